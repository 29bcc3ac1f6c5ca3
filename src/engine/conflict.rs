//! Overlap detection on a single resource.
//!
//! # Algorithm
//! 1. Widen the candidate trip's window by the look-behind/look-ahead
//!    horizon to get the scan range.
//! 2. Collect the other trips bound to the resource whose windows touch
//!    the scan range.
//! 3. Report those whose windows strictly overlap the candidate window.
//!
//! The horizon bounds the scan to the slice of the board a planner actually
//! has loaded; it never widens what counts as an overlap.

use chrono::Duration;

use super::BoardState;
use crate::models::TimeWindow;

/// Scan range around a trip when looking for conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictHorizon {
    look_behind: Duration,
    look_ahead: Duration,
}

impl ConflictHorizon {
    /// Creates a horizon. Negative durations are clamped to zero.
    pub fn new(look_behind: Duration, look_ahead: Duration) -> Self {
        Self {
            look_behind: look_behind.max(Duration::zero()),
            look_ahead: look_ahead.max(Duration::zero()),
        }
    }

    /// How far before the trip the scan starts.
    pub fn look_behind(&self) -> Duration {
        self.look_behind
    }

    /// How far after the trip the scan ends.
    pub fn look_ahead(&self) -> Duration {
        self.look_ahead
    }

    /// Scan range for a trip window.
    pub fn scan_range(&self, window: &TimeWindow) -> TimeWindow {
        window.expand(self.look_behind, self.look_ahead)
    }
}

impl Default for ConflictHorizon {
    fn default() -> Self {
        Self::new(Duration::hours(24), Duration::hours(24))
    }
}

/// Trips on `resource_uid` (other than `trip_uid`) overlapping `window`.
///
/// Returns trip uids sorted ascending.
pub fn find_conflicts(
    state: &BoardState,
    trip_uid: &str,
    window: &TimeWindow,
    resource_uid: &str,
    horizon: &ConflictHorizon,
) -> Vec<String> {
    let scan = horizon.scan_range(window);
    let mut conflicts: Vec<String> = state
        .trips_on_resource(resource_uid)
        .into_iter()
        .filter(|other| other.uid != trip_uid)
        .filter_map(|other| other.window().map(|w| (other, w)))
        .filter(|(_, w)| w.start() <= scan.end() && w.end() >= scan.start())
        .filter(|(_, w)| w.overlaps(window))
        .map(|(other, _)| other.uid.clone())
        .collect();
    conflicts.sort();
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{at, trip_at, trip_between};
    use crate::models::{Resource, ResourceKind, ResourceRegistry};

    fn state() -> BoardState {
        let registry = ResourceRegistry::from_resources(vec![Resource::trucker("X", 1)]).unwrap();
        BoardState::new(
            vec![
                trip_between("T1", 9, 10).with_resource(ResourceKind::Trucker, "X"),
                trip_between("T3", 11, 12).with_resource(ResourceKind::Trucker, "X"),
                trip_between("T4", 8, 12),
            ],
            registry,
        )
        .unwrap()
    }

    #[test]
    fn test_overlap_found() {
        let w = TimeWindow::new(at(9, 30), at(9, 45)).unwrap();
        let c = find_conflicts(&state(), "T2", &w, "X", &ConflictHorizon::default());
        assert_eq!(c, vec!["T1"]);
    }

    #[test]
    fn test_touching_is_not_conflict() {
        let w = TimeWindow::new(at(10, 0), at(11, 0)).unwrap();
        let c = find_conflicts(&state(), "T2", &w, "X", &ConflictHorizon::default());
        assert!(c.is_empty());
    }

    #[test]
    fn test_spanning_window_hits_all() {
        let trip = trip_at("T4", at(8, 0), at(12, 0));
        let w = trip.window().unwrap();
        let c = find_conflicts(&state(), "T4", &w, "X", &ConflictHorizon::default());
        assert_eq!(c, vec!["T1", "T3"]);
    }

    #[test]
    fn test_self_excluded() {
        let w = TimeWindow::new(at(9, 0), at(10, 0)).unwrap();
        let c = find_conflicts(&state(), "T1", &w, "X", &ConflictHorizon::default());
        assert!(c.is_empty());
    }

    #[test]
    fn test_zero_horizon_still_finds_overlaps() {
        let horizon = ConflictHorizon::new(Duration::zero(), Duration::hours(-3));
        assert_eq!(horizon.look_ahead(), Duration::zero());
        let w = TimeWindow::new(at(9, 30), at(11, 30)).unwrap();
        let c = find_conflicts(&state(), "T2", &w, "X", &horizon);
        assert_eq!(c, vec!["T1", "T3"]);
    }
}
