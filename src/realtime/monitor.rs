//! Reload state machine.
//!
//! ```text
//!            notify                tick(can_reload = true)
//!   Idle ─────────────► PendingReload ─────────────────────► Idle (reload)
//!                          │    ▲
//!                          │    └── tick(can_reload = false)
//!                          └── cancel() ──► Idle (no reload)
//! ```
//!
//! Notifications only mark the board stale; the periodic tick decides when
//! to reload. A burst of notifications therefore collapses into one reload,
//! and a missed notification delays a reload by at most one refresh cycle.

use tracing::debug;

use super::{BoardKind, RealtimeEvent};

/// Reload state of a board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReloadState {
    #[default]
    Idle,
    PendingReload,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing pending.
    Idle,
    /// Caller must reload now.
    Reload,
    /// Pending, but the board may not reload right now.
    Deferred,
}

/// Per-board reload monitor.
#[derive(Debug, Clone)]
pub struct ReloadMonitor {
    board: BoardKind,
    state: ReloadState,
}

impl ReloadMonitor {
    pub fn new(board: BoardKind) -> Self {
        Self {
            board,
            state: ReloadState::Idle,
        }
    }

    pub fn board(&self) -> BoardKind {
        self.board
    }

    pub fn state(&self) -> ReloadState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == ReloadState::PendingReload
    }

    /// Handles a notification. Returns whether it concerned this board.
    pub fn notify(&mut self, event: &RealtimeEvent) -> bool {
        if !self.board.watches(event) {
            return false;
        }
        self.mark_stale();
        true
    }

    /// Marks the board stale.
    pub fn mark_stale(&mut self) {
        if self.state == ReloadState::Idle {
            debug!(board = %self.board, "reload pending");
        }
        self.state = ReloadState::PendingReload;
    }

    /// Periodic check.
    pub fn tick(&mut self, can_reload: bool) -> TickOutcome {
        match (self.state, can_reload) {
            (ReloadState::Idle, _) => TickOutcome::Idle,
            (ReloadState::PendingReload, true) => {
                self.state = ReloadState::Idle;
                TickOutcome::Reload
            }
            (ReloadState::PendingReload, false) => TickOutcome::Deferred,
        }
    }

    /// Drops a pending reload without reloading.
    pub fn cancel(&mut self) {
        self.state = ReloadState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn trips_changed() -> RealtimeEvent {
        RealtimeEvent::new("schedulerTrips", Utc::now())
    }

    #[test]
    fn test_burst_collapses_into_one_reload() {
        let mut monitor = ReloadMonitor::new(BoardKind::Scheduler);
        assert_eq!(monitor.tick(true), TickOutcome::Idle);
        for _ in 0..5 {
            assert!(monitor.notify(&trips_changed()));
        }
        assert_eq!(monitor.tick(true), TickOutcome::Reload);
        assert_eq!(monitor.tick(true), TickOutcome::Idle);
    }

    #[test]
    fn test_deferred_while_editing() {
        let mut monitor = ReloadMonitor::new(BoardKind::UnplannedPool);
        monitor.notify(&trips_changed());
        assert_eq!(monitor.tick(false), TickOutcome::Deferred);
        assert_eq!(monitor.tick(false), TickOutcome::Deferred);
        assert!(monitor.is_pending());
        assert_eq!(monitor.tick(true), TickOutcome::Reload);
    }

    #[test]
    fn test_cancel_skips_reload() {
        let mut monitor = ReloadMonitor::new(BoardKind::Scheduler);
        monitor.notify(&trips_changed());
        monitor.cancel();
        assert_eq!(monitor.state(), ReloadState::Idle);
        assert_eq!(monitor.tick(true), TickOutcome::Idle);
    }

    #[test]
    fn test_unrelated_entity_ignored() {
        let mut monitor = ReloadMonitor::new(BoardKind::InvoiceList);
        assert!(!monitor.notify(&trips_changed()));
        assert_eq!(monitor.tick(true), TickOutcome::Idle);
    }
}
