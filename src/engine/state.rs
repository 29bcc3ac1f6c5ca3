//! Board state snapshot.
//!
//! `BoardState` is the validated set of trips the board currently shows plus
//! the resource registry they are planned on. It is a value: the assignment
//! engine produces a new state for every accepted change, and nothing outside
//! the engine can modify bindings in place.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{ResourceRegistry, TimeWindow, Trip};
use crate::validation::validate_board;

/// Validated snapshot of trips and resources.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    trips: BTreeMap<String, Trip>,
    registry: ResourceRegistry,
}

impl BoardState {
    /// Builds a state from API snapshots.
    ///
    /// Fails with [`BoardError::Validation`](crate::BoardError::Validation)
    /// listing every problem found.
    pub fn new(trips: Vec<Trip>, registry: ResourceRegistry) -> Result<Self> {
        validate_board(&trips, &registry)?;
        Ok(Self {
            trips: trips.into_iter().map(|t| (t.uid.clone(), t)).collect(),
            registry,
        })
    }

    /// Looks up a trip.
    pub fn trip(&self, uid: &str) -> Option<&Trip> {
        self.trips.get(uid)
    }

    /// All trips by uid.
    pub fn trips(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    /// Resources the trips are planned on.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Number of trips.
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    /// Whether the board holds no trips.
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Trips with no resource bound on any kind.
    pub fn unplanned(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values().filter(|t| t.is_unplanned())
    }

    /// Trips bound to a resource, in start order (then uid).
    pub fn trips_on_resource(&self, resource_uid: &str) -> Vec<&Trip> {
        let kind = self.registry.get(resource_uid).map(|r| r.kind);
        let mut lane: Vec<&Trip> = self
            .trips
            .values()
            .filter(|t| match kind {
                Some(kind) => t.assignment.get(kind) == Some(resource_uid),
                None => t.assignment.contains(resource_uid),
            })
            .collect();
        lane.sort_by(|a, b| {
            let sa = a.window().map(|w| w.start());
            let sb = b.window().map(|w| w.start());
            sa.cmp(&sb).then_with(|| a.uid.cmp(&b.uid))
        });
        lane
    }

    /// Trips whose window overlaps `window`.
    pub fn trips_in_window(&self, window: &TimeWindow) -> Vec<&Trip> {
        self.trips
            .values()
            .filter(|t| t.window().is_some_and(|w| w.overlaps(window)))
            .collect()
    }

    /// Pairs of overlapping trips on a resource, for stacked rendering.
    pub fn overlapping_pairs(&self, resource_uid: &str) -> Vec<(String, String)> {
        let lane = self.trips_on_resource(resource_uid);
        let mut pairs = Vec::new();
        for (i, a) in lane.iter().enumerate() {
            let Some(wa) = a.window() else { continue };
            for b in &lane[i + 1..] {
                let Some(wb) = b.window() else { continue };
                // Lane is start-sorted: once b starts after a ends, later ones do too
                if wb.start() >= wa.end() {
                    break;
                }
                if wa.overlaps(&wb) {
                    pairs.push((a.uid.clone(), b.uid.clone()));
                }
            }
        }
        pairs
    }

    pub(crate) fn trip_mut(&mut self, uid: &str) -> Option<&mut Trip> {
        self.trips.get_mut(uid)
    }
}
