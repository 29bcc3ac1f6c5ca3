//! Assignment projection.
//!
//! A trip binds at most one resource per [`ResourceKind`]. The binding set
//! is not a persisted entity of its own; it is the projection
//! `Trip -> {kind: resource | none}` owned by the assignment engine.

use serde::{Deserialize, Serialize};

use super::{ResourceKind, TimeWindow};

/// Resource bindings of one trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    #[serde(default)]
    pub trucker: Option<String>,
    #[serde(default)]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub trailer: Option<String>,
}

impl ResourceAssignment {
    /// Creates an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a resource (builder form).
    pub fn with(mut self, kind: ResourceKind, resource_uid: impl Into<String>) -> Self {
        self.set(kind, Some(resource_uid.into()));
        self
    }

    /// Resource bound for a kind.
    pub fn get(&self, kind: ResourceKind) -> Option<&str> {
        self.slot(kind).as_deref()
    }

    /// Replaces the binding for a kind, returning the previous one.
    pub fn set(&mut self, kind: ResourceKind, resource_uid: Option<String>) -> Option<String> {
        std::mem::replace(self.slot_mut(kind), resource_uid)
    }

    /// Whether no kind is bound (trip belongs to the unplanned pool).
    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL.iter().all(|k| self.slot(*k).is_none())
    }

    /// Whether every kind is bound.
    pub fn is_complete(&self) -> bool {
        ResourceKind::ALL.iter().all(|k| self.slot(*k).is_some())
    }

    /// Kinds currently bound.
    pub fn assigned_kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|k| self.slot(*k).is_some())
            .collect()
    }

    /// Whether the resource is bound on any kind.
    pub fn contains(&self, resource_uid: &str) -> bool {
        ResourceKind::ALL
            .iter()
            .any(|k| self.get(*k) == Some(resource_uid))
    }

    fn slot(&self, kind: ResourceKind) -> &Option<String> {
        match kind {
            ResourceKind::Trucker => &self.trucker,
            ResourceKind::Vehicle => &self.vehicle,
            ResourceKind::Trailer => &self.trailer,
        }
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> &mut Option<String> {
        match kind {
            ResourceKind::Trucker => &mut self.trucker,
            ResourceKind::Vehicle => &mut self.vehicle,
            ResourceKind::Trailer => &mut self.trailer,
        }
    }
}

/// A trip-resource binding as produced by the assignment engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Bound trip.
    pub trip_uid: String,
    /// Slot the resource occupies.
    pub kind: ResourceKind,
    /// Bound resource.
    pub resource_uid: String,
    /// Overall window of the trip.
    pub window: TimeWindow,
    /// Accepted despite overlapping other trips on the resource.
    pub stacked: bool,
}
