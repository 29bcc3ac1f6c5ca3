//! Assign and unassign resources.
//!
//! The engine is the only code path that changes trip-resource bindings.
//! It never mutates the state it is given: every accepted change yields a
//! new [`BoardState`] together with the patch the backend must receive.
//!
//! # Algorithm (assign)
//! 1. Resolve the trip and the resource; the resource kind must match the
//!    requested slot.
//! 2. Gate both through the caller's [`EditScope`].
//! 3. Scan the resource lane within the conflict horizon for overlaps.
//! 4. Reject on overlap, unless the request carries an override, in which
//!    case bind and mark the slot stacked.

use tracing::{info, warn};

use super::{find_conflicts, BoardState, ConflictHorizon, EditScope};
use crate::api::AssignmentPatch;
use crate::config::BoardConfig;
use crate::error::{BoardError, Result};
use crate::models::{Assignment, Resource, ResourceKind, TimeWindow, Trip};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Request to bind a resource to a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRequest {
    pub trip_uid: String,
    pub kind: ResourceKind,
    pub resource_uid: String,
    /// Accept the binding even if it overlaps other trips ("stacked").
    pub allow_overlap: bool,
}

impl AssignRequest {
    /// Creates a request without override.
    pub fn new(
        trip_uid: impl Into<String>,
        kind: ResourceKind,
        resource_uid: impl Into<String>,
    ) -> Self {
        Self {
            trip_uid: trip_uid.into(),
            kind,
            resource_uid: resource_uid.into(),
            allow_overlap: false,
        }
    }

    /// Marks the request as a manual override of overlap checks.
    pub fn with_override(mut self) -> Self {
        self.allow_overlap = true;
        self
    }
}

/// Result of an accepted assignment.
#[derive(Debug, Clone)]
pub struct AssignOutcome {
    /// Board after the change.
    pub state: BoardState,
    /// The binding now in place.
    pub assignment: Assignment,
    /// Resource bound on the slot before, if any.
    pub previous_resource: Option<String>,
    /// Trips the binding overlaps (non-empty only for overrides).
    pub overlapping_trip_ids: Vec<String>,
    /// Command for the backend. Empty when nothing changed.
    pub patch: AssignmentPatch,
}

impl AssignOutcome {
    /// Whether the request changed anything.
    pub fn is_noop(&self) -> bool {
        self.patch.is_empty()
    }
}

/// Result of an unassignment.
#[derive(Debug, Clone)]
pub struct UnassignOutcome {
    /// Board after the change.
    pub state: BoardState,
    /// Resource that was bound, if any.
    pub previous_resource: Option<String>,
    /// Command for the backend. Empty when the slot was already free.
    pub patch: AssignmentPatch,
}

/// Assignment engine.
///
/// # Example
/// ```
/// use trip_board::engine::{AssignRequest, AssignmentEngine, BoardState, EditScope};
/// use trip_board::models::{Resource, ResourceKind, ResourceRegistry};
///
/// let registry = ResourceRegistry::from_resources(vec![Resource::trucker("X", 1)]).unwrap();
/// let state = BoardState::new(Vec::new(), registry).unwrap();
/// let engine = AssignmentEngine::default();
///
/// // Unknown trip
/// let result = engine.assign(&state, &EditScope::new([1]), AssignRequest::new("T1", ResourceKind::Trucker, "X"));
/// assert!(result.is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AssignmentEngine {
    horizon: ConflictHorizon,
}

impl AssignmentEngine {
    /// Creates an engine with the given conflict horizon.
    pub fn new(horizon: ConflictHorizon) -> Self {
        Self { horizon }
    }

    /// Creates an engine from board configuration.
    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(config.conflict_horizon())
    }

    /// Conflict scan horizon.
    pub fn horizon(&self) -> &ConflictHorizon {
        &self.horizon
    }

    /// Binds a resource to a trip.
    ///
    /// Fails without touching `state` when the trip or resource is unknown,
    /// the kinds differ, the caller may not edit either side, or the binding
    /// overlaps other trips and no override was requested.
    pub fn assign(
        &self,
        state: &BoardState,
        scope: &EditScope,
        request: AssignRequest,
    ) -> Result<AssignOutcome> {
        let trip = lookup_trip(state, &request.trip_uid)?;
        let resource = lookup_resource(state, &request.resource_uid, request.kind)?;
        scope.ensure_trip(trip)?;
        scope.ensure_resource(resource)?;
        let window = trip_window(trip)?;

        let previous = trip.assignment.get(request.kind).map(str::to_owned);
        if previous.as_deref() == Some(request.resource_uid.as_str()) {
            return Ok(AssignOutcome {
                state: state.clone(),
                assignment: Assignment {
                    trip_uid: request.trip_uid,
                    kind: request.kind,
                    resource_uid: request.resource_uid,
                    window,
                    stacked: trip.is_stacked_on(request.kind),
                },
                previous_resource: previous,
                overlapping_trip_ids: Vec::new(),
                patch: AssignmentPatch::default(),
            });
        }

        let overlapping = find_conflicts(
            state,
            &request.trip_uid,
            &window,
            &request.resource_uid,
            &self.horizon,
        );
        if !overlapping.is_empty() && !request.allow_overlap {
            warn!(
                trip = %request.trip_uid,
                resource = %request.resource_uid,
                conflicts = ?overlapping,
                "assignment rejected: overlap"
            );
            return Err(BoardError::Conflict {
                trip_uid: request.trip_uid,
                kind: request.kind,
                resource_uid: request.resource_uid,
                conflicting_trip_ids: overlapping,
            });
        }

        let stacked = !overlapping.is_empty();
        let mut next = state.clone();
        if let Some(trip) = next.trip_mut(&request.trip_uid) {
            trip.assignment
                .set(request.kind, Some(request.resource_uid.clone()));
            if stacked {
                trip.stacked.insert(request.kind);
            } else {
                trip.stacked.remove(&request.kind);
            }
        }

        info!(
            trip = %request.trip_uid,
            kind = %request.kind,
            resource = %request.resource_uid,
            previous = ?previous,
            stacked,
            "resource assigned"
        );

        Ok(AssignOutcome {
            state: next,
            patch: AssignmentPatch::set(request.kind, request.resource_uid.clone()),
            assignment: Assignment {
                trip_uid: request.trip_uid,
                kind: request.kind,
                resource_uid: request.resource_uid,
                window,
                stacked,
            },
            previous_resource: previous,
            overlapping_trip_ids: overlapping,
        })
    }

    /// Clears the binding of one kind.
    ///
    /// Idempotent: a free slot yields an unchanged state and an empty patch.
    pub fn unassign(
        &self,
        state: &BoardState,
        scope: &EditScope,
        trip_uid: &str,
        kind: ResourceKind,
    ) -> Result<UnassignOutcome> {
        let trip = lookup_trip(state, trip_uid)?;
        scope.ensure_trip(trip)?;

        if trip.assignment.get(kind).is_none() {
            return Ok(UnassignOutcome {
                state: state.clone(),
                previous_resource: None,
                patch: AssignmentPatch::default(),
            });
        }

        let mut next = state.clone();
        let previous = next.trip_mut(trip_uid).and_then(|trip| {
            trip.stacked.remove(&kind);
            trip.assignment.set(kind, None)
        });

        info!(trip = %trip_uid, %kind, previous = ?previous, "resource unassigned");

        Ok(UnassignOutcome {
            state: next,
            previous_resource: previous,
            patch: AssignmentPatch::clear(kind),
        })
    }

    /// Whether the caller may edit a trip.
    pub fn can_edit(&self, trip: &Trip, scope: &EditScope) -> bool {
        super::can_edit(trip, scope)
    }

    /// Trips a binding would overlap, without changing anything.
    pub fn conflicts(
        &self,
        state: &BoardState,
        trip_uid: &str,
        kind: ResourceKind,
        resource_uid: &str,
    ) -> Result<Vec<String>> {
        let trip = lookup_trip(state, trip_uid)?;
        lookup_resource(state, resource_uid, kind)?;
        let window = trip_window(trip)?;
        Ok(find_conflicts(
            state,
            trip_uid,
            &window,
            resource_uid,
            &self.horizon,
        ))
    }
}

fn lookup_trip<'a>(state: &'a BoardState, uid: &str) -> Result<&'a Trip> {
    state
        .trip(uid)
        .ok_or_else(|| BoardError::TripNotFound(uid.to_owned()))
}

fn lookup_resource<'a>(
    state: &'a BoardState,
    uid: &str,
    kind: ResourceKind,
) -> Result<&'a Resource> {
    let resource = state
        .registry()
        .get(uid)
        .ok_or_else(|| BoardError::ResourceNotFound(uid.to_owned()))?;
    if resource.kind != kind {
        return Err(ValidationError::new(
            ValidationErrorKind::ResourceKindMismatch,
            format!("Resource '{uid}' is a {}, not a {kind}", resource.kind),
        )
        .into());
    }
    Ok(resource)
}

fn trip_window(trip: &Trip) -> Result<TimeWindow> {
    trip.window().ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::EmptyTrip,
            format!("Trip '{}' has no activities", trip.uid),
        )
        .into()
    })
}
