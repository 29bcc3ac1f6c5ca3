//! Input validation for board snapshots.
//!
//! Checks structural and temporal integrity of trips, activities, and
//! resource bindings before the board accepts a snapshot. Detects:
//! - Duplicate IDs
//! - Empty trips and implicit trips not wrapping exactly one transport
//! - Activity sequences that go backwards in time
//! - Loading activities that end after the unloading of the same delivery
//! - Bindings to unknown resources or to resources of the wrong kind
//!
//! Every failure is collected; validation never stops at the first error
//! and never corrects data silently.

use crate::models::{ActivityCategory, ResourceKind, ResourceRegistry, Trip};
use std::collections::{HashMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// What went wrong, for display.
    pub message: String,
}

/// Kind of snapshot integrity failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two trips, activities or resources reuse a uid.
    DuplicateId,
    /// A trip has no activities.
    EmptyTrip,
    /// An implicit trip does not wrap exactly one transport.
    ImplicitTripTransportCount,
    /// A time window ends before it starts.
    InvalidTimeWindow,
    /// An activity starts before its predecessor in the sequence.
    ActivityOrder,
    /// Loading ends after the unloading of the same delivery starts.
    LoadingAfterUnloading,
    /// A binding references a resource that doesn't exist.
    InvalidResourceReference,
    /// A binding references a resource of another kind.
    ResourceKindMismatch,
    /// A query uses a filter key outside the supported set.
    UnknownFilterKey,
    /// A filter value could not be parsed.
    InvalidFilterValue,
    /// An ordering key outside the supported set.
    UnknownOrdering,
    /// Page number or size out of range.
    InvalidPage,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a single trip.
///
/// Checks:
/// 1. The trip has at least one activity
/// 2. Implicit trips wrap exactly one transport
/// 3. Activity IDs are unique within the trip
/// 4. Activity windows are non-decreasing in sequence order
/// 5. Every loading ends at or before the unloading of the same delivery starts
pub fn validate_trip(trip: &Trip) -> ValidationResult {
    let mut errors = Vec::new();
    check_trip(trip, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a full board snapshot.
///
/// Runs [`validate_trip`] on every trip and additionally checks:
/// 1. No duplicate trip IDs
/// 2. No duplicate activity IDs across trips
/// 3. Every bound resource exists in the registry
/// 4. Every bound resource has the kind of the slot it is bound to
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_board(trips: &[Trip], registry: &ResourceRegistry) -> ValidationResult {
    let mut errors = Vec::new();

    let mut trip_ids = HashSet::new();
    let mut activity_ids = HashSet::new();

    for trip in trips {
        if !trip_ids.insert(trip.uid.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate trip ID: {}", trip.uid),
            ));
        }

        check_trip(trip, &mut errors);

        for act in &trip.activities {
            if !activity_ids.insert(act.uid.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate activity ID across trips: {}", act.uid),
                ));
            }
        }
    }

    for trip in trips {
        for kind in ResourceKind::ALL {
            let Some(resource_uid) = trip.assignment.get(kind) else {
                continue;
            };
            match registry.get(resource_uid) {
                None => errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidResourceReference,
                    format!("Trip '{}' references unknown {kind} '{resource_uid}'", trip.uid),
                )),
                Some(resource) if resource.kind != kind => errors.push(ValidationError::new(
                    ValidationErrorKind::ResourceKindMismatch,
                    format!(
                        "Trip '{}' binds {} '{}' as {kind}",
                        trip.uid, resource.kind, resource_uid
                    ),
                )),
                Some(_) => {}
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_trip(trip: &Trip, errors: &mut Vec<ValidationError>) {
    if trip.activities.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyTrip,
            format!("Trip '{}' has no activities", trip.uid),
        ));
    }

    if !trip.is_prepared && trip.transports.len() != 1 {
        errors.push(ValidationError::new(
            ValidationErrorKind::ImplicitTripTransportCount,
            format!(
                "Implicit trip '{}' wraps {} transports, expected exactly one",
                trip.uid,
                trip.transports.len()
            ),
        ));
    }

    let mut seen = HashSet::new();
    for act in &trip.activities {
        if !seen.insert(act.uid.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate activity ID in trip '{}': {}", trip.uid, act.uid),
            ));
        }
    }

    for pair in trip.activities.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.window.start() < prev.window.start() {
            errors.push(ValidationError::new(
                ValidationErrorKind::ActivityOrder,
                format!(
                    "Activity '{}' starts before its predecessor '{}' in trip '{}'",
                    next.uid, prev.uid, trip.uid
                ),
            ));
        }
    }

    check_delivery_order(trip, errors);
}

/// Loading must be finished before the unloading of the same delivery begins.
fn check_delivery_order(trip: &Trip, errors: &mut Vec<ValidationError>) {
    let mut unloading_start = HashMap::new();
    for act in &trip.activities {
        if act.category != ActivityCategory::Unloading {
            continue;
        }
        if let Some(delivery) = act.delivery_ref.as_deref() {
            let start = act.window.start();
            unloading_start
                .entry(delivery)
                .and_modify(|s| {
                    if start < *s {
                        *s = start;
                    }
                })
                .or_insert(start);
        }
    }

    for act in &trip.activities {
        if act.category != ActivityCategory::Loading {
            continue;
        }
        let Some(delivery) = act.delivery_ref.as_deref() else {
            continue;
        };
        if let Some(&start) = unloading_start.get(delivery) {
            if act.window.end() > start {
                errors.push(ValidationError::new(
                    ValidationErrorKind::LoadingAfterUnloading,
                    format!(
                        "Loading '{}' ends after unloading of delivery '{delivery}' starts",
                        act.uid
                    ),
                ));
            }
        }
    }
}
