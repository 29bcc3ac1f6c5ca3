//! Error taxonomy of the scheduling core.
//!
//! - **Validation**: malformed filters, orderings, windows, or snapshots.
//!   Rejected before any mutation and never retried automatically.
//! - **Conflict**: an assignment overlaps trips already bound to the
//!   resource. The caller may retry with an explicit override.
//! - **Authorization**: the caller may not edit the trip or resource.
//!   Fatal for the requested operation.
//! - **StaleQuery**: a superseded in-flight fetch. Not user-visible;
//!   callers drop it.

use crate::models::{CompanyId, ResourceKind};
use crate::validation::ValidationError;
use crate::views::ViewId;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors produced by the scheduling core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoardError {
    #[error("validation failed: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    #[error("trip '{trip_uid}' overlaps {conflicting_trip_ids:?} on {kind} '{resource_uid}'")]
    Conflict {
        trip_uid: String,
        kind: ResourceKind,
        resource_uid: String,
        conflicting_trip_ids: Vec<String>,
    },

    #[error("not allowed to edit {entity} '{uid}' owned by company {company_id}")]
    Authorization {
        entity: &'static str,
        uid: String,
        company_id: CompanyId,
    },

    #[error("query '{key}' superseded: sequence {sequence}, latest {latest}")]
    StaleQuery {
        key: String,
        sequence: u64,
        latest: u64,
    },

    #[error("unknown trip '{0}'")]
    TripNotFound(String),

    #[error("unknown resource '{0}'")]
    ResourceNotFound(String),

    #[error("scheduler view {0} not found")]
    ViewNotFound(ViewId),

    #[error("api error: {0}")]
    Api(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),
}

impl BoardError {
    /// Whether this error is a superseded query that callers should drop.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleQuery { .. })
    }

    /// Conflicting trip IDs, if this is a conflict.
    pub fn conflicting_trip_ids(&self) -> Option<&[String]> {
        match self {
            Self::Conflict {
                conflicting_trip_ids,
                ..
            } => Some(conflicting_trip_ids),
            _ => None,
        }
    }
}

impl From<ValidationError> for BoardError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(vec![err])
    }
}

impl From<Vec<ValidationError>> for BoardError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_validation_display_joins_messages() {
        let err = BoardError::from(vec![
            ValidationError::new(ValidationErrorKind::EmptyTrip, "Trip 'A' has no activities"),
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate trip ID: B"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: Trip 'A' has no activities; Duplicate trip ID: B"
        );
    }

    #[test]
    fn test_conflict_accessors() {
        let err = BoardError::Conflict {
            trip_uid: "T2".into(),
            kind: ResourceKind::Trucker,
            resource_uid: "X".into(),
            conflicting_trip_ids: vec!["T1".into()],
        };
        assert_eq!(err.conflicting_trip_ids(), Some(&["T1".to_string()][..]));
        assert!(!err.is_stale());
        assert!(err.to_string().contains("trucker 'X'"));
    }
}
