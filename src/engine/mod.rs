//! Assignment engine.
//!
//! Owns the trip-resource binding projection. Callers hand in a
//! [`BoardState`] and an [`EditScope`]; the engine checks edit rights and
//! overlaps and returns a new state plus the backend patch.
//!
//! # Components
//! - [`BoardState`]: validated snapshot of trips and resources
//! - [`EditScope`] / [`can_edit`]: the single authorization predicate
//! - [`find_conflicts`] / [`ConflictHorizon`]: overlap detection per resource
//! - [`AssignmentEngine`]: `assign`, `unassign`, `conflicts`

mod assignment;
mod authz;
mod conflict;
mod state;

pub use assignment::{AssignOutcome, AssignRequest, AssignmentEngine, UnassignOutcome};
pub use authz::{can_edit, EditScope, GroupView};
pub use conflict::{find_conflicts, ConflictHorizon};
pub use state::BoardState;
