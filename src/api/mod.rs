//! External interfaces.
//!
//! - [`TripQueries`] / [`TripCommands`]: async backend traits
//! - [`QueryParams`]: flat key/value encoding of queries
//! - [`AssignmentPatch`]: tri-state assignment command body
//! - [`QuerySequencer`]: drops superseded in-flight query results

mod client;
mod params;
mod patch;
mod sequencing;

pub use client::{TripCommands, TripQueries};
pub use params::{unplanned_params, QueryParams, TripListQuery};
pub use patch::{AssignmentPatch, Patch};
pub use sequencing::{QuerySequencer, QueryTicket};
