//! Backend interfaces.
//!
//! The scheduling core does not own an HTTP client; it talks to the backend
//! through these traits. Implementations handle transport, auth and retry.

use async_trait::async_trait;

use super::{AssignmentPatch, TripListQuery};
use crate::error::Result;
use crate::models::{Resource, ResourceAssignment, Trip};
use crate::pool::{Page, PoolQuery};

/// Read side of the trips API.
#[async_trait]
pub trait TripQueries: Send + Sync {
    /// Trips scheduled in a date range.
    async fn list_trips(&self, query: &TripListQuery) -> Result<Page<Trip>>;

    /// Trips without any resource bound.
    async fn list_unplanned_trips(
        &self,
        query: &PoolQuery,
        extended_view: bool,
    ) -> Result<Page<Trip>>;

    /// Resource catalog visible to the caller.
    async fn list_resources(&self) -> Result<Vec<Resource>>;
}

/// Write side of the trips API.
#[async_trait]
pub trait TripCommands: Send + Sync {
    /// Applies an assignment patch; returns the bindings the backend stored.
    async fn patch_trip_assignment(
        &self,
        trip_uid: &str,
        patch: &AssignmentPatch,
    ) -> Result<ResourceAssignment>;
}
