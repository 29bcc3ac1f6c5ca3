//! Trip model.
//!
//! A trip is an ordered sequence of activities driven by one set of
//! resources (trucker, vehicle, trailer). Two flavours exist:
//!
//! - **Prepared** trips are durable, named planning units that may carry
//!   several transports and survive across them.
//! - **Implicit** trips are display-only wrappers around exactly one
//!   transport.
//!
//! # Time Representation
//! The overall window of a trip is the span of its activity windows. The
//! activity sequence must be non-decreasing in time; see
//! [`validate_trip`](crate::validation::validate_trip).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Activity, CompanyId, ResourceAssignment, ResourceKind, TimeWindow, Transport};

/// A trip to be placed on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Unique trip identifier.
    pub uid: String,
    /// Planner-given name (prepared trips).
    #[serde(default)]
    pub name: Option<String>,
    /// Durable planning unit, as opposed to a one-transport wrapper.
    pub is_prepared: bool,
    /// Carrier company running the trip; decides who may edit it.
    pub carrier_company_id: CompanyId,
    /// Stops in sequence order.
    pub activities: Vec<Activity>,
    /// Transports carried.
    #[serde(default)]
    pub transports: Vec<Transport>,
    /// Current resource bindings.
    #[serde(default)]
    pub assignment: ResourceAssignment,
    /// Kinds whose binding was accepted despite an overlap.
    #[serde(default)]
    pub stacked: BTreeSet<ResourceKind>,
}

impl Trip {
    /// Creates an empty prepared trip.
    pub fn prepared(
        uid: impl Into<String>,
        name: impl Into<String>,
        carrier_company_id: CompanyId,
    ) -> Self {
        Self {
            uid: uid.into(),
            name: Some(name.into()),
            is_prepared: true,
            carrier_company_id,
            activities: Vec::new(),
            transports: Vec::new(),
            assignment: ResourceAssignment::default(),
            stacked: BTreeSet::new(),
        }
    }

    /// Creates an implicit trip wrapping one transport.
    pub fn implicit(
        uid: impl Into<String>,
        transport: Transport,
        carrier_company_id: CompanyId,
    ) -> Self {
        Self {
            uid: uid.into(),
            name: None,
            is_prepared: false,
            carrier_company_id,
            activities: Vec::new(),
            transports: vec![transport],
            assignment: ResourceAssignment::default(),
            stacked: BTreeSet::new(),
        }
    }

    /// Appends an activity to the sequence.
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    /// Adds a transport.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transports.push(transport);
        self
    }

    /// Binds a resource (snapshot construction).
    pub fn with_resource(mut self, kind: ResourceKind, resource_uid: impl Into<String>) -> Self {
        self.assignment.set(kind, Some(resource_uid.into()));
        self
    }

    /// Overall window: span of all activity windows.
    ///
    /// `None` for a trip without activities.
    pub fn window(&self) -> Option<TimeWindow> {
        self.activities
            .iter()
            .map(|a| a.window)
            .reduce(|acc, w| acc.span(&w))
    }

    /// Earliest loading start.
    pub fn first_pickup(&self) -> Option<DateTime<Utc>> {
        self.activities
            .iter()
            .filter(|a| a.is_pickup())
            .map(|a| a.window.start())
            .min()
    }

    /// Latest unloading end.
    pub fn last_delivery(&self) -> Option<DateTime<Utc>> {
        self.activities
            .iter()
            .filter(|a| a.is_delivery())
            .map(|a| a.window.end())
            .max()
    }

    /// Union of the tags of all transports.
    pub fn tags(&self) -> BTreeSet<&str> {
        self.transports
            .iter()
            .flat_map(|t| t.tags.iter().map(String::as_str))
            .collect()
    }

    /// Shippers of all transports.
    pub fn shipper_ids(&self) -> impl Iterator<Item = CompanyId> + '_ {
        self.transports.iter().filter_map(|t| t.shipper_id)
    }

    /// Smallest sequential id of the carried transports.
    pub fn min_sequential_id(&self) -> Option<u64> {
        self.transports.iter().map(|t| t.sequential_id).min()
    }

    /// Name shown on the card: the trip name, else the transport number.
    pub fn display_name(&self) -> String {
        match (&self.name, self.min_sequential_id()) {
            (Some(name), _) => name.clone(),
            (None, Some(seq)) => format!("#{seq}"),
            (None, None) => self.uid.clone(),
        }
    }

    /// Whether no resource is bound on any kind.
    pub fn is_unplanned(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Whether any binding was accepted as an overlap.
    pub fn is_stacked(&self) -> bool {
        !self.stacked.is_empty()
    }

    /// Whether the binding of a kind was accepted as an overlap.
    pub fn is_stacked_on(&self, kind: ResourceKind) -> bool {
        self.stacked.contains(&kind)
    }

    /// Number of activities.
    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }
}
