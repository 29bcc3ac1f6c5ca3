//! Transport model.
//!
//! A transport is the commercial order behind a trip: who ships, with which
//! tags, under which reference. The board only needs this summary; full
//! transport records live behind the API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{CompanyId, TagId};

/// Summary of a transport order carried by a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    /// Unique transport identifier.
    pub uid: String,
    /// Human-facing sequential number.
    pub sequential_id: u64,
    /// Shipper (customer) company.
    #[serde(default)]
    pub shipper_id: Option<CompanyId>,
    /// Shipper's order reference.
    #[serde(default)]
    pub reference: Option<String>,
    /// Tags (e.g. "frozen", "urgent").
    #[serde(default)]
    pub tags: BTreeSet<TagId>,
}

impl Transport {
    /// Creates a new transport.
    pub fn new(uid: impl Into<String>, sequential_id: u64) -> Self {
        Self {
            uid: uid.into(),
            sequential_id,
            shipper_id: None,
            reference: None,
            tags: BTreeSet::new(),
        }
    }

    /// Sets the shipper.
    pub fn with_shipper(mut self, shipper_id: CompanyId) -> Self {
        self.shipper_id = Some(shipper_id);
        self
    }

    /// Sets the shipper reference.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<TagId>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}
