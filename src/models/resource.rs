//! Resource model.
//!
//! Resources are the physical entities trips are planned onto: truckers
//! (drivers), vehicles (tractors, rigid trucks) and trailers. Each resource
//! is owned by exactly one company and never changes kind.
//!
//! The registry is an immutable snapshot of what the fleet API returned for
//! one query; it is rebuilt on reload, never patched.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::{CompanyId, TagId};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Kind of a schedulable resource. One trip binds at most one per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Driver.
    Trucker,
    /// Motorised unit.
    Vehicle,
    /// Towed unit.
    Trailer,
}

impl ResourceKind {
    /// All kinds in board row order.
    pub const ALL: [ResourceKind; 3] = [Self::Trucker, Self::Vehicle, Self::Trailer];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trucker => "trucker",
            Self::Vehicle => "vehicle",
            Self::Trailer => "trailer",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trucker" => Ok(Self::Trucker),
            "vehicle" => Ok(Self::Vehicle),
            "trailer" => Ok(Self::Trailer),
            other => Err(ValidationError::new(
                ValidationErrorKind::InvalidFilterValue,
                format!("Unknown resource kind '{other}'"),
            )),
        }
    }
}

/// A resource that trips can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource uid, unique across kinds.
    pub uid: String,
    /// Resource classification, fixed for the resource's lifetime.
    pub kind: ResourceKind,
    /// Company owning the resource.
    pub owner_company_id: CompanyId,
    /// Display name (driver name, licence plate).
    #[serde(default)]
    pub name: String,
    /// Tags for grouping and filtering board rows.
    #[serde(default)]
    pub tags: BTreeSet<TagId>,
    /// Position on the board (lower first).
    #[serde(default)]
    pub display_order: i32,
}

impl Resource {
    /// Creates a new resource.
    pub fn new(uid: impl Into<String>, kind: ResourceKind, owner_company_id: CompanyId) -> Self {
        Self {
            uid: uid.into(),
            kind,
            owner_company_id,
            name: String::new(),
            tags: BTreeSet::new(),
            display_order: 0,
        }
    }

    /// Creates a trucker.
    pub fn trucker(uid: impl Into<String>, owner_company_id: CompanyId) -> Self {
        Self::new(uid, ResourceKind::Trucker, owner_company_id)
    }

    /// Creates a vehicle.
    pub fn vehicle(uid: impl Into<String>, owner_company_id: CompanyId) -> Self {
        Self::new(uid, ResourceKind::Vehicle, owner_company_id)
    }

    /// Creates a trailer.
    pub fn trailer(uid: impl Into<String>, owner_company_id: CompanyId) -> Self {
        Self::new(uid, ResourceKind::Trailer, owner_company_id)
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<TagId>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Sets the board position.
    pub fn with_display_order(mut self, display_order: i32) -> Self {
        self.display_order = display_order;
        self
    }

    /// Whether this resource carries a given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether this resource carries at least one of the tags.
    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|t| self.has_tag(t.as_ref()))
    }
}

/// Immutable catalog of resources keyed by uid.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, Resource>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a snapshot, rejecting duplicate uids.
    pub fn from_resources(
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut map = BTreeMap::new();
        let mut errors = Vec::new();
        for resource in resources {
            if map.contains_key(&resource.uid) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate resource ID: {}", resource.uid),
                ));
                continue;
            }
            map.insert(resource.uid.clone(), resource);
        }
        if errors.is_empty() {
            Ok(Self { resources: map })
        } else {
            Err(errors)
        }
    }

    /// Looks up a resource.
    pub fn get(&self, uid: &str) -> Option<&Resource> {
        self.resources.get(uid)
    }

    /// All resources of a kind, in board order (display order, name, uid).
    pub fn of_kind(&self, kind: ResourceKind) -> Vec<&Resource> {
        let mut rows: Vec<&Resource> = self
            .resources
            .values()
            .filter(|r| r.kind == kind)
            .collect();
        rows.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.uid.cmp(&b.uid))
        });
        rows
    }

    /// Resources of a kind carrying at least one of the tags.
    ///
    /// An empty tag list means no tag constraint.
    pub fn with_any_tag<S: AsRef<str>>(&self, kind: ResourceKind, tags: &[S]) -> Vec<&Resource> {
        self.of_kind(kind)
            .into_iter()
            .filter(|r| tags.is_empty() || r.has_any_tag(tags))
            .collect()
    }

    /// Resources owned by a company.
    pub fn owned_by(&self, company_id: CompanyId) -> Vec<&Resource> {
        self.resources
            .values()
            .filter(|r| r.owner_company_id == company_id)
            .collect()
    }

    /// Iterates all resources by uid.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
