//! Unplanned pool ordering.
//!
//! Orderings are evaluated in sequence: the next key is consulted only when
//! the previous ones tie. Trips still tied after every key are ordered by
//! uid, so a query always yields a deterministic order.
//!
//! Keys: `pickup` (earliest pickup), `delivery` (latest delivery end),
//! `sequential_id` (smallest transport number), `name` (display name).
//! A leading `-` reverses a key. Trips lacking the value sort last in
//! either direction.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::Trip;
use crate::validation::{ValidationError, ValidationErrorKind};

/// Sortable attribute of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderingKey {
    Pickup,
    Delivery,
    SequentialId,
    Name,
}

impl OrderingKey {
    /// Every supported key.
    pub const ALL: [OrderingKey; 4] = [
        Self::Pickup,
        Self::Delivery,
        Self::SequentialId,
        Self::Name,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
            Self::SequentialId => "sequential_id",
            Self::Name => "name",
        }
    }

    fn compare(&self, a: &Trip, b: &Trip) -> Option<Ordering> {
        match self {
            Self::Pickup => cmp_present(a.first_pickup(), b.first_pickup()),
            Self::Delivery => cmp_present(a.last_delivery(), b.last_delivery()),
            Self::SequentialId => cmp_present(a.min_sequential_id(), b.min_sequential_id()),
            Self::Name => Some(
                a.display_name()
                    .to_lowercase()
                    .cmp(&b.display_name().to_lowercase()),
            ),
        }
    }
}

/// `None` when exactly one side lacks the value; missing values go last.
fn cmp_present<T: Ord>(a: Option<T>, b: Option<T>) -> Option<Ordering> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        (None, None) => Some(Ordering::Equal),
        _ => None,
    }
}

/// One ordering key with direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolOrdering {
    pub key: OrderingKey,
    pub descending: bool,
}

impl PoolOrdering {
    pub fn asc(key: OrderingKey) -> Self {
        Self {
            key,
            descending: false,
        }
    }

    pub fn desc(key: OrderingKey) -> Self {
        Self {
            key,
            descending: true,
        }
    }

    /// Parses a comma-separated ordering list such as `-pickup,name`.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, ValidationError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }

    /// Compares two trips under this key.
    pub fn compare(&self, a: &Trip, b: &Trip) -> Ordering {
        match self.key.compare(a, b) {
            Some(ord) if self.descending => ord.reverse(),
            Some(ord) => ord,
            None if a_is_missing(self.key, a) => Ordering::Greater,
            None => Ordering::Less,
        }
    }
}

fn a_is_missing(key: OrderingKey, trip: &Trip) -> bool {
    match key {
        OrderingKey::Pickup => trip.first_pickup().is_none(),
        OrderingKey::Delivery => trip.last_delivery().is_none(),
        OrderingKey::SequentialId => trip.min_sequential_id().is_none(),
        OrderingKey::Name => false,
    }
}

impl Default for PoolOrdering {
    fn default() -> Self {
        Self::asc(OrderingKey::Pickup)
    }
}

impl fmt::Display for PoolOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(self.key.as_str())
    }
}

impl FromStr for PoolOrdering {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let key = OrderingKey::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .ok_or_else(|| {
                ValidationError::new(
                    ValidationErrorKind::UnknownOrdering,
                    format!("Unknown ordering '{s}'"),
                )
            })?;
        Ok(Self { key, descending })
    }
}

impl Serialize for PoolOrdering {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PoolOrdering {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Sorts trips by the orderings, then by uid.
pub fn sort_trips(trips: &mut [&Trip], orderings: &[PoolOrdering]) {
    trips.sort_by(|a, b| {
        orderings
            .iter()
            .map(|o| o.compare(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.uid.cmp(&b.uid))
    });
}
