//! Unplanned pool filter.
//!
//! A filter is a set of named keys. An absent key places no constraint; a
//! list key that is present but empty matches nothing. Keys combine with
//! AND, values inside a list key with OR.
//!
//! # Query pairs
//! List values repeat their key. Ids and tags may also arrive comma-joined;
//! addresses are free text and are never split. A list key with an empty
//! value is an explicitly empty list.
//!
//! | Key | Matches when |
//! |-----|--------------|
//! | `shipper__in` | any transport's shipper is listed |
//! | `address__in` | any stop's site name or street address is listed (case-insensitive) |
//! | `tags__in` | any transport carries a listed tag |
//! | `company__in` | the carrier company is listed |
//! | `search` | the text occurs in the trip name, transport references or any site |
//! | `pickup_date__gte` / `__lte` | local date of the first pickup is within bounds |
//! | `delivery_date__gte` / `__lte` | local date of the last delivery is within bounds |
//! | `is_prepared` | prepared flag equals the value |

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CompanyId, TagId, Trip};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Every key the filter understands.
pub const FILTER_KEYS: [&str; 10] = [
    "shipper__in",
    "address__in",
    "tags__in",
    "company__in",
    "search",
    "pickup_date__gte",
    "pickup_date__lte",
    "delivery_date__gte",
    "delivery_date__lte",
    "is_prepared",
];

/// Inclusive calendar-date bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    #[serde(default)]
    pub gte: Option<NaiveDate>,
    #[serde(default)]
    pub lte: Option<NaiveDate>,
}

impl DateBounds {
    /// Whether no bound is set.
    pub fn is_open(&self) -> bool {
        self.gte.is_none() && self.lte.is_none()
    }

    /// Whether the local date of `instant` lies within the bounds.
    ///
    /// A missing instant only passes open bounds.
    pub fn admits(&self, instant: Option<DateTime<Utc>>, tz: FixedOffset) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(instant) = instant else {
            return false;
        };
        let date = instant.with_timezone(&tz).date_naive();
        self.gte.map_or(true, |from| date >= from) && self.lte.map_or(true, |to| date <= to)
    }
}

/// Filter over unplanned trips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolFilterQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipper_in: Option<Vec<CompanyId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_in: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_in: Option<Vec<TagId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_in: Option<Vec<CompanyId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub pickup_date: DateBounds,
    #[serde(default)]
    pub delivery_date: DateBounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_prepared: Option<bool>,
}

impl PoolFilterQuery {
    /// Creates a filter without constraints.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shippers(mut self, shippers: impl IntoIterator<Item = CompanyId>) -> Self {
        self.shipper_in = Some(shippers.into_iter().collect());
        self
    }

    pub fn with_addresses<S: Into<String>>(mut self, addresses: impl IntoIterator<Item = S>) -> Self {
        self.address_in = Some(addresses.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_tags<S: Into<TagId>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags_in = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_companies(mut self, companies: impl IntoIterator<Item = CompanyId>) -> Self {
        self.company_in = Some(companies.into_iter().collect());
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn with_pickup_dates(mut self, gte: Option<NaiveDate>, lte: Option<NaiveDate>) -> Self {
        self.pickup_date = DateBounds { gte, lte };
        self
    }

    pub fn with_delivery_dates(mut self, gte: Option<NaiveDate>, lte: Option<NaiveDate>) -> Self {
        self.delivery_date = DateBounds { gte, lte };
        self
    }

    pub fn with_prepared(mut self, prepared: bool) -> Self {
        self.is_prepared = Some(prepared);
        self
    }

    /// Whether no key is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether a trip satisfies every key.
    pub fn matches(&self, trip: &Trip, tz: FixedOffset) -> bool {
        if let Some(shippers) = &self.shipper_in {
            if !trip.shipper_ids().any(|s| shippers.contains(&s)) {
                return false;
            }
        }
        if let Some(addresses) = &self.address_in {
            let wanted: Vec<String> = addresses.iter().map(|a| fold(a)).collect();
            let hit = trip.activities.iter().any(|a| {
                let (name, address) = (fold(&a.site.name), fold(&a.site.address));
                wanted.iter().any(|w| *w == name || *w == address)
            });
            if !hit {
                return false;
            }
        }
        if let Some(tags) = &self.tags_in {
            let trip_tags = trip.tags();
            if !tags.iter().any(|t| trip_tags.contains(t.as_str())) {
                return false;
            }
        }
        if let Some(companies) = &self.company_in {
            if !companies.contains(&trip.carrier_company_id) {
                return false;
            }
        }
        if let Some(text) = &self.search {
            if !matches_search(trip, &fold(text)) {
                return false;
            }
        }
        if let Some(prepared) = self.is_prepared {
            if trip.is_prepared != prepared {
                return false;
            }
        }
        self.pickup_date.admits(trip.first_pickup(), tz)
            && self.delivery_date.admits(trip.last_delivery(), tz)
    }

    /// Applies one flat query pair.
    ///
    /// List keys accumulate when repeated; an empty value leaves the list
    /// present but empty.
    pub fn apply_pair(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        match key {
            "shipper__in" => extend(&mut self.shipper_in, parse_ids(key, value)?),
            "address__in" => extend(&mut self.address_in, single_value(value)),
            "tags__in" => extend(&mut self.tags_in, split_list(value)),
            "company__in" => extend(&mut self.company_in, parse_ids(key, value)?),
            "search" => self.search = Some(value.to_owned()),
            "pickup_date__gte" => self.pickup_date.gte = Some(parse_date(key, value)?),
            "pickup_date__lte" => self.pickup_date.lte = Some(parse_date(key, value)?),
            "delivery_date__gte" => self.delivery_date.gte = Some(parse_date(key, value)?),
            "delivery_date__lte" => self.delivery_date.lte = Some(parse_date(key, value)?),
            "is_prepared" => self.is_prepared = Some(parse_bool(key, value)?),
            other => {
                return Err(ValidationError::new(
                    ValidationErrorKind::UnknownFilterKey,
                    format!("Unknown filter key '{other}'"),
                ))
            }
        }
        Ok(())
    }

    /// Flat pairs; list values repeat their key.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push_list(&mut pairs, "shipper__in", self.shipper_in.as_deref());
        push_list(&mut pairs, "address__in", self.address_in.as_deref());
        push_list(&mut pairs, "tags__in", self.tags_in.as_deref());
        push_list(&mut pairs, "company__in", self.company_in.as_deref());

        let mut push = |key: &str, value: String| pairs.push((key.to_owned(), value));
        if let Some(text) = &self.search {
            push("search", text.clone());
        }
        let dates = [
            ("pickup_date__gte", self.pickup_date.gte),
            ("pickup_date__lte", self.pickup_date.lte),
            ("delivery_date__gte", self.delivery_date.gte),
            ("delivery_date__lte", self.delivery_date.lte),
        ];
        for (key, date) in dates {
            if let Some(date) = date {
                push(key, date.format("%Y-%m-%d").to_string());
            }
        }
        if let Some(prepared) = self.is_prepared {
            push("is_prepared", prepared.to_string());
        }
        pairs
    }
}

fn matches_search(trip: &Trip, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let in_name = trip
        .name
        .as_deref()
        .is_some_and(|n| n.to_lowercase().contains(needle));
    in_name
        || trip.uid.to_lowercase().contains(needle)
        || trip.transports.iter().any(|t| {
            t.sequential_id.to_string().contains(needle)
                || t
                    .reference
                    .as_deref()
                    .is_some_and(|r| r.to_lowercase().contains(needle))
        })
        || trip.activities.iter().any(|a| a.site.matches_text(needle))
}

/// Case folding shared by every text comparison.
fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

fn push_list<T: ToString>(pairs: &mut Vec<(String, String)>, key: &str, values: Option<&[T]>) {
    match values {
        None => {}
        Some([]) => pairs.push((key.to_owned(), String::new())),
        Some(values) => {
            pairs.extend(values.iter().map(|v| (key.to_owned(), v.to_string())));
        }
    }
}

fn extend<T>(slot: &mut Option<Vec<T>>, values: Vec<T>) {
    slot.get_or_insert_with(Vec::new).extend(values);
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

fn single_value(value: &str) -> Vec<String> {
    let value = value.trim();
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_owned()]
    }
}

fn parse_ids(key: &str, value: &str) -> Result<Vec<CompanyId>, ValidationError> {
    split_list(value)
        .iter()
        .map(|v| {
            v.parse().map_err(|_| {
                ValidationError::new(
                    ValidationErrorKind::InvalidFilterValue,
                    format!("'{key}' expects numeric ids, got '{v}'"),
                )
            })
        })
        .collect()
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::new(
            ValidationErrorKind::InvalidFilterValue,
            format!("'{key}' expects a YYYY-MM-DD date, got '{value}'"),
        )
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ValidationError::new(
            ValidationErrorKind::InvalidFilterValue,
            format!("'{key}' expects true or false, got '{value}'"),
        )),
    }
}
