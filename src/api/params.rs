//! Flat query parameters.
//!
//! The trips API takes filters as repeated key/value pairs: list values
//! repeat the key, boolean flags are sent only when set.

use serde::{Deserialize, Serialize};

use crate::models::{DateRange, ResourceAssignment, ResourceKind};
use crate::pool::{PageRequest, PoolFilterQuery, PoolQuery};

/// Ordered list of query pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Adds one pair.
    pub fn push(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.pairs.push((key.to_owned(), value.to_string()));
        self
    }

    /// Adds one pair per value.
    pub fn push_list<T: ToString>(&mut self, key: &str, values: &[T]) -> &mut Self {
        for value in values {
            self.push(key, value.to_string());
        }
        self
    }

    /// Adds `key=true` only when `flag` is set.
    pub fn push_flag(&mut self, key: &str, flag: bool) -> &mut Self {
        if flag {
            self.push(key, "true");
        }
        self
    }

    /// First value of a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a key, in order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

/// Query of the scheduled-trips endpoint.
///
/// The endpoint returns trips touching `dates`. Planned trips are limited
/// to those bound to one of `resource_uids`; `filter` narrows the unplanned
/// trips returned alongside them. Planned trips on the requested rows are
/// never filtered out, so overlaps on those rows stay visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripListQuery {
    /// Calendar days shown on the grid.
    pub dates: DateRange,
    /// Same keys as the unplanned pool filter.
    #[serde(default)]
    pub filter: PoolFilterQuery,
    /// Grid rows; `None` requests every resource, an empty list none.
    #[serde(default)]
    pub resource_uids: Option<Vec<String>>,
    /// Restrict to one resource row kind.
    #[serde(default)]
    pub resource_kind: Option<ResourceKind>,
    #[serde(default)]
    pub extended_view: bool,
    #[serde(default)]
    pub page: PageRequest,
}

impl TripListQuery {
    pub fn new(dates: DateRange) -> Self {
        Self {
            dates,
            filter: PoolFilterQuery::default(),
            resource_uids: None,
            resource_kind: None,
            extended_view: false,
            page: PageRequest::default(),
        }
    }

    pub fn with_filter(mut self, filter: PoolFilterQuery) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_resources<S: Into<String>>(mut self, uids: impl IntoIterator<Item = S>) -> Self {
        self.resource_uids = Some(uids.into_iter().map(Into::into).collect());
        self
    }

    /// Whether any binding falls on a requested row.
    pub fn covers(&self, assignment: &ResourceAssignment) -> bool {
        match &self.resource_uids {
            None => true,
            Some(uids) => uids.iter().any(|u| assignment.contains(u)),
        }
    }

    pub fn with_kind(mut self, kind: ResourceKind) -> Self {
        self.resource_kind = Some(kind);
        self
    }

    pub fn with_extended_view(mut self, active: bool) -> Self {
        self.extended_view = active;
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::from_pairs(self.filter.to_pairs());
        params
            .push("date__gte", self.dates.from().format("%Y-%m-%d"))
            .push("date__lte", self.dates.to().format("%Y-%m-%d"));
        match self.resource_uids.as_deref() {
            None => {}
            Some([]) => {
                params.push("resource__in", "");
            }
            Some(uids) => {
                params.push_list("resource__in", uids);
            }
        }
        if let Some(kind) = self.resource_kind {
            params.push("resource_kind", kind);
        }
        params
            .push_flag("extended_view", self.extended_view)
            .push("page", self.page.page)
            .push("page_size", self.page.page_size);
        params
    }
}

/// Parameters of the unplanned-trips endpoint.
pub fn unplanned_params(query: &PoolQuery, extended_view: bool) -> QueryParams {
    let mut params = QueryParams::from_pairs(query.to_query_pairs());
    params.push_flag("extended_view", extended_view);
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolFilterQuery;
    use chrono::NaiveDate;

    fn week() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_lists_repeat_and_flags_only_when_set() {
        let params = TripListQuery::new(week())
            .with_resources(["X", "Y"])
            .to_params();
        assert_eq!(params.get_all("resource__in"), vec!["X", "Y"]);
        assert_eq!(params.get("date__gte"), Some("2024-03-04"));
        assert!(!params.contains_key("extended_view"));
        assert!(!params.contains_key("resource_kind"));
        assert!(!TripListQuery::new(week()).to_params().contains_key("resource__in"));
        let none = TripListQuery::new(week()).with_resources(Vec::<String>::new()).to_params();
        assert_eq!(none.get_all("resource__in"), vec![""]);

        let params = TripListQuery::new(week())
            .with_kind(ResourceKind::Trailer)
            .with_extended_view(true)
            .to_params();
        assert_eq!(params.get("extended_view"), Some("true"));
        assert_eq!(params.get("resource_kind"), Some("trailer"));
    }

    #[test]
    fn test_trip_filter_is_encoded() {
        let params = TripListQuery::new(week())
            .with_filter(PoolFilterQuery::new().with_shippers([10, 11]).with_search("rivoli"))
            .to_params();
        assert_eq!(params.get_all("shipper__in"), vec!["10", "11"]);
        assert_eq!(params.get("search"), Some("rivoli"));
    }

    #[test]
    fn test_covers_requested_rows() {
        let bound = ResourceAssignment::new()
            .with(ResourceKind::Trucker, "Y")
            .with(ResourceKind::Vehicle, "V1");
        assert!(TripListQuery::new(week()).covers(&bound));
        assert!(TripListQuery::new(week()).with_resources(["X", "Y"]).covers(&bound));
        assert!(!TripListQuery::new(week()).with_resources(["Z"]).covers(&bound));
    }

    #[test]
    fn test_unplanned_params() {
        let query = PoolQuery::new(PoolFilterQuery::new().with_tags(["frozen", "urgent"]));
        let params = unplanned_params(&query, false);
        assert_eq!(params.get_all("tags__in"), vec!["frozen", "urgent"]);
        assert!(!params.contains_key("extended_view"));
        assert_eq!(params.get("page"), Some("1"));
        assert!(unplanned_params(&query, true).contains_key("extended_view"));
    }
}
