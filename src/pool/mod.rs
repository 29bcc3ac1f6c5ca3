//! Unplanned pool.
//!
//! The pool lists trips the caller can see that have no resource bound on
//! any kind. A trip with only some kinds bound is partially planned and
//! lives on the grid, not here.
//!
//! # Query pipeline
//! 1. Keep visible trips with an empty assignment
//! 2. Apply [`PoolFilterQuery`] (AND across keys, OR within list keys)
//! 3. Sort by the [`PoolOrdering`] chain, ties by uid
//! 4. Cut the requested [`Page`]

mod filter;
mod ordering;
mod page;

pub use filter::{DateBounds, PoolFilterQuery, FILTER_KEYS};
pub use ordering::{sort_trips, OrderingKey, PoolOrdering};
pub use page::{Page, PageRequest, DEFAULT_PAGE_SIZE};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BoardConfig;
use crate::engine::{BoardState, EditScope};
use crate::error::Result;
use crate::models::Trip;
use crate::validation::{ValidationError, ValidationErrorKind};

/// Filter, ordering and page of one pool query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolQuery {
    #[serde(default)]
    pub filter: PoolFilterQuery,
    #[serde(default)]
    pub ordering: Vec<PoolOrdering>,
    #[serde(default)]
    pub page: PageRequest,
}

impl PoolQuery {
    pub fn new(filter: PoolFilterQuery) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn with_ordering(mut self, ordering: PoolOrdering) -> Self {
        self.ordering.push(ordering);
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Parses flat query pairs.
    ///
    /// Besides the filter keys, accepts `ordering` (comma-separated or
    /// repeated), `page` and `page_size`. Any other key is rejected.
    pub fn from_query_pairs<K, V>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> std::result::Result<Self, ValidationError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::from_query_pairs_sized(pairs, DEFAULT_PAGE_SIZE)
    }

    /// Like [`from_query_pairs`](Self::from_query_pairs), with the page size
    /// used when `page_size` is absent.
    pub fn from_query_pairs_sized<K, V>(
        pairs: impl IntoIterator<Item = (K, V)>,
        default_page_size: u32,
    ) -> std::result::Result<Self, ValidationError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        let mut page = None;
        let mut page_size = None;
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "ordering" => query.ordering.extend(PoolOrdering::parse_list(value)?),
                "page" => page = Some(parse_page_number(key, value)?),
                "page_size" => page_size = Some(parse_page_number(key, value)?),
                _ => query.filter.apply_pair(key, value)?,
            }
        }
        query.page = PageRequest::new(page.unwrap_or(1), page_size.unwrap_or(default_page_size))?;
        Ok(query)
    }

    /// Flat pairs for the trips API.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filter.to_pairs();
        if !self.ordering.is_empty() {
            let joined: Vec<String> = self.ordering.iter().map(ToString::to_string).collect();
            pairs.push(("ordering".into(), joined.join(",")));
        }
        pairs.push(("page".into(), self.page.page.to_string()));
        pairs.push(("page_size".into(), self.page.page_size.to_string()));
        pairs
    }
}

fn parse_page_number(key: &str, value: &str) -> std::result::Result<u32, ValidationError> {
    value.trim().parse().map_err(|_| {
        ValidationError::new(
            ValidationErrorKind::InvalidPage,
            format!("'{key}' expects a positive integer, got '{value}'"),
        )
    })
}

/// Query engine over the unplanned part of a board.
///
/// # Example
/// ```
/// use chrono::FixedOffset;
/// use trip_board::engine::{BoardState, EditScope};
/// use trip_board::pool::{PoolQuery, UnplannedPool};
///
/// let pool = UnplannedPool::new(FixedOffset::east_opt(3600).unwrap());
/// let query = PoolQuery::from_query_pairs([("tags__in", "frozen,urgent"), ("ordering", "-pickup")]).unwrap();
/// let page = pool.query(&BoardState::default(), &EditScope::new([1]), &query).unwrap();
/// assert_eq!(page.count, 0);
/// ```
#[derive(Debug, Clone)]
pub struct UnplannedPool {
    timezone: FixedOffset,
    default_page_size: u32,
    max_page_size: u32,
}

impl UnplannedPool {
    /// Creates a pool evaluating dates in `timezone`.
    pub fn new(timezone: FixedOffset) -> Self {
        let defaults = BoardConfig::default();
        Self {
            timezone,
            default_page_size: defaults.pool_page_size,
            max_page_size: defaults.max_page_size,
        }
    }

    /// Creates a pool from board configuration.
    pub fn from_config(config: &BoardConfig) -> Result<Self> {
        Ok(Self {
            timezone: config.timezone()?,
            default_page_size: config.pool_page_size,
            max_page_size: config.max_page_size,
        })
    }

    /// Page size used when a query names none.
    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// Parses flat query pairs with this pool's default page size.
    pub fn parse_query<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<PoolQuery>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(PoolQuery::from_query_pairs_sized(pairs, self.default_page_size)?)
    }

    /// Timezone used for date filters.
    pub fn timezone(&self) -> FixedOffset {
        self.timezone
    }

    /// Whether a trip belongs in the pool for this caller.
    pub fn admits(&self, trip: &Trip, scope: &EditScope) -> bool {
        trip.is_unplanned() && scope.can_edit_company(trip.carrier_company_id)
    }

    /// Runs a query.
    pub fn query(
        &self,
        state: &BoardState,
        scope: &EditScope,
        query: &PoolQuery,
    ) -> Result<Page<Trip>> {
        let page =
            PageRequest::new(query.page.page, query.page.page_size)?.capped(self.max_page_size);
        let mut trips: Vec<&Trip> = state
            .trips()
            .filter(|t| self.admits(t, scope))
            .filter(|t| query.filter.matches(t, self.timezone))
            .collect();
        sort_trips(&mut trips, &query.ordering);
        debug!(
            matched = trips.len(),
            page = page.page,
            page_size = page.page_size,
            "unplanned pool query"
        );
        Ok(page.slice(trips).map(Trip::clone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GroupView;
    use crate::models::test_support::trip_between;
    use crate::models::{Resource, ResourceKind, ResourceRegistry, Transport};
    use crate::BoardError;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn tagged(uid: &str, from: u32, tags: &[&str], shipper: i64) -> Trip {
        let mut trip = trip_between(uid, from, from + 1);
        let mut transport = Transport::new(format!("TR-{uid}"), 1).with_shipper(shipper);
        for tag in tags {
            transport = transport.with_tag(*tag);
        }
        trip.transports = vec![transport];
        trip
    }

    fn state() -> BoardState {
        let registry = ResourceRegistry::from_resources(vec![
            Resource::trucker("X", 1),
            Resource::vehicle("V1", 1),
        ])
        .unwrap();
        let mut foreign = tagged("F", 6, &["frozen"], 10);
        foreign.carrier_company_id = 2;
        BoardState::new(
            vec![
                tagged("A", 9, &["frozen"], 10),
                tagged("B", 8, &["urgent", "adr"], 10),
                tagged("C", 7, &["adr"], 10),
                tagged("D", 10, &["frozen"], 11),
                tagged("P", 11, &["frozen"], 10).with_resource(ResourceKind::Vehicle, "V1"),
                foreign,
            ],
            registry,
        )
        .unwrap()
    }

    fn uids(page: &Page<Trip>) -> Vec<&str> {
        page.items.iter().map(|t| t.uid.as_str()).collect()
    }

    #[test]
    fn test_tags_and_shipper_scenario() {
        let query = PoolQuery::from_query_pairs([
            ("tags__in", "frozen"),
            ("tags__in", "urgent"),
            ("shipper__in", "10"),
        ])
        .unwrap();
        let page = UnplannedPool::new(utc())
            .query(&state(), &EditScope::new([1]), &query)
            .unwrap();
        // C lacks the tags, D has another shipper, P is partially planned,
        // F belongs to another company
        assert_eq!(uids(&page), vec!["A", "B"]);
    }

    #[test]
    fn test_only_fully_unassigned_trips() {
        let pool = UnplannedPool::new(utc());
        let page = pool
            .query(&state(), &EditScope::new([1]), &PoolQuery::default())
            .unwrap();
        assert_eq!(page.count, 4);
        assert!(page.items.iter().all(|t| t.assignment.is_empty()));
    }

    #[test]
    fn test_extended_view_widens_pool() {
        let scope = EditScope::new([1])
            .with_group_view(GroupView::new().with_group([1, 2]))
            .with_extended_view(true);
        let query = PoolQuery::default().with_ordering(PoolOrdering::asc(OrderingKey::Pickup));
        let page = UnplannedPool::new(utc())
            .query(&state(), &scope, &query)
            .unwrap();
        assert_eq!(page.items.first().map(|t| t.uid.as_str()), Some("F"));
        assert_eq!(page.count, 5);
    }

    #[test]
    fn test_ordering_and_paging() {
        let query = PoolQuery::from_query_pairs([("ordering", "-pickup"), ("page_size", "2"), ("page", "2")])
            .unwrap();
        let page = UnplannedPool::new(utc())
            .query(&state(), &EditScope::new([1]), &query)
            .unwrap();
        // D(10) A(9) | B(8) C(7)
        assert_eq!(uids(&page), vec!["B", "C"]);
        assert!(!page.has_next());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = PoolQuery::from_query_pairs([("ordering", "weight")]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::UnknownOrdering);
        let err = PoolQuery::from_query_pairs([("colour", "red")]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::UnknownFilterKey);
        let err = PoolQuery::from_query_pairs([("page", "0")]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidPage);
    }

    #[test]
    fn test_invalid_page_in_struct() {
        let mut query = PoolQuery::default();
        query.page.page = 0;
        let err = UnplannedPool::new(utc())
            .query(&state(), &EditScope::new([1]), &query)
            .unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn test_configured_default_page_size() {
        let config = BoardConfig::from_toml_str("pool_page_size = 3").unwrap();
        let pool = UnplannedPool::from_config(&config).unwrap();
        let query = pool.parse_query([("ordering", "pickup")]).unwrap();
        assert_eq!(query.page, PageRequest::first(3));
        let page = pool.query(&state(), &EditScope::new([1]), &query).unwrap();
        assert_eq!(uids(&page), vec!["C", "B", "A"]);
        assert!(page.has_next());

        let explicit = pool.parse_query([("page_size", "10")]).unwrap();
        assert_eq!(explicit.page.page_size, 10);
        let unsized_query = PoolQuery::from_query_pairs(Vec::<(&str, &str)>::new()).unwrap();
        assert_eq!(unsized_query.page, PageRequest::default());
    }

    #[test]
    fn test_query_pairs_round_trip() {
        let filter = PoolFilterQuery::new()
            .with_tags(["frozen"])
            .with_companies(Vec::new())
            .with_addresses(["12 Rue de Rivoli, Paris"])
            .with_prepared(true);
        let query = PoolQuery::new(filter)
            .with_ordering(PoolOrdering::desc(OrderingKey::Pickup))
            .with_page(PageRequest::new(3, 10).unwrap());
        let pairs = query.to_query_pairs();
        assert_eq!(PoolQuery::from_query_pairs(pairs).unwrap(), query);
    }
}
