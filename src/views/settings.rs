//! Board settings and their resolution.
//!
//! Settings are stored sparsely: a settings map holds only the keys a user
//! or view set explicitly. Defaults are applied when settings are read, so
//! a change of defaults reaches every stored view without rewriting it.
//!
//! # Resolution
//! `defaults <- user settings <- view overrides`, merged with
//! [`deep_merge`]. Each key is then decoded on its own; a malformed value
//! falls back to the default for that key and is logged, never returned as
//! an error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::api::TripListQuery;
use crate::models::{CompanyId, DateRange, Resource, ResourceKind, ResourceRegistry, TagId};
use crate::pool::{OrderingKey, PageRequest, PoolFilterQuery, PoolOrdering, PoolQuery};

/// Sparse settings map keyed by [`SettingKey`] names.
pub type Settings = Map<String, Value>;

/// Namespaced setting keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ZoomLevel,
    SelectedDates,
    ResourceFilters,
    ResourceOrdering,
    CardDisplay,
    TransportSort,
    UnplannedFilters,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        Self::ZoomLevel,
        Self::SelectedDates,
        Self::ResourceFilters,
        Self::ResourceOrdering,
        Self::CardDisplay,
        Self::TransportSort,
        Self::UnplannedFilters,
    ];

    /// Storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZoomLevel => "scheduler.predefinedZoomLevel",
            Self::SelectedDates => "scheduler.selectedDates",
            Self::ResourceFilters => "scheduler.resourceFilters",
            Self::ResourceOrdering => "scheduler.resourceOrdering",
            Self::CardDisplay => "scheduler.cardDisplay",
            Self::TransportSort => "transport.sort",
            Self::UnplannedFilters => "unplanned.filters",
        }
    }
}

/// Predefined grid zoom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomLevel {
    Day,
    ThreeDays,
    #[default]
    Week,
    TwoWeeks,
    Month,
}

/// Which resources the grid shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFilters {
    /// Row kinds shown; empty means all.
    #[serde(default)]
    pub kinds: Vec<ResourceKind>,
    /// Only resources with one of these tags; empty means all.
    #[serde(default)]
    pub tags: Vec<TagId>,
    /// Only resources of these companies; empty means all visible.
    #[serde(default)]
    pub company_ids: Vec<CompanyId>,
}

impl ResourceFilters {
    /// Whether every resource is shown.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty() && self.tags.is_empty() && self.company_ids.is_empty()
    }

    /// Whether a resource gets a row on the grid.
    pub fn matches(&self, resource: &Resource) -> bool {
        (self.kinds.is_empty() || self.kinds.contains(&resource.kind))
            && (self.tags.is_empty() || resource.has_any_tag(&self.tags))
            && (self.company_ids.is_empty() || self.company_ids.contains(&resource.owner_company_id))
    }

    /// Grid rows, grouped by kind and sorted within each kind.
    pub fn select<'a>(
        &self,
        registry: &'a ResourceRegistry,
        ordering: ResourceOrdering,
    ) -> Vec<&'a Resource> {
        let mut rows = Vec::new();
        for kind in ResourceKind::ALL {
            let mut of_kind: Vec<&Resource> = registry
                .of_kind(kind)
                .into_iter()
                .filter(|r| self.matches(r))
                .collect();
            if ordering == ResourceOrdering::Name {
                of_kind.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.uid.cmp(&b.uid)));
            }
            rows.extend(of_kind);
        }
        rows
    }
}

/// Row order of the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceOrdering {
    #[default]
    DisplayOrder,
    Name,
}

/// Fields shown on a trip card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardDisplay {
    pub show_name: bool,
    pub show_sites: bool,
    pub show_times: bool,
    pub show_tags: bool,
    pub show_shipper: bool,
}

impl Default for CardDisplay {
    fn default() -> Self {
        Self {
            show_name: true,
            show_sites: true,
            show_times: true,
            show_tags: false,
            show_shipper: false,
        }
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub zoom_level: ZoomLevel,
    /// `None` means "around today".
    pub selected_dates: Option<DateRange>,
    pub resource_filters: ResourceFilters,
    pub resource_ordering: ResourceOrdering,
    pub card_display: CardDisplay,
    pub transport_sort: Vec<PoolOrdering>,
    pub unplanned_filters: PoolFilterQuery,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self {
            zoom_level: ZoomLevel::default(),
            selected_dates: None,
            resource_filters: ResourceFilters::default(),
            resource_ordering: ResourceOrdering::default(),
            card_display: CardDisplay::default(),
            transport_sort: vec![PoolOrdering::asc(OrderingKey::Pickup)],
            unplanned_filters: PoolFilterQuery::default(),
        }
    }
}

impl ResolvedSettings {
    /// Selected dates, or `fallback` when none are stored.
    pub fn dates_or(&self, fallback: DateRange) -> DateRange {
        self.selected_dates.unwrap_or(fallback)
    }

    /// Unplanned pool query with the stored filters and sort.
    pub fn pool_query(&self, page_size: u32) -> PoolQuery {
        PoolQuery {
            filter: self.unplanned_filters.clone(),
            ordering: self.transport_sort.clone(),
            page: PageRequest::first(page_size),
        }
    }

    /// Scheduled-trips query for `dates` over the grid rows of `registry`.
    ///
    /// Without resource filters every resource is requested. A single
    /// filtered kind is also sent as the row kind.
    pub fn trip_list_query(&self, registry: &ResourceRegistry, dates: DateRange) -> TripListQuery {
        let mut query = TripListQuery::new(dates);
        let filters = &self.resource_filters;
        if !filters.is_empty() {
            let rows = filters.select(registry, self.resource_ordering);
            query = query.with_resources(rows.into_iter().map(|r| r.uid.clone()));
        }
        if let [kind] = filters.kinds.as_slice() {
            query = query.with_kind(*kind);
        }
        query
    }

    /// Dense settings map with every key.
    pub fn to_settings(&self) -> Settings {
        let mut map = Settings::new();
        let mut put = |key: SettingKey, value: Value| {
            map.insert(key.as_str().to_owned(), value);
        };
        put(SettingKey::ZoomLevel, to_value(&self.zoom_level));
        put(SettingKey::SelectedDates, to_value(&self.selected_dates));
        put(SettingKey::ResourceFilters, to_value(&self.resource_filters));
        put(SettingKey::ResourceOrdering, to_value(&self.resource_ordering));
        put(SettingKey::CardDisplay, to_value(&self.card_display));
        put(SettingKey::TransportSort, to_value(&self.transport_sort));
        put(SettingKey::UnplannedFilters, to_value(&self.unplanned_filters));
        map
    }

    /// Resolves sparse layers on top of `self` as defaults.
    ///
    /// Later layers win.
    pub fn resolve(&self, layers: &[&Settings]) -> Self {
        let mut merged = Value::Object(self.to_settings());
        for layer in layers {
            deep_merge(&mut merged, &Value::Object((*layer).clone()));
        }
        let Value::Object(merged) = merged else {
            return self.clone();
        };
        Self {
            zoom_level: decode(&merged, SettingKey::ZoomLevel, &self.zoom_level),
            selected_dates: decode(&merged, SettingKey::SelectedDates, &self.selected_dates),
            resource_filters: decode(&merged, SettingKey::ResourceFilters, &self.resource_filters),
            resource_ordering: decode(
                &merged,
                SettingKey::ResourceOrdering,
                &self.resource_ordering,
            ),
            card_display: decode(&merged, SettingKey::CardDisplay, &self.card_display),
            transport_sort: decode(&merged, SettingKey::TransportSort, &self.transport_sort),
            unplanned_filters: decode(
                &merged,
                SettingKey::UnplannedFilters,
                &self.unplanned_filters,
            ),
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    // Plain data types; serialization to Value cannot fail for them
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn decode<T: DeserializeOwned + Clone>(merged: &Settings, key: SettingKey, fallback: &T) -> T {
    let Some(value) = merged.get(key.as_str()) else {
        return fallback.clone();
    };
    match serde_json::from_value(value.clone()) {
        Ok(v) => v,
        Err(e) => {
            warn!(key = key.as_str(), error = %e, "malformed setting, using default");
            fallback.clone()
        }
    }
}

/// Merges `overlay` into `target`.
///
/// Objects merge key by key, recursively; any other value replaces.
pub fn deep_merge(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}

/// Merges the keys of `overlay` into a settings map.
pub fn merge_settings(target: &mut Settings, overlay: &Settings) {
    for (key, value) in overlay {
        match target.get_mut(key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> Settings {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_defaults_when_empty() {
        let resolved = ResolvedSettings::default().resolve(&[]);
        assert_eq!(resolved, ResolvedSettings::default());
    }

    #[test]
    fn test_layers_override_in_order() {
        let user = settings(json!({
            "scheduler.predefinedZoomLevel": "day",
            "scheduler.cardDisplay": {"showTags": true},
        }));
        let view = settings(json!({
            "scheduler.predefinedZoomLevel": "month",
            "transport.sort": ["-delivery"],
        }));
        let resolved = ResolvedSettings::default().resolve(&[&user, &view]);
        assert_eq!(resolved.zoom_level, ZoomLevel::Month);
        assert!(resolved.card_display.show_tags);
        // Untouched nested fields keep their defaults
        assert!(resolved.card_display.show_name);
        assert_eq!(
            resolved.transport_sort,
            vec![PoolOrdering::desc(OrderingKey::Delivery)]
        );
    }

    #[test]
    fn test_malformed_value_falls_back() {
        let view = settings(json!({
            "scheduler.predefinedZoomLevel": "fortnight",
            "unplanned.filters": {"tags_in": ["frozen"]},
            "transport.sort": ["weight"],
        }));
        let resolved = ResolvedSettings::default().resolve(&[&view]);
        assert_eq!(resolved.zoom_level, ZoomLevel::Week);
        assert_eq!(resolved.transport_sort, ResolvedSettings::default().transport_sort);
        assert_eq!(
            resolved.unplanned_filters.tags_in,
            Some(vec!["frozen".to_string()])
        );
    }

    #[test]
    fn test_deep_merge() {
        let mut target = json!({"a": {"x": 1, "y": 2}, "b": [1, 2], "c": 1});
        deep_merge(&mut target, &json!({"a": {"y": 3, "z": 4}, "b": [9], "d": null}));
        assert_eq!(
            target,
            json!({"a": {"x": 1, "y": 3, "z": 4}, "b": [9], "c": 1, "d": null})
        );
    }

    fn registry() -> ResourceRegistry {
        ResourceRegistry::from_resources(vec![
            Resource::trucker("X", 1).with_name("Zoe").with_tag("adr"),
            Resource::trucker("Y", 1).with_name("Adam"),
            Resource::trucker("Z", 2).with_name("Bea").with_tag("adr"),
            Resource::vehicle("V1", 1).with_tag("adr"),
        ])
        .unwrap()
    }

    #[test]
    fn test_resource_filters_select_rows() {
        let registry = registry();
        let all = ResourceFilters::default().select(&registry, ResourceOrdering::Name);
        let uids: Vec<&str> = all.iter().map(|r| r.uid.as_str()).collect();
        assert_eq!(uids, vec!["Y", "Z", "X", "V1"]);

        let filters = ResourceFilters {
            kinds: vec![ResourceKind::Trucker],
            tags: vec!["adr".into()],
            company_ids: vec![1],
        };
        let rows = filters.select(&registry, ResourceOrdering::DisplayOrder);
        assert_eq!(rows.iter().map(|r| r.uid.as_str()).collect::<Vec<_>>(), vec!["X"]);
    }

    #[test]
    fn test_settings_drive_queries() {
        let stored = settings(json!({
            "scheduler.selectedDates": {"from": "2024-03-04", "to": "2024-03-05"},
            "scheduler.resourceFilters": {"kinds": ["trucker"], "tags": ["adr"]},
            "unplanned.filters": {"tags_in": ["frozen"]},
            "transport.sort": ["-delivery"],
        }));
        let resolved = ResolvedSettings::default().resolve(&[&stored]);
        let today = DateRange::day(chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        let dates = resolved.dates_or(today);
        assert_eq!(dates.days(), 2);
        assert_eq!(ResolvedSettings::default().dates_or(today), today);

        let trips = resolved.trip_list_query(&registry(), dates);
        assert_eq!(trips.dates, dates);
        // Display order ties break by name: Bea before Zoe
        assert_eq!(trips.resource_uids, Some(vec!["Z".to_string(), "X".to_string()]));
        assert_eq!(trips.resource_kind, Some(ResourceKind::Trucker));
        let unfiltered = ResolvedSettings::default().trip_list_query(&registry(), dates);
        assert_eq!(unfiltered.resource_uids, None);

        let pool = resolved.pool_query(10);
        assert_eq!(pool.filter.tags_in, Some(vec!["frozen".to_string()]));
        assert_eq!(pool.ordering, vec![PoolOrdering::desc(OrderingKey::Delivery)]);
        assert_eq!(pool.page, PageRequest::first(10));
    }

    #[test]
    fn test_selected_dates_decode() {
        let view = settings(json!({
            "scheduler.selectedDates": {"from": "2024-03-04", "to": "2024-03-10"},
        }));
        let resolved = ResolvedSettings::default().resolve(&[&view]);
        assert_eq!(resolved.selected_dates.map(|d| d.days()), Some(7));

        let inverted = settings(json!({
            "scheduler.selectedDates": {"from": "2024-03-10", "to": "2024-03-04"},
        }));
        assert_eq!(ResolvedSettings::default().resolve(&[&inverted]).selected_dates, None);
    }
}
