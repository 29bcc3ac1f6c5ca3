//! Scheduler views and user settings.
//!
//! A view is a named set of setting overrides a user can save, reload and
//! share with companies. Only explicit keys are persisted; everything else
//! comes from the defaults at read time.
//!
//! # Storage layout
//! | Key | Value |
//! |-----|-------|
//! | `view/{pk}` | [`SchedulerView`] |
//! | `user/{user_id}/settings` | user base [`Settings`] |
//! | `meta/next_view_id` | next primary key |

mod settings;
mod store;
mod view;

pub use settings::{
    deep_merge, merge_settings, CardDisplay, ResolvedSettings, ResourceFilters, ResourceOrdering,
    SettingKey, Settings, ZoomLevel,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use view::{SchedulerView, UserId, ViewId};

use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::{BoardError, Result};
use crate::models::CompanyId;

const VIEW_PREFIX: &str = "view/";
const NEXT_ID_KEY: &str = "meta/next_view_id";

fn view_key(pk: ViewId) -> String {
    format!("{VIEW_PREFIX}{pk}")
}

fn user_settings_key(user: UserId) -> String {
    format!("user/{user}/settings")
}

/// Views and user settings on top of a [`KeyValueStore`].
///
/// # Example
/// ```
/// use serde_json::json;
/// use trip_board::views::{MemoryStore, SchedulerView, SettingKey, ViewStore, ZoomLevel};
///
/// let store = ViewStore::new(MemoryStore::new());
/// let view = SchedulerView::new("Night shift", 7)
///     .with_override(SettingKey::ZoomLevel, json!("day"));
/// let saved = store.save(view).unwrap();
///
/// let loaded = store.load(saved.pk.unwrap()).unwrap();
/// let settings = store.effective_settings(7, Some(&loaded)).unwrap();
/// assert_eq!(settings.zoom_level, ZoomLevel::Day);
/// ```
#[derive(Debug)]
pub struct ViewStore<S> {
    store: S,
    defaults: ResolvedSettings,
}

impl<S: KeyValueStore> ViewStore<S> {
    /// Creates a view store with built-in defaults.
    pub fn new(store: S) -> Self {
        Self {
            store,
            defaults: ResolvedSettings::default(),
        }
    }

    /// Replaces the defaults applied at read time.
    pub fn with_defaults(mut self, defaults: ResolvedSettings) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &ResolvedSettings {
        &self.defaults
    }

    /// Loads a view.
    pub fn load(&self, view_id: ViewId) -> Result<SchedulerView> {
        let value = self
            .store
            .get(&view_key(view_id))?
            .ok_or(BoardError::ViewNotFound(view_id))?;
        match serde_json::from_value::<SchedulerView>(value) {
            Ok(mut view) => {
                view.pk = Some(view_id);
                Ok(view)
            }
            Err(e) => {
                warn!(view_id, error = %e, "unreadable scheduler view record");
                Err(BoardError::ViewNotFound(view_id))
            }
        }
    }

    /// Saves a view; last write wins.
    ///
    /// A view without `pk` is always stored as a new record. For an
    /// existing view the given overrides are deep-merged into the stored
    /// ones; name and sharing are replaced.
    pub fn save(&self, mut view: SchedulerView) -> Result<SchedulerView> {
        let pk = match view.pk {
            Some(pk) => {
                match self.load(pk) {
                    Ok(existing) => {
                        let mut overrides = existing.overrides;
                        merge_settings(&mut overrides, &view.overrides);
                        view.overrides = overrides;
                    }
                    Err(BoardError::ViewNotFound(_)) => {}
                    Err(e) => return Err(e),
                }
                self.reserve_id(pk)?;
                pk
            }
            None => self.next_id()?,
        };
        view.pk = Some(pk);
        self.store.put(&view_key(pk), to_json(&view)?)?;
        debug!(view_id = pk, name = %view.name, "scheduler view saved");
        Ok(view)
    }

    /// Deletes a view.
    pub fn delete(&self, view_id: ViewId) -> Result<()> {
        if self.store.delete(&view_key(view_id))? {
            debug!(view_id, "scheduler view deleted");
            Ok(())
        } else {
            Err(BoardError::ViewNotFound(view_id))
        }
    }

    /// Views owned by a user, by pk.
    pub fn list_for_user(&self, user: UserId) -> Result<Vec<SchedulerView>> {
        Ok(self
            .all_views()?
            .into_iter()
            .filter(|v| v.owner_user_id == user)
            .collect())
    }

    /// Views shared with any of the companies, by pk.
    pub fn list_shared_with(
        &self,
        company_ids: &BTreeSet<CompanyId>,
    ) -> Result<Vec<SchedulerView>> {
        Ok(self
            .all_views()?
            .into_iter()
            .filter(|v| v.is_shared_with(company_ids))
            .collect())
    }

    /// Base settings of a user. Unreadable records read as empty.
    pub fn load_user_settings(&self, user: UserId) -> Result<Settings> {
        match self.store.get(&user_settings_key(user))? {
            Some(Value::Object(map)) => Ok(map),
            Some(other) => {
                warn!(user, kind = value_kind(&other), "user settings record is not an object");
                Ok(Settings::new())
            }
            None => Ok(Settings::new()),
        }
    }

    /// Deep-merges explicit keys into the user's base settings.
    pub fn save_user_settings(&self, user: UserId, settings: &Settings) -> Result<Settings> {
        let mut stored = self.load_user_settings(user)?;
        merge_settings(&mut stored, settings);
        self.store
            .put(&user_settings_key(user), Value::Object(stored.clone()))?;
        Ok(stored)
    }

    /// `defaults <- user settings <- view overrides`.
    pub fn effective_settings(
        &self,
        user: UserId,
        view: Option<&SchedulerView>,
    ) -> Result<ResolvedSettings> {
        let user_settings = self.load_user_settings(user)?;
        let mut layers = vec![&user_settings];
        if let Some(view) = view {
            layers.push(&view.overrides);
        }
        Ok(self.defaults.resolve(&layers))
    }

    fn all_views(&self) -> Result<Vec<SchedulerView>> {
        let mut views = Vec::new();
        for key in self.store.keys(VIEW_PREFIX)? {
            let Some(pk) = key.strip_prefix(VIEW_PREFIX).and_then(|s| s.parse().ok()) else {
                continue;
            };
            match self.load(pk) {
                Ok(view) => views.push(view),
                Err(BoardError::ViewNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        views.sort_by_key(|v| v.pk);
        Ok(views)
    }

    /// Allocates a pk above the counter and above every stored view.
    fn next_id(&self) -> Result<ViewId> {
        let counter = self
            .store
            .get(NEXT_ID_KEY)?
            .and_then(|v| v.as_u64())
            .unwrap_or(1);
        let above_stored = self
            .store
            .keys(VIEW_PREFIX)?
            .iter()
            .filter_map(|key| key.strip_prefix(VIEW_PREFIX)?.parse::<ViewId>().ok())
            .max()
            .map_or(1, |max| max + 1);
        let next = counter.max(above_stored);
        self.store.put(NEXT_ID_KEY, Value::from(next + 1))?;
        Ok(next)
    }

    /// Moves the counter past an explicitly chosen pk.
    fn reserve_id(&self, pk: ViewId) -> Result<()> {
        let counter = self
            .store
            .get(NEXT_ID_KEY)?
            .and_then(|v| v.as_u64())
            .unwrap_or(1);
        if counter <= pk {
            self.store.put(NEXT_ID_KEY, Value::from(pk + 1))?;
        }
        Ok(())
    }
}

fn to_json(view: &SchedulerView) -> Result<Value> {
    serde_json::to_value(view).map_err(|e| BoardError::Storage(e.to_string()))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> ViewStore<MemoryStore> {
        ViewStore::new(MemoryStore::new())
    }

    #[test]
    fn test_save_assigns_ids() {
        let store = store();
        let a = store.save(SchedulerView::new("A", 1)).unwrap();
        let b = store.save(SchedulerView::new("B", 1)).unwrap();
        assert_eq!(a.pk, Some(1));
        assert_eq!(b.pk, Some(2));
        assert_eq!(store.load(2).unwrap().name, "B");
        assert_eq!(store.load(9).unwrap_err(), BoardError::ViewNotFound(9));
    }

    #[test]
    fn test_explicit_pk_never_reused() {
        let store = store();
        let mut imported = SchedulerView::new("Imported", 1)
            .with_override(SettingKey::ZoomLevel, json!("day"));
        imported.pk = Some(1);
        store.save(imported).unwrap();

        let fresh = store
            .save(
                SchedulerView::new("Fresh", 2)
                    .with_override(SettingKey::ZoomLevel, json!("month")),
            )
            .unwrap();
        assert_eq!(fresh.pk, Some(2));

        let first = store.load(1).unwrap();
        assert_eq!(first.name, "Imported");
        assert_eq!(first.owner_user_id, 1);
        assert_eq!(
            first.overrides.get("scheduler.predefinedZoomLevel"),
            Some(&json!("day"))
        );
    }

    #[test]
    fn test_new_view_skips_records_written_elsewhere() {
        let kv = MemoryStore::new();
        kv.put("view/4", json!({"name": "Legacy", "owner_user_id": 3})).unwrap();
        let store = ViewStore::new(kv);

        let saved = store.save(SchedulerView::new("New", 1)).unwrap();
        assert_eq!(saved.pk, Some(5));
        assert_eq!(store.load(4).unwrap().name, "Legacy");
        assert!(store.load(5).unwrap().overrides.is_empty());
    }

    #[test]
    fn test_round_trip_against_changed_defaults() {
        let saved = {
            let store = store();
            let view = SchedulerView::new("Mine", 1)
                .with_override(SettingKey::CardDisplay, json!({"showTags": true}));
            let saved = store.save(view).unwrap();
            (store.store, saved.pk.unwrap())
        };
        let (kv, pk) = saved;

        // Defaults change after the view was stored
        let defaults = ResolvedSettings {
            zoom_level: ZoomLevel::Day,
            ..ResolvedSettings::default()
        };
        let store = ViewStore::new(kv).with_defaults(defaults);
        let view = store.load(pk).unwrap();
        let settings = store.effective_settings(1, Some(&view)).unwrap();
        assert_eq!(settings.zoom_level, ZoomLevel::Day);
        assert!(settings.card_display.show_tags);
        // Stored record still holds only the explicit key
        assert_eq!(view.overrides.len(), 1);
    }

    #[test]
    fn test_save_deep_merges_overrides() {
        let store = store();
        let first = store
            .save(
                SchedulerView::new("V", 1)
                    .with_override(SettingKey::CardDisplay, json!({"showTags": true}))
                    .with_override(SettingKey::ZoomLevel, json!("day")),
            )
            .unwrap();

        let mut update = SchedulerView::new("V renamed", 1)
            .with_override(SettingKey::CardDisplay, json!({"showShipper": true}));
        update.pk = first.pk;
        let saved = store.save(update).unwrap();

        assert_eq!(saved.name, "V renamed");
        assert_eq!(
            saved.overrides.get("scheduler.cardDisplay"),
            Some(&json!({"showTags": true, "showShipper": true}))
        );
        assert_eq!(
            saved.overrides.get("scheduler.predefinedZoomLevel"),
            Some(&json!("day"))
        );
    }

    #[test]
    fn test_listing_and_sharing() {
        let store = store();
        store.save(SchedulerView::new("A", 1).shared_with([10])).unwrap();
        store.save(SchedulerView::new("B", 2).shared_with([20, 30])).unwrap();
        store.save(SchedulerView::new("C", 1)).unwrap();

        let mine: Vec<String> = store
            .list_for_user(1)
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(mine, vec!["A", "C"]);

        let shared = store.list_shared_with(&BTreeSet::from([30, 40])).unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].name, "B");

        store.delete(1).unwrap();
        assert_eq!(store.list_for_user(1).unwrap().len(), 1);
        assert!(store.delete(1).is_err());
    }

    #[test]
    fn test_user_settings_layer() {
        let store = store();
        let user: Settings = serde_json::from_value(json!({
            "scheduler.predefinedZoomLevel": "month",
            "scheduler.resourceOrdering": "name",
        }))
        .unwrap();
        store.save_user_settings(1, &user).unwrap();

        let view = SchedulerView::new("V", 1)
            .with_override(SettingKey::ZoomLevel, json!("two_weeks"));
        let settings = store.effective_settings(1, Some(&view)).unwrap();
        assert_eq!(settings.zoom_level, ZoomLevel::TwoWeeks);
        assert_eq!(settings.resource_ordering, ResourceOrdering::Name);

        let without_view = store.effective_settings(1, None).unwrap();
        assert_eq!(without_view.zoom_level, ZoomLevel::Month);
        assert_eq!(store.effective_settings(2, None).unwrap(), ResolvedSettings::default());
    }

    #[test]
    fn test_corrupt_records_recover() {
        let kv = MemoryStore::new();
        kv.put("user/1/settings", json!("garbage")).unwrap();
        kv.put("view/5", json!({"name": 12})).unwrap();
        let store = ViewStore::new(kv);

        assert!(store.load_user_settings(1).unwrap().is_empty());
        assert_eq!(store.load(5).unwrap_err(), BoardError::ViewNotFound(5));
        assert!(store.list_for_user(1).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_settings_file_resolves_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("views.json");
        std::fs::write(&path, "{1: oops").unwrap();
        let store = ViewStore::new(FileStore::new(&path));

        assert_eq!(store.effective_settings(1, None).unwrap(), ResolvedSettings::default());
        assert_eq!(store.load(1).unwrap_err(), BoardError::ViewNotFound(1));
    }
}
