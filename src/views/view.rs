//! Named scheduler views.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::settings::{SettingKey, Settings};
use crate::models::CompanyId;

/// View primary key.
pub type ViewId = u64;

/// User identifier.
pub type UserId = i64;

/// A named, persisted board configuration.
///
/// `overrides` holds only the keys set explicitly for this view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerView {
    /// Assigned on first save.
    #[serde(default)]
    pub pk: Option<ViewId>,
    pub name: String,
    pub owner_user_id: UserId,
    #[serde(default)]
    pub overrides: Settings,
    #[serde(default)]
    pub shared_with_company_ids: BTreeSet<CompanyId>,
}

impl SchedulerView {
    /// Creates an unsaved view without overrides.
    pub fn new(name: impl Into<String>, owner_user_id: UserId) -> Self {
        Self {
            pk: None,
            name: name.into(),
            owner_user_id,
            overrides: Settings::new(),
            shared_with_company_ids: BTreeSet::new(),
        }
    }

    /// Sets one override.
    pub fn with_override(mut self, key: SettingKey, value: serde_json::Value) -> Self {
        self.overrides.insert(key.as_str().to_owned(), value);
        self
    }

    /// Shares the view with companies.
    pub fn shared_with(mut self, companies: impl IntoIterator<Item = CompanyId>) -> Self {
        self.shared_with_company_ids.extend(companies);
        self
    }

    /// Whether any of the companies may use the view.
    pub fn is_shared_with(&self, company_ids: &BTreeSet<CompanyId>) -> bool {
        !self.shared_with_company_ids.is_disjoint(company_ids)
    }
}
