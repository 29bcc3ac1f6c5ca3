//! Board configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//!
//! ```toml
//! conflict_look_behind_hours = 24
//! conflict_look_ahead_hours = 24
//! reload_interval_ms = 5000
//! pool_page_size = 25
//! max_page_size = 100
//! utc_offset_minutes = 60
//! ```

use chrono::{Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::ConflictHorizon;
use crate::error::{BoardError, Result};
use crate::pool::DEFAULT_PAGE_SIZE;

/// Tunables of the scheduling core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// How far before a trip the conflict scan looks.
    #[serde(default = "default_look_hours")]
    pub conflict_look_behind_hours: i64,
    /// How far after a trip the conflict scan looks.
    #[serde(default = "default_look_hours")]
    pub conflict_look_ahead_hours: i64,
    /// Period of the realtime reload tick.
    #[serde(default = "default_reload_interval_ms")]
    pub reload_interval_ms: u64,
    /// Page size of the unplanned pool when the caller gives none.
    #[serde(default = "default_pool_page_size")]
    pub pool_page_size: u32,
    /// Upper bound for requested page sizes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    /// Canonical timezone for calendar-day logic, as minutes east of UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_look_hours() -> i64 { 24 }
fn default_reload_interval_ms() -> u64 { 5_000 }
fn default_pool_page_size() -> u32 { DEFAULT_PAGE_SIZE }
fn default_max_page_size() -> u32 { 100 }

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            conflict_look_behind_hours: default_look_hours(),
            conflict_look_ahead_hours: default_look_hours(),
            reload_interval_ms: default_reload_interval_ms(),
            pool_page_size: default_pool_page_size(),
            max_page_size: default_max_page_size(),
            utc_offset_minutes: 0,
        }
    }
}

impl BoardConfig {
    /// Parses a TOML document and checks it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| BoardError::Config(format!("Failed to parse config: {e}")))?;
        config.check()?;
        Ok(config)
    }

    /// Loads config from a file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BoardError::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Canonical timezone.
    pub fn timezone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            BoardError::Config(format!(
                "UTC offset out of range: {} minutes",
                self.utc_offset_minutes
            ))
        })
    }

    /// Conflict scan horizon.
    pub fn conflict_horizon(&self) -> ConflictHorizon {
        ConflictHorizon::new(
            Duration::hours(self.conflict_look_behind_hours),
            Duration::hours(self.conflict_look_ahead_hours),
        )
    }

    /// Realtime reload tick period.
    pub fn reload_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.reload_interval_ms)
    }

    fn check(&self) -> Result<()> {
        self.timezone()?;
        if self.conflict_look_behind_hours < 0 || self.conflict_look_ahead_hours < 0 {
            return Err(BoardError::Config("Conflict horizon must not be negative".into()));
        }
        if self.reload_interval_ms == 0 {
            return Err(BoardError::Config("Reload interval must be positive".into()));
        }
        if self.pool_page_size == 0 || self.pool_page_size > self.max_page_size {
            return Err(BoardError::Config(format!(
                "Pool page size must be within 1..={}",
                self.max_page_size
            )));
        }
        Ok(())
    }
}
