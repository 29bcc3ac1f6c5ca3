//! Realtime notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BoardError, Result};

/// A change notification. Only the entity name and timestamp matter; the
/// payload is never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub entity: String,
    pub timestamp: DateTime<Utc>,
}

impl RealtimeEvent {
    pub fn new(entity: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            entity: entity.into(),
            timestamp,
        }
    }

    /// Parses a channel message `{entity, data, timestamp}`.
    ///
    /// `data` may have any shape, or be absent.
    pub fn from_json(message: &str) -> Result<Self> {
        serde_json::from_str(message)
            .map_err(|e| BoardError::Api(format!("Malformed realtime message: {e}")))
    }
}

/// Boards that reload on notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardKind {
    Scheduler,
    UnplannedPool,
    InvoiceList,
}

impl BoardKind {
    /// Entities whose changes make the board stale.
    pub fn watched_entities(&self) -> &'static [&'static str] {
        match self {
            Self::Scheduler => &[
                "schedulerTrips",
                "trips",
                "transports",
                "truckers",
                "vehicles",
                "trailers",
            ],
            Self::UnplannedPool => &["schedulerTrips", "unplannedTrips", "trips", "transports"],
            Self::InvoiceList => &["invoiceOrFreeTransports", "invoices"],
        }
    }

    /// Whether a notification concerns this board.
    pub fn watches(&self, event: &RealtimeEvent) -> bool {
        self.watched_entities().contains(&event.entity.as_str())
    }
}

impl fmt::Display for BoardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scheduler => "scheduler",
            Self::UnplannedPool => "unplanned_pool",
            Self::InvoiceList => "invoice_list",
        })
    }
}
