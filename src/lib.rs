//! Scheduling core of a carrier trip board.
//!
//! Places transport trips onto a time-indexed grid of truckers, vehicles
//! and trailers, keeps the pool of trips nobody is planned on yet, persists
//! per-user board views, and keeps the board consistent with a backend that
//! pushes change notifications.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Trip`, `Activity`, `Transport`, `Resource`,
//!   `TimeWindow`, `DateRange`, `ResourceAssignment`
//! - **`validation`**: Snapshot integrity checks (duplicate IDs, activity
//!   order, loading before unloading, resource refs and kinds)
//! - **`engine`**: Assign/unassign with conflict detection and edit rights
//! - **`pool`**: Unplanned pool filtering, ordering and paging
//! - **`views`**: Scheduler views and settings resolved against defaults
//! - **`realtime`**: Notification-driven reload state machine and drivers
//! - **`api`**: Backend traits, query encoding, tri-state patches, query
//!   sequencing
//! - **`board`**: `BoardSession` wiring the above to a backend
//! - **`config`**: `BoardConfig` loaded from TOML
//!
//! # Architecture
//!
//! Models and time windows are plain values. The assignment engine is the
//! only code that changes trip-resource bindings, and it does so by
//! returning new [`engine::BoardState`] values. The pool is a read-only
//! query over the same state. The realtime layer only decides *when* to
//! reload; it never touches trip data.
//!
//! The crate logs through `tracing` and never installs a subscriber.
//!
//! # Example
//!
//! ```
//! use trip_board::engine::AssignmentEngine;
//! use trip_board::pool::UnplannedPool;
//! use trip_board::BoardConfig;
//!
//! let config = BoardConfig::from_toml_str("utc_offset_minutes = 60").unwrap();
//! let engine = AssignmentEngine::from_config(&config);
//! let pool = UnplannedPool::from_config(&config).unwrap();
//!
//! assert_eq!(engine.horizon().look_ahead(), chrono::Duration::hours(24));
//! assert_eq!(pool.timezone().local_minus_utc(), 3600);
//! ```

pub mod api;
pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod pool;
pub mod realtime;
pub mod validation;
pub mod views;

pub use board::BoardSession;
pub use config::BoardConfig;
pub use error::{BoardError, Result};
