//! Realtime reconciliation.
//!
//! Change notifications from the backend mark boards stale; a periodic tick
//! reloads stale boards when they are allowed to reload. The state machine
//! in [`ReloadMonitor`] is synchronous and can be driven by hand; the async
//! drivers in this module wire it to a tokio interval and an event channel.

mod driver;
mod event;
mod monitor;

pub use driver::{pump_events, run_reload_loop, Reloadable, SharedMonitor};
pub use event::{BoardKind, RealtimeEvent};
pub use monitor::{ReloadMonitor, ReloadState, TickOutcome};
