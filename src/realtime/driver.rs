//! Async drivers for the reload monitor.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{RealtimeEvent, ReloadMonitor, TickOutcome};
use crate::error::Result;

/// A board that can refetch its data.
#[async_trait]
pub trait Reloadable: Send {
    /// Whether a reload may run now (e.g. false while a card is dragged).
    fn can_reload(&self) -> bool;

    async fn reload(&mut self) -> Result<()>;
}

/// Monitor shared between the event pump and the reload loop.
pub type SharedMonitor = Arc<Mutex<ReloadMonitor>>;

/// Runs the tick loop until `cancel` fires. Returns the number of reloads.
///
/// A failed reload marks the board stale again so the next tick retries.
/// A reload in flight when `cancel` fires is dropped and the loop stops
/// without touching the monitor.
pub async fn run_reload_loop<R: Reloadable>(
    monitor: SharedMonitor,
    target: &mut R,
    period: Duration,
    cancel: CancellationToken,
) -> usize {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let board = monitor.lock().await.board();
    let mut reloads = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let outcome = {
            let mut monitor = monitor.lock().await;
            monitor.tick(target.can_reload())
        };
        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Deferred => debug!(%board, "reload deferred"),
            TickOutcome::Reload => {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = target.reload() => Some(result),
                };
                match result {
                    None => {
                        debug!(%board, "reload abandoned on shutdown");
                        break;
                    }
                    Some(Ok(())) => {
                        reloads += 1;
                        info!(%board, "board reloaded");
                    }
                    Some(Err(_)) if cancel.is_cancelled() => break,
                    Some(Err(e)) => {
                        warn!(%board, error = %e, "reload failed, retrying next tick");
                        monitor.lock().await.mark_stale();
                    }
                }
            }
        }
    }

    debug!(%board, reloads, "reload loop stopped");
    reloads
}

/// Routes channel events to monitors until the channel closes or `cancel`
/// fires. Returns the number of events received.
pub async fn pump_events(
    mut events: mpsc::Receiver<RealtimeEvent>,
    monitors: Vec<SharedMonitor>,
    cancel: CancellationToken,
) -> usize {
    let mut received = 0;
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        received += 1;
        for monitor in &monitors {
            monitor.lock().await.notify(&event);
        }
    }
    received
}
