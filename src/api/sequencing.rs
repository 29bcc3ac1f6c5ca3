//! Query sequencing.
//!
//! Several fetches for the same slice of the board can be in flight at
//! once (a planner clicking through dates faster than the backend
//! answers). Each fetch gets a ticket with a per-key sequence number and a
//! cancellation token. Issuing a newer ticket cancels the older token, and
//! only the result of the newest ticket is applied; everything else is
//! reported as [`BoardError::StaleQuery`] for the caller to drop.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{BoardError, Result};

/// A stamped in-flight query.
#[derive(Debug, Clone)]
pub struct QueryTicket {
    pub key: String,
    pub sequence: u64,
    pub token: CancellationToken,
}

#[derive(Debug, Default)]
struct KeyState {
    latest: u64,
    applied: u64,
    token: Option<CancellationToken>,
}

/// Per-key query sequencer.
///
/// # Example
/// ```
/// use trip_board::api::QuerySequencer;
///
/// let seq = QuerySequencer::new();
/// let older = seq.issue("trips");
/// let newer = seq.issue("trips");
/// assert!(older.token.is_cancelled());
/// assert!(seq.accept(&older, ()).unwrap_err().is_stale());
/// assert!(seq.accept(&newer, ()).is_ok());
/// ```
#[derive(Debug, Default)]
pub struct QuerySequencer {
    keys: Mutex<HashMap<String, KeyState>>,
}

impl QuerySequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps a new query for `key`, cancelling the previous one.
    pub fn issue(&self, key: &str) -> QueryTicket {
        let mut keys = self.keys.lock();
        let state = keys.entry(key.to_owned()).or_default();
        state.latest += 1;
        if let Some(previous) = state.token.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        state.token = Some(token.clone());
        debug!(key, sequence = state.latest, "query issued");
        QueryTicket {
            key: key.to_owned(),
            sequence: state.latest,
            token,
        }
    }

    /// Latest sequence issued for a key (0 if none).
    pub fn latest(&self, key: &str) -> u64 {
        self.keys.lock().get(key).map_or(0, |s| s.latest)
    }

    /// Admits a result if its ticket is still the newest.
    pub fn accept<T>(&self, ticket: &QueryTicket, result: T) -> Result<T> {
        let mut keys = self.keys.lock();
        let state = keys.entry(ticket.key.clone()).or_default();
        if ticket.sequence == state.latest && ticket.sequence > state.applied {
            state.applied = ticket.sequence;
            Ok(result)
        } else {
            debug!(
                key = %ticket.key,
                sequence = ticket.sequence,
                latest = state.latest,
                "stale query result dropped"
            );
            Err(BoardError::StaleQuery {
                key: ticket.key.clone(),
                sequence: ticket.sequence,
                latest: state.latest,
            })
        }
    }

    /// Issues a ticket, runs the fetch, and admits its result.
    ///
    /// The fetch is abandoned as soon as a newer query for the same key is
    /// issued.
    pub async fn run<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let ticket = self.issue(key);
        let result = tokio::select! {
            _ = ticket.token.cancelled() => None,
            result = fetch(ticket.token.clone()) => Some(result),
        };
        match result {
            Some(result) => self.accept(&ticket, result?),
            None => Err(BoardError::StaleQuery {
                key: ticket.key.clone(),
                sequence: ticket.sequence,
                latest: self.latest(key),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_older_result_after_newer_is_stale() {
        let seq = QuerySequencer::new();
        let tickets: Vec<QueryTicket> = (0..6).map(|_| seq.issue("trips")).collect();
        let fifth = &tickets[4];
        let sixth = &tickets[5];
        assert_eq!(fifth.sequence, 5);
        assert_eq!(sixth.sequence, 6);

        assert_eq!(seq.accept(sixth, "six").unwrap(), "six");
        let err = seq.accept(fifth, "five").unwrap_err();
        assert_eq!(
            err,
            BoardError::StaleQuery {
                key: "trips".into(),
                sequence: 5,
                latest: 6
            }
        );
    }

    #[test]
    fn test_older_result_before_newer_is_stale_too() {
        let seq = QuerySequencer::new();
        let fifth = seq.issue("trips");
        let sixth = seq.issue("trips");
        assert!(fifth.token.is_cancelled());
        assert!(!sixth.token.is_cancelled());
        assert!(seq.accept(&fifth, ()).is_err());
        assert!(seq.accept(&sixth, ()).is_ok());
        // Same ticket cannot be applied twice
        assert!(seq.accept(&sixth, ()).is_err());
    }

    #[test]
    fn test_keys_are_independent() {
        let seq = QuerySequencer::new();
        let trips = seq.issue("trips");
        let pool = seq.issue("pool");
        assert_eq!(trips.sequence, 1);
        assert_eq!(pool.sequence, 1);
        assert!(!trips.token.is_cancelled());
        assert!(seq.accept(&trips, ()).is_ok());
        assert!(seq.accept(&pool, ()).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_abandons_superseded_fetch() {
        let seq = QuerySequencer::new();
        let slow = seq.run("trips", |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("slow")
        });
        let fast = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            seq.run("trips", |_| async { Ok("fast") }).await
        };
        let (slow, fast) = tokio::join!(slow, fast);
        assert!(slow.unwrap_err().is_stale());
        assert_eq!(fast.unwrap(), "fast");
    }

    #[tokio::test]
    async fn test_run_propagates_fetch_error() {
        let seq = QuerySequencer::new();
        let result: Result<()> = seq
            .run("trips", |_| async { Err(BoardError::Api("timeout".into())) })
            .await;
        assert_eq!(result.unwrap_err(), BoardError::Api("timeout".into()));
    }
}
