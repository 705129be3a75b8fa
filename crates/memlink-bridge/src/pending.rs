// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-flight request table of one session.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use memlink_core::MemlinkError;
use tokio::sync::oneshot;
use tracing::debug;

use crate::protocol::{BridgeOp, BridgeResponse};

/// The single outcome delivered to a waiting caller.
pub type Outcome = Result<BridgeResponse, MemlinkError>;

struct Waiter {
    op: BridgeOp,
    tx: oneshot::Sender<Outcome>,
}

#[derive(Default)]
struct State {
    waiters: HashMap<String, Waiter>,
    closed: Option<String>,
}

/// Request id → waiting caller.
///
/// The lock is never held across an await. Outcomes are sent while the lock
/// is held, so a caller that fails to remove its own entry can rely on the
/// outcome already sitting in its channel.
#[derive(Default)]
pub struct PendingTable {
    state: Mutex<State>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a request. Fails once the table has been closed.
    pub fn register(&self, id: &str, op: BridgeOp) -> Result<oneshot::Receiver<Outcome>, MemlinkError> {
        let mut state = self.lock();
        if let Some(reason) = &state.closed {
            return Err(MemlinkError::WorkerCrashed(reason.clone()));
        }
        let (tx, rx) = oneshot::channel();
        state.waiters.insert(id.to_string(), Waiter { op, tx });
        Ok(rx)
    }

    /// Route a response to its caller. Returns false for unknown ids.
    pub fn complete(&self, response: BridgeResponse) -> bool {
        let mut state = self.lock();
        let Some(waiter) = state.waiters.remove(&response.id) else {
            debug!(id = %response.id, "dropping response with unknown id");
            return false;
        };
        let outcome = if response.ok {
            Ok(response)
        } else {
            Err(MemlinkError::WorkerReported {
                op: response.op.clone().unwrap_or_else(|| waiter.op.to_string()),
                message: response
                    .error
                    .clone()
                    .unwrap_or_else(|| "worker returned ok=false without an error".to_string()),
            })
        };
        // Receiver gone means the caller already gave up.
        let _ = waiter.tx.send(outcome);
        true
    }

    /// Forget a request. Returns false if it was already completed or failed.
    pub fn remove(&self, id: &str) -> bool {
        self.lock().waiters.remove(id).is_some()
    }

    /// Reject every waiter and refuse new registrations. Returns how many were rejected.
    pub fn fail_all(&self, reason: &str) -> usize {
        let mut state = self.lock();
        if state.closed.is_none() {
            state.closed = Some(reason.to_string());
        }
        let waiters: Vec<Waiter> = state.waiters.drain().map(|(_, w)| w).collect();
        let count = waiters.len();
        for waiter in waiters {
            let _ = waiter.tx.send(Err(MemlinkError::WorkerCrashed(reason.to_string())));
        }
        count
    }

    /// Whether a caller is still waiting on `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.lock().waiters.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn response(id: &str, ok: bool) -> BridgeResponse {
        BridgeResponse {
            id: id.to_string(),
            ok,
            op: None,
            error: (!ok).then(|| "boom".to_string()),
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn complete_routes_by_id() {
        let table = PendingTable::new();
        let rx_a = table.register("a", BridgeOp::Health).unwrap();
        let rx_b = table.register("b", BridgeOp::Memorize).unwrap();

        assert!(!table.complete(response("zzz", true)));
        assert!(table.complete(response("b", false)));
        assert!(table.complete(response("a", true)));

        assert_eq!(rx_a.await.unwrap().unwrap().id, "a");
        match rx_b.await.unwrap() {
            Err(MemlinkError::WorkerReported { op, message }) => {
                assert_eq!(op, "memorize");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn fail_all_rejects_once_and_closes() {
        let table = PendingTable::new();
        let rx = table.register("a", BridgeOp::Health).unwrap();
        assert_eq!(table.fail_all("worker exited"), 1);
        assert!(matches!(rx.await.unwrap(), Err(MemlinkError::WorkerCrashed(_))));
        assert_eq!(table.fail_all("again"), 0);
        assert!(table.is_closed());
        assert!(table.register("b", BridgeOp::Health).is_err());
    }

    #[test]
    fn remove_after_complete_reports_false() {
        let table = PendingTable::new();
        let _rx = table.register("a", BridgeOp::Health).unwrap();
        assert!(table.complete(response("a", true)));
        assert!(!table.remove("a"));
    }

    #[test]
    fn contains_tracks_waiting_callers() {
        let table = PendingTable::new();
        let _rx = table.register("a", BridgeOp::Health).unwrap();
        assert!(table.contains("a"));
        assert!(table.remove("a"));
        assert!(!table.contains("a"));
    }
}
