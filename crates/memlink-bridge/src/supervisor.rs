// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owns the single worker process and restarts it lazily.
//!
//! The worker is started on the first call, and again on the first call after
//! it died or after the launch spec changed. Each start creates a new session
//! id, published on a watch channel.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use memlink_config::model::BridgeConfig;
use memlink_core::{MemlinkError, SessionId};
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::process::{LaunchSpec, WorkerProcess};
use crate::protocol::{BridgeOp, BridgeResponse};
use crate::session::BridgeSession;
use crate::stderr::StderrTail;

pub struct BridgeSupervisor {
    launch: RwLock<LaunchSpec>,
    timeout: Duration,
    slot: Mutex<Option<WorkerProcess>>,
    stderr: Arc<StderrTail>,
    session_tx: watch::Sender<Option<SessionId>>,
}

impl std::fmt::Debug for BridgeSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeSupervisor")
            .field("launch", &self.launch_spec())
            .field("timeout", &self.timeout)
            .field("session", &self.session_id())
            .finish()
    }
}

impl BridgeSupervisor {
    pub fn new(launch: LaunchSpec, timeout: Duration, stderr_lines: usize) -> Self {
        Self {
            launch: RwLock::new(launch),
            timeout,
            slot: Mutex::new(None),
            stderr: Arc::new(StderrTail::new(stderr_lines)),
            session_tx: watch::Sender::new(None),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            LaunchSpec::from_config(config),
            config.timeout(),
            config.stderr_lines,
        )
    }

    pub fn launch_spec(&self) -> LaunchSpec {
        self.launch.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the launch spec. A running worker started from a different
    /// spec is replaced on the next call.
    pub fn set_launch_spec(&self, launch: LaunchSpec) {
        *self.launch.write().unwrap_or_else(PoisonError::into_inner) = launch;
    }

    /// Session id of the most recently started worker, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_tx.borrow().clone()
    }

    /// Observe session changes. `None` after shutdown.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionId>> {
        self.session_tx.subscribe()
    }

    /// Latest worker stderr lines, oldest first. Survives restarts.
    pub fn stderr_tail(&self) -> Vec<String> {
        self.stderr.snapshot()
    }

    /// Return the live session, starting a worker when needed.
    ///
    /// Concurrent callers wait on the same start and share its session.
    pub async fn ensure_running(&self) -> Result<BridgeSession, MemlinkError> {
        let launch = self.launch_spec();
        let mut slot = self.slot.lock().await;

        if let Some(current) = slot.as_ref() {
            if current.session.is_alive() && current.launch == launch {
                return Ok(current.session.clone());
            }
            if current.session.is_alive() {
                info!(session = %current.session.id(), "launch spec changed, restarting bridge worker");
            } else {
                debug!(session = %current.session.id(), "bridge worker is gone, starting a new one");
            }
        }
        if let Some(old) = slot.take() {
            old.terminate().await;
        }

        let process = WorkerProcess::spawn(launch, self.timeout, Arc::clone(&self.stderr)).await?;
        let session = process.session.clone();
        *slot = Some(process);
        self.session_tx.send_replace(Some(session.id().clone()));
        Ok(session)
    }

    /// Send one request to the worker, starting it if needed.
    ///
    /// The start is serialized; the request itself is not, so any number of
    /// calls can be in flight at once.
    pub async fn call(&self, op: BridgeOp, payload: Option<Value>) -> Result<BridgeResponse, MemlinkError> {
        let session = self.ensure_running().await?;
        session.call(op, payload).await
    }

    /// Whether a live worker exists right now. Never starts one.
    pub async fn is_running(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .is_some_and(|p| p.session.is_alive())
    }

    /// Stop the worker, rejecting its pending calls.
    pub async fn shutdown(&self) {
        let old = self.slot.lock().await.take();
        if let Some(process) = old {
            info!(session = %process.session.id(), "shutting down bridge worker");
            process.terminate().await;
        }
        self.session_tx.send_replace(None);
    }
}
