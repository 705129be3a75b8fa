// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Launching the worker and watching it until exit.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use memlink_config::model::BridgeConfig;
use memlink_core::MemlinkError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::session::BridgeSession;
use crate::stderr::StderrTail;

/// How long output already written by an exited worker may still be routed.
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// Everything needed to start the worker. Two specs are equal iff they would
/// launch the same process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub command: String,
    pub script_path: PathBuf,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    pub fn new(command: impl Into<String>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            script_path: script_path.into(),
            working_dir: None,
            env: Vec::new(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            command: config.command.clone(),
            script_path: PathBuf::from(&config.script_path),
            working_dir: config.working_dir.as_ref().map(PathBuf::from),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// A running worker: its session plus the task that owns the child.
pub(crate) struct WorkerProcess {
    pub(crate) session: BridgeSession,
    pub(crate) launch: LaunchSpec,
    kill_tx: Option<oneshot::Sender<()>>,
    watcher: JoinHandle<()>,
}

impl WorkerProcess {
    /// Start `command script_path --daemon` with piped stdio.
    pub(crate) async fn spawn(
        launch: LaunchSpec,
        timeout: Duration,
        stderr_tail: Arc<StderrTail>,
    ) -> Result<Self, MemlinkError> {
        let script_exists = tokio::fs::try_exists(&launch.script_path).await.unwrap_or(false);
        if !script_exists {
            return Err(MemlinkError::ProcessUnavailable {
                message: format!("worker script not found: {}", launch.script_path.display()),
                source: None,
            });
        }

        let mut cmd = Command::new(&launch.command);
        cmd.arg(&launch.script_path)
            .arg("--daemon")
            .envs(launch.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &launch.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| MemlinkError::ProcessUnavailable {
            message: format!("failed to launch `{}`", launch.command),
            source: Some(Box::new(e)),
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.start_kill();
            return Err(MemlinkError::ProcessUnavailable {
                message: "worker stdio was not piped".to_string(),
                source: None,
            });
        };

        let session = BridgeSession::attach(stdout, stdin, timeout);
        let pid = child.id();
        info!(session = %session.id(), pid, command = %launch.command, script = %launch.script_path.display(), "bridge worker started");

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr, stderr_tail, session.id().to_string()));
        }

        let (kill_tx, kill_rx) = oneshot::channel();
        let watcher = tokio::spawn(watch_exit(child, kill_rx, session.clone()));

        Ok(Self {
            session,
            launch,
            kill_tx: Some(kill_tx),
            watcher,
        })
    }

    /// Kill the child and wait for the watcher to reap it.
    pub(crate) async fn terminate(mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.watcher).await {
            debug!(error = %e, "bridge exit watcher ended abnormally");
        }
    }
}

async fn watch_exit(mut child: Child, kill_rx: oneshot::Receiver<()>, session: BridgeSession) {
    let (status, killed) = tokio::select! {
        status = child.wait() => (status, false),
        _ = kill_rx => {
            let _ = child.start_kill();
            (child.wait().await, true)
        }
    };

    let reason = match &status {
        Ok(status) => format!("worker exited with {status}"),
        Err(e) => format!("failed waiting for worker: {e}"),
    };
    if killed {
        info!(session = %session.id(), "bridge worker stopped");
    } else {
        warn!(session = %session.id(), reason = %reason, "bridge worker exited");
        let _ = tokio::time::timeout(EXIT_GRACE, session.closed()).await;
    }
    session.close(&reason);
}

/// Copy worker stderr into the log and the tail until EOF. Invalid UTF-8 is
/// replaced, never fatal: closing the pipe early would kill the worker.
async fn drain_stderr(stderr: ChildStderr, tail: Arc<StderrTail>, session: String) {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                debug!(target: "memlink::worker", session = %session, "{line}");
                tail.push(line.to_string());
            }
            Err(e) => {
                debug!(session = %session, error = %e, "stopped reading worker stderr");
                break;
            }
        }
    }
}
