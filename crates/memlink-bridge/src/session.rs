// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One live conversation with a worker over a reader/writer pair.
//!
//! A session multiplexes any number of concurrent calls over a single line
//! stream. Responses are matched to callers by request id; they may arrive in
//! any order. When the output stream ends, every pending call is rejected and
//! the session stays dead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use memlink_core::{MemlinkError, SessionId};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::pending::{Outcome, PendingTable};
use crate::protocol::{parse_line, BridgeOp, BridgeRequest, BridgeResponse};

struct Shared {
    id: SessionId,
    pending: PendingTable,
    alive: AtomicBool,
    done: watch::Sender<bool>,
}

impl Shared {
    fn close(&self, reason: &str) {
        let was_alive = self.alive.swap(false, Ordering::SeqCst);
        let rejected = self.pending.fail_all(reason);
        self.done.send_replace(true);
        if was_alive || rejected > 0 {
            warn!(session = %self.id, rejected, reason, "bridge session closed");
        }
    }
}

/// A request line queued for the writer task.
struct Outgoing {
    id: String,
    line: String,
    written: oneshot::Sender<std::io::Result<()>>,
}

/// A handle to a session. Clones share the same stream and pending table.
#[derive(Clone)]
pub struct BridgeSession {
    shared: Arc<Shared>,
    outgoing: mpsc::UnboundedSender<Outgoing>,
    reader: Arc<JoinHandle<()>>,
    writer: Arc<JoinHandle<()>>,
    timeout: Duration,
}

impl std::fmt::Debug for BridgeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeSession")
            .field("id", &self.shared.id)
            .field("alive", &self.is_alive())
            .field("pending", &self.shared.pending.len())
            .finish()
    }
}

impl BridgeSession {
    /// Attach to a worker's output (`reader`) and input (`writer`).
    ///
    /// Spawns the reader and writer tasks, so this must run inside a Tokio
    /// runtime.
    pub fn attach<R, W>(reader: R, writer: W, timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let shared = Arc::new(Shared {
            id: SessionId(Uuid::new_v4().to_string()),
            pending: PendingTable::new(),
            alive: AtomicBool::new(true),
            done: watch::Sender::new(false),
        });
        let (outgoing, queue) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(reader, Arc::clone(&shared)));
        let writer = tokio::spawn(write_loop(writer, queue, Arc::clone(&shared)));
        Self {
            shared,
            outgoing,
            reader: Arc::new(reader),
            writer: Arc::new(writer),
            timeout,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.shared.id
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one request and wait for its correlated response.
    ///
    /// Resolves exactly once: with the response, a worker-reported error, a
    /// crash, or a timeout. The timeout covers writing the request as well as
    /// waiting for the reply, so a worker that stops reading its input cannot
    /// stall the caller.
    pub async fn call(&self, op: BridgeOp, payload: Option<Value>) -> Result<BridgeResponse, MemlinkError> {
        let request = BridgeRequest::new(op, payload);
        let line = request.to_line()?;
        let deadline = Instant::now() + self.timeout;
        let mut rx = self.shared.pending.register(&request.id, op)?;

        debug!(session = %self.shared.id, id = %request.id, %op, "sending bridge request");
        let (written_tx, written_rx) = oneshot::channel();
        let queued = self.outgoing.send(Outgoing {
            id: request.id.clone(),
            line,
            written: written_tx,
        });
        if queued.is_err() {
            self.shared.pending.remove(&request.id);
            return Err(input_closed(op, None));
        }

        match timeout_at(deadline, written_rx).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => {
                if !self.shared.pending.remove(&request.id) {
                    return settled(&mut rx, || input_closed(op, None));
                }
                self.shared.close(&format!("cannot write to worker: {e}"));
                return Err(input_closed(op, Some(e)));
            }
            Ok(Err(_)) => {
                // Writer task stopped before reaching this line.
                if !self.shared.pending.remove(&request.id) {
                    return settled(&mut rx, || input_closed(op, None));
                }
                return Err(input_closed(op, None));
            }
            Err(_) => return self.expire(&request.id, op, &mut rx),
        }

        match timeout_at(deadline, &mut rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(MemlinkError::WorkerCrashed(
                "response channel dropped".to_string(),
            )),
            Err(_) => self.expire(&request.id, op, &mut rx),
        }
    }

    /// Settle a call whose deadline passed.
    fn expire(&self, id: &str, op: BridgeOp, rx: &mut oneshot::Receiver<Outcome>) -> Outcome {
        let timed_out = || MemlinkError::ProtocolTimeout {
            op: op.to_string(),
            duration: self.timeout,
        };
        if self.shared.pending.remove(id) {
            debug!(session = %self.shared.id, id, %op, "bridge request timed out");
            return Err(timed_out());
        }
        // Routed while the timer fired; the outcome is already in the channel.
        settled(rx, timed_out)
    }

    /// Resolves once the session has closed, for any reason.
    pub async fn closed(&self) {
        let mut done = self.shared.done.subscribe();
        let _ = done.wait_for(|closed| *closed).await;
    }

    /// Reject all pending calls and mark the session dead.
    pub fn close(&self, reason: &str) {
        self.shared.close(reason);
        self.reader.abort();
        self.writer.abort();
    }
}

fn settled(rx: &mut oneshot::Receiver<Outcome>, fallback: impl FnOnce() -> MemlinkError) -> Outcome {
    rx.try_recv().unwrap_or_else(|_| Err(fallback()))
}

fn input_closed(op: BridgeOp, source: Option<std::io::Error>) -> MemlinkError {
    MemlinkError::ProcessUnavailable {
        message: format!("cannot write `{op}` request to worker"),
        source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    }
}

/// Writes queued request lines one at a time. A line is always written whole;
/// requests whose caller already gave up are skipped.
async fn write_loop<W>(mut writer: W, mut queue: mpsc::UnboundedReceiver<Outgoing>, shared: Arc<Shared>)
where
    W: AsyncWrite + Send + Unpin,
{
    while let Some(Outgoing { id, line, written }) = queue.recv().await {
        if !shared.pending.contains(&id) {
            debug!(session = %shared.id, id = %id, "skipping abandoned bridge request");
            continue;
        }
        let result = write_line(&mut writer, &line).await;
        let failed = result.is_err();
        let _ = written.send(result);
        if failed {
            break;
        }
    }
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

async fn read_loop<R>(reader: R, shared: Arc<Shared>)
where
    R: AsyncRead + Send + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let reason = loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break "worker closed its output".to_string(),
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                if let Some(response) = parse_line(&line) {
                    shared.pending.complete(response);
                }
            }
            Err(e) => break format!("failed reading worker output: {e}"),
        }
    };
    shared.close(&reason);
}
