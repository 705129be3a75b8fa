// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poll-based status for memorize operations running on the worker.
//!
//! Mirrors the cloud service's task model: a task moves forward through
//! PENDING → PROCESSING → SUCCESS | FAILURE and never leaves a terminal state.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use memlink_core::SessionId;
use serde::Serialize;
use serde_json::Value;
use strum::Display;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Processing,
    Success,
    Failure,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failure)
    }

    fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Success | TaskStatus::Failure => 2,
        }
    }

    /// Forward moves only, never out of a terminal state.
    pub fn can_become(self, next: TaskStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTask {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// Outcome of a status lookup. An unknown id is not an error.
#[derive(Debug, Clone)]
pub enum TaskLookup {
    Found(LocalTask),
    Unknown,
}

impl TaskLookup {
    pub fn task(&self) -> Option<&LocalTask> {
        match self {
            TaskLookup::Found(task) => Some(task),
            TaskLookup::Unknown => None,
        }
    }
}

struct Entry {
    task: LocalTask,
    finished: Option<Instant>,
}

/// In-memory task table.
pub struct TaskStore {
    tasks: Mutex<HashMap<TaskId, Entry>>,
    retention: Option<Duration>,
}

impl TaskStore {
    /// `retention` of `None` keeps finished tasks forever.
    pub fn new(retention: Option<Duration>) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, Entry>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a PENDING task.
    pub fn create(&self, session_id: Option<SessionId>) -> TaskId {
        let now = Utc::now();
        let id = TaskId::new();
        let mut tasks = self.lock();
        self.prune(&mut tasks);
        tasks.insert(
            id.clone(),
            Entry {
                task: LocalTask {
                    task_id: id.clone(),
                    status: TaskStatus::Pending,
                    created_at: now,
                    updated_at: now,
                    error: None,
                    session_id,
                    result: None,
                },
                finished: None,
            },
        );
        debug!(task = %id, "task created");
        id
    }

    /// Move a task forward. Refused transitions are logged and return false.
    pub fn set_status(&self, id: &TaskId, status: TaskStatus, error: Option<String>) -> bool {
        self.transition(id, status, |task| task.error = error)
    }

    pub fn complete(&self, id: &TaskId, result: Option<Value>) -> bool {
        self.transition(id, TaskStatus::Success, |task| task.result = result)
    }

    pub fn fail(&self, id: &TaskId, error: impl Into<String>) -> bool {
        let error = error.into();
        self.transition(id, TaskStatus::Failure, |task| task.error = Some(error))
    }

    fn transition(&self, id: &TaskId, status: TaskStatus, apply: impl FnOnce(&mut LocalTask)) -> bool {
        let mut tasks = self.lock();
        let Some(entry) = tasks.get_mut(id) else {
            warn!(task = %id, %status, "status update for unknown task");
            return false;
        };
        let current = entry.task.status;
        if !current.can_become(status) {
            warn!(task = %id, from = %current, to = %status, "refusing task transition");
            return false;
        }
        entry.task.status = status;
        entry.task.updated_at = Utc::now();
        apply(&mut entry.task);
        if status.is_terminal() {
            entry.finished = Some(Instant::now());
        }
        debug!(task = %id, from = %current, to = %status, "task transition");
        true
    }

    pub fn get(&self, id: &TaskId) -> TaskLookup {
        let mut tasks = self.lock();
        self.prune(&mut tasks);
        match tasks.get(id) {
            Some(entry) => TaskLookup::Found(entry.task.clone()),
            None => TaskLookup::Unknown,
        }
    }

    /// Record the session a task was sent on.
    pub fn attach_session(&self, id: &TaskId, session: SessionId) -> bool {
        match self.lock().get_mut(id) {
            Some(entry) => {
                entry.task.session_id = Some(session);
                true
            }
            None => false,
        }
    }

    /// Drop every task dispatched on a session other than `current`.
    /// Tasks not yet attached to a session are kept.
    pub fn clear_other_sessions(&self, current: &SessionId) -> usize {
        let mut tasks = self.lock();
        let before = tasks.len();
        tasks.retain(|_, entry| entry.task.session_id.as_ref().is_none_or(|s| s == current));
        let removed = before - tasks.len();
        if removed > 0 {
            debug!(session = %current, removed, "cleared tasks of previous bridge sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self, tasks: &mut HashMap<TaskId, Entry>) {
        let Some(retention) = self.retention else {
            return;
        };
        tasks.retain(|_, entry| entry.finished.is_none_or(|at| at.elapsed() < retention));
    }
}
