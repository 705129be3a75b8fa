// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model catalog for deterministic cache tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use memlink_core::{MemlinkError, ModelCatalog, ModelKind, ResolvedCredential};
use tokio::sync::Mutex;

type Reply = Result<Vec<String>, String>;

/// A catalog that pops queued replies and counts lookups.
///
/// When the queue is empty, `["mock-model"]` is returned.
#[derive(Clone, Default)]
pub struct MockCatalog {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    calls: Arc<AtomicUsize>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(models: &[&str]) -> Self {
        let catalog = Self::new();
        catalog
            .replies
            .try_lock()
            .expect("fresh catalog")
            .push_back(Ok(models.iter().map(|m| m.to_string()).collect()));
        catalog
    }

    pub async fn push_models(&self, models: &[&str]) {
        self.replies
            .lock()
            .await
            .push_back(Ok(models.iter().map(|m| m.to_string()).collect()));
    }

    pub async fn push_failure(&self, message: &str) {
        self.replies.lock().await.push_back(Err(message.to_string()));
    }

    /// Number of `list_models` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelCatalog for MockCatalog {
    async fn list_models(
        &self,
        _credential: &ResolvedCredential,
        _kind: ModelKind,
    ) -> Result<Vec<String>, MemlinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().await.pop_front() {
            Some(Ok(models)) => Ok(models),
            Some(Err(message)) => Err(MemlinkError::Provider {
                message,
                source: None,
            }),
            None => Ok(vec!["mock-model".to_string()]),
        }
    }
}
