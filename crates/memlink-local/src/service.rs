// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The local memory service: what callers use instead of the cloud API.

use std::path::PathBuf;
use std::sync::Arc;

use memlink_bridge::{BridgeOp, BridgeSupervisor};
use memlink_config::model::{MemlinkConfig, ServiceConfig};
use memlink_core::{MemlinkError, ModelCatalog, ModelKind, ModelListing, ResolvedCredential, SessionId};
use memlink_profile::{HostLayout, ProfileResolver, ProfilesSummary};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::OpenAiCompatibleCatalog;
use crate::models::ModelListingCache;
use crate::payload::{base_payload, memorize_payload, normalize_conversation};
use crate::tasks::{TaskId, TaskLookup, TaskStatus, TaskStore};

/// Why a memorize request was refused before reaching the worker.
#[derive(Debug, Error)]
pub enum DispatchRejection {
    #[error("connection profile `{0}` not found")]
    ProfileNotFound(String),

    #[error("{message}")]
    IncompleteCredential { profile: String, message: String },

    #[error("conversation is empty after normalization")]
    EmptyConversation,
}

/// Worker liveness as reported to callers.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeHealth {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Extra fields of the worker's health response.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
    pub stderr_tail: Vec<String>,
}

pub struct LocalMemoryService {
    service: ServiceConfig,
    resolver: ProfileResolver,
    bridge: Arc<BridgeSupervisor>,
    tasks: Arc<TaskStore>,
    models: ModelListingCache,
    catalog: Arc<dyn ModelCatalog>,
}

impl LocalMemoryService {
    pub fn new(
        service: ServiceConfig,
        resolver: ProfileResolver,
        bridge: Arc<BridgeSupervisor>,
        catalog: Arc<dyn ModelCatalog>,
        tasks: TaskStore,
        models: ModelListingCache,
    ) -> Self {
        Self {
            service,
            resolver,
            bridge,
            tasks: Arc::new(tasks),
            models,
            catalog,
        }
    }

    /// Assemble the service with the HTTP model catalog and a process-backed bridge.
    pub fn from_config(config: &MemlinkConfig) -> Result<Self, MemlinkError> {
        let host = HostLayout::new(PathBuf::from(&config.host.data_root), config.host.user_dirs.clone());
        let catalog = OpenAiCompatibleCatalog::new(config.models.request_timeout())?;
        Ok(Self::new(
            config.service.clone(),
            ProfileResolver::new(host),
            Arc::new(BridgeSupervisor::from_config(&config.bridge)),
            Arc::new(catalog),
            TaskStore::new(config.tasks.retention()),
            ModelListingCache::new(config.models.cache_ttl()),
        ))
    }

    pub fn bridge(&self) -> &Arc<BridgeSupervisor> {
        &self.bridge
    }

    pub async fn resolve_profile_credentials(&self, profile_id: &str) -> Option<ResolvedCredential> {
        self.resolver.resolve_profile_credentials(profile_id).await
    }

    pub async fn connection_profiles_summary(&self) -> ProfilesSummary {
        self.resolver.connection_profiles_summary().await
    }

    /// Models offered by a profile's endpoint, served from cache within the TTL.
    pub async fn list_models_for_profile(
        &self,
        profile_id: &str,
        kind: ModelKind,
        force: bool,
    ) -> Arc<ModelListing> {
        self.models
            .get_or_fetch(kind, profile_id, force, move || self.fetch_models(profile_id, kind))
            .await
    }

    async fn fetch_models(&self, profile_id: &str, kind: ModelKind) -> ModelListing {
        let Some(credential) = self.resolver.resolve_profile_credentials(profile_id).await else {
            return ModelListing::failure(format!("connection profile `{profile_id}` not found"));
        };
        // A model is not needed to list models.
        let missing: Vec<&str> = credential
            .missing_fields()
            .into_iter()
            .filter(|field| *field != memlink_core::types::FIELD_MODEL)
            .collect();
        if !missing.is_empty() {
            return ModelListing::failure(format!(
                "connection profile `{profile_id}` is missing: {}",
                missing.join(", ")
            ));
        }
        match self.catalog.list_models(&credential, kind).await {
            Ok(models) => ModelListing::success(models),
            Err(e) => {
                warn!(profile = profile_id, %kind, error = %e, "model listing failed");
                ModelListing::failure(e.to_string())
            }
        }
    }

    /// Resolve the chat profile (and the embedding profile, if configured)
    /// and build the common payload.
    async fn payload(&self) -> Result<Value, DispatchRejection> {
        let llm = self.resolve_complete(&self.service.llm_profile).await?;
        let embedding = match &self.service.embedding_profile {
            Some(id) => Some(self.resolve_complete(id).await?),
            None => None,
        };
        Ok(base_payload(&self.service, &llm, embedding.as_ref()))
    }

    async fn resolve_complete(&self, profile_id: &str) -> Result<ResolvedCredential, DispatchRejection> {
        let credential = self
            .resolver
            .resolve_profile_credentials(profile_id)
            .await
            .ok_or_else(|| DispatchRejection::ProfileNotFound(profile_id.to_string()))?;
        if !credential.ok {
            return Err(DispatchRejection::IncompleteCredential {
                profile: profile_id.to_string(),
                message: credential.message.unwrap_or_default(),
            });
        }
        Ok(credential)
    }

    /// Queue a conversation for memorization and return its task id at once.
    ///
    /// The worker call runs in the background; poll with [`Self::task_status`].
    pub async fn dispatch_memorize(
        &self,
        user_id: &str,
        agent_id: &str,
        conversation: &Value,
    ) -> Result<TaskId, DispatchRejection> {
        let messages = normalize_conversation(conversation);
        if messages.is_empty() {
            return Err(DispatchRejection::EmptyConversation);
        }
        let payload = memorize_payload(self.payload().await?, &messages, user_id, agent_id);

        let task_id = self.tasks.create(None);
        info!(task = %task_id, user = user_id, agent = agent_id, messages = messages.len(), "memorize dispatched");

        let bridge = Arc::clone(&self.bridge);
        let tasks = Arc::clone(&self.tasks);
        let id = task_id.clone();
        tokio::spawn(async move {
            let session = match bridge.ensure_running().await {
                Ok(session) => session,
                Err(e) => {
                    tasks.fail(&id, e.to_string());
                    return;
                }
            };
            tasks.attach_session(&id, session.id().clone());
            tasks.clear_other_sessions(session.id());
            tasks.set_status(&id, TaskStatus::Processing, None);

            match session.call(BridgeOp::Memorize, Some(payload)).await {
                Ok(response) => {
                    tasks.complete(&id, response.result().cloned());
                }
                Err(e) => {
                    warn!(task = %id, error = %e, "memorize failed");
                    tasks.fail(&id, e.to_string());
                }
            }
        });

        Ok(task_id)
    }

    pub fn task_status(&self, task_id: &TaskId) -> TaskLookup {
        if let Some(current) = self.bridge.session_id() {
            self.tasks.clear_other_sessions(&current);
        }
        self.tasks.get(task_id)
    }

    /// Ask the worker for its health, starting it if needed.
    pub async fn bridge_health(&self) -> BridgeHealth {
        let payload = match self.payload().await {
            Ok(payload) => Some(payload),
            Err(e) => {
                debug!(error = %e, "health check without model profiles");
                None
            }
        };

        let outcome = self.bridge.call(BridgeOp::Health, payload).await;
        let session_id = self.bridge.session_id();
        let stderr_tail = self.bridge.stderr_tail();
        match outcome {
            Ok(response) => BridgeHealth {
                ok: true,
                session_id,
                error: None,
                details: response.extra,
                stderr_tail,
            },
            Err(e) => BridgeHealth {
                ok: false,
                session_id,
                error: Some(e.to_string()),
                details: Map::new(),
                stderr_tail,
            },
        }
    }

    /// Memory categories known to the worker.
    pub async fn list_categories(&self) -> Result<Value, MemlinkError> {
        let payload = self
            .payload()
            .await
            .map_err(|e| MemlinkError::Profile(e.to_string()))?;
        let response = self.bridge.call(BridgeOp::ListCategories, Some(payload)).await?;
        Ok(response.result().cloned().unwrap_or(Value::Null))
    }

    pub async fn shutdown(&self) {
        self.bridge.shutdown().await;
    }
}
