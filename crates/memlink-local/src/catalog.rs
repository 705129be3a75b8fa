// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model listing over the OpenAI-compatible `GET {base_url}/models` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use memlink_core::{MemlinkError, ModelCatalog, ModelKind, ResolvedCredential};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::debug;

pub struct OpenAiCompatibleCatalog {
    client: reqwest::Client,
}

impl OpenAiCompatibleCatalog {
    pub fn new(timeout: Duration) -> Result<Self, MemlinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MemlinkError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ModelCatalog for OpenAiCompatibleCatalog {
    async fn list_models(
        &self,
        credential: &ResolvedCredential,
        kind: ModelKind,
    ) -> Result<Vec<String>, MemlinkError> {
        let url = format!("{}/models", credential.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| MemlinkError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, url = %url, "model listing response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemlinkError::Provider {
                message: format!("model listing returned {status}: {}", body.trim()),
                source: None,
            });
        }

        let body: Value = response.json().await.map_err(|e| MemlinkError::Provider {
            message: format!("model listing is not valid JSON: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(filter_by_kind(parse_model_ids(&body), kind))
    }
}

/// Accepts `{data:[{id}]}`, `{models:[{id}|{name}]}`, or a bare array of
/// strings or objects.
pub fn parse_model_ids(body: &Value) -> Vec<String> {
    let items = body
        .get("data")
        .or_else(|| body.get("models"))
        .unwrap_or(body)
        .as_array();

    items
        .into_iter()
        .flatten()
        .filter_map(|item| match item {
            Value::String(id) => Some(id.clone()),
            Value::Object(map) => map
                .get("id")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Embedding listings keep ids mentioning "embed"; chat listings drop them.
pub fn filter_by_kind(ids: Vec<String>, kind: ModelKind) -> Vec<String> {
    ids.into_iter()
        .filter(|id| {
            let is_embedding = id.to_ascii_lowercase().contains("embed");
            match kind {
                ModelKind::Embedding => is_embedding,
                ModelKind::Llm => !is_embedding,
            }
        })
        .collect()
}
