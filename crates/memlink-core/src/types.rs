// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the resolver, the bridge, and the local service.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use strum::{Display, EnumString};

/// Identifier of one worker process lifetime. Regenerated on every spawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which family of models a listing refers to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Chat / completion models.
    Llm,
    /// Embedding models.
    Embedding,
}

/// Field names reported when a credential is incomplete.
pub const FIELD_BASE_URL: &str = "base_url";
pub const FIELD_MODEL: &str = "model";
pub const FIELD_API_KEY: &str = "api_key";

/// A connection profile joined with its API key.
///
/// `ok` is true iff `base_url`, `model`, and `api_key` are all non-empty. An
/// incomplete credential still carries whatever values were found so callers
/// can render diagnostics.
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub ok: bool,
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key: SecretString,
    pub message: Option<String>,
}

impl ResolvedCredential {
    /// Build a credential from resolved parts, computing `ok` and `message`.
    ///
    /// `label` names the profile in the failure message.
    pub fn from_parts(
        label: &str,
        provider: String,
        base_url: String,
        model: String,
        api_key: Option<SecretString>,
    ) -> Self {
        let api_key = api_key.unwrap_or_else(|| SecretString::from(String::new()));
        let mut credential = Self {
            ok: false,
            provider,
            base_url,
            model,
            api_key,
            message: None,
        };
        let missing = credential.missing_fields();
        if missing.is_empty() {
            credential.ok = true;
        } else {
            credential.message = Some(format!(
                "connection profile `{label}` is missing: {}",
                missing.join(", ")
            ));
        }
        credential
    }

    /// Names of the required fields that are empty, in canonical order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.base_url.trim().is_empty() {
            missing.push(FIELD_BASE_URL);
        }
        if self.model.trim().is_empty() {
            missing.push(FIELD_MODEL);
        }
        if self.api_key.expose_secret().trim().is_empty() {
            missing.push(FIELD_API_KEY);
        }
        missing
    }
}

/// Serialized form is for diagnostics: the API key is masked.
impl Serialize for ResolvedCredential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResolvedCredential", 6)?;
        state.serialize_field("ok", &self.ok)?;
        state.serialize_field("provider", &self.provider)?;
        state.serialize_field("baseUrl", &self.base_url)?;
        state.serialize_field("model", &self.model)?;
        let key = self.api_key.expose_secret();
        let masked = if key.is_empty() {
            String::new()
        } else {
            mask_secret(key)
        };
        state.serialize_field("apiKey", &masked)?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

/// Mask a secret value for display: "sk-ant-api03-abc...xyz" format.
///
/// Shows prefix (up to 4 chars) and suffix (up to 4 chars) with "..." in between.
/// Short values (< 10 chars) are fully masked as "****".
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// Result of a model listing, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelListing {
    pub ok: bool,
    pub models: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ModelListing {
    /// A successful listing; ids are deduplicated and sorted.
    pub fn success(models: Vec<String>) -> Self {
        Self {
            ok: true,
            models: normalize_model_ids(models),
            message: None,
        }
    }

    /// A failed listing carrying a message for the caller.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            models: Vec::new(),
            message: Some(message.into()),
        }
    }
}

/// Trim, drop empties, deduplicate, and sort model identifiers ascending.
pub fn normalize_model_ids(models: Vec<String>) -> Vec<String> {
    let mut ids: Vec<String> = models
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}
