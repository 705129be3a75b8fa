// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical connection profiles built from heterogeneous host records.

use secrecy::SecretString;
use serde::Serialize;
use serde_json::{Map, Value};

pub const PROVIDER_KEYS: &[&str] = &[
    "provider",
    "api",
    "apiType",
    "api_type",
    "chat_completion_source",
    "source",
];
pub const BASE_URL_KEYS: &[&str] = &[
    "baseUrl",
    "base_url",
    "apiUrl",
    "api_url",
    "api-url",
    "url",
    "endpoint",
    "server_url",
];
pub const MODEL_KEYS: &[&str] = &["model", "modelId", "model_id", "modelName", "model_name"];
pub const SECRET_ID_KEYS: &[&str] = &["secretId", "secret_id", "secret-id", "apiKeyId", "api_key_id"];
pub const INLINE_KEY_KEYS: &[&str] = &["apiKey", "api_key", "api-key", "key"];

/// A connection profile with field names normalized.
///
/// Empty strings mean "not set". The provider tag is lower-cased.
#[derive(Debug, Clone)]
pub struct ConnectionProfile {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub secret_id: Option<String>,
    pub api_key_inline: Option<SecretString>,
}

impl ConnectionProfile {
    /// Normalize a discovered record. Returns `None` without a string `id`.
    pub fn from_record(map: &Map<String, Value>) -> Option<Self> {
        let id = map.get("id").and_then(Value::as_str)?.trim().to_string();
        if id.is_empty() {
            return None;
        }
        let name = map
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&id)
            .to_string();

        Some(Self {
            provider: first_non_empty(map, PROVIDER_KEYS)
                .unwrap_or_default()
                .to_ascii_lowercase(),
            base_url: first_non_empty(map, BASE_URL_KEYS).unwrap_or_default(),
            model: first_non_empty(map, MODEL_KEYS).unwrap_or_default(),
            secret_id: first_non_empty(map, SECRET_ID_KEYS),
            api_key_inline: first_non_empty(map, INLINE_KEY_KEYS).map(SecretString::from),
            id,
            name,
        })
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// First synonym holding a non-empty string, trimmed.
fn first_non_empty(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// `{id, name}` pair listed to callers choosing a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
}

/// Result of listing the discoverable profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilesSummary {
    pub ok: bool,
    pub profiles: Vec<ProfileSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProfilesSummary {
    pub fn from_profiles(profiles: &[ConnectionProfile]) -> Self {
        if profiles.is_empty() {
            return Self {
                ok: false,
                profiles: Vec::new(),
                message: Some("no connection profiles found in host settings".to_string()),
            };
        }
        Self {
            ok: true,
            profiles: profiles.iter().map(ConnectionProfile::summary).collect(),
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;

    fn profile(value: Value) -> ConnectionProfile {
        ConnectionProfile::from_record(value.as_object().unwrap()).unwrap()
    }

    #[test]
    fn synonyms_follow_priority_order() {
        let p = profile(json!({
            "id": "a",
            "name": "A",
            "api": "OpenAI",
            "chat_completion_source": "groq",
            "url": "http://fallback",
            "base_url": "http://primary",
            "model_name": "later",
            "modelId": "earlier"
        }));
        assert_eq!(p.provider, "openai");
        assert_eq!(p.base_url, "http://primary");
        assert_eq!(p.model, "earlier");
    }

    #[test]
    fn blank_synonym_does_not_shadow_later_one() {
        let p = profile(json!({
            "id": "a", "name": "A",
            "baseUrl": "  ",
            "endpoint": "http://endpoint",
            "secretId": "",
            "api_key_id": "sec-1"
        }));
        assert_eq!(p.base_url, "http://endpoint");
        assert_eq!(p.secret_id.as_deref(), Some("sec-1"));
    }

    #[test]
    fn inline_key_is_captured() {
        let p = profile(json!({"id": "a", "name": "A", "api-key": " sk-inline "}));
        assert_eq!(p.api_key_inline.unwrap().expose_secret(), "sk-inline");
    }

    #[test]
    fn empty_summary_is_not_ok() {
        let summary = ProfilesSummary::from_profiles(&[]);
        assert!(!summary.ok);
        assert!(summary.message.is_some());
    }
}
