// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker payloads and chat conversation normalization.

use memlink_config::model::ServiceConfig;
use memlink_core::ResolvedCredential;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Roles the worker never sees.
const DROPPED_ROLES: &[&str] = &["system", "tool", "function"];

/// Keys tried, in order, when message content is an object.
const CONTENT_TEXT_KEYS: &[&str] = &["text", "content", "value"];

/// Keys naming the speaker of a message with a non-standard role.
const SPEAKER_KEYS: &[&str] = &["name", "speaker", "author"];

/// One message as the worker expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
}

/// Normalize host chat messages into `{role, content}` pairs.
///
/// System, tool and function messages are dropped, as are messages whose
/// content flattens to blank text. Roles other than user/assistant become
/// `user`, with the speaker's name prefixed to the content.
pub fn normalize_conversation(conversation: &Value) -> Vec<ConversationMessage> {
    let Some(messages) = conversation.as_array() else {
        return Vec::new();
    };

    messages
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|message| {
            let role = message
                .get("role")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if DROPPED_ROLES.contains(&role.as_str()) {
                return None;
            }

            let mut content = content_text(message.get("content"));
            if content.trim().is_empty() {
                return None;
            }

            let role = if role == "user" || role == "assistant" {
                role
            } else {
                let speaker = SPEAKER_KEYS
                    .iter()
                    .filter_map(|key| message.get(*key).and_then(Value::as_str))
                    .map(str::trim)
                    .find(|name| !name.is_empty());
                if let Some(name) = speaker {
                    content = format!("{name}: {content}");
                }
                "user".to_string()
            };

            Some(ConversationMessage {
                role,
                content,
                created_at: message.get("created_at").cloned(),
            })
        })
        .collect()
}

fn content_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Object(map)) => CONTENT_TEXT_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                Value::Object(map) => map.get("text").and_then(Value::as_str),
                _ => None,
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
        Some(other) => other.to_string(),
    }
}

/// OpenAI SDK clients expect the base URL to end in `/v1`; `/api/v1` is kept as is.
pub fn normalize_openai_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() || url.ends_with("/v1") || url.ends_with("/api/v1") {
        return url.to_string();
    }
    format!("{url}/v1")
}

fn profile_entry(credential: &ResolvedCredential, model_key: &str) -> Value {
    let base_url = if credential.provider == "openai" {
        normalize_openai_base_url(&credential.base_url)
    } else {
        credential.base_url.clone()
    };
    let mut entry = Map::new();
    entry.insert("provider".into(), json!(credential.provider));
    entry.insert("base_url".into(), json!(base_url));
    entry.insert("api_key".into(), json!(credential.api_key.expose_secret()));
    entry.insert(model_key.into(), json!(credential.model));
    entry.insert("client_backend".into(), json!("sdk"));
    Value::Object(entry)
}

/// The payload every operation carries: model profiles, storage locations,
/// and the key the worker caches its memory service under.
pub fn base_payload(
    service: &ServiceConfig,
    llm: &ResolvedCredential,
    embedding: Option<&ResolvedCredential>,
) -> Value {
    let mut profiles = Map::new();
    profiles.insert("default".into(), profile_entry(llm, "chat_model"));
    if let Some(embedding) = embedding {
        profiles.insert("embedding".into(), profile_entry(embedding, "embed_model"));
    }

    json!({
        "service_key": service.service_key,
        "llm_profiles": profiles,
        "blob_config": {"resources_dir": service.resources_dir},
        "database_config": {
            "metadata_store": {"provider": service.metadata_store}
        },
    })
}

/// Extend a base payload with a normalized conversation and its owner.
pub fn memorize_payload(
    mut base: Value,
    conversation: &[ConversationMessage],
    user_id: &str,
    agent_id: &str,
) -> Value {
    if let Some(map) = base.as_object_mut() {
        map.insert("conversation".into(), json!(conversation));
        map.insert("user".into(), json!({"user_id": user_id, "agent_id": agent_id}));
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn credential(provider: &str, base_url: &str) -> ResolvedCredential {
        ResolvedCredential::from_parts(
            "test",
            provider.into(),
            base_url.into(),
            "model-x".into(),
            Some(SecretString::from("sk-test-0123456789")),
        )
    }

    #[test]
    fn openai_urls_gain_v1() {
        assert_eq!(normalize_openai_base_url("http://localhost:8080/"), "http://localhost:8080/v1");
        assert_eq!(normalize_openai_base_url("https://api.openai.com/v1"), "https://api.openai.com/v1");
        assert_eq!(normalize_openai_base_url("https://nano-gpt.com/api/v1/"), "https://nano-gpt.com/api/v1");
        assert_eq!(normalize_openai_base_url("  "), "");
    }

    #[test]
    fn conversation_drops_and_flattens() {
        let raw = json!([
            {"role": "system", "content": "you are helpful"},
            {"role": "User", "content": "hello", "created_at": "2026-01-01T00:00:00Z"},
            {"role": "assistant", "content": {"text": "hi there"}},
            {"role": "assistant", "content": ["part one", {"text": "part two"}, {"image": "x"}]},
            {"role": "tool", "content": "{}"},
            {"role": "user", "content": "   "},
            "not an object"
        ]);
        let normalized = normalize_conversation(&raw);
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0].role, "user");
        assert_eq!(normalized[0].created_at, Some(json!("2026-01-01T00:00:00Z")));
        assert_eq!(normalized[1].content, "hi there");
        assert_eq!(normalized[2].content, "part one\npart two");
    }

    #[test]
    fn unknown_roles_become_named_user_messages() {
        let raw = json!([
            {"role": "participant", "speaker": "Alice", "content": "hey all"},
            {"content": "anonymous"}
        ]);
        let normalized = normalize_conversation(&raw);
        assert_eq!(normalized[0].role, "user");
        assert_eq!(normalized[0].content, "Alice: hey all");
        assert_eq!(normalized[1].content, "anonymous");
        assert!(normalized[1].created_at.is_none());
    }

    #[test]
    fn object_content_without_text_is_serialized() {
        let raw = json!([{"role": "user", "content": {"foo": 1}}]);
        assert_eq!(normalize_conversation(&raw)[0].content, r#"{"foo":1}"#);
    }

    #[test]
    fn non_array_conversation_is_empty() {
        assert!(normalize_conversation(&json!({"role": "user"})).is_empty());
    }

    #[test]
    fn base_payload_shape() {
        let service = ServiceConfig {
            service_key: "st".into(),
            resources_dir: "/tmp/res".into(),
            ..ServiceConfig::default()
        };
        let payload = base_payload(
            &service,
            &credential("openai", "http://127.0.0.1:5001"),
            Some(&credential("custom", "http://embed:9000")),
        );
        assert_eq!(payload["service_key"], "st");
        assert_eq!(payload["blob_config"]["resources_dir"], "/tmp/res");
        assert_eq!(payload["database_config"]["metadata_store"]["provider"], "inmemory");

        let default = &payload["llm_profiles"]["default"];
        assert_eq!(default["base_url"], "http://127.0.0.1:5001/v1");
        assert_eq!(default["api_key"], "sk-test-0123456789");
        assert_eq!(default["chat_model"], "model-x");
        assert_eq!(default["client_backend"], "sdk");

        let embedding = &payload["llm_profiles"]["embedding"];
        assert_eq!(embedding["base_url"], "http://embed:9000");
        assert_eq!(embedding["embed_model"], "model-x");
    }

    #[test]
    fn memorize_payload_adds_conversation_and_user() {
        let messages = vec![ConversationMessage {
            role: "user".into(),
            content: "hi".into(),
            created_at: None,
        }];
        let payload = memorize_payload(json!({"service_key": "k"}), &messages, "u1", "a1");
        assert_eq!(payload["conversation"][0]["content"], "hi");
        assert_eq!(payload["user"]["agent_id"], "a1");
        assert_eq!(payload["service_key"], "k");
    }
}
