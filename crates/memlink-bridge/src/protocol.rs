// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types of the worker protocol: one JSON object per line in each direction.

use memlink_core::MemlinkError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use tracing::debug;
use uuid::Uuid;

/// Operations the worker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BridgeOp {
    Health,
    Memorize,
    ListCategories,
}

/// A request line. Field order is part of the wire format: `id` comes first.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeRequest {
    pub id: String,
    pub op: BridgeOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl BridgeRequest {
    /// A request with a fresh v4 UUID.
    pub fn new(op: BridgeOp, payload: Option<Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            op,
            payload,
        }
    }

    /// Serialized request including the trailing newline.
    pub fn to_line(&self) -> Result<String, MemlinkError> {
        let mut line = serde_json::to_string(self)
            .map_err(|e| MemlinkError::Internal(format!("cannot serialize bridge request: {e}")))?;
        line.push('\n');
        Ok(line)
    }
}

/// A response line. Fields beyond `id`, `ok`, `op`, `error` are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BridgeResponse {
    pub id: String,
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BridgeResponse {
    /// The `result` value, when the worker sent one.
    pub fn result(&self) -> Option<&Value> {
        self.extra.get("result")
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Parse one output line. Blank and malformed lines yield `None`.
pub fn parse_line(line: &str) -> Option<BridgeResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<BridgeResponse>(line) {
        Ok(response) => Some(response),
        Err(e) => {
            debug!(error = %e, len = line.len(), "dropping malformed worker line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn request_serializes_id_first() {
        let request = BridgeRequest::new(BridgeOp::ListCategories, Some(json!({"k": 1})));
        let line = request.to_line().unwrap();
        assert!(line.starts_with(&format!("{{\"id\":\"{}\",\"op\":\"list_categories\"", request.id)));
        assert!(line.ends_with("}\n"));
    }

    #[test]
    fn request_without_payload_omits_it() {
        let line = BridgeRequest::new(BridgeOp::Health, None).to_line().unwrap();
        assert!(!line.contains("payload"));
    }

    #[test]
    fn request_ids_are_unique() {
        let a = BridgeRequest::new(BridgeOp::Health, None);
        let b = BridgeRequest::new(BridgeOp::Health, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn response_keeps_extra_fields() {
        let response = parse_line(
            r#"{"id":"1","ok":true,"op":"health","services":2,"bridge_instance_id":"abc","result":[1]}"#,
        )
        .unwrap();
        assert!(response.ok);
        assert_eq!(response.op.as_deref(), Some("health"));
        assert_eq!(response.field("bridge_instance_id"), Some(&json!("abc")));
        assert_eq!(response.result(), Some(&json!([1])));
    }

    #[test]
    fn malformed_and_idless_lines_are_dropped() {
        assert!(parse_line("Traceback (most recent call last):").is_none());
        assert!(parse_line(r#"{"ok":false,"error":"Bad request"}"#).is_none());
        assert!(parse_line("   ").is_none());
    }

    #[test]
    fn op_names_match_worker() {
        assert_eq!(BridgeOp::ListCategories.to_string(), "list_categories");
        assert_eq!(BridgeOp::from_str("memorize").unwrap(), BridgeOp::Memorize);
    }
}
