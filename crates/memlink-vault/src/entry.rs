// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret entries as stored under one vault bucket.
//!
//! A bucket holds a raw string, a single `{id, value, label, active}` record,
//! or an array of such records (several keys for one provider).

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

/// One stored key with its metadata.
#[derive(Debug, Clone)]
pub struct SecretRecord {
    pub id: Option<String>,
    pub value: SecretString,
    pub label: Option<String>,
    pub active: bool,
}

impl SecretRecord {
    fn from_object(map: &serde_json::Map<String, Value>) -> Self {
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            id: text("id"),
            value: SecretString::from(text("value").unwrap_or_default()),
            label: text("label"),
            active: map.get("active").and_then(Value::as_bool).unwrap_or(false),
        }
    }

    /// The trimmed value, if non-empty.
    pub fn usable_value(&self) -> Option<SecretString> {
        non_empty(self.value.expose_secret())
    }
}

/// The content of one vault bucket.
#[derive(Debug, Clone)]
pub enum SecretEntry {
    Raw(SecretString),
    Keyed(SecretRecord),
    Rotation(Vec<SecretRecord>),
}

impl SecretEntry {
    /// Interpret a JSON value as a bucket entry. Numbers, booleans and nulls
    /// are not secrets and yield `None`; non-object array elements are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(SecretEntry::Raw(SecretString::from(s.clone()))),
            Value::Object(map) => Some(SecretEntry::Keyed(SecretRecord::from_object(map))),
            Value::Array(items) => Some(SecretEntry::Rotation(
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(SecretRecord::from_object)
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Generic extraction rule: array → active entry, else first entry with a
    /// value; object → its value; string → itself. Always trimmed.
    pub fn extract(&self) -> Option<SecretString> {
        match self {
            SecretEntry::Raw(value) => non_empty(value.expose_secret()),
            SecretEntry::Keyed(record) => record.usable_value(),
            SecretEntry::Rotation(records) => records
                .iter()
                .filter(|r| r.active)
                .find_map(SecretRecord::usable_value)
                .or_else(|| records.iter().find_map(SecretRecord::usable_value)),
        }
    }

    /// The value of the record whose own `id` equals `secret_id`.
    pub fn find_by_id(&self, secret_id: &str) -> Option<SecretString> {
        match self {
            SecretEntry::Raw(_) => None,
            SecretEntry::Keyed(record) => (record.id.as_deref() == Some(secret_id))
                .then(|| record.usable_value())
                .flatten(),
            SecretEntry::Rotation(records) => records
                .iter()
                .filter(|r| r.id.as_deref() == Some(secret_id))
                .find_map(SecretRecord::usable_value),
        }
    }

    /// Number of stored records (a raw string counts as one).
    pub fn len(&self) -> usize {
        match self {
            SecretEntry::Raw(_) | SecretEntry::Keyed(_) => 1,
            SecretEntry::Rotation(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn non_empty(value: &str) -> Option<SecretString> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| SecretString::from(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expose(secret: Option<SecretString>) -> Option<String> {
        secret.map(|s| s.expose_secret().to_string())
    }

    #[test]
    fn raw_string_is_trimmed() {
        let entry = SecretEntry::from_value(&json!("  sk-raw \n")).unwrap();
        assert_eq!(expose(entry.extract()).as_deref(), Some("sk-raw"));
    }

    #[test]
    fn blank_raw_string_is_unusable() {
        let entry = SecretEntry::from_value(&json!("   ")).unwrap();
        assert!(entry.extract().is_none());
    }

    #[test]
    fn rotation_prefers_active_record() {
        let entry = SecretEntry::from_value(&json!([
            {"id": "a", "value": "k1", "active": false},
            {"id": "b", "value": "k2", "active": true}
        ]))
        .unwrap();
        assert_eq!(expose(entry.extract()).as_deref(), Some("k2"));
        assert_eq!(entry.len(), 2);
    }

    #[test]
    fn rotation_falls_back_to_first_with_value() {
        let entry = SecretEntry::from_value(&json!([
            {"id": "a", "value": ""},
            {"id": "b", "value": "k2"},
            {"id": "c", "value": "k3"}
        ]))
        .unwrap();
        assert_eq!(expose(entry.extract()).as_deref(), Some("k2"));
    }

    #[test]
    fn active_record_without_value_is_skipped() {
        let entry = SecretEntry::from_value(&json!([
            {"id": "a", "value": "k1"},
            {"id": "b", "value": " ", "active": true}
        ]))
        .unwrap();
        assert_eq!(expose(entry.extract()).as_deref(), Some("k1"));
    }

    #[test]
    fn find_by_id_ignores_active_flag() {
        let entry = SecretEntry::from_value(&json!([
            {"id": "a", "value": "k1", "active": false},
            {"id": "b", "value": "k2", "active": true}
        ]))
        .unwrap();
        assert_eq!(expose(entry.find_by_id("a")).as_deref(), Some("k1"));
        assert!(entry.find_by_id("zzz").is_none());
    }

    #[test]
    fn keyed_object_matches_its_own_id() {
        let entry =
            SecretEntry::from_value(&json!({"id": "x", "value": "kx", "label": "main"})).unwrap();
        assert_eq!(expose(entry.find_by_id("x")).as_deref(), Some("kx"));
        assert_eq!(expose(entry.extract()).as_deref(), Some("kx"));
    }

    #[test]
    fn non_secret_values_are_ignored() {
        assert!(SecretEntry::from_value(&json!(42)).is_none());
        assert!(SecretEntry::from_value(&json!(null)).is_none());
        let mixed = SecretEntry::from_value(&json!(["loose", {"value": "k"}])).unwrap();
        assert_eq!(mixed.len(), 1);
    }
}
