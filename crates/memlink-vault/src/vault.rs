// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The host secret vault: a flat JSON document of named buckets.
//!
//! Buckets follow the `api_key_<provider>` naming convention. The vault is
//! read-only here; the host application owns the file.

use std::collections::BTreeMap;
use std::path::Path;

use memlink_core::MemlinkError;
use serde_json::Value;
use tracing::debug;

use crate::entry::SecretEntry;

/// Bucket name prefix for provider API keys.
pub const API_KEY_PREFIX: &str = "api_key_";

/// File name of the vault inside a host user directory.
pub const SECRETS_FILE: &str = "secrets.json";

/// An in-memory snapshot of a host vault.
///
/// Debug output lists bucket names only.
#[derive(Clone, Default)]
pub struct SecretVault {
    buckets: BTreeMap<String, SecretEntry>,
}

impl std::fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVault")
            .field("buckets", &self.buckets.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SecretVault {
    /// Build a vault from a parsed JSON document. Non-object documents are rejected.
    pub fn from_json(document: &Value) -> Result<Self, MemlinkError> {
        let map = document
            .as_object()
            .ok_or_else(|| MemlinkError::Vault("secret vault must be a JSON object".to_string()))?;
        let buckets = map
            .iter()
            .filter_map(|(name, value)| SecretEntry::from_value(value).map(|e| (name.clone(), e)))
            .collect();
        Ok(Self { buckets })
    }

    /// Read a vault file. A missing file is not an error and yields `None`.
    pub async fn load(path: &Path) -> Result<Option<Self>, MemlinkError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no secret vault");
                return Ok(None);
            }
            Err(e) => {
                return Err(MemlinkError::Vault(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        let document: Value = serde_json::from_str(&content).map_err(|e| {
            MemlinkError::Vault(format!("{} is not valid JSON: {e}", path.display()))
        })?;
        let vault = Self::from_json(&document)?;
        debug!(path = %path.display(), buckets = vault.len(), "secret vault loaded");
        Ok(Some(vault))
    }

    /// Merge `other` into `self`. Buckets already present are kept.
    pub fn merge_first_wins(&mut self, other: SecretVault) {
        for (name, entry) in other.buckets {
            self.buckets.entry(name).or_insert(entry);
        }
    }

    pub fn get(&self, bucket: &str) -> Option<&SecretEntry> {
        self.buckets.get(bucket)
    }

    /// Iterate buckets in name order.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &SecretEntry)> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.keys().cloned().collect()
    }

    /// Buckets following the `api_key_*` convention, in name order.
    pub fn api_key_buckets(&self) -> impl Iterator<Item = (&str, &SecretEntry)> {
        self.buckets().filter(|(name, _)| name.starts_with(API_KEY_PREFIX))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn from_json_rejects_arrays() {
        let err = SecretVault::from_json(&json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn api_key_buckets_filter_by_prefix() {
        let vault = SecretVault::from_json(&json!({
            "api_key_openai": "k1",
            "api_key_nanogpt": "k2",
            "oauth_token": "t"
        }))
        .unwrap();
        let names: Vec<&str> = vault.api_key_buckets().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["api_key_nanogpt", "api_key_openai"]);
        assert_eq!(vault.len(), 3);
    }

    #[test]
    fn merge_keeps_first_bucket() {
        let mut first = SecretVault::from_json(&json!({"api_key_openai": "first"})).unwrap();
        let second = SecretVault::from_json(&json!({
            "api_key_openai": "second",
            "api_key_groq": "g"
        }))
        .unwrap();
        first.merge_first_wins(second);

        let openai = first.get("api_key_openai").unwrap().extract().unwrap();
        assert_eq!(openai.expose_secret(), "first");
        assert!(first.get("api_key_groq").is_some());
    }

    #[test]
    fn debug_does_not_leak_values() {
        let vault = SecretVault::from_json(&json!({"api_key_openai": "sk-very-secret"})).unwrap();
        let rendered = format!("{vault:?}");
        assert!(rendered.contains("api_key_openai"));
        assert!(!rendered.contains("sk-very-secret"));
    }

    #[tokio::test]
    async fn load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let vault = SecretVault::load(&dir.path().join(SECRETS_FILE)).await.unwrap();
        assert!(vault.is_none());
    }

    #[tokio::test]
    async fn load_invalid_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SECRETS_FILE);
        tokio::fs::write(&path, "{not json").await.unwrap();
        let err = SecretVault::load(&path).await.unwrap_err();
        assert!(matches!(err, MemlinkError::Vault(_)));
    }
}
