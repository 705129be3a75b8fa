// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider credential resolution against a host vault.
//!
//! Resolution order, first usable value wins:
//! 1. explicit secret id, matched against every record in every bucket
//! 2. the provider's candidate buckets from [`PROVIDER_BUCKETS`]
//! 3. `api_key_*` buckets whose name contains the sanitized provider
//! 4. the only `api_key_*` bucket, when there is exactly one

use secrecy::SecretString;
use tracing::debug;

use crate::vault::{SecretVault, API_KEY_PREFIX};

/// Provider tag → candidate bucket names, in priority order.
pub const PROVIDER_BUCKETS: &[(&str, &[&str])] = &[
    ("openai", &["api_key_openai"]),
    ("claude", &["api_key_claude", "api_key_anthropic"]),
    ("anthropic", &["api_key_claude", "api_key_anthropic"]),
    ("openrouter", &["api_key_openrouter"]),
    ("nanogpt", &["api_key_nanogpt"]),
    ("makersuite", &["api_key_makersuite", "api_key_gemini"]),
    ("google", &["api_key_makersuite", "api_key_gemini"]),
    ("gemini", &["api_key_makersuite", "api_key_gemini"]),
    ("vertexai", &["api_key_vertexai"]),
    ("mistralai", &["api_key_mistralai"]),
    ("mistral", &["api_key_mistralai"]),
    ("groq", &["api_key_groq"]),
    ("deepseek", &["api_key_deepseek"]),
    ("xai", &["api_key_xai"]),
    ("grok", &["api_key_xai"]),
    ("cohere", &["api_key_cohere"]),
    ("perplexity", &["api_key_perplexity"]),
    ("togetherai", &["api_key_togetherai"]),
    ("together", &["api_key_togetherai"]),
    ("fireworks", &["api_key_fireworks"]),
    ("custom", &["api_key_custom"]),
];

/// Candidate buckets for a provider tag (case-insensitive), empty if unknown.
pub fn candidate_buckets(provider: &str) -> &'static [&'static str] {
    let provider = provider.trim().to_ascii_lowercase();
    PROVIDER_BUCKETS
        .iter()
        .find(|(name, _)| *name == provider)
        .map(|(_, buckets)| *buckets)
        .unwrap_or(&[])
}

/// Lower-case alphanumerics only: `"Nano-GPT"` → `"nanogpt"`.
pub fn sanitize_provider(provider: &str) -> String {
    provider
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve an API key for `provider` from `secrets`.
///
/// Returns `None` when the vault is absent or nothing usable is found. Never
/// mutates the vault.
pub fn resolve_credential(
    provider: &str,
    secrets: Option<&SecretVault>,
    secret_id: Option<&str>,
) -> Option<SecretString> {
    let vault = secrets?;

    if let Some(id) = secret_id.map(str::trim).filter(|id| !id.is_empty()) {
        if let Some(found) = vault.buckets().find_map(|(_, entry)| entry.find_by_id(id)) {
            debug!(provider, secret_id = id, "credential matched by secret id");
            return Some(found);
        }
        debug!(provider, secret_id = id, "secret id not found, falling back to provider lookup");
    }

    if let Some(found) = candidate_buckets(provider)
        .iter()
        .filter_map(|bucket| vault.get(bucket))
        .find_map(|entry| entry.extract())
    {
        return Some(found);
    }

    let sanitized = sanitize_provider(provider);
    if !sanitized.is_empty()
        && let Some(found) = vault
            .api_key_buckets()
            .filter(|(name, _)| sanitize_provider(&name[API_KEY_PREFIX.len()..]).contains(&sanitized))
            .find_map(|(_, entry)| entry.extract())
    {
        return Some(found);
    }

    let mut conventional = vault.api_key_buckets();
    match (conventional.next(), conventional.next()) {
        (Some((name, entry)), None) => {
            debug!(provider, bucket = name, "using the only api_key bucket");
            entry.extract()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_buckets_are_case_insensitive() {
        assert_eq!(candidate_buckets("OpenAI"), &["api_key_openai"]);
        assert!(candidate_buckets("unknown-provider").is_empty());
    }

    #[test]
    fn sanitize_strips_punctuation() {
        assert_eq!(sanitize_provider("Nano-GPT"), "nanogpt");
        assert_eq!(sanitize_provider("  "), "");
    }

    #[test]
    fn absent_vault_resolves_nothing() {
        assert!(resolve_credential("openai", None, Some("a")).is_none());
    }
}
