// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Well-known OpenAI-compatible endpoints, used when a profile has no URL.

use memlink_core::BaseUrlLookup;

const DEFAULT_BASE_URLS: &[(&str, &str)] = &[
    ("openai", "https://api.openai.com/v1"),
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("nanogpt", "https://nano-gpt.com/api/v1"),
    ("deepseek", "https://api.deepseek.com/v1"),
    ("groq", "https://api.groq.com/openai/v1"),
    ("mistralai", "https://api.mistral.ai/v1"),
    ("xai", "https://api.x.ai/v1"),
    ("together", "https://api.together.xyz/v1"),
    ("togetherai", "https://api.together.xyz/v1"),
    ("fireworks", "https://api.fireworks.ai/inference/v1"),
    ("perplexity", "https://api.perplexity.ai"),
];

/// Static provider → endpoint table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticBaseUrls;

impl BaseUrlLookup for StaticBaseUrls {
    fn default_base_url(&self, provider: &str) -> Option<String> {
        let provider = provider.trim().to_ascii_lowercase();
        DEFAULT_BASE_URLS
            .iter()
            .find(|(name, _)| *name == provider)
            .map(|(_, url)| (*url).to_string())
    }
}
