// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base URL fallback for profiles that do not carry one.

/// Supplies a default endpoint for a provider tag.
pub trait BaseUrlLookup: Send + Sync {
    /// Returns the default base URL for `provider` (lower-cased), if known.
    fn default_base_url(&self, provider: &str) -> Option<String>;
}

/// A lookup that never supplies a URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBaseUrls;

impl BaseUrlLookup for NoBaseUrls {
    fn default_base_url(&self, _provider: &str) -> Option<String> {
        None
    }
}
