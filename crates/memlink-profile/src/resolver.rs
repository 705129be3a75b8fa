// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Joins a connection profile with its API key.

use std::sync::Arc;

use memlink_core::{BaseUrlLookup, ResolvedCredential};
use memlink_vault::{resolve_credential, SecretVault};
use tracing::debug;

use crate::host::HostLayout;
use crate::profile::{ConnectionProfile, ProfilesSummary};
use crate::urls::StaticBaseUrls;

/// Profile id that selects the first discovered profile.
pub const DEFAULT_PROFILE_ID: &str = "default";

/// Resolves connection profiles from the host layout on every call.
#[derive(Clone)]
pub struct ProfileResolver {
    host: HostLayout,
    urls: Arc<dyn BaseUrlLookup>,
}

impl std::fmt::Debug for ProfileResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileResolver")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl ProfileResolver {
    pub fn new(host: HostLayout) -> Self {
        Self::with_base_urls(host, Arc::new(StaticBaseUrls))
    }

    pub fn with_base_urls(host: HostLayout, urls: Arc<dyn BaseUrlLookup>) -> Self {
        Self { host, urls }
    }

    pub fn host(&self) -> &HostLayout {
        &self.host
    }

    /// `None` when no profile matches; `Some` with `ok: false` when the
    /// profile exists but lacks a base URL, model, or key.
    pub async fn resolve_profile_credentials(&self, profile_id: &str) -> Option<ResolvedCredential> {
        let profiles = self.host.load_profiles().await;
        let profile = select_profile(&profiles, profile_id)?;
        let vault = self.host.load_vault().await;
        Some(resolve_profile(profile, vault.as_ref(), self.urls.as_ref()))
    }

    pub async fn connection_profiles_summary(&self) -> ProfilesSummary {
        ProfilesSummary::from_profiles(&self.host.load_profiles().await)
    }
}

/// `"default"` picks the first profile; other ids match exactly.
pub fn select_profile<'a>(
    profiles: &'a [ConnectionProfile],
    profile_id: &str,
) -> Option<&'a ConnectionProfile> {
    let profile_id = profile_id.trim();
    if profile_id == DEFAULT_PROFILE_ID {
        return profiles.first();
    }
    profiles.iter().find(|p| p.id == profile_id)
}

/// Resolve one profile. An inline key wins over the vault.
pub fn resolve_profile(
    profile: &ConnectionProfile,
    vault: Option<&SecretVault>,
    urls: &dyn BaseUrlLookup,
) -> ResolvedCredential {
    let api_key = profile.api_key_inline.clone().or_else(|| {
        resolve_credential(&profile.provider, vault, profile.secret_id.as_deref())
    });

    let base_url = if profile.base_url.is_empty() {
        urls.default_base_url(&profile.provider).unwrap_or_default()
    } else {
        profile.base_url.clone()
    };

    let credential = ResolvedCredential::from_parts(
        &profile.name,
        profile.provider.clone(),
        base_url,
        profile.model.clone(),
        api_key,
    );
    debug!(
        profile = %profile.id,
        provider = %credential.provider,
        ok = credential.ok,
        "resolved connection profile"
    );
    credential
}
