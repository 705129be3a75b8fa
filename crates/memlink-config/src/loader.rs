// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./memlink.toml` > `~/.config/memlink/memlink.toml` > `/etc/memlink/memlink.toml`
//! with environment variable overrides via `MEMLINK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MemlinkConfig;

/// Sections addressable from `MEMLINK_<SECTION>_<KEY>` environment variables.
const ENV_SECTIONS: &[&str] = &["service", "bridge", "host", "models", "tasks"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/memlink/memlink.toml` (system-wide)
/// 3. `~/.config/memlink/memlink.toml` (user XDG config)
/// 4. `./memlink.toml` (local directory)
/// 5. `MEMLINK_*` environment variables
pub fn load_config() -> Result<MemlinkConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
pub fn load_config_from_str(toml_content: &str) -> Result<MemlinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemlinkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MemlinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemlinkConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MemlinkConfig::default()))
        .merge(Toml::file("/etc/memlink/memlink.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("memlink/memlink.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("memlink.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section-to-dot mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `MEMLINK_BRIDGE_SCRIPT_PATH` maps to `bridge.script_path`.
fn env_provider() -> Env {
    Env::prefixed("MEMLINK_").map(|key| env_key_to_path(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to a dotted config path.
pub(crate) fn env_key_to_path(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section)
            && let Some(field) = rest.strip_prefix('_')
        {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(env_key_to_path("bridge_script_path"), "bridge.script_path");
        assert_eq!(env_key_to_path("service_log_level"), "service.log_level");
        assert_eq!(env_key_to_path("models_cache_ttl_secs"), "models.cache_ttl_secs");
        assert_eq!(env_key_to_path("host_data_root"), "host.data_root");
    }

    #[test]
    fn unknown_env_section_is_left_alone() {
        assert_eq!(env_key_to_path("vault_key"), "vault_key");
    }
}
