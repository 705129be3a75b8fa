// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for memlink.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level memlink configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemlinkConfig {
    /// Worker payload and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Worker process launch and protocol settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Host application data layout.
    #[serde(default)]
    pub host: HostConfig,

    /// Model listing cache settings.
    #[serde(default)]
    pub models: ModelsConfig,

    /// Local task bookkeeping settings.
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Settings that shape the payload handed to the worker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Key the worker uses to cache its memory service between calls.
    #[serde(default = "default_service_key")]
    pub service_key: String,

    /// Directory where the worker writes conversation resources.
    #[serde(default = "default_resources_dir")]
    pub resources_dir: String,

    /// Worker metadata store provider ("inmemory" keeps state in-process).
    #[serde(default = "default_metadata_store")]
    pub metadata_store: String,

    /// Connection profile used for chat completions ("default" = first discovered).
    #[serde(default = "default_llm_profile")]
    pub llm_profile: String,

    /// Optional second connection profile used for embeddings.
    #[serde(default)]
    pub embedding_profile: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            service_key: default_service_key(),
            resources_dir: default_resources_dir(),
            metadata_store: default_metadata_store(),
            llm_profile: default_llm_profile(),
            embedding_profile: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_key() -> String {
    "memlink".to_string()
}

fn default_resources_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("memlink").join("resources"))
        .unwrap_or_else(|| PathBuf::from("data/resources"))
        .to_string_lossy()
        .into_owned()
}

fn default_metadata_store() -> String {
    "inmemory".to_string()
}

fn default_llm_profile() -> String {
    "default".to_string()
}

/// Worker process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Interpreter or executable that runs the worker script.
    #[serde(default = "default_bridge_command")]
    pub command: String,

    /// Path to the worker script. Launched as `command script_path --daemon`.
    #[serde(default = "default_script_path")]
    pub script_path: String,

    /// Working directory for the worker. `None` inherits the current directory.
    #[serde(default)]
    pub working_dir: Option<String>,

    /// Ceiling for a single request/response round trip, in seconds.
    #[serde(default = "default_bridge_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of worker stderr lines retained for diagnostics.
    #[serde(default = "default_stderr_lines")]
    pub stderr_lines: usize,
}

impl BridgeConfig {
    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: default_bridge_command(),
            script_path: default_script_path(),
            working_dir: None,
            timeout_secs: default_bridge_timeout_secs(),
            stderr_lines: default_stderr_lines(),
        }
    }
}

fn default_bridge_command() -> String {
    "python3".to_string()
}

fn default_script_path() -> String {
    "memu_st_bridge.py".to_string()
}

fn default_bridge_timeout_secs() -> u64 {
    120 // model calls inside memorize are slow
}

fn default_stderr_lines() -> usize {
    200
}

/// Host application layout: one directory per user under `data_root`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Directory containing the per-user directories.
    #[serde(default = "default_data_root")]
    pub data_root: String,

    /// Explicit user directory names, in priority order. Empty = discover.
    #[serde(default)]
    pub user_dirs: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            user_dirs: Vec::new(),
        }
    }
}

fn default_data_root() -> String {
    "data".to_string()
}

/// Model listing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    /// How long a listing (successful or not) is served from cache.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// HTTP timeout for a provider model listing request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ModelsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    600 // 10 minutes
}

fn default_request_timeout_secs() -> u64 {
    20
}

/// Local task bookkeeping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TasksConfig {
    /// Terminal tasks older than this are pruned. 0 disables pruning.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

impl TasksConfig {
    /// Retention window, or `None` when pruning is disabled.
    pub fn retention(&self) -> Option<Duration> {
        (self.retention_secs > 0).then(|| Duration::from_secs(self.retention_secs))
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
        }
    }
}

fn default_retention_secs() -> u64 {
    3600 // 1 hour
}
