// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty launch commands and non-zero timeouts.

use crate::diagnostic::ConfigError;
use crate::model::MemlinkConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MemlinkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.trim().to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` must be one of: {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.service.llm_profile.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "service.llm_profile must not be empty".to_string(),
        });
    }

    if config.service.resources_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "service.resources_dir must not be empty".to_string(),
        });
    }

    if config.bridge.command.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "bridge.command must not be empty".to_string(),
        });
    }

    if config.bridge.script_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "bridge.script_path must not be empty".to_string(),
        });
    }

    if config.bridge.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "bridge.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.bridge.stderr_lines == 0 {
        errors.push(ConfigError::Validation {
            message: "bridge.stderr_lines must be greater than 0".to_string(),
        });
    }

    if config.host.data_root.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "host.data_root must not be empty".to_string(),
        });
    }

    for (i, dir) in config.host.user_dirs.iter().enumerate() {
        if dir.trim().is_empty() || dir.contains('/') || dir.contains('\\') || dir == ".." {
            errors.push(ConfigError::Validation {
                message: format!("host.user_dirs[{i}] `{dir}` must be a plain directory name"),
            });
        }
    }

    if config.models.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "models.request_timeout_secs must be greater than 0".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
