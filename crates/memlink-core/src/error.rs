// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for memlink.
//!
//! Profile lookups that miss or resolve to an incomplete credential are not
//! errors; they are reported as structured results by the resolver. Malformed
//! worker output is swallowed by the bridge and never becomes an error either.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across the memlink crates.
#[derive(Debug, Error)]
pub enum MemlinkError {
    /// Configuration errors (invalid TOML, bad values, missing launch script).
    #[error("configuration error: {0}")]
    Config(String),

    /// Secret vault could not be read or parsed.
    #[error("vault error: {0}")]
    Vault(String),

    /// Host settings could not be read or parsed.
    #[error("profile error: {0}")]
    Profile(String),

    /// Worker executable is missing, could not be launched, or died before
    /// the request could be written.
    #[error("bridge process unavailable: {message}")]
    ProcessUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No correlated response arrived within the timeout window.
    #[error("bridge request `{op}` timed out after {duration:?}")]
    ProtocolTimeout { op: String, duration: Duration },

    /// The worker answered with a well-formed `ok: false` response.
    #[error("bridge worker reported an error for `{op}`: {message}")]
    WorkerReported { op: String, message: String },

    /// Worker output closed or the process exited while the request was pending.
    #[error("bridge worker crashed: {0}")]
    WorkerCrashed(String),

    /// Model provider lookup failed (HTTP failure, bad payload).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MemlinkError {
    /// Returns true for errors produced by the bridge call path.
    pub fn is_bridge_failure(&self) -> bool {
        matches!(
            self,
            MemlinkError::ProcessUnavailable { .. }
                | MemlinkError::ProtocolTimeout { .. }
                | MemlinkError::WorkerReported { .. }
                | MemlinkError::WorkerCrashed(_)
        )
    }
}
