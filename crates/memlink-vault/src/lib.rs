// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only access to the host application's secret vault.
//!
//! Loads `secrets.json` documents from host user directories and resolves a
//! provider API key through an explicit, ordered fallback chain. Secret
//! values are held as [`secrecy::SecretString`] and never appear in debug
//! output.

pub mod entry;
pub mod resolve;
pub mod vault;

pub use entry::{SecretEntry, SecretRecord};
pub use memlink_core::mask_secret;
pub use resolve::{candidate_buckets, resolve_credential, sanitize_provider};
pub use vault::{SecretVault, API_KEY_PREFIX, SECRETS_FILE};
