// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host application data layout: `<data_root>/<user>/{settings,secrets}.json`.
//!
//! Everything here is read fresh on each call. The host owns these files and
//! may rewrite them at any time.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use memlink_vault::{SecretVault, SECRETS_FILE};
use serde_json::Value;
use tracing::{debug, warn};

use crate::profile::ConnectionProfile;
use crate::scan::find_profile_records;

pub const SETTINGS_FILE: &str = "settings.json";

/// The host user directory listed first when discovering.
pub const DEFAULT_USER_DIR: &str = "default-user";

/// Location of the host data and which user directories to read.
#[derive(Debug, Clone)]
pub struct HostLayout {
    data_root: PathBuf,
    user_dirs: Vec<String>,
}

impl HostLayout {
    /// `user_dirs` empty means discover every directory under `data_root`.
    pub fn new(data_root: impl Into<PathBuf>, user_dirs: Vec<String>) -> Self {
        Self {
            data_root: data_root.into(),
            user_dirs,
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// User directories containing a settings file, in priority order.
    pub async fn user_directories(&self) -> Vec<PathBuf> {
        let names = if self.user_dirs.is_empty() {
            self.discover_names().await
        } else {
            self.user_dirs.clone()
        };

        let mut found = Vec::new();
        for name in names {
            let dir = self.data_root.join(&name);
            if tokio::fs::try_exists(dir.join(SETTINGS_FILE))
                .await
                .unwrap_or(false)
            {
                found.push(dir);
            } else {
                debug!(dir = %dir.display(), "user directory has no settings file");
            }
        }
        found
    }

    async fn discover_names(&self) -> Vec<String> {
        let mut entries = match tokio::fs::read_dir(&self.data_root).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %self.data_root.display(), error = %e, "cannot list host data root");
                return Vec::new();
            }
        };

        let mut names = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir && let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        order_user_dirs(names)
    }

    /// All profiles across user directories, de-duplicated by id (first kept).
    pub async fn load_profiles(&self) -> Vec<ConnectionProfile> {
        let mut seen = HashSet::new();
        let mut profiles = Vec::new();

        for dir in self.user_directories().await {
            let path = dir.join(SETTINGS_FILE);
            let Some(document) = read_settings(&path).await else {
                continue;
            };
            for record in find_profile_records(&document) {
                if let Some(profile) = ConnectionProfile::from_record(record)
                    && seen.insert(profile.id.clone())
                {
                    profiles.push(profile);
                }
            }
        }

        debug!(count = profiles.len(), "connection profiles loaded");
        profiles
    }

    /// Vaults of every user directory merged; the first directory's buckets win.
    pub async fn load_vault(&self) -> Option<SecretVault> {
        let mut merged: Option<SecretVault> = None;

        for dir in self.user_directories().await {
            let path = dir.join(SECRETS_FILE);
            let vault = match SecretVault::load(&path).await {
                Ok(Some(vault)) => vault,
                Ok(None) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable secret vault");
                    continue;
                }
            };
            match merged.as_mut() {
                Some(existing) => {
                    let shadowed = vault
                        .bucket_names()
                        .into_iter()
                        .filter(|name| existing.get(name).is_some())
                        .count();
                    if shadowed > 0 {
                        debug!(path = %path.display(), shadowed, "buckets already provided by an earlier user directory");
                    }
                    existing.merge_first_wins(vault);
                }
                None => merged = Some(vault),
            }
        }
        merged
    }
}

/// `default-user` first, the rest by name.
pub fn order_user_dirs(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    if let Some(pos) = names.iter().position(|n| n == DEFAULT_USER_DIR) {
        let default = names.remove(pos);
        names.insert(0, default);
    }
    names
}

async fn read_settings(path: &Path) -> Option<Value> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable settings file");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(document) => Some(document),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unparsable settings file");
            None
        }
    }
}
