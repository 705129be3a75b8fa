// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary host data root.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

/// A throwaway `<data_root>` with helpers to populate user directories.
///
/// The directory is removed when the fixture is dropped.
pub struct HostFixture {
    dir: TempDir,
}

impl HostFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp host root"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn user_dir(&self, user: &str) -> PathBuf {
        let dir = self.dir.path().join(user);
        std::fs::create_dir_all(&dir).expect("create user dir");
        dir
    }

    /// Write `<user>/settings.json`.
    pub fn write_settings(&self, user: &str, document: &Value) -> &Self {
        self.write_json(user, "settings.json", document)
    }

    /// Write `<user>/secrets.json`.
    pub fn write_secrets(&self, user: &str, document: &Value) -> &Self {
        self.write_json(user, "secrets.json", document)
    }

    /// Write arbitrary text, for malformed-file cases.
    pub fn write_raw(&self, user: &str, file: &str, content: &str) -> &Self {
        std::fs::write(self.user_dir(user).join(file), content).expect("write fixture file");
        self
    }

    fn write_json(&self, user: &str, file: &str, document: &Value) -> &Self {
        let text = serde_json::to_string_pretty(document).expect("serialize fixture");
        self.write_raw(user, file, &text)
    }
}

impl Default for HostFixture {
    fn default() -> Self {
        Self::new()
    }
}
