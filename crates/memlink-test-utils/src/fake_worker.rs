// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A scripted stand-in for the Python worker.
//!
//! The script is plain POSIX `sh` plus `sed`, launched the same way as the
//! real worker (`sh <script> --daemon`). It relies on requests being
//! serialized as `{"id":"...","op":"...",...}` with `id` first.

use std::path::{Path, PathBuf};

/// How the fake worker answers each request line.
#[derive(Debug, Clone)]
pub enum WorkerBehavior {
    /// `ok: true` with `result: {"op": <op>}` and a `bridge_instance_id`.
    Respond,
    /// `ok: false` with the given error text.
    ReportError(String),
    /// Read requests and never answer.
    Silent,
    /// Exit with the given status as soon as a request arrives.
    CrashOnRequest(i32),
    /// A non-JSON line and a response with a foreign id, then the real answer.
    NoisyRespond,
    /// Write a line of invalid UTF-8 to stderr, then answer like `Respond`.
    BinaryStderr,
}

const PRELUDE: &str = r##"#!/bin/sh
if [ "$1" != "--daemon" ]; then
  echo "fake worker: expected --daemon" >&2
  exit 2
fi
echo "fake worker ready pid=$$" >&2
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/^{"id":"\([^"]*\)".*/\1/p')
  op=$(printf '%s\n' "$line" | sed -n 's/^{"id":"[^"]*","op":"\([^"]*\)".*/\1/p')
  echo "fake worker: $op $id" >&2
"##;

const RESPOND: &str = r##"  printf '{"id":"%s","ok":true,"op":"%s","bridge_instance_id":"fake-%s","result":{"op":"%s"}}\n' "$id" "$op" "$$" "$op"
"##;

const POSTLUDE: &str = "done\n";

/// A fake worker script written to disk.
#[derive(Debug, Clone)]
pub struct FakeWorker {
    path: PathBuf,
}

impl FakeWorker {
    /// Write the script as `fake_worker.sh` inside `dir`.
    pub fn write(dir: &Path, behavior: WorkerBehavior) -> Self {
        Self::write_named(dir, "fake_worker.sh", behavior)
    }

    pub fn write_named(dir: &Path, file: &str, behavior: WorkerBehavior) -> Self {
        let body = match behavior {
            WorkerBehavior::Respond => RESPOND.to_string(),
            WorkerBehavior::ReportError(message) => format!(
                "  printf '{{\"id\":\"%s\",\"ok\":false,\"op\":\"%s\",\"error\":\"%s\"}}\\n' \"$id\" \"$op\" '{}'\n",
                message.replace(['\'', '"', '\\'], "")
            ),
            WorkerBehavior::Silent => "  :\n".to_string(),
            WorkerBehavior::CrashOnRequest(code) => {
                format!("  echo \"fake worker: crashing\" >&2\n  exit {code}\n")
            }
            WorkerBehavior::NoisyRespond => format!(
                "  echo 'this is not json'\n  printf '{{\"id\":\"not-%s\",\"ok\":true}}\\n' \"$id\"\n{RESPOND}"
            ),
            WorkerBehavior::BinaryStderr => format!("  printf 'bad \\377 byte\\n' >&2\n{RESPOND}"),
        };
        let script = format!("{PRELUDE}{body}{POSTLUDE}");
        let path = dir.join(file);
        std::fs::write(&path, script).expect("write fake worker script");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The interpreter to launch the script with.
    pub fn command(&self) -> &'static str {
        "sh"
    }
}
