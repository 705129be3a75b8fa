// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker process supervision for memlink.
//!
//! The worker is a long-lived child process that reads one JSON request per
//! line on stdin and answers with one JSON response per line on stdout,
//! echoing the request id. [`BridgeSupervisor`] owns the process and starts
//! it on demand; [`BridgeSession`] multiplexes concurrent calls over the
//! streams and can be attached to any async reader/writer pair.

pub mod pending;
pub mod process;
pub mod protocol;
pub mod session;
pub mod stderr;
pub mod supervisor;

pub use process::LaunchSpec;
pub use protocol::{parse_line, BridgeOp, BridgeRequest, BridgeResponse};
pub use session::BridgeSession;
pub use stderr::StderrTail;
pub use supervisor::BridgeSupervisor;
