// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local execution of memory operations for memlink.
//!
//! [`LocalMemoryService`] resolves connection profiles into worker payloads,
//! dispatches them to the supervised worker, tracks memorize operations as
//! pollable tasks, and lists provider models through a short-lived cache.

pub mod catalog;
pub mod models;
pub mod payload;
pub mod service;
pub mod tasks;

pub use catalog::OpenAiCompatibleCatalog;
pub use models::ModelListingCache;
pub use service::{BridgeHealth, DispatchRejection, LocalMemoryService};
pub use tasks::{LocalTask, TaskId, TaskLookup, TaskStatus, TaskStore};
