// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for memlink integration tests.
//!
//! Provides host directory fixtures, a scripted fake worker, and a mock model
//! catalog for fast, deterministic tests without Python or network access.
//!
//! # Components
//!
//! - [`HostFixture`] - temporary host data root with per-user settings and vaults
//! - [`FakeWorker`] - `sh` script speaking the worker's line protocol (unix only)
//! - [`MockCatalog`] - model catalog with queued responses and a call counter

pub mod fake_worker;
pub mod host_fixture;
pub mod mock_catalog;

pub use fake_worker::{FakeWorker, WorkerBehavior};
pub use host_fixture::HostFixture;
pub use mock_catalog::MockCatalog;
