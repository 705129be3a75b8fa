// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection profile resolution for memlink.
//!
//! Discovers connection profiles in the host application's per-user
//! settings, normalizes their field names, and joins a profile with an API
//! key from the host secret vault into a [`memlink_core::ResolvedCredential`].

pub mod host;
pub mod profile;
pub mod resolver;
pub mod scan;
pub mod urls;

pub use host::HostLayout;
pub use profile::{ConnectionProfile, ProfileSummary, ProfilesSummary};
pub use resolver::{resolve_profile, select_profile, ProfileResolver, DEFAULT_PROFILE_ID};
pub use urls::StaticBaseUrls;
