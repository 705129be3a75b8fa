// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for memlink.
//!
//! Provides the error taxonomy, the credential and listing types shared by
//! every crate, and the pluggable lookup traits (model catalog, base URL
//! defaults) that the local service is assembled from.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MemlinkError;
pub use traits::{BaseUrlLookup, ModelCatalog};
pub use types::{
    mask_secret, normalize_model_ids, ModelKind, ModelListing, ResolvedCredential, SessionId,
};
