// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pluggable lookups consumed by the resolver and the model listing cache.

pub mod catalog;
pub mod lookup;

pub use catalog::ModelCatalog;
pub use lookup::BaseUrlLookup;
