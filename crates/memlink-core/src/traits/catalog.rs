// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model catalog trait for provider model listings.

use async_trait::async_trait;

use crate::error::MemlinkError;
use crate::types::{ModelKind, ResolvedCredential};

/// Lists the models a provider endpoint offers.
///
/// Implementations receive a complete credential (`ok == true`) and return
/// raw identifiers; callers normalize ordering and duplicates.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Fetches model identifiers of the given kind.
    async fn list_models(
        &self,
        credential: &ResolvedCredential,
        kind: ModelKind,
    ) -> Result<Vec<String>, MemlinkError>;
}
