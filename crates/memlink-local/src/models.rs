// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-lived cache of model listings keyed by (kind, profile).
//!
//! Failed listings are cached like successful ones so a misconfigured
//! profile does not hit the provider on every poll.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use memlink_core::{ModelKind, ModelListing};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

type CacheKey = (ModelKind, String);

struct CachedListing {
    listing: Arc<ModelListing>,
    fetched_at: Instant,
}

pub struct ModelListingCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CachedListing>>,
}

impl ModelListingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached listing if fresh, otherwise the result of `fetch`, stored.
    ///
    /// Within the TTL the same `Arc` is returned. `force` skips the lookup but
    /// still stores the new listing.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        kind: ModelKind,
        profile_id: &str,
        force: bool,
        fetch: F,
    ) -> Arc<ModelListing>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ModelListing>,
    {
        let key = (kind, profile_id.to_string());
        if !force && let Some(hit) = self.fresh(&key).await {
            debug!(%kind, profile = profile_id, "model listing cache hit");
            return hit;
        }

        let listing = Arc::new(fetch().await);
        debug!(%kind, profile = profile_id, ok = listing.ok, count = listing.models.len(), "model listing fetched");
        self.entries.lock().await.insert(
            key,
            CachedListing {
                listing: Arc::clone(&listing),
                fetched_at: Instant::now(),
            },
        );
        listing
    }

    async fn fresh(&self, key: &CacheKey) -> Option<Arc<ModelListing>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(cached) if cached.fetched_at.elapsed() < self.ttl => Some(Arc::clone(&cached.listing)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn invalidate(&self) {
        self.entries.lock().await.clear();
    }
}
