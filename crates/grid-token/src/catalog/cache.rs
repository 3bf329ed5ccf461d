//! Per-ship-type catalog cache with single-flight fetching.
//!
//! Each ship type has at most one fetch in flight. Callers arriving while it
//! runs await the same shared future; once it completes they all observe the
//! same result. A failed fetch is evicted so the next caller retries.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::catalog::source::TechTreeSource;
use crate::catalog::TechCatalog;
use crate::error::CatalogError;

type CatalogFetch = Shared<BoxFuture<'static, Result<Arc<TechCatalog>, CatalogError>>>;

/// State of the catalog for one ship type.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus {
    /// Nobody asked for this ship type yet (or a failure was evicted).
    NotRequested,
    /// A fetch is in flight.
    Pending,
    /// The catalog is available.
    Ready(Arc<TechCatalog>),
    /// The last fetch failed; the next `get` retries.
    Failed(CatalogError),
}

/// Catalog cache keyed by ship type.
pub struct CatalogCache {
    source: Arc<dyn TechTreeSource>,
    entries: Mutex<FxHashMap<String, CatalogFetch>>,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("ship_types", &self.entries.lock().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl CatalogCache {
    /// Creates an empty cache over `source`.
    pub fn new(source: Arc<dyn TechTreeSource>) -> Self {
        Self {
            source,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// Returns the catalog for `ship_type`, fetching it if needed.
    pub async fn get(&self, ship_type: &str) -> Result<Arc<TechCatalog>, CatalogError> {
        let fetch = self.fetch_for(ship_type);
        let result = fetch.clone().await;
        if result.is_err() {
            let mut entries = self.entries.lock();
            // Only evict the fetch we awaited; a retry may already be in flight.
            if entries.get(ship_type).is_some_and(|f| f.ptr_eq(&fetch)) {
                entries.remove(ship_type);
            }
        }
        result
    }

    /// Reports the cache state for `ship_type` without starting a fetch.
    pub fn status(&self, ship_type: &str) -> FetchStatus {
        let entries = self.entries.lock();
        match entries.get(ship_type).map(|f| f.peek()) {
            None => FetchStatus::NotRequested,
            Some(None) => FetchStatus::Pending,
            Some(Some(Ok(catalog))) => FetchStatus::Ready(Arc::clone(catalog)),
            Some(Some(Err(e))) => FetchStatus::Failed(e.clone()),
        }
    }

    fn fetch_for(&self, ship_type: &str) -> CatalogFetch {
        let mut entries = self.entries.lock();
        if let Some(fetch) = entries.get(ship_type) {
            log::debug!("catalog cache hit for {ship_type:?}");
            return fetch.clone();
        }
        log::debug!("catalog cache miss for {ship_type:?}");

        let source = Arc::clone(&self.source);
        let ship = ship_type.to_string();
        let fetch = async move {
            let tree = source.fetch_tech_tree(&ship).await?;
            Ok::<_, CatalogError>(Arc::new(TechCatalog::from_tree(&tree)))
        }
        .boxed()
        .shared();
        entries.insert(ship_type.to_string(), fetch.clone());
        fetch
    }
}
