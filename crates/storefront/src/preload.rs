//! Eager product catalogue preload.
//!
//! The product listing is fetched once at shell start so the first visit to
//! a product page does not wait on the network. Failures are logged and the
//! pages fall back to rendering without preloaded data.

use std::sync::Arc;
use std::time::Duration;

use am_botanics_client::{ApiClient, ApiError};
use moka::future::Cache;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// Public catalogue endpoint.
pub const PRODUCTS_PATH: &str = "/api/products";

/// How long a preloaded catalogue stays fresh.
pub const PRELOAD_TTL: Duration = Duration::from_secs(300);

const CACHE_CAPACITY: u64 = 16;

/// Cache of anonymous catalogue responses keyed by API path.
#[derive(Clone)]
pub struct ProductPreload {
    client: ApiClient,
    cache: Cache<String, Value>,
}

impl std::fmt::Debug for ProductPreload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductPreload")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl ProductPreload {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self::with_ttl(client, PRELOAD_TTL)
    }

    /// Preload cache with a custom freshness window.
    #[must_use]
    pub fn with_ttl(client: ApiClient, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { client, cache }
    }

    /// Fetch the catalogue in the background. Errors are logged only.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> JoinHandle<()> {
        let preload = self.clone();
        tokio::spawn(async move {
            if let Err(e) = preload.fetch().await {
                warn!(error = %e, kind = ?e.kind(), "Product preload failed");
            }
        })
    }

    /// Cached catalogue, fetching it if absent or stale.
    ///
    /// # Errors
    ///
    /// Returns the API error when the fetch fails; nothing is cached then.
    /// Concurrent callers waiting on the same fetch share one error.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Value, Arc<ApiError>> {
        let client = self.client.clone();
        self.cache
            .try_get_with(PRODUCTS_PATH.to_string(), async move {
                debug!(path = PRODUCTS_PATH, "Preloading products");
                client.get_public_json(PRODUCTS_PATH).await
            })
            .await
    }

    /// Catalogue if it is already cached. Never touches the network.
    pub async fn cached(&self) -> Option<Value> {
        self.cache.get(PRODUCTS_PATH).await
    }
}

/// Name and identifier of one catalogue entry, for page chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    pub id: Option<String>,
    pub name: String,
}

/// Product names in a catalogue payload.
///
/// Accepts either a bare array or an object with a `products` array; entries
/// without a `name` are skipped.
#[must_use]
pub fn product_summaries(catalogue: &Value) -> Vec<ProductSummary> {
    let items: &[Value] = match catalogue {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("products")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice),
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?.to_string();
            let id = item
                .get("_id")
                .or_else(|| item.get("id"))
                .and_then(|id| match id {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });
            Some(ProductSummary { id, name })
        })
        .collect()
}
