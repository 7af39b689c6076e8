use super::{CatalogResult, ProductApi};
use parking_lot::RwLock;
use shared::models::{Product, ProductFilter};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CacheEntry {
    products: Vec<Product>,
    fetched_at: Instant,
}

/// TTL-cached product reads.
///
/// Lists are cached per filter. When a fetch fails, an expired entry for
/// the same filter is returned instead of the error.
pub struct ProductCatalog {
    api: Arc<dyn ProductApi>,
    ttl: Duration,
    entries: RwLock<HashMap<ProductFilter, CacheEntry>>,
}

impl ProductCatalog {
    pub fn new(api: Arc<dyn ProductApi>, ttl: Duration) -> Self {
        Self {
            api,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn products(&self, filter: &ProductFilter) -> CatalogResult<Vec<Product>> {
        if let Some(products) = self.fresh(filter) {
            tracing::debug!(count = products.len(), "Products served from cache");
            return Ok(products);
        }
        self.fetch(filter).await
    }

    /// Bypass the cache for this filter
    pub async fn refresh(&self, filter: &ProductFilter) -> CatalogResult<Vec<Product>> {
        self.fetch(filter).await
    }

    /// Single product: fresh cache first, then the API, then any stale copy
    pub async fn product(&self, id: &str) -> CatalogResult<Option<Product>> {
        if let Some(product) = self.cached_product(id, true) {
            return Ok(Some(product));
        }
        match self.api.get(id).await {
            Ok(product) => Ok(product),
            Err(e) => match self.cached_product(id, false) {
                Some(product) => {
                    tracing::warn!(product_id = %id, error = %e, "Product API failed, serving stale product");
                    Ok(Some(product))
                }
                None => Err(e),
            },
        }
    }

    pub fn invalidate(&self) {
        self.entries.write().clear();
    }

    fn fresh(&self, filter: &ProductFilter) -> Option<Vec<Product>> {
        let entries = self.entries.read();
        entries
            .get(filter)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.products.clone())
    }

    fn cached_product(&self, id: &str, fresh_only: bool) -> Option<Product> {
        let entries = self.entries.read();
        entries
            .values()
            .filter(|entry| !fresh_only || entry.fetched_at.elapsed() < self.ttl)
            .flat_map(|entry| entry.products.iter())
            .find(|p| p.id == id)
            .cloned()
    }

    async fn fetch(&self, filter: &ProductFilter) -> CatalogResult<Vec<Product>> {
        match self.api.list(filter).await {
            Ok(products) => {
                tracing::info!(count = products.len(), "Products fetched from API");
                self.entries.write().insert(
                    filter.clone(),
                    CacheEntry {
                        products: products.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Ok(products)
            }
            Err(e) => {
                let stale = self
                    .entries
                    .read()
                    .get(filter)
                    .map(|entry| entry.products.clone());
                match stale {
                    Some(products) => {
                        tracing::warn!(error = %e, "Product API failed, serving expired cache");
                        Ok(products)
                    }
                    None => {
                        tracing::error!(error = %e, "Product API failed and nothing is cached");
                        Err(e)
                    }
                }
            }
        }
    }
}
