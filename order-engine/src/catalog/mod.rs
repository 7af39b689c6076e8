//! Product catalog
//!
//! Read path of the REST product API. [`ProductCatalog`] adds a TTL cache
//! in front of any [`ProductApi`] and keeps serving expired entries while
//! the API is failing.

mod cache;
mod http;

pub use cache::ProductCatalog;
pub use http::HttpProductApi;

use async_trait::async_trait;
use shared::error::ErrorCode;
use shared::models::{Product, ProductFilter};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Product API answered with status {status}: {body}")]
    Status { status: u16, body: String },
}

impl CatalogError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CatalogError::Status { status: 404, .. } => ErrorCode::ProductNotFound,
            _ => ErrorCode::CatalogUnavailable,
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn list(&self, filter: &ProductFilter) -> CatalogResult<Vec<Product>>;

    /// `Ok(None)` when the product does not exist
    async fn get(&self, id: &str) -> CatalogResult<Option<Product>>;
}
