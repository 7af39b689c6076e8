use super::{CatalogError, CatalogResult, ProductApi};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared::models::{Product, ProductFilter};
use std::time::Duration;

/// List endpoint body; older deployments answer with a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Paged {
        #[serde(alias = "productos")]
        products: Vec<Product>,
    },
    Bare(Vec<Product>),
}

/// REST product API client
#[derive(Debug, Clone)]
pub struct HttpProductApi {
    client: Client,
    base_url: String,
}

impl HttpProductApi {
    pub fn new(base_url: &str, timeout: Duration) -> CatalogResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: reqwest::Response) -> CatalogResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CatalogError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn list_params(filter: &ProductFilter) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(category) = &filter.category {
        params.push(("categoria", category.clone()));
    }
    if let Some(available) = filter.available {
        params.push(("disponible", u8::from(available).to_string()));
    }
    if let Some(skip) = filter.skip {
        params.push(("skip", skip.to_string()));
    }
    if let Some(limit) = filter.limit {
        params.push(("limit", limit.to_string()));
    }
    params
}

#[async_trait]
impl ProductApi for HttpProductApi {
    async fn list(&self, filter: &ProductFilter) -> CatalogResult<Vec<Product>> {
        let url = format!("{}/productos/", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&list_params(filter))
            .send()
            .await?;
        let body: ListBody = Self::check(response).await?.json().await?;
        Ok(match body {
            ListBody::Paged { products } | ListBody::Bare(products) => products,
        })
    }

    async fn get(&self, id: &str) -> CatalogResult<Option<Product>> {
        let url = format!("{}/productos/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::check(response).await?.json().await?))
    }
}
