//! HTTP client for the live SkinGuide product API
//!
//! `GET {api_url}/products?type=<type>&country=<country>` returns up to 50
//! products; `type` and `country` are the only server-side filters.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{CatalogError, ProductCatalog};
use crate::domain::product::null_as_default;
use crate::domain::{Country, Product};

/// Default base URL of the live API
pub const DEFAULT_API_URL: &str = "https://skinguide.beauty/api";

#[derive(Debug, Deserialize)]
struct ProductsPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    products: Vec<Product>,
}

/// Catalog backed by the live HTTP API
pub struct LiveCatalog {
    base_url: String,
    http: reqwest::Client,
}

impl LiveCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skinguide-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn products_url(&self) -> String {
        format!("{}/products", self.base_url)
    }
}

#[async_trait]
impl ProductCatalog for LiveCatalog {
    async fn fetch_products(
        &self,
        product_type: Option<&str>,
        country: Country,
    ) -> Result<Vec<Product>, CatalogError> {
        let mut query = vec![("country", country.as_str())];
        if let Some(product_type) = product_type {
            query.insert(0, ("type", product_type));
        }

        debug!("Fetching products from {} with {:?}", self.products_url(), query);
        let response = self.http.get(self.products_url()).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let payload: ProductsPayload = response.json().await?;
        debug!("Live API returned {} products", payload.products.len());
        Ok(payload.products)
    }
}
