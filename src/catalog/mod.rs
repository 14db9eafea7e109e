//! Product catalog layer
//!
//! Search results come from the live SkinGuide API. The trait lets the tools
//! run against a fixed product list in tests or offline.

pub mod live;

pub use live::LiveCatalog;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Country, Product};

/// Errors that can occur while fetching products
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Live API error {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Live API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Source of products for `search_products`
///
/// Implementations filter by product type and country; every other filter
/// is applied by the caller.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn fetch_products(
        &self,
        product_type: Option<&str>,
        country: Country,
    ) -> Result<Vec<Product>, CatalogError>;
}

/// In-memory catalog over a fixed product list
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductCatalog for StaticCatalog {
    async fn fetch_products(
        &self,
        product_type: Option<&str>,
        country: Country,
    ) -> Result<Vec<Product>, CatalogError> {
        Ok(self
            .products
            .iter()
            .filter(|p| product_type.map_or(true, |t| p.product_type == t))
            .filter(|p| p.country == country.as_str())
            .cloned()
            .collect())
    }
}
