//! Tool for searching skincare products
//!
//! This module implements the search_products MCP tool. The catalog does
//! the coarse type/country selection; budget, skin-type axes and the limit
//! are applied locally.

use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{ArgumentContract, ToolError};
use crate::catalog::ProductCatalog;
use crate::domain::{
    validate_product_type, Aging, AxisFilter, Country, Oiliness, Pigmentation, SearchQuery,
    SearchResult, Sensitivity, MAX_SEARCH_LIMIT, PRODUCT_TYPES,
};

/// Parameters for searching products
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SearchProductsArgs {
    /// Product type to search for. Call get_product_types for all options.
    #[serde(rename = "type", default)]
    #[schemars(schema_with = "product_type_schema")]
    pub product_type: Option<String>,
    /// Country for product availability: 'US' or 'UAE'. Defaults to 'US'.
    #[serde(default)]
    pub country: Option<Country>,
    /// Skin oiliness: O for Oily, D for Dry
    #[serde(default)]
    pub od: Option<Oiliness>,
    /// Skin sensitivity: S for Sensitive, R for Resistant
    #[serde(default)]
    pub sr: Option<Sensitivity>,
    /// Skin pigmentation: P for Pigmented (prone to dark spots), N for Non-pigmented
    #[serde(default)]
    pub pn: Option<Pigmentation>,
    /// Skin aging: W for Wrinkled (shows aging), T for Tight (firm)
    #[serde(default)]
    pub wt: Option<Aging>,
    /// Maximum price in dollars. Use 5, 10, 20, 50, or 100. Use 101 for products over $100.
    #[serde(default)]
    pub budget: Option<f64>,
    /// Maximum number of products to return. Defaults to 50.
    #[serde(default)]
    #[schemars(range(min = 1, max = 50))]
    pub limit: Option<u32>,
}

fn product_type_schema(_: &mut SchemaGenerator) -> Schema {
    Schema::Object(SchemaObject {
        instance_type: Some(InstanceType::String.into()),
        enum_values: Some(PRODUCT_TYPES.iter().map(|t| Value::from(*t)).collect()),
        ..Default::default()
    })
}

impl ArgumentContract for SearchProductsArgs {
    fn validate(&self) -> Result<(), String> {
        if let Some(product_type) = &self.product_type {
            validate_product_type(product_type).map_err(|e| e.to_string())?;
        }
        if let Some(budget) = self.budget {
            if !(budget.is_finite() && budget > 0.0) {
                return Err(format!("budget must be a positive number, got {}", budget));
            }
        }
        if let Some(limit) = self.limit {
            if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
                return Err(format!("limit must be between 1 and {}, got {}", MAX_SEARCH_LIMIT, limit));
            }
        }
        Ok(())
    }
}

impl SearchProductsArgs {
    /// Resolve defaults into a search query; call after `validate`
    pub fn into_query(self) -> Result<SearchQuery, ToolError> {
        let product_type = match self.product_type.as_deref() {
            Some(t) => Some(validate_product_type(t).map_err(|e| ToolError::InvalidArguments(e.to_string()))?),
            None => None,
        };

        Ok(SearchQuery {
            product_type,
            country: self.country.unwrap_or_default(),
            axes: AxisFilter {
                od: self.od,
                sr: self.sr,
                pn: self.pn,
                wt: self.wt,
            },
            budget: self.budget,
            limit: self.limit.unwrap_or(MAX_SEARCH_LIMIT),
        })
    }
}

/// Search the catalog and filter the results
pub async fn search_products(
    catalog: &dyn ProductCatalog,
    args: SearchProductsArgs,
) -> Result<SearchResult, ToolError> {
    let query = args.into_query()?;
    info!(
        "Executing search_products: type={:?} country={} axes={:?} budget={:?} limit={}",
        query.product_type,
        query.country.as_str(),
        query.axes,
        query.budget,
        query.limit
    );

    let products = catalog.fetch_products(query.product_type, query.country).await?;
    Ok(query.apply(products))
}
