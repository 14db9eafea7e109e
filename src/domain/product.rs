//! Skincare products, categories and the local search filters
//!
//! The live catalog filters by product type and country on its side; budget
//! and skin-type axes are applied here.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{Aging, AxisFilter, DomainError, Oiliness, Pigmentation, Sensitivity};

/// Hard cap on products returned by one search
pub const MAX_SEARCH_LIMIT: u32 = 50;

/// Product categories known to the catalog
pub const PRODUCT_TYPES: [&str; 43] = [
    "Acne Treatment",
    "Anti-Inflammatory Moisturizing",
    "Anti-Inflammatory Product",
    "Anti-age serum",
    "Anti-inflammatory Product",
    "Antioxidant Serum",
    "At-Home Peel",
    "Benzoyl Peroxide",
    "Blushes",
    "Body Moisture",
    "Bottler",
    "Cleanser",
    "Concealers",
    "Dark Spot Treatment",
    "Exfoliation",
    "Eye Cream",
    "Face Massage",
    "Facial Peels",
    "Facial Scrub",
    "Facial Water",
    "Foundation",
    "Kits",
    "Lightening",
    "Mask",
    "Microdermabrasion",
    "Moisturizer",
    "Moisturizer Day",
    "Moisturizer Night",
    "Oil-control Powder",
    "Oil-control Product",
    "Oil-control product",
    "Pimple Medication",
    "Powder",
    "Retinol Product",
    "Scrub",
    "Self-tanning",
    "Serum",
    "Skin Lightener",
    "Spot Treatment",
    "Sulfur Mask",
    "Sunscreen",
    "Toner",
    "Wrinkle Prevention",
];

/// Check a product type against [`PRODUCT_TYPES`] (exact match; the
/// catalog's categories differ only by case in places)
pub fn validate_product_type(product_type: &str) -> Result<&'static str, DomainError> {
    PRODUCT_TYPES
        .iter()
        .copied()
        .find(|t| *t == product_type)
        .ok_or_else(|| DomainError::UnknownProductType(product_type.to_string()))
}

/// Country a product is sold in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Country {
    #[default]
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "UAE")]
    Uae,
}

impl Country {
    pub fn as_str(self) -> &'static str {
        match self {
            Country::Us => "US",
            Country::Uae => "UAE",
        }
    }
}

/// Read an explicit `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One product as served by the live catalog
///
/// Only `id` is required. Null display fields read as empty, and fields not
/// modelled here are kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub product_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skin_types: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A validated product search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub product_type: Option<&'static str>,
    pub country: Country,
    pub axes: AxisFilter,
    pub budget: Option<f64>,
    pub limit: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            product_type: None,
            country: Country::default(),
            axes: AxisFilter::default(),
            budget: None,
            limit: MAX_SEARCH_LIMIT,
        }
    }
}

/// The query as echoed back in the search result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEcho {
    #[serde(rename = "type")]
    pub product_type: String,
    pub country: Country,
    pub od: Option<Oiliness>,
    pub sr: Option<Sensitivity>,
    pub pn: Option<Pigmentation>,
    pub wt: Option<Aging>,
    pub budget: Option<f64>,
}

/// Result of `search_products`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub total: usize,
    pub query: QueryEcho,
    pub products: Vec<Product>,
}

impl SearchQuery {
    fn echo(&self) -> QueryEcho {
        QueryEcho {
            product_type: self.product_type.unwrap_or("all").to_string(),
            country: self.country,
            od: self.axes.od,
            sr: self.axes.sr,
            pn: self.axes.pn,
            wt: self.axes.wt,
            budget: self.budget,
        }
    }

    /// Apply budget and skin-type filters, then truncate to the limit
    pub fn apply(&self, products: Vec<Product>) -> SearchResult {
        let limit = self.limit.min(MAX_SEARCH_LIMIT) as usize;
        let products: Vec<Product> = products
            .into_iter()
            .filter(|p| self.budget.map_or(true, |budget| p.price <= budget))
            .filter(|p| self.axes.matches_any(p.skin_types.as_slice()))
            .take(limit)
            .collect();

        SearchResult {
            total: products.len(),
            query: self.echo(),
            products,
        }
    }
}

/// One entry of `get_product_types`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductTypeEntry {
    pub id: &'static str,
}

/// Result of `get_product_types`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTypeList {
    pub product_types: Vec<ProductTypeEntry>,
    pub total: usize,
}

pub fn list_product_types() -> ProductTypeList {
    let product_types: Vec<_> = PRODUCT_TYPES.iter().map(|&id| ProductTypeEntry { id }).collect();
    ProductTypeList {
        total: product_types.len(),
        product_types,
    }
}
