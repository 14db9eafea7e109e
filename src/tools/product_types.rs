//! Tool for listing product categories
//!
//! This module implements the get_product_types MCP tool.

use tracing::info;

use crate::domain::{list_product_types, ProductTypeList};

/// List every product category usable as `type` in search_products
pub fn get_product_types() -> ProductTypeList {
    info!("Executing get_product_types");
    list_product_types()
}
