//! Domain module containing the skincare data and its rules
//!
//! This module defines the Baumann skin type table, the product model and
//! the local filters applied to live catalog results. None of it knows about
//! the protocol; tools translate between the two.

pub mod product;
pub mod skin_type;

// Re-export public types for easy access
pub use product::*;
pub use skin_type::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Unknown skin type \"{code}\". Valid codes: {valid}")]
    UnknownSkinType { code: String, valid: String },

    #[error("Unknown product type \"{0}\". Call get_product_types for all options")]
    UnknownProductType(String),
}
