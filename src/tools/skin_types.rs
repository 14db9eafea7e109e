//! Tools for the Baumann skin type table
//!
//! This module implements the get_skin_type_info and list_skin_types MCP
//! tools. Both are served from static data.

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::{ArgumentContract, ToolError};
use crate::domain::{list_skin_types as all_skin_types, lookup_skin_type, SkinTypeInfo, SkinTypeList};

/// Parameters for looking up one skin type
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SkinTypeInfoArgs {
    /// 4-letter Baumann skin type code, e.g. OSPT
    #[serde(rename = "skinType")]
    #[schemars(length(equal = 4))]
    pub skin_type: String,
}

impl ArgumentContract for SkinTypeInfoArgs {
    fn validate(&self) -> Result<(), String> {
        let code = &self.skin_type;
        if code.chars().count() != 4 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("skinType must be a 4-letter code, got \"{}\"", self.skin_type));
        }
        Ok(())
    }
}

/// Get the full record for one skin type
pub fn get_skin_type_info(args: SkinTypeInfoArgs) -> Result<&'static SkinTypeInfo, ToolError> {
    info!("Executing get_skin_type_info for: {}", args.skin_type);
    Ok(lookup_skin_type(&args.skin_type)?)
}

/// List all 16 skin types
pub fn list_skin_types() -> SkinTypeList {
    info!("Executing list_skin_types");
    all_skin_types()
}
