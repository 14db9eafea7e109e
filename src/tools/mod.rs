//! MCP tools for skincare discovery
//!
//! This module contains the closed set of tools that external clients (like
//! Claude) can call. Each tool has a typed argument struct that doubles as
//! its argument contract: serde decides what is accepted, schemars publishes
//! the matching JSON schema, and `validate` adds the range checks serde
//! cannot express.

pub mod product_types;
pub mod search;
pub mod skin_types;

// Re-export tool functions for easy access
pub use product_types::*;
pub use search::*;
pub use skin_types::*;

use std::str::FromStr;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::{CatalogError, ProductCatalog};
use crate::domain::DomainError;
use crate::mcp::protocol::{ErrorKind, ToolDefinition};

/// Errors a tool invocation can end with
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    ExecutionFailed(String),
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownTool(_) => ErrorKind::UnknownTool,
            ToolError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            ToolError::ExecutionFailed(_) => ErrorKind::ToolExecutionFailed,
        }
    }
}

impl From<DomainError> for ToolError {
    fn from(e: DomainError) -> Self {
        ToolError::ExecutionFailed(e.to_string())
    }
}

impl From<CatalogError> for ToolError {
    fn from(e: CatalogError) -> Self {
        ToolError::ExecutionFailed(e.to_string())
    }
}

/// A tool's accepted arguments
pub trait ArgumentContract: DeserializeOwned + JsonSchema {
    /// Checks beyond what deserialization enforces
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Decode and validate raw arguments against contract `A`
pub fn parse_arguments<A: ArgumentContract>(arguments: Value) -> Result<A, ToolError> {
    let arguments = if arguments.is_null() { Value::Object(Default::default()) } else { arguments };
    let parsed: A = serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
    parsed.validate().map_err(ToolError::InvalidArguments)?;
    Ok(parsed)
}

/// JSON schema published for contract `A`
pub fn input_schema<A: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(A)).unwrap_or_default();
    if let Some(object) = schema.as_object_mut() {
        // MCP clients expect a bare object schema
        object.remove("$schema");
        object.remove("title");
        object.entry("properties").or_insert_with(|| Value::Object(Default::default()));
    }
    schema
}

/// Serialize a tool's result for the wire
pub fn to_payload<T: Serialize>(result: &T) -> Result<Value, ToolError> {
    serde_json::to_value(result).map_err(|e| ToolError::ExecutionFailed(format!("Failed to serialize result: {}", e)))
}

/// Every tool this server declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SearchProducts,
    GetSkinTypeInfo,
    ListSkinTypes,
    GetProductTypes,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::SearchProducts,
        ToolName::GetSkinTypeInfo,
        ToolName::ListSkinTypes,
        ToolName::GetProductTypes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::SearchProducts => "search_products",
            ToolName::GetSkinTypeInfo => "get_skin_type_info",
            ToolName::ListSkinTypes => "list_skin_types",
            ToolName::GetProductTypes => "get_product_types",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolName::SearchProducts => "Search skincare products based on skin type characteristics, product type, country, and budget. Returns products with name, brand, price, and compatible skin types.",
            ToolName::GetSkinTypeInfo => "Get the full name, description, category, and difficulty rating for a specific Baumann skin type code.",
            ToolName::ListSkinTypes => "List all 16 Baumann skin types with codes, names, categories, difficulty ratings, and descriptions.",
            ToolName::GetProductTypes => "List all available product categories. Use the id value as the type parameter in search_products.",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// The callable behind each tool, one variant per [`ToolName`]
#[derive(Clone)]
pub enum ToolHandler {
    SearchProducts(Arc<dyn ProductCatalog>),
    GetSkinTypeInfo,
    ListSkinTypes,
    GetProductTypes,
}

impl std::fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ToolHandler({})", self.name())
    }
}

impl ToolHandler {
    pub fn name(&self) -> ToolName {
        match self {
            ToolHandler::SearchProducts(_) => ToolName::SearchProducts,
            ToolHandler::GetSkinTypeInfo => ToolName::GetSkinTypeInfo,
            ToolHandler::ListSkinTypes => ToolName::ListSkinTypes,
            ToolHandler::GetProductTypes => ToolName::GetProductTypes,
        }
    }

    /// Definition advertised by `tools/list`
    pub fn definition(&self) -> ToolDefinition {
        let name = self.name();
        let input_schema = match self {
            ToolHandler::SearchProducts(_) => input_schema::<SearchProductsArgs>(),
            ToolHandler::GetSkinTypeInfo => input_schema::<SkinTypeInfoArgs>(),
            ToolHandler::ListSkinTypes | ToolHandler::GetProductTypes => input_schema::<NoArguments>(),
        };

        ToolDefinition {
            name: name.as_str().to_string(),
            description: name.description().to_string(),
            input_schema,
        }
    }

    /// Check the arguments against the contract, then run the tool
    pub async fn invoke(&self, arguments: Value) -> Result<Value, ToolError> {
        match self {
            ToolHandler::SearchProducts(catalog) => {
                let args = parse_arguments(arguments)?;
                to_payload(&search_products(catalog.as_ref(), args).await?)
            }
            ToolHandler::GetSkinTypeInfo => {
                let args = parse_arguments(arguments)?;
                to_payload(get_skin_type_info(args)?)
            }
            ToolHandler::ListSkinTypes => {
                let _: NoArguments = parse_arguments(arguments)?;
                to_payload(&list_skin_types())
            }
            ToolHandler::GetProductTypes => {
                let _: NoArguments = parse_arguments(arguments)?;
                to_payload(&get_product_types())
            }
        }
    }
}

/// Contract for tools that take no arguments; extra keys are ignored
#[derive(Debug, Default, serde::Deserialize, JsonSchema)]
pub struct NoArguments {}

impl ArgumentContract for NoArguments {}
