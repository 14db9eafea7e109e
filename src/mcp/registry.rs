//! Tool registry and invoker
//!
//! Tools are registered once at start-up and the registry is read-only
//! afterwards, shared between request tasks behind an `Arc`. `build` checks
//! the registered names against the declared [`ToolName`] set so a missing or
//! misspelled registration fails at start-up instead of at call time.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::catalog::ProductCatalog;
use crate::mcp::protocol::{ErrorKind, RequestId, Response, RpcError, ToolCallParams, ToolCallResult, ToolDefinition};
use crate::tools::{ToolError, ToolHandler, ToolName};

/// Errors raised while assembling the registry
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool '{0}' is registered twice")]
    DuplicateTool(String),

    #[error("Tool '{0}' is not a declared tool")]
    UndeclaredTool(String),

    #[error("Tool '{name}' is registered with the handler for '{handler}'")]
    HandlerMismatch { name: String, handler: ToolName },

    #[error("Declared tool '{0}' has no registration")]
    MissingTool(ToolName),
}

/// Collects registrations before they are frozen into a [`ToolRegistry`]
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<(String, ToolHandler)>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`; duplicate names fail immediately
    pub fn register(mut self, name: impl Into<String>, handler: ToolHandler) -> Result<Self, RegistryError> {
        let name = name.into();
        if self.tools.iter().any(|(existing, _)| *existing == name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.tools.push((name, handler));
        Ok(self)
    }

    /// Freeze the registrations after checking them against [`ToolName::ALL`]
    pub fn build(self) -> Result<ToolRegistry, RegistryError> {
        for (name, handler) in &self.tools {
            let declared = ToolName::from_str(name).map_err(|_| RegistryError::UndeclaredTool(name.clone()))?;
            if declared != handler.name() {
                return Err(RegistryError::HandlerMismatch {
                    name: name.clone(),
                    handler: handler.name(),
                });
            }
        }

        for tool in ToolName::ALL {
            if !self.tools.iter().any(|(name, _)| name == tool.as_str()) {
                return Err(RegistryError::MissingTool(tool));
            }
        }

        let order = self.tools.iter().map(|(name, _)| name.clone()).collect();
        let tools = self
            .tools
            .into_iter()
            .map(|(name, handler)| {
                let definition = handler.definition();
                (name, RegisteredTool { definition, handler })
            })
            .collect();

        Ok(ToolRegistry { tools, order })
    }
}

/// One frozen registration: the argument contract travels inside the handler
#[derive(Debug)]
pub struct RegisteredTool {
    pub definition: ToolDefinition,
    handler: ToolHandler,
}

/// Name to tool mapping, immutable after start-up
#[derive(Debug)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// The four skinguide tools, searching through `catalog`
    pub fn skinguide(catalog: Arc<dyn ProductCatalog>) -> Result<Self, RegistryError> {
        ToolRegistry::builder()
            .register(ToolName::SearchProducts.as_str(), ToolHandler::SearchProducts(catalog))?
            .register(ToolName::GetSkinTypeInfo.as_str(), ToolHandler::GetSkinTypeInfo)?
            .register(ToolName::ListSkinTypes.as_str(), ToolHandler::ListSkinTypes)?
            .register(ToolName::GetProductTypes.as_str(), ToolHandler::GetProductTypes)?
            .build()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definitions in registration order, for `tools/list`
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition.clone())
            .collect()
    }

    /// Look up `name` and run it with `arguments`
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.handler.invoke(arguments).await
    }

    /// Serve one `tools/call` request, always producing exactly one response
    ///
    /// Unknown tools and rejected arguments become JSON-RPC errors; a tool
    /// that runs and fails becomes an `isError` result carrying its message.
    pub async fn dispatch(&self, id: RequestId, params: Value) -> Response {
        let call: ToolCallParams = match serde_json::from_value(params) {
            Ok(call) => call,
            Err(e) => {
                return Response::error(
                    id,
                    RpcError::new(ErrorKind::InvalidArguments, format!("Invalid tools/call parameters: {}", e)),
                );
            }
        };

        info!("Calling tool {} (request {})", call.name, id);
        let result = match self.invoke(&call.name, call.arguments).await {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(text) => ToolCallResult::success(text),
                Err(e) => ToolCallResult::error(format!("Failed to serialize result: {}", e)),
            },
            Err(ToolError::ExecutionFailed(message)) => {
                error!("{} failed: {}", call.name, message);
                ToolCallResult::error(message)
            }
            Err(e) => return Response::error(id, RpcError::new(e.kind(), e.to_string())),
        };

        match serde_json::to_value(result) {
            Ok(value) => Response::success(id, value),
            Err(e) => Response::error(id, RpcError::new(ErrorKind::ToolExecutionFailed, e.to_string())),
        }
    }
}
