//! Public library interface for the SkinGuide MCP server
//!
//! This module exports the server wrapper, the MCP client and the tool and
//! catalog layers so the binaries and the integration tests can use them.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub mod catalog;
pub mod domain;
pub mod mcp;
pub mod tools;

// Re-export public modules and types
pub use catalog::{CatalogError, LiveCatalog, ProductCatalog, StaticCatalog};
pub use domain::*;
pub use mcp::{ClientError, McpClient, McpServer, ToolRegistry};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    #[error("Tool registry error: {0}")]
    Registry(#[from] mcp::RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Runtime settings for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the live product API
    pub api_url: String,
    /// Timeout applied to every live API request
    pub http_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: catalog::live::DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_secs(15),
        }
    }
}

/// Main SkinGuide server that speaks MCP over stdin/stdout
///
/// Holds the tool registry; the registry is built once here and shared
/// read-only by every request.
pub struct SkinGuideServer {
    registry: Arc<ToolRegistry>,
}

impl SkinGuideServer {
    /// Create a server whose product search goes to the live API
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        tracing::info!("Initializing SkinGuide server with live API: {}", config.api_url);
        let catalog = LiveCatalog::new(config.api_url, config.http_timeout)?;
        Self::with_catalog(Arc::new(catalog))
    }

    /// Create a server over any product catalog
    pub fn with_catalog(catalog: Arc<dyn ProductCatalog>) -> Result<Self, ServerError> {
        let registry = ToolRegistry::skinguide(catalog)?;
        tracing::info!("Registered {} tools", registry.len());
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// Returns once stdin closes and every in-flight call has replied.
    pub async fn run(self) -> Result<(), ServerError> {
        McpServer::new(self.registry).run().await
    }

    /// Serve one connection over arbitrary streams
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: tokio::io::AsyncRead + Unpin,
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        McpServer::new(self.registry).serve(reader, writer).await
    }

    /// The tool registry (useful for testing)
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}
