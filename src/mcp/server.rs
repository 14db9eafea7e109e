//! MCP server loop over a pair of byte streams
//!
//! Reads one message per line, walks the initialize handshake and routes
//! requests:
//! - `initialize`, `ping` and `tools/list` are answered inline
//! - `tools/call` runs on its own task so a slow tool never holds up the read loop
//!
//! Replies to tool calls may therefore leave in a different order than their
//! requests arrived; each carries the id of its own request.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::mcp::framer::{MessageReader, MessageWriter};
use crate::mcp::lifecycle::{is_initialized_notification, methods, Lifecycle};
use crate::mcp::protocol::*;
use crate::mcp::registry::ToolRegistry;
use crate::ServerError;

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "skinguide-mcp-server";

const INSTRUCTIONS: &str =
    "SkinGuide MCP Server: Search skincare products by Baumann skin type, category, country, and budget.";

/// MCP server bound to one tool registry
pub struct McpServer {
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Serve over stdin/stdout until stdin closes
    pub async fn run(&self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one connection until `reader` reaches end of stream
    ///
    /// In-flight tool calls are allowed to finish and reply before this
    /// returns. A failed write is fatal and ends the loop with an error.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut lifecycle = Lifecycle::new();
        let mut reader = MessageReader::new(reader);
        let writer = Arc::new(MessageWriter::new(writer));
        let mut in_flight: JoinSet<std::io::Result<()>> = JoinSet::new();

        loop {
            tokio::select! {
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    settle(joined)?;
                }
                message = reader.next_message() => {
                    match message? {
                        Some(message) => {
                            self.handle_message(message, &mut lifecycle, &writer, &mut in_flight).await?;
                        }
                        None => break,
                    }
                }
            }
        }

        info!("MCP server shutting down (input closed), {} call(s) in flight", in_flight.len());
        while let Some(joined) = in_flight.join_next().await {
            settle(joined)?;
        }
        lifecycle.close();

        if reader.skipped_lines() > 0 {
            warn!("Skipped {} malformed line(s) during the session", reader.skipped_lines());
        }
        Ok(())
    }

    async fn handle_message<W>(
        &self,
        message: Message,
        lifecycle: &mut Lifecycle,
        writer: &Arc<MessageWriter<W>>,
        in_flight: &mut JoinSet<std::io::Result<()>>,
    ) -> Result<(), ServerError>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        match message {
            Message::Request(request) => {
                if let Some(response) = self.handle_request(request, lifecycle, writer, in_flight) {
                    writer.write_message(&Message::from(response)).await?;
                }
            }
            Message::Notification(notification) => handle_notification(notification, lifecycle),
            Message::Response(response) => {
                warn!("Ignoring response {} sent to the server", response.id);
            }
        }
        Ok(())
    }

    /// Answer a request inline, or hand a tool call to its own task and
    /// return `None`
    fn handle_request<W>(
        &self,
        request: Request,
        lifecycle: &mut Lifecycle,
        writer: &Arc<MessageWriter<W>>,
        in_flight: &mut JoinSet<std::io::Result<()>>,
    ) -> Option<Response>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let Request { id, method, params, .. } = request;

        if let Err(error) = lifecycle.admit(&method) {
            warn!("Rejecting '{}' (request {}): {}", method, id, error.message);
            return Some(Response::error(id, error));
        }

        let response = match method.as_str() {
            methods::INITIALIZE => {
                let response = handle_initialize(id, params);
                if response.error.is_none() {
                    lifecycle.begin_negotiation();
                }
                response
            }
            methods::PING => Response::success(id, json!({})),
            methods::TOOLS_LIST => {
                let result = ToolsListResult {
                    tools: self.registry.definitions(),
                };
                to_response(id, &result)
            }
            methods::TOOLS_CALL => {
                let registry = Arc::clone(&self.registry);
                let writer = Arc::clone(writer);
                in_flight.spawn(async move {
                    let response = registry.dispatch(id, params).await;
                    writer.write_message(&Message::from(response)).await
                });
                return None;
            }
            other => Response::error(
                id,
                RpcError::new(ErrorKind::MethodNotFound, format!("Method '{}' not found", other)),
            ),
        };
        Some(response)
    }
}

fn handle_initialize(id: RequestId, params: Value) -> Response {
    let params: InitializeParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => {
            return Response::error(
                id,
                RpcError::new(ErrorKind::InvalidRequest, format!("Invalid initialize parameters: {}", e)),
            );
        }
    };

    info!(
        "MCP client connected: {} {} (protocol {})",
        params.client_info.name, params.client_info.version, params.protocol_version
    );
    if params.protocol_version != MCP_VERSION {
        warn!(
            "Client asked for protocol {}, answering with {}",
            params.protocol_version, MCP_VERSION
        );
    }

    let result = InitializeResult {
        protocol_version: MCP_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: false }),
        },
        server_info: Implementation {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        instructions: Some(INSTRUCTIONS.to_string()),
    };
    to_response(id, &result)
}

fn handle_notification(notification: Notification, lifecycle: &mut Lifecycle) {
    if is_initialized_notification(&notification.method) {
        if lifecycle.complete() {
            info!("Handshake complete, tools are callable");
        } else {
            warn!("Unexpected '{}' in state {:?}", notification.method, lifecycle.state());
        }
    } else if notification.method == methods::CANCELLED {
        debug!("Client cancelled a request: {}", notification.params);
    } else {
        debug!("Ignoring notification '{}'", notification.method);
    }
}

fn to_response<T: serde::Serialize>(id: RequestId, result: &T) -> Response {
    match serde_json::to_value(result) {
        Ok(value) => Response::success(id, value),
        Err(e) => Response::error(id, RpcError::new(ErrorKind::InvalidRequest, e.to_string())),
    }
}

fn settle(joined: Result<std::io::Result<()>, JoinError>) -> Result<(), ServerError> {
    joined??;
    Ok(())
}
