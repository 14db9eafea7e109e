//! MCP (Model Context Protocol) message structures and JSON-RPC handling
//!
//! This module defines the JSON-RPC message format that MCP clients and our
//! skinguide server exchange, one message per line.

use jsonrpc_core::ErrorCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// MCP protocol version we support
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC version tag carried by every message
pub const JSONRPC_VERSION: &str = "2.0";

/// Correlation identifier linking a request to its response
pub type RequestId = u64;

/// Errors produced while decoding a line into a protocol message
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// One protocol message: request, response or notification
///
/// Serialization is untagged, so each variant writes exactly its own JSON
/// object. Parsing goes through [`Message::parse`], which classifies the
/// object by the fields it carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    Request(Request),
    Response(Response),
    Notification(Notification),
}

/// JSON-RPC 2.0 request message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Unique identifier for this request
    pub id: RequestId,
    /// The method to call (e.g., "tools/call")
    pub method: String,
    /// Parameters for the method call
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

/// JSON-RPC 2.0 response message
///
/// Exactly one of `result` and `error` is set; the constructors below are
/// the only way this crate builds one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID that we're responding to
    pub id: RequestId,
    /// Successful result (if no error occurred)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information (if something went wrong)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC 2.0 notification: a request without an id, never answered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

/// JSON-RPC error information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Error code (standard JSON-RPC codes)
    pub code: i64,
    /// Human-readable error message
    pub message: String,
    /// Additional error details; we put the [`ErrorKind`] here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Failure taxonomy shared by the server, the client and the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A line that is not a valid protocol message
    MalformedLine,
    /// A request object that breaks the protocol rules (e.g. repeated initialize)
    InvalidRequest,
    /// A method the peer does not implement
    MethodNotFound,
    /// `tools/call` named a tool that is not registered
    UnknownTool,
    /// The tool's argument contract rejected the supplied arguments
    InvalidArguments,
    /// The tool ran and failed
    ToolExecutionFailed,
    /// A call arrived before the initialize handshake completed
    NotInitialized,
    /// A response carried an id with no pending request
    NoMatchingRequest,
    /// The stream ended while the call was still pending
    TransportClosed,
}

impl ErrorKind {
    /// JSON-RPC error code used on the wire for this kind
    pub fn code(self) -> ErrorCode {
        match self {
            ErrorKind::MalformedLine => ErrorCode::ParseError,
            ErrorKind::InvalidRequest => ErrorCode::InvalidRequest,
            ErrorKind::MethodNotFound => ErrorCode::MethodNotFound,
            ErrorKind::UnknownTool | ErrorKind::InvalidArguments => ErrorCode::InvalidParams,
            ErrorKind::ToolExecutionFailed => ErrorCode::InternalError,
            ErrorKind::NotInitialized => ErrorCode::ServerError(-32002),
            ErrorKind::NoMatchingRequest => ErrorCode::ServerError(-32003),
            ErrorKind::TransportClosed => ErrorCode::ServerError(-32000),
        }
    }

    /// Best-effort reverse mapping for peers that send no `data.kind`
    fn from_code(code: i64) -> Option<Self> {
        match ErrorCode::from(code) {
            ErrorCode::ParseError => Some(ErrorKind::MalformedLine),
            ErrorCode::InvalidRequest => Some(ErrorKind::InvalidRequest),
            ErrorCode::MethodNotFound => Some(ErrorKind::MethodNotFound),
            ErrorCode::InvalidParams => Some(ErrorKind::InvalidArguments),
            ErrorCode::InternalError => Some(ErrorKind::ToolExecutionFailed),
            ErrorCode::ServerError(-32002) => Some(ErrorKind::NotInitialized),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl RpcError {
    /// Create an error of the given kind, tagging `data.kind` so clients can
    /// tell `UnknownTool` and `InvalidArguments` apart despite the shared code
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code: kind.code().code(),
            message: message.into(),
            data: Some(json!({ "kind": kind })),
        }
    }

    /// The failure kind, read from `data.kind` or derived from the code
    pub fn kind(&self) -> Option<ErrorKind> {
        self.data
            .as_ref()
            .and_then(|data| data.get("kind"))
            .and_then(|kind| serde_json::from_value(kind.clone()).ok())
            .or_else(|| ErrorKind::from_code(self.code))
    }
}

impl Request {
    pub fn new(id: RequestId, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

impl Response {
    /// Create a successful response
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: RequestId, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Split into the success payload or the error payload
    pub fn into_outcome(self) -> Result<Value, RpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Wire shape before classification; every field optional
#[derive(Debug, Deserialize)]
struct RawMessage {
    jsonrpc: Option<String>,
    #[serde(default, deserialize_with = "present")]
    id: Option<Value>,
    method: Option<String>,
    #[serde(default)]
    params: Value,
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Keeps `"result": null` distinguishable from a missing `result`
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn numeric_id(id: Value) -> Result<RequestId, ProtocolError> {
    id.as_u64()
        .ok_or_else(|| ProtocolError::InvalidMessage(format!("id must be a non-negative integer, got {}", id)))
}

impl TryFrom<RawMessage> for Message {
    type Error = ProtocolError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        if raw.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
            return Err(ProtocolError::InvalidMessage(format!(
                "unsupported jsonrpc version {:?}",
                raw.jsonrpc
            )));
        }

        match (raw.method, raw.id) {
            (Some(method), Some(id)) => Ok(Message::Request(Request {
                jsonrpc: JSONRPC_VERSION.to_string(),
                id: numeric_id(id)?,
                method,
                params: raw.params,
            })),
            (Some(method), None) => Ok(Message::Notification(Notification {
                jsonrpc: JSONRPC_VERSION.to_string(),
                method,
                params: raw.params,
            })),
            (None, Some(id)) => {
                let id = numeric_id(id)?;
                match (raw.result, raw.error) {
                    (Some(result), None) => Ok(Message::Response(Response::success(id, result))),
                    (None, Some(error)) => Ok(Message::Response(Response::error(id, error))),
                    _ => Err(ProtocolError::InvalidMessage(format!(
                        "response {} must carry exactly one of result or error",
                        id
                    ))),
                }
            }
            (None, None) => Err(ProtocolError::InvalidMessage(
                "message has neither method nor id".to_string(),
            )),
        }
    }
}

impl Message {
    /// Parse one line of text into a message
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let raw: RawMessage = serde_json::from_str(line)?;
        Message::try_from(raw)
    }

    /// Serialize to a single line, terminator included
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        Message::Response(response)
    }
}

impl From<Notification> for Message {
    fn from(notification: Notification) -> Self {
        Message::Notification(notification)
    }
}

/// Information about a client or server implementation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

/// MCP initialization request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// MCP protocol version the client supports
    pub protocol_version: String,
    /// Capabilities the client supports
    #[serde(default)]
    pub capabilities: Value,
    /// Client information
    pub client_info: Implementation,
}

/// MCP initialization response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// MCP protocol version we negotiated
    pub protocol_version: String,
    /// Our server capabilities
    pub capabilities: ServerCapabilities,
    /// Information about our server
    pub server_info: Implementation,
    /// Free-form usage hint for the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// MCP server capabilities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tools that this server provides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// Tools capability information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// Whether the tool list can change at runtime
    #[serde(default)]
    pub list_changed: bool,
}

/// MCP tool definition returned by `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name (e.g., "search_products")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

/// Result of `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDefinition>,
}

/// MCP tool call parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call (e.g., "get_skin_type_info")
    pub name: String,
    /// Arguments to pass to the tool
    #[serde(default = "empty_object")]
    pub arguments: Value,
}

fn empty_object() -> Value {
    json!({})
}

/// MCP tool call result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Tool execution results
    pub content: Vec<ToolContent>,
    /// Whether this is an error result
    #[serde(default)]
    pub is_error: bool,
}

/// Content returned by a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolContent {
    /// Type of content (always "text" here)
    #[serde(rename = "type")]
    pub content_type: String,
    /// The actual content/result
    pub text: String,
}

impl ToolCallResult {
    /// Create a successful tool result with text content
    pub fn success(text: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(error_message: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: error_message,
            }],
            is_error: true,
        }
    }

    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
