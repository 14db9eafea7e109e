//! MCP protocol implementation
//!
//! Line-delimited JSON-RPC transport, request correlation, the initialize
//! handshake and both ends of the connection.

pub mod client;
pub mod correlator;
pub mod framer;
pub mod lifecycle;
pub mod protocol;
pub mod registry;
pub mod server;

// Re-export main types
pub use client::{ClientError, Connection, McpClient};
pub use correlator::{Completion, Correlator, CorrelatorError};
pub use framer::{MessageReader, MessageWriter};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use protocol::{ErrorKind, Message, RequestId, RpcError};
pub use registry::{RegistryError, ToolRegistry};
pub use server::McpServer;
