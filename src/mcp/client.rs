//! MCP client: call dispatcher and handshake over a pair of byte streams
//!
//! [`Connection`] owns one id counter and one pending-request table. A
//! background task reads replies and settles pending calls through the
//! [`Correlator`], so a caller waiting on one reply never blocks delivery of
//! another. [`McpClient`] layers the MCP handshake and the `tools/*` methods
//! on top and can spawn the server as a child process.

use std::process::ExitStatus;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::mcp::correlator::{Completion, Correlator, CorrelatorError};
use crate::mcp::framer::{MessageReader, MessageWriter};
use crate::mcp::lifecycle::{methods, Lifecycle, LifecycleState};
use crate::mcp::protocol::*;

/// Client-side failures
#[derive(Error, Debug)]
pub enum ClientError {
    /// The peer answered with an error payload, or a tool reported failure
    #[error("Remote error {code}: {message}")]
    Remote {
        kind: Option<ErrorKind>,
        code: i64,
        message: String,
    },

    #[error("Call attempted before the initialize handshake completed")]
    NotInitialized,

    #[error("Handshake already started on this connection")]
    AlreadyInitialized,

    #[error("Transport closed before a reply arrived")]
    TransportClosed,

    #[error("No reply to '{method}' within {after:?}")]
    Timeout { method: String, after: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Correlation error: {0}")]
    Correlator(CorrelatorError),
}

impl ClientError {
    /// Build from an error payload received from the peer
    pub fn remote(error: RpcError) -> Self {
        ClientError::Remote {
            kind: error.kind(),
            code: error.code,
            message: error.message,
        }
    }

    /// The protocol failure kind, when there is one
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Remote { kind, .. } => *kind,
            ClientError::NotInitialized => Some(ErrorKind::NotInitialized),
            ClientError::TransportClosed => Some(ErrorKind::TransportClosed),
            _ => None,
        }
    }
}

impl From<CorrelatorError> for ClientError {
    fn from(e: CorrelatorError) -> Self {
        match e {
            CorrelatorError::Closed(_) => ClientError::TransportClosed,
            duplicate => ClientError::Correlator(duplicate),
        }
    }
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Removes the pending entry if the caller stops waiting early
struct PendingGuard<'a> {
    correlator: &'a Correlator,
    id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.correlator.cancel(self.id) {
            debug!("Request {} abandoned before its reply", self.id);
        }
    }
}

/// One logical connection: id counter, pending table and read loop
pub struct Connection {
    writer: Arc<MessageWriter<BoxedWriter>>,
    correlator: Arc<Correlator>,
    next_id: AtomicU64,
    timeout: Option<Duration>,
    reader_task: JoinHandle<()>,
}

impl Connection {
    /// Start the read loop on `reader` and send through `writer`
    ///
    /// Must be called inside a tokio runtime.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let writer: Arc<MessageWriter<BoxedWriter>> = Arc::new(MessageWriter::new(Box::new(writer)));
        let correlator = Arc::new(Correlator::new());
        let reader_task = tokio::spawn(read_loop(reader, Arc::clone(&correlator), Arc::clone(&writer)));

        Self {
            writer,
            correlator,
            next_id: AtomicU64::new(1),
            timeout: None,
            reader_task,
        }
    }

    /// Fail calls that wait longer than `timeout` for their reply
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send a request and wait for the reply carrying its id
    ///
    /// The id is taken under the write lock, so requests reach the stream in
    /// id order and in the order concurrent callers got the lock.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let (_guard, rx) = self
            .writer
            .write_with(|| {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let (tx, rx) = oneshot::channel();
                self.correlator.register(id, tx)?;
                let guard = PendingGuard {
                    correlator: &self.correlator,
                    id,
                };

                debug!("Calling '{}' as request {}", method, id);
                Ok::<_, ClientError>((Message::from(Request::new(id, method, params)), (guard, rx)))
            })
            .await?;

        let completion = match self.timeout {
            Some(after) => tokio::time::timeout(after, rx).await.map_err(|_| ClientError::Timeout {
                method: method.to_string(),
                after,
            })?,
            None => rx.await,
        };

        match completion {
            Ok(Completion::Result(value)) => Ok(value),
            Ok(Completion::Error(error)) => Err(ClientError::remote(error)),
            Ok(Completion::Closed) | Err(_) => Err(ClientError::TransportClosed),
        }
    }

    /// Send a notification; nothing is awaited beyond the write
    pub async fn notify(&self, method: &str, params: Value) -> Result<(), ClientError> {
        self.writer
            .write_message(&Message::from(Notification::new(method, params)))
            .await?;
        Ok(())
    }

    /// Number of calls still waiting for a reply
    pub fn pending(&self) -> usize {
        self.correlator.pending_count()
    }

    /// Whether the peer's stream has ended
    pub fn is_closed(&self) -> bool {
        self.correlator.is_closed()
    }

    /// Close the write side; the peer sees end of stream
    pub async fn close(&self) -> Result<(), ClientError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

async fn read_loop<R>(reader: R, correlator: Arc<Correlator>, writer: Arc<MessageWriter<BoxedWriter>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = MessageReader::new(reader);
    loop {
        match reader.next_message().await {
            Ok(Some(Message::Response(response))) => {
                let id = response.id;
                correlator.resolve(id, Completion::from(response.into_outcome()));
            }
            Ok(Some(Message::Request(request))) => {
                let response = if request.method == methods::PING {
                    Response::success(request.id, json!({}))
                } else {
                    Response::error(
                        request.id,
                        RpcError::new(
                            ErrorKind::MethodNotFound,
                            format!("Client does not handle '{}'", request.method),
                        ),
                    )
                };
                if let Err(e) = writer.write_message(&Message::from(response)).await {
                    error!("Failed to answer server request {}: {}", request.id, e);
                    break;
                }
            }
            Ok(Some(Message::Notification(notification))) => {
                debug!("Server notification '{}'", notification.method);
            }
            Ok(None) => {
                debug!("Server closed its output");
                break;
            }
            Err(e) => {
                error!("Failed to read from server: {}", e);
                break;
            }
        }
    }

    let drained = correlator.drain_all();
    if drained > 0 {
        warn!("Transport closed with {} call(s) pending", drained);
    }
}

/// MCP client over one [`Connection`]
pub struct McpClient {
    connection: Connection,
    lifecycle: Mutex<Lifecycle>,
    child: Option<Child>,
}

impl McpClient {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::from_connection(Connection::new(reader, writer))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection,
            lifecycle: Mutex::new(Lifecycle::new()),
            child: None,
        }
    }

    /// Spawn `program` and talk to it over its stdin/stdout
    ///
    /// The child's stderr is inherited so its logs stay visible.
    pub fn spawn<I, S>(program: &str, args: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut child = Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "child stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "child stdout unavailable"))?;

        info!("Spawned MCP server '{}' (pid {:?})", program, child.id());
        let mut client = Self::new(stdout, stdin);
        client.child = Some(child);
        Ok(client)
    }

    /// Fail calls that wait longer than `timeout` for their reply
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connection = self.connection.with_timeout(timeout);
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle().state()
    }

    fn lifecycle(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the handshake: `initialize`, then the `initialized` notification
    ///
    /// A failed handshake leaves the client unusable; open a new connection
    /// to retry.
    pub async fn initialize(&self, client_info: Implementation) -> Result<InitializeResult, ClientError> {
        if !self.lifecycle().begin_negotiation() {
            return Err(ClientError::AlreadyInitialized);
        }

        let params = InitializeParams {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: json!({}),
            client_info,
        };
        let result = self
            .connection
            .call(methods::INITIALIZE, serde_json::to_value(params)?)
            .await?;
        let result: InitializeResult = serde_json::from_value(result)?;

        self.connection.notify(methods::INITIALIZED, Value::Null).await?;
        self.lifecycle().complete();

        info!(
            "Connected to {} {} (protocol {})",
            result.server_info.name, result.server_info.version, result.protocol_version
        );
        Ok(result)
    }

    /// Issue a request once the handshake allows it
    async fn request(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        if self.connection.is_closed() {
            self.lifecycle().close();
        }
        if let Err(error) = self.lifecycle().admit(method) {
            return Err(match error.kind() {
                Some(ErrorKind::NotInitialized) => ClientError::NotInitialized,
                Some(ErrorKind::TransportClosed) => ClientError::TransportClosed,
                _ => ClientError::remote(error),
            });
        }
        self.connection.call(method, params).await
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        self.request(methods::PING, Value::Null).await?;
        Ok(())
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ClientError> {
        let result = self.request(methods::TOOLS_LIST, Value::Null).await?;
        let list: ToolsListResult = serde_json::from_value(result)?;
        Ok(list.tools)
    }

    /// Call a tool and decode its JSON text content
    ///
    /// An `isError` result becomes [`ClientError::Remote`] with kind
    /// [`ErrorKind::ToolExecutionFailed`]. Text that is not JSON is returned
    /// as a string value.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ClientError> {
        let params = serde_json::to_value(ToolCallParams {
            name: name.to_string(),
            arguments,
        })?;
        let result = self.request(methods::TOOLS_CALL, params).await?;
        let result: ToolCallResult = serde_json::from_value(result)?;

        let text = result.text();
        if result.is_error {
            return Err(ClientError::Remote {
                kind: Some(ErrorKind::ToolExecutionFailed),
                code: ErrorKind::ToolExecutionFailed.code().code(),
                message: text,
            });
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    /// Close the connection and wait for a spawned server to exit
    pub async fn shutdown(mut self) -> Result<Option<ExitStatus>, ClientError> {
        self.lifecycle().close();
        self.connection.close().await?;
        match self.child.take() {
            Some(mut child) => Ok(Some(child.wait().await?)),
            None => Ok(None),
        }
    }
}
