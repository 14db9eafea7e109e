//! Pending-request table matching responses to their callers
//!
//! Every outstanding request owns one entry keyed by its id. A response
//! settles and removes the entry; a response for an id with no entry is
//! dropped with a warning. When the transport goes away the whole table is
//! drained so no caller waits forever.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::mcp::protocol::{RequestId, RpcError};

/// How a pending request was settled
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The peer answered with a result
    Result(Value),
    /// The peer answered with an error payload
    Error(RpcError),
    /// The transport closed before an answer arrived
    Closed,
}

impl From<Result<Value, RpcError>> for Completion {
    fn from(outcome: Result<Value, RpcError>) -> Self {
        match outcome {
            Ok(value) => Completion::Result(value),
            Err(error) => Completion::Error(error),
        }
    }
}

/// Errors raised when registering a pending request
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CorrelatorError {
    #[error("Request id {0} is already pending")]
    DuplicateId(RequestId),

    #[error("Transport closed, cannot register request {0}")]
    Closed(RequestId),
}

#[derive(Default)]
struct Table {
    pending: HashMap<RequestId, oneshot::Sender<Completion>>,
    closed: bool,
}

/// Tracks outstanding requests for one connection
#[derive(Default)]
pub struct Correlator {
    table: Mutex<Table>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    // Critical sections never panic, so a poisoned lock still holds a consistent table.
    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a pending entry for `id`
    pub fn register(&self, id: RequestId, handle: oneshot::Sender<Completion>) -> Result<(), CorrelatorError> {
        let mut table = self.table();
        if table.closed {
            return Err(CorrelatorError::Closed(id));
        }
        if table.pending.contains_key(&id) {
            return Err(CorrelatorError::DuplicateId(id));
        }
        table.pending.insert(id, handle);
        Ok(())
    }

    /// Settle and remove the entry for `id`
    ///
    /// Returns `false` when no entry exists; the completion is discarded.
    pub fn resolve(&self, id: RequestId, completion: Completion) -> bool {
        let handle = self.table().pending.remove(&id);
        match handle {
            Some(handle) => {
                if handle.send(completion).is_err() {
                    debug!("Caller for request {} went away before its response", id);
                }
                true
            }
            None => {
                warn!("Discarding response for request {}: no matching request", id);
                false
            }
        }
    }

    /// Remove the entry for `id` without settling it
    pub fn cancel(&self, id: RequestId) -> bool {
        self.table().pending.remove(&id).is_some()
    }

    /// Settle every remaining entry with [`Completion::Closed`]
    ///
    /// Later registrations fail. Returns how many entries were drained; a
    /// second call drains nothing.
    pub fn drain_all(&self) -> usize {
        let drained: Vec<_> = {
            let mut table = self.table();
            table.closed = true;
            table.pending.drain().collect()
        };

        let count = drained.len();
        for (id, handle) in drained {
            debug!("Failing request {}: transport closed", id);
            let _ = handle.send(Completion::Closed);
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.table().pending.len()
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.table().pending.contains_key(&id)
    }

    pub fn is_closed(&self) -> bool {
        self.table().closed
    }
}
