//! Connection lifecycle: the initialize handshake state machine
//!
//! `Uninitialized -> Negotiating -> Ready -> Closed`. The server moves to
//! `Negotiating` once it has answered `initialize` and to `Ready` when the
//! client's `initialized` notification arrives. The client walks the same
//! states from its side of the exchange.

use crate::mcp::protocol::{ErrorKind, RpcError};

/// Handshake method and notification names
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    /// Pre-namespacing name still sent by some clients
    pub const INITIALIZED_LEGACY: &str = "initialized";
    pub const PING: &str = "ping";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const CANCELLED: &str = "notifications/cancelled";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Negotiating,
    Ready,
    Closed,
}

/// Handshake state of one connection
#[derive(Debug)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LifecycleState::Ready
    }

    /// Decide whether a request for `method` may be served right now
    pub fn admit(&self, method: &str) -> Result<(), RpcError> {
        match (self.state, method) {
            (LifecycleState::Uninitialized, methods::INITIALIZE) => Ok(()),
            (_, methods::INITIALIZE) => Err(RpcError::new(
                ErrorKind::InvalidRequest,
                "Server already initialized",
            )),
            (LifecycleState::Ready, _) => Ok(()),
            (LifecycleState::Closed, _) => Err(RpcError::new(
                ErrorKind::TransportClosed,
                "Connection is closed",
            )),
            (LifecycleState::Negotiating, _) => Err(RpcError::new(
                ErrorKind::NotInitialized,
                format!("Cannot call '{}' before the initialized notification", method),
            )),
            (LifecycleState::Uninitialized, _) => Err(RpcError::new(
                ErrorKind::NotInitialized,
                format!("Cannot call '{}' before initialize", method),
            )),
        }
    }

    /// `initialize` has been answered (server) or sent (client)
    pub fn begin_negotiation(&mut self) -> bool {
        self.transition(LifecycleState::Uninitialized, LifecycleState::Negotiating)
    }

    /// The `initialized` notification has been received (server) or sent (client)
    pub fn complete(&mut self) -> bool {
        self.transition(LifecycleState::Negotiating, LifecycleState::Ready)
    }

    /// The transport ended; terminal
    pub fn close(&mut self) {
        self.state = LifecycleState::Closed;
    }

    fn transition(&mut self, from: LifecycleState, to: LifecycleState) -> bool {
        if self.state == from {
            self.state = to;
            true
        } else {
            false
        }
    }
}

/// True for both spellings of the initialized notification
pub fn is_initialized_notification(method: &str) -> bool {
    method == methods::INITIALIZED || method == methods::INITIALIZED_LEGACY
}
