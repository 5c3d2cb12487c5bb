//! # Outbound Ports
//!
//! Traits for external dependencies: the node callbacks, the HTTP command
//! transport and the event channel.

use crate::domain::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{CallbackError, OperationUpdate, TokenApproval, TokenPool, TokenTransfer};
use std::collections::HashMap;

/// Node callbacks receiving decoded records - outbound port.
///
/// Records are handed over by value; the callback owns them.
#[async_trait]
pub trait TokenCallbacks: Send + Sync {
    /// Outcome of a previously issued operation. Infallible for the caller.
    async fn token_op_update(&self, connector: &str, update: OperationUpdate);

    /// A pool was created or activated.
    async fn token_pool_created(&self, connector: &str, pool: TokenPool)
        -> Result<(), CallbackError>;

    /// Tokens were minted, burned or transferred.
    async fn tokens_transferred(
        &self,
        connector: &str,
        transfer: TokenTransfer,
    ) -> Result<(), CallbackError>;

    /// An operator approval changed.
    async fn tokens_approved(
        &self,
        connector: &str,
        approval: TokenApproval,
    ) -> Result<(), CallbackError>;
}

/// Raw HTTP response from the command transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Response with `status` and `body`.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP command transport - outbound port.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// POST a JSON body to `path` (relative to the connector base URL).
    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;
}

/// Event channel used by the event loop - outbound port.
///
/// Owned exclusively by the loop. `Sync` so the loop future stays `Send`
/// while handlers borrow it across awaits.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Next inbound frame. Waits until the channel is connected; `None` once
    /// the peer has gone away.
    async fn receive(&mut self) -> Option<Vec<u8>>;

    /// Write one frame.
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError>;

    /// Close the channel. Idempotent.
    async fn close(&mut self);
}

/// Opens the connection behind an [`EventChannel`] - outbound port.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    /// Connect once. A second call fails with `AlreadyConnected`.
    async fn connect(&self) -> Result<(), TransportError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock command transport for testing.
///
/// Answers `202 Accepted` with an empty body unless a response was scripted
/// for the path.
#[derive(Default)]
pub struct MockCommandTransport {
    responses: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<(String, serde_json::Value)>>,
    /// Fail every request with this error.
    pub fail_with: Option<TransportError>,
}

impl MockCommandTransport {
    /// Transport answering 202 to everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport failing every request.
    pub fn failing(error: TransportError) -> Self {
        Self {
            fail_with: Some(error),
            ..Default::default()
        }
    }

    /// Script the response for `path`.
    pub fn respond(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .insert(path.to_string(), HttpResponse::new(status, body));
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CommandTransport for MockCommandTransport {
    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push((path.to_string(), body));
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(self
            .responses
            .lock()
            .get(path)
            .cloned()
            .unwrap_or_else(|| HttpResponse::new(202, Vec::new())))
    }
}

/// Callback sink recording every record, for testing.
#[derive(Default)]
pub struct RecordingCallbacks {
    /// Receipts delivered.
    pub updates: Mutex<Vec<OperationUpdate>>,
    /// Pools delivered.
    pub pools: Mutex<Vec<TokenPool>>,
    /// Transfers delivered.
    pub transfers: Mutex<Vec<TokenTransfer>>,
    /// Approvals delivered.
    pub approvals: Mutex<Vec<TokenApproval>>,
    /// When set, fallible callbacks record the record and then return this.
    pub fail_with: Mutex<Option<CallbackError>>,
}

impl RecordingCallbacks {
    /// Sink accepting everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent fallible callbacks fail.
    pub fn fail_with(&self, error: CallbackError) {
        *self.fail_with.lock() = Some(error);
    }

    fn outcome(&self) -> Result<(), CallbackError> {
        match self.fail_with.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TokenCallbacks for RecordingCallbacks {
    async fn token_op_update(&self, _connector: &str, update: OperationUpdate) {
        self.updates.lock().push(update);
    }

    async fn token_pool_created(
        &self,
        _connector: &str,
        pool: TokenPool,
    ) -> Result<(), CallbackError> {
        self.pools.lock().push(pool);
        self.outcome()
    }

    async fn tokens_transferred(
        &self,
        _connector: &str,
        transfer: TokenTransfer,
    ) -> Result<(), CallbackError> {
        self.transfers.lock().push(transfer);
        self.outcome()
    }

    async fn tokens_approved(
        &self,
        _connector: &str,
        approval: TokenApproval,
    ) -> Result<(), CallbackError> {
        self.approvals.lock().push(approval);
        self.outcome()
    }
}
