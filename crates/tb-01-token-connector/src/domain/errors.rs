//! # Domain Errors
//!
//! Error types for the token connector.

use super::value_objects::ChannelState;
use shared_types::{CallbackError, TransferType};
use thiserror::Error;

/// Transport-level failures (HTTP command channel and WebSocket event channel).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not open the event channel.
    #[error("Connect failed: {0}")]
    Connect(String),

    /// Could not write a frame to the event channel.
    #[error("Send failed: {0}")]
    Send(String),

    /// The event channel is closed.
    #[error("Event channel closed")]
    Closed,

    /// `connect` was called on a channel that already had its one connection.
    #[error("Event channel already connected")]
    AlreadyConnected,

    /// HTTP request could not be completed.
    #[error("HTTP request failed: {0}")]
    Http(String),
}

/// Token connector error types.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Mandatory configuration missing.
    #[error("Missing configuration '{key}' for {section}")]
    MissingConfig {
        /// Configuration key
        key: &'static str,
        /// Configuration section the key belongs to
        section: &'static str,
    },

    /// Configuration present but unusable.
    #[error("Invalid configuration '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// The connector answered with a non-success status.
    #[error("Token connector returned {status}: {body}")]
    Rest {
        /// HTTP status code
        status: u16,
        /// Response body, lossily decoded
        body: String,
    },

    /// Transport failure.
    #[error("Token connector transport error: {0}")]
    Transport(#[from] TransportError),

    /// A synchronous pool response was not a JSON object.
    #[error("Invalid response body: {0}")]
    InvalidResponse(String),

    /// Request body could not be serialised.
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// Endpoints on a transfer request do not match the operation.
    #[error("Endpoint mismatch: expected {expected} request, got {actual}")]
    EndpointMismatch {
        /// Operation being issued
        expected: TransferType,
        /// Kind implied by the request endpoints
        actual: TransferType,
    },

    /// The node callback rejected a record.
    #[error("Callback failed: {0}")]
    Callback(#[from] CallbackError),

    /// `start` called when the channel is not disconnected.
    #[error("Event channel cannot start from state {0}")]
    InvalidState(ChannelState),

    /// The connector was shut down while the call was in flight.
    #[error("Operation cancelled")]
    Cancelled,
}

impl ConnectorError {
    /// True for configuration errors raised by `init`.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::MissingConfig { .. } | Self::InvalidConfig { .. })
    }
}
