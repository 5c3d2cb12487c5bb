//! # TB-01 Token Connector
//!
//! Client for an external token-management service speaking the `fftokens`
//! protocol.
//!
//! **Subsystem ID:** 01  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Let the orchestration node drive token operations and learn their outcome:
//! - Commands (create/activate pool, mint, burn, transfer, approve) go out
//!   over HTTP
//! - Confirmations, including ones for operations this node never issued,
//!   come back over a WebSocket event channel
//! - Every confirmation is decoded, handed to the node and only then
//!   acknowledged
//!
//! ## Event Channel Guarantees
//!
//! | Guarantee | Description |
//! |-----------|-------------|
//! | Ordering | One frame at a time, in arrival order |
//! | Ack after delivery | Ack sent only after the callback returned `Ok` |
//! | Receipts | Delivered best-effort, never acked |
//! | Fail-fast | Callback or ack failure stops the loop unacked |
//!
//! ## Module Structure
//!
//! ```text
//! tb-01-token-connector/
//! ├── domain/          # Config, envelope, correlation data, codec, errors
//! ├── ports/           # TokenConnectorApi, TokenCallbacks, transports
//! ├── adapters/        # reqwest, tokio-tungstenite, in-memory channel
//! └── service/         # Issuer, event loop, facade
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{in_memory_channel, HttpCommandTransport, InMemoryPeer};
pub use domain::{
    ChannelState, ConnectorConfig, ConnectorError, Decoded, EventCodec, EventKind, PoolSubmission,
    SkipReason, TokenData, TransportError, CONNECTOR_KIND, DEFAULT_WS_PATH,
};
pub use ports::{
    ChannelConnector, CommandTransport, EventChannel, HttpResponse, MockCommandTransport,
    RecordingCallbacks, TokenCallbacks, TokenConnectorApi,
};
pub use service::{CommandIssuer, EventLoopError, LoopExit, TokenConnector, Transports};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
