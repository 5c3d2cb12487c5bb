//! # Adapters Module
//!
//! Concrete transports behind the outbound ports.

pub mod http_transport;
pub mod memory_channel;
pub mod ws_channel;

pub use http_transport::HttpCommandTransport;
pub use memory_channel::{in_memory_channel, InMemoryConnector, InMemoryEventChannel, InMemoryPeer};
pub use ws_channel::{ws_event_channel, WsConnector, WsEventChannel};
