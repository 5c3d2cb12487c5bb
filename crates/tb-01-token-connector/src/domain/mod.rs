//! # Domain Module
//!
//! Configuration, wire envelope, correlation data and the event codec.

pub mod codec;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod payload;
pub mod timestamp;
pub mod token_data;
pub mod value_objects;

pub use codec::{Decoded, EventCodec, SkipReason};
pub use config::ConnectorConfig;
pub use envelope::{ack_frame, EventEnvelope, EventKind};
pub use errors::{ConnectorError, TransportError};
pub use payload::Payload;
pub use timestamp::{parse_timestamp, timestamp_or};
pub use token_data::TokenData;
pub use value_objects::*;
