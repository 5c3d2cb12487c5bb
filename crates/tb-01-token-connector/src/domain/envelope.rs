//! # Event Envelope
//!
//! Frames exchanged on the event channel. Inbound: `{event, id, data}`.
//! Outbound: `{"event":"ack","data":{"id":...}}`.

use serde::Deserialize;
use shared_types::{JsonObject, TransferType};
use std::fmt;

/// Kind of an inbound event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Outcome of a previously issued command.
    Receipt,
    /// Pool created or activated.
    TokenPool,
    /// Tokens minted.
    TokenMint,
    /// Tokens burned.
    TokenBurn,
    /// Tokens transferred.
    TokenTransfer,
    /// Operator approval changed.
    TokenApproval,
    /// Anything else.
    Unknown,
}

impl EventKind {
    /// Classify a wire event name.
    pub fn parse(event: &str) -> Self {
        match event {
            "receipt" => Self::Receipt,
            "token-pool" => Self::TokenPool,
            "token-mint" => Self::TokenMint,
            "token-burn" => Self::TokenBurn,
            "token-transfer" => Self::TokenTransfer,
            "token-approval" => Self::TokenApproval,
            _ => Self::Unknown,
        }
    }

    /// Wire name (`unknown` for unrecognised kinds).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::TokenPool => "token-pool",
            Self::TokenMint => "token-mint",
            Self::TokenBurn => "token-burn",
            Self::TokenTransfer => "token-transfer",
            Self::TokenApproval => "token-approval",
            Self::Unknown => "unknown",
        }
    }

    /// Transfer kind carried by mint/burn/transfer events.
    pub fn transfer_type(&self) -> Option<TransferType> {
        match self {
            Self::TokenMint => Some(TransferType::Mint),
            Self::TokenBurn => Some(TransferType::Burn),
            Self::TokenTransfer => Some(TransferType::Transfer),
            _ => None,
        }
    }

    /// Receipts are never acknowledged.
    pub fn requires_ack(&self) -> bool {
        !matches!(self, Self::Receipt)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound frame.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventEnvelope {
    /// Event name.
    #[serde(default)]
    pub event: String,
    /// Delivery ID, echoed in the ack.
    #[serde(default)]
    pub id: String,
    /// Event payload.
    #[serde(default)]
    data: Option<JsonObject>,
}

impl EventEnvelope {
    /// Parse a raw frame. Only JSON objects are envelopes.
    pub fn parse(frame: &[u8]) -> Result<Self, serde_json::Error> {
        let object: JsonObject = serde_json::from_slice(frame)?;
        serde_json::from_value(serde_json::Value::Object(object))
    }

    /// Classified event kind.
    pub fn kind(&self) -> EventKind {
        EventKind::parse(&self.event)
    }

    /// Payload (empty when the frame carried none).
    pub fn data(&self) -> &JsonObject {
        static EMPTY: std::sync::OnceLock<JsonObject> = std::sync::OnceLock::new();
        self.data
            .as_ref()
            .unwrap_or_else(|| EMPTY.get_or_init(JsonObject::new))
    }
}

/// Outbound ack frame for delivery `id`.
pub fn ack_frame(id: &str) -> Vec<u8> {
    serde_json::json!({
        "event": "ack",
        "data": { "id": id },
    })
    .to_string()
    .into_bytes()
}
