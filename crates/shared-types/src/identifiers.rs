//! # Identifiers and References
//!
//! Identifiers owned by the orchestration node, plus the transaction and
//! message references that travel through the token connector inside the
//! opaque correlation data.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Loosely-typed JSON object as exchanged with the token connector.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Identifier of an operation tracked by the orchestration node.
///
/// Sent to the connector as `requestId` and echoed back in receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Generate a new random operation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the canonical hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OperationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Kind of node transaction an operation belongs to.
///
/// Correlation data may be written by other nodes, so types this node does
/// not model are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Batch of pinned messages.
    BatchPin,
    /// Token pool creation or activation.
    TokenPool,
    /// Mint, burn or transfer.
    TokenTransfer,
    /// Operator approval.
    TokenApproval,
    /// Unpinned message delivery.
    Unpinned,
    /// Any other transaction type.
    Other(String),
}

impl TransactionType {
    /// Wire name of the transaction type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::BatchPin => "batch_pin",
            Self::TokenPool => "token_pool",
            Self::TokenTransfer => "token_transfer",
            Self::TokenApproval => "token_approval",
            Self::Unpinned => "unpinned",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for TransactionType {
    fn from(s: &str) -> Self {
        match s {
            "batch_pin" => Self::BatchPin,
            "token_pool" => Self::TokenPool,
            "token_transfer" => Self::TokenTransfer,
            "token_approval" => Self::TokenApproval,
            "unpinned" => Self::Unpinned,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransactionType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Reference to the node transaction that caused an operation.
///
/// The ID is absent for events this node did not initiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRef {
    /// Transaction ID.
    pub id: Option<Uuid>,
    /// Transaction type.
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
}

impl TransactionRef {
    /// Reference a known transaction.
    pub fn new(id: Uuid, tx_type: TransactionType) -> Self {
        Self {
            id: Some(id),
            tx_type,
        }
    }

    /// Reference with no transaction ID (externally initiated).
    pub fn untracked(tx_type: TransactionType) -> Self {
        Self { id: None, tx_type }
    }
}

/// Errors parsing a [`Bytes32`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Bytes32Error {
    /// Not valid hexadecimal.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded to the wrong number of bytes.
    #[error("Expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 32-byte hash, hex encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bytes32(pub [u8; 32]);

impl FromStr for Bytes32 {
    type Err = Bytes32Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| Bytes32Error::InvalidHex(e.to_string()))?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Bytes32Error::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_id_parse_display() {
        let id = OperationId::new();
        let parsed = OperationId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_operation_id_rejects_garbage() {
        assert!(OperationId::parse("not-a-uuid").is_err());
        assert!(OperationId::parse("").is_err());
    }

    #[test]
    fn test_transaction_type_wire_names() {
        let json = serde_json::to_string(&TransactionType::TokenTransfer).unwrap();
        assert_eq!(json, "\"token_transfer\"");
        let parsed: TransactionType = serde_json::from_str("\"token_pool\"").unwrap();
        assert_eq!(parsed, TransactionType::TokenPool);
        let other: TransactionType = serde_json::from_str("\"contract_invoke\"").unwrap();
        assert_eq!(other, TransactionType::Other("contract_invoke".into()));
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"contract_invoke\"");
        assert!(serde_json::from_str::<TransactionType>("7").is_err());
    }

    #[test]
    fn test_bytes32_accepts_prefix() {
        let hex_str = "ab".repeat(32);
        let plain: Bytes32 = hex_str.parse().unwrap();
        let prefixed: Bytes32 = format!("0x{}", hex_str).parse().unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain.to_string(), hex_str);
    }

    #[test]
    fn test_bytes32_wrong_length() {
        let err = "abcd".parse::<Bytes32>().unwrap_err();
        assert_eq!(err, Bytes32Error::InvalidLength(2));
    }
}
