//! # Token Records
//!
//! Strongly-typed token pool, transfer and approval records handed to the
//! orchestration node, and the requests the node issues against a token
//! connector.
//!
//! Records are built transiently per event (or per synchronous response) and
//! ownership passes straight to the node's callbacks.

use crate::identifiers::{Bytes32, JsonObject, OperationId, TransactionRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use num_bigint::BigInt;

/// Token pool type.
///
/// The connector may report types this node does not model; those are kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Interchangeable balances.
    Fungible,
    /// Individually indexed tokens.
    NonFungible,
    /// Any other connector-defined type.
    Other(String),
}

impl TokenType {
    /// Wire name of the token type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fungible => "fungible",
            Self::NonFungible => "nonfungible",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for TokenType {
    fn from(s: &str) -> Self {
        match s {
            "fungible" => Self::Fungible,
            "nonfungible" => Self::NonFungible,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TokenType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TokenType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Kind of token movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    /// Tokens created (no sender).
    Mint,
    /// Tokens destroyed (no recipient).
    Burn,
    /// Tokens moved between two holders.
    Transfer,
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mint => "mint",
            Self::Burn => "burn",
            Self::Transfer => "transfer",
        };
        f.write_str(s)
    }
}

/// Sender and recipient of a transfer.
///
/// The variant fixes the transfer kind, so a mint can never carry a sender
/// and a burn can never carry a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEndpoints {
    /// Mint into `to`.
    Mint {
        /// Recipient.
        to: String,
    },
    /// Burn from `from`.
    Burn {
        /// Holder the tokens are burned from.
        from: String,
    },
    /// Move from `from` to `to`.
    Transfer {
        /// Sender.
        from: String,
        /// Recipient.
        to: String,
    },
}

impl TransferEndpoints {
    /// Build endpoints for `kind`, returning `None` when a required side is
    /// missing or empty. Sides that the kind does not use are ignored.
    pub fn for_kind(kind: TransferType, from: Option<&str>, to: Option<&str>) -> Option<Self> {
        let from = from.filter(|s| !s.is_empty()).map(str::to_string);
        let to = to.filter(|s| !s.is_empty()).map(str::to_string);
        match kind {
            TransferType::Mint => Some(Self::Mint { to: to? }),
            TransferType::Burn => Some(Self::Burn { from: from? }),
            TransferType::Transfer => Some(Self::Transfer {
                from: from?,
                to: to?,
            }),
        }
    }

    /// The transfer kind implied by these endpoints.
    pub fn kind(&self) -> TransferType {
        match self {
            Self::Mint { .. } => TransferType::Mint,
            Self::Burn { .. } => TransferType::Burn,
            Self::Transfer { .. } => TransferType::Transfer,
        }
    }

    /// Sender, if the kind has one.
    pub fn from(&self) -> Option<&str> {
        match self {
            Self::Burn { from } | Self::Transfer { from, .. } => Some(from),
            Self::Mint { .. } => None,
        }
    }

    /// Recipient, if the kind has one.
    pub fn to(&self) -> Option<&str> {
        match self {
            Self::Mint { to } | Self::Transfer { to, .. } => Some(to),
            Self::Burn { .. } => None,
        }
    }
}

/// On-chain event that produced a token record.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockchainEvent {
    /// Protocol-level identifier (ordering key on the chain).
    pub protocol_id: String,
    /// Hash of the blockchain transaction.
    pub blockchain_tx_id: String,
    /// Human readable event name.
    pub name: String,
    /// Structured event output.
    pub output: JsonObject,
    /// `<connector-kind>:<connector-name>`.
    pub source: String,
    /// Contract location.
    pub location: String,
    /// Event signature.
    pub signature: String,
    /// Free-form connector info.
    pub info: JsonObject,
    /// When the event happened (or was received, if the connector omitted it).
    pub timestamp: DateTime<Utc>,
}

/// A token pool reported by the connector.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPool {
    /// Pool type.
    pub pool_type: TokenType,
    /// Connector-assigned primary key of the pool.
    pub pool_locator: String,
    /// Token standard (e.g. ERC20), if reported.
    pub standard: Option<String>,
    /// Token symbol, if reported.
    pub symbol: Option<String>,
    /// Extra connector info.
    pub info: JsonObject,
    /// Node transaction that created the pool.
    pub tx: TransactionRef,
    /// Configured name of the connector instance.
    pub connector: String,
    /// Associated on-chain event, if the connector supplied one.
    pub event: Option<BlockchainEvent>,
}

/// A confirmed mint, burn or transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTransfer {
    /// Sender/recipient (determines the kind).
    pub endpoints: TransferEndpoints,
    /// Pool the tokens belong to.
    pub pool_locator: String,
    /// Token index for non-fungible pools.
    pub token_index: Option<String>,
    /// Token URI for non-fungible pools.
    pub uri: Option<String>,
    /// Amount moved (arbitrary precision).
    pub amount: BigInt,
    /// Connector-supplied idempotency/grouping key.
    pub subject: String,
    /// Signing key.
    pub key: String,
    /// Message attached to the transfer, if this node sent one.
    pub message: Option<Uuid>,
    /// Hash of the attached message.
    pub message_hash: Option<Bytes32>,
    /// Node transaction reference.
    pub tx: TransactionRef,
    /// Configured name of the connector instance.
    pub connector: String,
    /// Associated on-chain event.
    pub event: Option<BlockchainEvent>,
}

impl TokenTransfer {
    /// Kind of the transfer.
    pub fn transfer_type(&self) -> TransferType {
        self.endpoints.kind()
    }
}

/// A confirmed operator approval (or revocation).
#[derive(Debug, Clone, PartialEq)]
pub struct TokenApproval {
    /// Pool the approval applies to.
    pub pool_locator: String,
    /// Signing key granting the approval.
    pub key: String,
    /// Grantee.
    pub operator: String,
    /// `true` for approve, `false` for revoke.
    pub approved: bool,
    /// Connector-supplied idempotency/grouping key.
    pub subject: String,
    /// Node transaction reference.
    pub tx: TransactionRef,
    /// Configured name of the connector instance.
    pub connector: String,
    /// Associated on-chain event.
    pub event: Option<BlockchainEvent>,
}

/// Final status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    /// Operation completed.
    Succeeded,
    /// Operation failed.
    Failed,
}

impl fmt::Display for OpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Receipt for a previously issued operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationUpdate {
    /// Operation the receipt refers to.
    pub operation_id: OperationId,
    /// Outcome.
    pub status: OpStatus,
    /// Blockchain transaction hash, if any.
    pub transaction_hash: Option<String>,
    /// Connector message, if any.
    pub message: Option<String>,
    /// Receipt payload as received.
    pub raw: JsonObject,
}

/// Capabilities advertised by a token connector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {}

// =============================================================================
// REQUESTS (node → connector)
// =============================================================================

/// Create a new token pool.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePoolRequest {
    /// Pool type.
    pub pool_type: TokenType,
    /// Signing key.
    pub signer: String,
    /// Pool name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Connector-specific pool configuration.
    pub config: JsonObject,
    /// Node transaction reference.
    pub tx: TransactionRef,
}

/// Activate an existing pool for event delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivatePoolRequest {
    /// Connector-assigned pool locator.
    pub pool_locator: String,
    /// Connector-specific pool configuration.
    pub config: JsonObject,
}

/// Mint, burn or transfer tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    /// Sender/recipient (determines the operation).
    pub endpoints: TransferEndpoints,
    /// Token index for non-fungible pools.
    pub token_index: Option<String>,
    /// Amount to move.
    pub amount: BigInt,
    /// Signing key.
    pub signer: String,
    /// Node transaction reference.
    pub tx: TransactionRef,
    /// Message attached to the transfer.
    pub message: Option<Uuid>,
    /// Hash of the attached message.
    pub message_hash: Option<Bytes32>,
}

/// Approve or revoke an operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalRequest {
    /// Signing key.
    pub signer: String,
    /// Grantee.
    pub operator: String,
    /// `true` to approve, `false` to revoke.
    pub approved: bool,
    /// Connector-specific approval configuration.
    pub config: JsonObject,
    /// Node transaction reference.
    pub tx: TransactionRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_endpoints_ignore_sender() {
        let ep = TransferEndpoints::for_kind(TransferType::Mint, Some("0xfrom"), Some("0xto"))
            .unwrap();
        assert_eq!(ep, TransferEndpoints::Mint { to: "0xto".into() });
        assert_eq!(ep.from(), None);
    }

    #[test]
    fn test_mint_requires_recipient() {
        assert!(TransferEndpoints::for_kind(TransferType::Mint, Some("0xfrom"), None).is_none());
        assert!(TransferEndpoints::for_kind(TransferType::Mint, None, Some("")).is_none());
    }

    #[test]
    fn test_burn_requires_sender() {
        assert!(TransferEndpoints::for_kind(TransferType::Burn, None, Some("0xto")).is_none());
        let ep = TransferEndpoints::for_kind(TransferType::Burn, Some("0xfrom"), None).unwrap();
        assert_eq!(ep.kind(), TransferType::Burn);
        assert_eq!(ep.to(), None);
    }

    #[test]
    fn test_transfer_requires_both() {
        assert!(TransferEndpoints::for_kind(TransferType::Transfer, Some("a"), None).is_none());
        assert!(TransferEndpoints::for_kind(TransferType::Transfer, None, Some("b")).is_none());
        let ep = TransferEndpoints::for_kind(TransferType::Transfer, Some("a"), Some("b")).unwrap();
        assert_eq!((ep.from(), ep.to()), (Some("a"), Some("b")));
    }

    #[test]
    fn test_token_type_keeps_unknown() {
        assert_eq!(TokenType::from("fungible"), TokenType::Fungible);
        assert_eq!(TokenType::from("nonfungible"), TokenType::NonFungible);
        let other = TokenType::from("semi");
        assert_eq!(other.as_str(), "semi");
    }
}
