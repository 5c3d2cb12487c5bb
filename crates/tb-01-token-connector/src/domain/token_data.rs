//! # Correlation Data
//!
//! The `data` string the node attaches to every command and the connector
//! echoes back verbatim on the matching event. It carries the transaction
//! and message references needed to correlate the confirmation.

use serde::{Deserialize, Serialize};
use shared_types::{Bytes32, TransactionRef, TransactionType, TransferRequest};
use tracing::info;
use uuid::Uuid;

/// Correlation data serialised into the `data` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    /// Node transaction ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx: Option<Uuid>,
    /// Node transaction type.
    #[serde(rename = "txtype", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TransactionType>,
    /// Attached message ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Uuid>,
    /// Attached message hash.
    #[serde(rename = "messageHash", default, skip_serializing_if = "Option::is_none")]
    pub message_hash: Option<Bytes32>,
}

impl TokenData {
    /// Data for a command that only references a transaction.
    pub fn for_transaction(tx: &TransactionRef) -> Self {
        Self {
            tx: tx.id,
            tx_type: Some(tx.tx_type.clone()),
            ..Default::default()
        }
    }

    /// Data for a mint/burn/transfer, including any attached message.
    pub fn for_transfer(request: &TransferRequest) -> Self {
        Self {
            message: request.message,
            message_hash: request.message_hash,
            ..Self::for_transaction(&request.tx)
        }
    }

    /// Serialise to the wire string.
    pub fn encode(&self) -> String {
        // Only UUIDs, enum names and hex strings: serialisation cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Strict parse.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Parse, falling back to defaults on any failure.
    ///
    /// The data string is written by whoever issued the command, which may not
    /// be this node, so failures are expected and only logged at info.
    pub fn decode_lenient(raw: &str, connector: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        match Self::decode(raw) {
            Ok(data) => data,
            Err(e) => {
                info!(
                    connector = %connector,
                    data = %raw,
                    error = %e,
                    "Ignoring unparseable token data"
                );
                Self::default()
            }
        }
    }

    /// Transaction reference, defaulting the type when absent.
    pub fn transaction(&self, default_type: TransactionType) -> TransactionRef {
        TransactionRef {
            id: self.tx,
            tx_type: self.tx_type.clone().unwrap_or(default_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BigInt, TransferEndpoints};

    #[test]
    fn test_round_trip_with_message() {
        let tx = Uuid::new_v4();
        let message = Uuid::new_v4();
        let hash: Bytes32 = "11".repeat(32).parse().unwrap();
        let request = TransferRequest {
            endpoints: TransferEndpoints::Mint { to: "0xb".into() },
            token_index: None,
            amount: BigInt::from(5u8),
            signer: "0xa".into(),
            tx: TransactionRef::new(tx, TransactionType::TokenTransfer),
            message: Some(message),
            message_hash: Some(hash),
        };
        let data = TokenData::for_transfer(&request);
        let decoded = TokenData::decode(&data.encode()).unwrap();
        assert_eq!(decoded, data);
        assert_eq!(decoded.transaction(TransactionType::TokenPool).id, Some(tx));
    }

    #[test]
    fn test_wire_field_names() {
        let tx = Uuid::new_v4();
        let data = TokenData::for_transaction(&TransactionRef::new(tx, TransactionType::TokenPool));
        let value: serde_json::Value = serde_json::from_str(&data.encode()).unwrap();
        assert_eq!(value["tx"], tx.to_string());
        assert_eq!(value["txtype"], "token_pool");
        assert!(value.get("message").is_none());
        assert!(value.get("messageHash").is_none());
    }

    #[test]
    fn test_lenient_decode_defaults() {
        assert_eq!(TokenData::decode_lenient("", "tok"), TokenData::default());
        assert_eq!(TokenData::decode_lenient("!json", "tok"), TokenData::default());
        assert_eq!(
            TokenData::decode_lenient(r#"{"tx":"not-a-uuid"}"#, "tok"),
            TokenData::default()
        );
        assert_eq!(
            TokenData::decode_lenient(r#"{"txtype":7}"#, "tok"),
            TokenData::default()
        );
    }

    #[test]
    fn test_transaction_defaults_type() {
        let data = TokenData::default();
        let tx = data.transaction(TransactionType::TokenApproval);
        assert_eq!(tx, TransactionRef::untracked(TransactionType::TokenApproval));
    }

    #[test]
    fn test_unknown_tx_type_keeps_id() {
        let tx = Uuid::new_v4();
        let raw = format!(r#"{{"tx":"{}","txtype":"contract_invoke"}}"#, tx);
        let data = TokenData::decode_lenient(&raw, "tok");
        let tx_ref = data.transaction(TransactionType::TokenTransfer);
        assert_eq!(tx_ref.id, Some(tx));
        assert_eq!(tx_ref.tx_type, TransactionType::Other("contract_invoke".into()));
        // Re-encoding keeps the foreign type verbatim
        assert!(data.encode().contains(r#""txtype":"contract_invoke""#));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let data = TokenData::decode_lenient(r#"{"txtype":"token_transfer","extra":1}"#, "tok");
        assert_eq!(data.tx_type, Some(TransactionType::TokenTransfer));
    }
}
