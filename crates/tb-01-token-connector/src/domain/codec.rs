//! # Event Codec
//!
//! Turns connector payloads into typed token records.
//!
//! Decoding never fails: a payload that is missing required fields or carries
//! an unusable amount or ID yields [`Decoded::Skip`], and the event is treated
//! as handled. Callers log skips at error level together with the raw
//! payload.

use super::payload::Payload;
use super::timestamp::timestamp_or;
use super::token_data::TokenData;
use super::value_objects::CONNECTOR_KIND;
use chrono::{DateTime, Utc};
use shared_types::{
    BigInt, BlockchainEvent, JsonObject, OpStatus, OperationId, OperationUpdate, TokenApproval,
    TokenPool, TokenTransfer, TokenType, TransactionType, TransferEndpoints, TransferType,
};
use std::fmt;
use std::str::FromStr;

/// Why a payload produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Required fields absent or empty.
    MissingFields(Vec<&'static str>),
    /// Amount is not a base-10 unsigned 256-bit integer.
    InvalidAmount(String),
    /// Receipt ID is not an operation ID.
    InvalidRequestId(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(fields) => write!(f, "missing data: {}", fields.join(", ")),
            Self::InvalidAmount(amount) => write!(f, "invalid amount '{}'", amount),
            Self::InvalidRequestId(id) => write!(f, "invalid request ID '{}'", id),
        }
    }
}

/// Outcome of decoding one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// A valid record.
    Record(T),
    /// Nothing to deliver.
    Skip(SkipReason),
}

impl<T> Decoded<T> {
    /// The record, if any.
    pub fn record(self) -> Option<T> {
        match self {
            Self::Record(r) => Some(r),
            Self::Skip(_) => None,
        }
    }

    /// True for a skip.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }
}

/// Names of `required` entries whose value is empty.
fn missing_fields(required: &[(&'static str, &str)]) -> Vec<&'static str> {
    required
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect()
}

/// Base-10 integer with an optional sign. Digit separators are not accepted.
fn parse_amount(raw: &str) -> Option<BigInt> {
    if raw.contains('_') {
        return None;
    }
    BigInt::from_str(raw).ok()
}

/// Codec bound to one configured connector instance.
#[derive(Debug, Clone)]
pub struct EventCodec {
    connector: String,
    source: String,
}

impl EventCodec {
    /// Codec for the connector instance named `connector`.
    pub fn new(connector: impl Into<String>) -> Self {
        let connector = connector.into();
        let source = format!("{}:{}", CONNECTOR_KIND, connector);
        Self { connector, source }
    }

    /// Configured connector name stamped on every record.
    pub fn connector(&self) -> &str {
        &self.connector
    }

    /// Event source stamped on every blockchain event.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Decode a `token-pool` payload (or a synchronous pool response).
    pub fn decode_pool(&self, data: &JsonObject) -> Decoded<TokenPool> {
        self.decode_pool_at(data, Utc::now())
    }

    /// [`decode_pool`](Self::decode_pool) with an explicit receive time.
    pub fn decode_pool_at(&self, data: &JsonObject, received_at: DateTime<Utc>) -> Decoded<TokenPool> {
        let p = Payload::new(data);
        let pool_type = p.get_string("type");
        let pool_locator = p.get_string("poolLocator");
        let missing = missing_fields(&[
            ("type", pool_type.as_str()),
            ("poolLocator", pool_locator.as_str()),
        ]);
        if !missing.is_empty() {
            return Decoded::Skip(SkipReason::MissingFields(missing));
        }

        let token_data = TokenData::decode_lenient(&p.get_string("data"), &self.connector);
        let chain = p.get_object("blockchain");
        let has_chain_event = !chain.get_string("id").is_empty()
            || !chain.get_object("info").get_string("transactionHash").is_empty();

        Decoded::Record(TokenPool {
            pool_type: TokenType::from(pool_type.as_str()),
            pool_locator,
            standard: p.get_opt_string("standard"),
            symbol: p.get_opt_string("symbol"),
            info: p.get_object("info").to_object(),
            tx: token_data.transaction(TransactionType::TokenPool),
            connector: self.connector.clone(),
            event: has_chain_event.then(|| self.blockchain_event(chain, received_at)),
        })
    }

    /// Decode a `token-mint`, `token-burn` or `token-transfer` payload.
    pub fn decode_transfer(&self, kind: TransferType, data: &JsonObject) -> Decoded<TokenTransfer> {
        self.decode_transfer_at(kind, data, Utc::now())
    }

    /// [`decode_transfer`](Self::decode_transfer) with an explicit receive time.
    pub fn decode_transfer_at(
        &self,
        kind: TransferType,
        data: &JsonObject,
        received_at: DateTime<Utc>,
    ) -> Decoded<TokenTransfer> {
        let p = Payload::new(data);
        let subject = p.get_string("subject");
        let pool_locator = p.get_string("poolLocator");
        let signer = p.get_string("signer");
        let from = p.get_string("from");
        let to = p.get_string("to");
        let amount = p.get_string("amount");

        let mut required = vec![
            ("subject", subject.as_str()),
            ("poolLocator", pool_locator.as_str()),
            ("signer", signer.as_str()),
            ("amount", amount.as_str()),
        ];
        if kind != TransferType::Mint {
            required.push(("from", from.as_str()));
        }
        if kind != TransferType::Burn {
            required.push(("to", to.as_str()));
        }
        let missing = missing_fields(&required);
        let Some(endpoints) =
            TransferEndpoints::for_kind(kind, Some(&from), Some(&to)).filter(|_| missing.is_empty())
        else {
            return Decoded::Skip(SkipReason::MissingFields(missing));
        };

        let Some(amount_value) = parse_amount(&amount) else {
            return Decoded::Skip(SkipReason::InvalidAmount(amount));
        };

        let token_data = TokenData::decode_lenient(&p.get_string("data"), &self.connector);

        Decoded::Record(TokenTransfer {
            endpoints,
            pool_locator,
            token_index: p.get_opt_string("tokenIndex"),
            uri: p.get_opt_string("uri"),
            amount: amount_value,
            subject,
            key: signer,
            message: token_data.message,
            message_hash: token_data.message_hash,
            tx: token_data.transaction(TransactionType::TokenTransfer),
            connector: self.connector.clone(),
            event: Some(self.blockchain_event(p.get_object("blockchain"), received_at)),
        })
    }

    /// Decode a `token-approval` payload.
    pub fn decode_approval(&self, data: &JsonObject) -> Decoded<TokenApproval> {
        self.decode_approval_at(data, Utc::now())
    }

    /// [`decode_approval`](Self::decode_approval) with an explicit receive time.
    pub fn decode_approval_at(
        &self,
        data: &JsonObject,
        received_at: DateTime<Utc>,
    ) -> Decoded<TokenApproval> {
        let p = Payload::new(data);
        let subject = p.get_string("subject");
        let pool_locator = p.get_string("poolLocator");
        let signer = p.get_string("signer");
        let operator = p.get_string("operator");
        let missing = missing_fields(&[
            ("subject", subject.as_str()),
            ("poolLocator", pool_locator.as_str()),
            ("signer", signer.as_str()),
            ("operator", operator.as_str()),
        ]);
        if !missing.is_empty() {
            return Decoded::Skip(SkipReason::MissingFields(missing));
        }

        let token_data = TokenData::decode_lenient(&p.get_string("data"), &self.connector);

        Decoded::Record(TokenApproval {
            pool_locator,
            key: signer,
            operator,
            approved: p.get_bool("approved"),
            subject,
            tx: token_data.transaction(TransactionType::TokenApproval),
            connector: self.connector.clone(),
            event: Some(self.blockchain_event(p.get_object("blockchain"), received_at)),
        })
    }

    /// Decode a `receipt` payload.
    pub fn decode_receipt(&self, data: &JsonObject) -> Decoded<OperationUpdate> {
        let p = Payload::new(data);
        let request_id = p.get_string("id");
        if request_id.is_empty() {
            return Decoded::Skip(SkipReason::MissingFields(vec!["id"]));
        }
        let Ok(operation_id) = OperationId::parse(&request_id) else {
            return Decoded::Skip(SkipReason::InvalidRequestId(request_id));
        };

        let status = if p.get_bool("success") {
            OpStatus::Succeeded
        } else {
            OpStatus::Failed
        };

        Decoded::Record(OperationUpdate {
            operation_id,
            status,
            transaction_hash: p.get_opt_string("transactionHash"),
            message: p.get_opt_string("message"),
            raw: data.clone(),
        })
    }

    fn blockchain_event(&self, chain: Payload<'_>, received_at: DateTime<Utc>) -> BlockchainEvent {
        let info = chain.get_object("info");
        BlockchainEvent {
            protocol_id: chain.get_string("id"),
            blockchain_tx_id: info.get_string("transactionHash"),
            name: chain.get_string("name"),
            output: chain.get_object("output").to_object(),
            source: self.source.clone(),
            location: chain.get_string("location"),
            signature: chain.get_string("signature"),
            info: info.to_object(),
            timestamp: timestamp_or(&chain.get_string("timestamp"), received_at),
        }
    }
}
