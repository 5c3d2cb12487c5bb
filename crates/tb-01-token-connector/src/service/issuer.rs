//! # Command Issuer
//!
//! Issues pool, transfer and approval commands to the connector's REST API.
//!
//! Every command carries the operation ID as `requestId` and the correlation
//! data as `data`; confirmation normally arrives later on the event channel.
//! A `200 OK` to create/activate pool is the exception: the body is the pool
//! itself and is delivered to the node before the call returns.

use super::shutdown::ShutdownSignal;
use crate::domain::{ConnectorError, Decoded, EventCodec, PoolSubmission, TokenData};
use crate::ports::{CommandTransport, HttpResponse, TokenCallbacks};
use bridge_telemetry::{metric_inc, CONNECTOR_COMMANDS};
use serde::Serialize;
use shared_types::{
    ActivatePoolRequest, ApprovalRequest, CreatePoolRequest, JsonObject, OperationId,
    TransferEndpoints, TransferRequest, TransferType,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Create pool endpoint.
pub const CREATE_POOL_PATH: &str = "/api/v1/createpool";
/// Activate pool endpoint.
pub const ACTIVATE_POOL_PATH: &str = "/api/v1/activatepool";
/// Mint endpoint.
pub const MINT_PATH: &str = "/api/v1/mint";
/// Burn endpoint.
pub const BURN_PATH: &str = "/api/v1/burn";
/// Transfer endpoint.
pub const TRANSFER_PATH: &str = "/api/v1/transfer";
/// Approval endpoint.
pub const APPROVAL_PATH: &str = "/api/v1/approval";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePoolBody<'a> {
    #[serde(rename = "type")]
    pool_type: &'a str,
    request_id: String,
    signer: &'a str,
    #[serde(skip_serializing_if = "String::is_empty")]
    data: String,
    config: &'a JsonObject,
    name: &'a str,
    symbol: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivatePoolBody<'a> {
    pool_locator: &'a str,
    config: &'a JsonObject,
    request_id: String,
}

/// Body shared by mint, burn and transfer; unused endpoint sides are omitted.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferBody<'a> {
    pool_locator: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_index: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    amount: String,
    request_id: String,
    signer: &'a str,
    #[serde(skip_serializing_if = "String::is_empty")]
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalBody<'a> {
    signer: &'a str,
    operator: &'a str,
    approved: bool,
    pool_locator: &'a str,
    request_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    data: String,
    config: &'a JsonObject,
}

/// Issues commands to one connector instance.
///
/// Calls may run concurrently; the issuer only holds shared immutable state.
#[derive(Clone)]
pub struct CommandIssuer {
    transport: Arc<dyn CommandTransport>,
    codec: Arc<EventCodec>,
    callbacks: Arc<dyn TokenCallbacks>,
    shutdown: ShutdownSignal,
}

impl CommandIssuer {
    /// Create a new issuer.
    pub fn new(
        transport: Arc<dyn CommandTransport>,
        codec: Arc<EventCodec>,
        callbacks: Arc<dyn TokenCallbacks>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            transport,
            codec,
            callbacks,
            shutdown,
        }
    }

    /// Create a pool.
    pub async fn create_pool(
        &self,
        op_id: OperationId,
        pool: &CreatePoolRequest,
    ) -> Result<PoolSubmission, ConnectorError> {
        let body = CreatePoolBody {
            pool_type: pool.pool_type.as_str(),
            request_id: op_id.to_string(),
            signer: &pool.signer,
            data: TokenData::for_transaction(&pool.tx).encode(),
            config: &pool.config,
            name: &pool.name,
            symbol: &pool.symbol,
        };
        let response = self.post("create_pool", CREATE_POOL_PATH, op_id, &body).await?;
        self.settle_pool("create_pool", op_id, response).await
    }

    /// Activate a pool.
    pub async fn activate_pool(
        &self,
        op_id: OperationId,
        pool: &ActivatePoolRequest,
    ) -> Result<PoolSubmission, ConnectorError> {
        let body = ActivatePoolBody {
            pool_locator: &pool.pool_locator,
            config: &pool.config,
            request_id: op_id.to_string(),
        };
        let response = self
            .post("activate_pool", ACTIVATE_POOL_PATH, op_id, &body)
            .await?;
        self.settle_pool("activate_pool", op_id, response).await
    }

    /// Mint tokens into the request's recipient.
    pub async fn mint(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        mint: &TransferRequest,
    ) -> Result<(), ConnectorError> {
        self.submit_transfer(TransferType::Mint, op_id, pool_locator, mint)
            .await
    }

    /// Burn tokens from the request's holder.
    pub async fn burn(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        burn: &TransferRequest,
    ) -> Result<(), ConnectorError> {
        self.submit_transfer(TransferType::Burn, op_id, pool_locator, burn)
            .await
    }

    /// Transfer tokens between holders.
    pub async fn transfer(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        transfer: &TransferRequest,
    ) -> Result<(), ConnectorError> {
        self.submit_transfer(TransferType::Transfer, op_id, pool_locator, transfer)
            .await
    }

    /// Approve or revoke an operator.
    pub async fn approve(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        approval: &ApprovalRequest,
    ) -> Result<(), ConnectorError> {
        let body = ApprovalBody {
            signer: &approval.signer,
            operator: &approval.operator,
            approved: approval.approved,
            pool_locator,
            request_id: op_id.to_string(),
            data: TokenData::for_transaction(&approval.tx).encode(),
            config: &approval.config,
        };
        self.post("approval", APPROVAL_PATH, op_id, &body).await?;
        metric_inc!(CONNECTOR_COMMANDS, &["approval", "accepted"]);
        Ok(())
    }

    async fn submit_transfer(
        &self,
        expected: TransferType,
        op_id: OperationId,
        pool_locator: &str,
        request: &TransferRequest,
    ) -> Result<(), ConnectorError> {
        let actual = request.endpoints.kind();
        if actual != expected {
            return Err(ConnectorError::EndpointMismatch { expected, actual });
        }
        let (operation, path) = match &request.endpoints {
            TransferEndpoints::Mint { .. } => ("mint", MINT_PATH),
            TransferEndpoints::Burn { .. } => ("burn", BURN_PATH),
            TransferEndpoints::Transfer { .. } => ("transfer", TRANSFER_PATH),
        };
        let body = TransferBody {
            pool_locator,
            token_index: request.token_index.as_deref(),
            from: request.endpoints.from(),
            to: request.endpoints.to(),
            amount: request.amount.to_string(),
            request_id: op_id.to_string(),
            signer: &request.signer,
            data: TokenData::for_transfer(request).encode(),
        };
        self.post(operation, path, op_id, &body).await?;
        metric_inc!(CONNECTOR_COMMANDS, &[operation, "accepted"]);
        Ok(())
    }

    /// POST `body`, racing the shutdown signal. Non-2xx is an error.
    async fn post<B: Serialize>(
        &self,
        operation: &'static str,
        path: &'static str,
        op_id: OperationId,
        body: &B,
    ) -> Result<HttpResponse, ConnectorError> {
        let body = serde_json::to_value(body).map_err(|e| ConnectorError::Encode(e.to_string()))?;
        debug!(
            connector = %self.codec.connector(),
            request_id = %op_id,
            path = path,
            "Issuing {}",
            operation
        );

        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(ConnectorError::Cancelled),
            result = self.transport.post_json(path, body) => result.map_err(ConnectorError::from),
        };

        match result {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => {
                let error = ConnectorError::Rest {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                };
                Err(self.command_failed(operation, op_id, error))
            }
            Err(e) => Err(self.command_failed(operation, op_id, e)),
        }
    }

    fn command_failed(
        &self,
        operation: &'static str,
        op_id: OperationId,
        error: ConnectorError,
    ) -> ConnectorError {
        metric_inc!(CONNECTOR_COMMANDS, &[operation, "failed"]);
        warn!(
            connector = %self.codec.connector(),
            request_id = %op_id,
            error = %error,
            "Command {} failed",
            operation
        );
        error
    }

    /// Deliver a synchronous pool response, or report the pool as pending.
    async fn settle_pool(
        &self,
        operation: &'static str,
        op_id: OperationId,
        response: HttpResponse,
    ) -> Result<PoolSubmission, ConnectorError> {
        if response.status != 200 {
            metric_inc!(CONNECTOR_COMMANDS, &[operation, "pending"]);
            return Ok(PoolSubmission::Pending);
        }

        let data: JsonObject = serde_json::from_slice(&response.body).map_err(|e| {
            ConnectorError::InvalidResponse(format!(
                "{}: {}",
                e,
                String::from_utf8_lossy(&response.body)
            ))
        })?;

        match self.codec.decode_pool(&data) {
            Decoded::Record(pool) => {
                self.callbacks
                    .token_pool_created(self.codec.connector(), pool)
                    .await?;
            }
            Decoded::Skip(reason) => {
                error!(
                    connector = %self.codec.connector(),
                    request_id = %op_id,
                    reason = %reason,
                    data = %serde_json::Value::Object(data.clone()),
                    "Synchronous pool response is incomplete, ignoring"
                );
            }
        }
        metric_inc!(CONNECTOR_COMMANDS, &[operation, "complete"]);
        Ok(PoolSubmission::Complete)
    }
}
