//! # Inbound Ports
//!
//! API the orchestration node drives a token connector through.

use crate::domain::{ConnectorError, PoolSubmission};
use async_trait::async_trait;
use shared_types::{
    ActivatePoolRequest, ApprovalRequest, Capabilities, CreatePoolRequest, OperationId,
    TransferRequest,
};

/// Token connector API - inbound port.
#[async_trait]
pub trait TokenConnectorApi: Send + Sync {
    /// Protocol kind (`fftokens`).
    fn name(&self) -> &'static str;

    /// Configured instance name.
    fn configured_name(&self) -> &str;

    /// Advertised capabilities.
    fn capabilities(&self) -> &Capabilities;

    /// Open the event channel.
    async fn start(&self) -> Result<(), ConnectorError>;

    /// Create a pool.
    async fn create_token_pool(
        &self,
        op_id: OperationId,
        pool: &CreatePoolRequest,
    ) -> Result<PoolSubmission, ConnectorError>;

    /// Activate a pool.
    async fn activate_token_pool(
        &self,
        op_id: OperationId,
        pool: &ActivatePoolRequest,
    ) -> Result<PoolSubmission, ConnectorError>;

    /// Mint tokens. The request endpoints must be `Mint`.
    async fn mint_tokens(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        mint: &TransferRequest,
    ) -> Result<(), ConnectorError>;

    /// Burn tokens. The request endpoints must be `Burn`.
    async fn burn_tokens(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        burn: &TransferRequest,
    ) -> Result<(), ConnectorError>;

    /// Transfer tokens. The request endpoints must be `Transfer`.
    async fn transfer_tokens(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        transfer: &TransferRequest,
    ) -> Result<(), ConnectorError>;

    /// Approve or revoke an operator.
    async fn tokens_approval(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        approval: &ApprovalRequest,
    ) -> Result<(), ConnectorError>;
}
