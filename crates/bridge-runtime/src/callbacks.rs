//! Callback sink that logs every decoded record.
//!
//! Stands in for the orchestration node when the connector runs on its own.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{CallbackError, OperationUpdate, TokenApproval, TokenPool, TokenTransfer};
use tb_01_token_connector::TokenCallbacks;
use tracing::info;

/// Counts of records seen by [`LoggingCallbacks`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallbackCounts {
    /// Operation receipts.
    pub updates: u64,
    /// Pools created or activated.
    pub pools: u64,
    /// Mints, burns and transfers.
    pub transfers: u64,
    /// Approvals.
    pub approvals: u64,
}

/// Logs each record at `info` and accepts it.
#[derive(Debug, Default)]
pub struct LoggingCallbacks {
    counts: Mutex<CallbackCounts>,
}

impl LoggingCallbacks {
    /// New sink with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the counters.
    pub fn counts(&self) -> CallbackCounts {
        *self.counts.lock()
    }
}

#[async_trait]
impl TokenCallbacks for LoggingCallbacks {
    async fn token_op_update(&self, connector: &str, update: OperationUpdate) {
        self.counts.lock().updates += 1;
        info!(
            connector,
            request_id = %update.operation_id,
            status = %update.status,
            tx_hash = update.transaction_hash.as_deref().unwrap_or(""),
            message = update.message.as_deref().unwrap_or(""),
            "Operation update"
        );
    }

    async fn token_pool_created(
        &self,
        connector: &str,
        pool: TokenPool,
    ) -> Result<(), CallbackError> {
        self.counts.lock().pools += 1;
        info!(
            connector,
            pool_locator = %pool.pool_locator,
            pool_type = %pool.pool_type,
            tx_type = %pool.tx.tx_type,
            has_event = pool.event.is_some(),
            "Token pool created"
        );
        Ok(())
    }

    async fn tokens_transferred(
        &self,
        connector: &str,
        transfer: TokenTransfer,
    ) -> Result<(), CallbackError> {
        self.counts.lock().transfers += 1;
        info!(
            connector,
            kind = %transfer.transfer_type(),
            pool_locator = %transfer.pool_locator,
            from = transfer.endpoints.from().unwrap_or(""),
            to = transfer.endpoints.to().unwrap_or(""),
            amount = %transfer.amount,
            "Tokens transferred"
        );
        Ok(())
    }

    async fn tokens_approved(
        &self,
        connector: &str,
        approval: TokenApproval,
    ) -> Result<(), CallbackError> {
        self.counts.lock().approvals += 1;
        info!(
            connector,
            pool_locator = %approval.pool_locator,
            operator = %approval.operator,
            approved = approval.approved,
            "Tokens approval"
        );
        Ok(())
    }
}
