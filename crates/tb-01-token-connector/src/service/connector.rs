//! # Connector Facade
//!
//! Wires configuration, transports, codec, issuer and event loop into one
//! connector instance.
//!
//! `init` spawns the event loop straight away but does not connect; frames
//! only start flowing after `start`. Dropping the connector cancels the loop.

use super::event_loop::{EventLoop, EventLoopError, LoopExit};
use super::issuer::CommandIssuer;
use super::shutdown::{shutdown_channel, ShutdownTrigger};
use crate::adapters::{ws_event_channel, HttpCommandTransport};
use crate::domain::{
    ChannelState, ChannelStatus, ConnectorConfig, ConnectorError, EventCodec, PoolSubmission,
    CONNECTOR_KIND,
};
use crate::ports::{
    ChannelConnector, CommandTransport, EventChannel, TokenCallbacks, TokenConnectorApi,
};
use async_trait::async_trait;
use shared_types::{
    ActivatePoolRequest, ApprovalRequest, Capabilities, CreatePoolRequest, OperationId,
    TransferRequest,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Injected transports for [`TokenConnector::init_with_transports`].
pub struct Transports<C> {
    /// HTTP command transport.
    pub commands: Arc<dyn CommandTransport>,
    /// Opens the event channel.
    pub connector: Arc<dyn ChannelConnector>,
    /// Event channel handed to the loop.
    pub channel: C,
}

/// One configured token connector instance.
pub struct TokenConnector {
    configured_name: String,
    capabilities: Capabilities,
    issuer: CommandIssuer,
    channel_connector: Arc<dyn ChannelConnector>,
    status: ChannelStatus,
    shutdown: ShutdownTrigger,
    event_loop: Mutex<Option<JoinHandle<Result<LoopExit, EventLoopError>>>>,
}

impl TokenConnector {
    /// Validate `config`, build the HTTP and WebSocket transports and spawn
    /// the event loop. Must be called from within a tokio runtime.
    pub fn init(
        name: impl Into<String>,
        config: &ConnectorConfig,
        callbacks: Arc<dyn TokenCallbacks>,
    ) -> Result<Self, ConnectorError> {
        config.validate()?;
        let commands = Arc::new(HttpCommandTransport::new(config)?);
        let (connector, channel) = ws_event_channel(config)?;
        info!(url = %config.url, ws_url = %connector.url(), "Token connector transports ready");

        Ok(Self::init_with_transports(
            name,
            callbacks,
            Transports {
                commands,
                connector: Arc::new(connector),
                channel,
            },
        ))
    }

    /// Build a connector over injected transports and spawn its event loop.
    pub fn init_with_transports<C>(
        name: impl Into<String>,
        callbacks: Arc<dyn TokenCallbacks>,
        transports: Transports<C>,
    ) -> Self
    where
        C: EventChannel + 'static,
    {
        let configured_name = name.into();
        let codec = Arc::new(EventCodec::new(configured_name.clone()));
        let (trigger, signal) = shutdown_channel();
        let status = ChannelStatus::new();

        let event_loop = EventLoop::new(
            transports.channel,
            codec.clone(),
            callbacks.clone(),
            signal.clone(),
            status.clone(),
        );
        let handle = tokio::spawn(event_loop.run());

        let issuer = CommandIssuer::new(transports.commands, codec, callbacks, signal);
        info!(connector = %configured_name, "Token connector initialized");

        Self {
            configured_name,
            capabilities: Capabilities::default(),
            issuer,
            channel_connector: transports.connector,
            status,
            shutdown: trigger,
            event_loop: Mutex::new(Some(handle)),
        }
    }

    /// Connect the event channel. Only valid once, from `Disconnected`.
    pub async fn start(&self) -> Result<(), ConnectorError> {
        if self.status.transition(ChannelState::Connecting).is_err() {
            return Err(ConnectorError::InvalidState(self.status.current()));
        }
        match self.channel_connector.connect().await {
            Ok(()) => {
                self.status
                    .transition_from(ChannelState::Connecting, ChannelState::Receiving);
                info!(connector = %self.configured_name, "Event channel started");
                Ok(())
            }
            Err(e) => {
                self.status.close();
                error!(connector = %self.configured_name, error = %e, "Event channel failed to start");
                Err(e.into())
            }
        }
    }

    /// Protocol kind.
    pub fn name(&self) -> &'static str {
        CONNECTOR_KIND
    }

    /// Configured instance name.
    pub fn configured_name(&self) -> &str {
        &self.configured_name
    }

    /// Advertised capabilities (currently none).
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Current event channel state.
    pub fn channel_state(&self) -> ChannelState {
        self.status.current()
    }

    /// Command issuer of this instance.
    pub fn issuer(&self) -> &CommandIssuer {
        &self.issuer
    }

    /// Stop the event loop and cancel in-flight commands.
    pub fn shutdown(&self) {
        info!(connector = %self.configured_name, "Token connector shutting down");
        self.shutdown.trigger();
    }

    /// Wait for the event loop to exit. `None` if it was already joined.
    ///
    /// Cancel safe: the handle is only released once the loop has finished.
    pub async fn join(&self) -> Option<Result<LoopExit, EventLoopError>> {
        let mut guard = self.event_loop.lock().await;
        let handle = guard.as_mut()?;
        let result = handle
            .await
            .unwrap_or_else(|e| Err(EventLoopError::Task(e.to_string())));
        *guard = None;
        Some(result)
    }
}

#[async_trait]
impl TokenConnectorApi for TokenConnector {
    fn name(&self) -> &'static str {
        TokenConnector::name(self)
    }

    fn configured_name(&self) -> &str {
        TokenConnector::configured_name(self)
    }

    fn capabilities(&self) -> &Capabilities {
        TokenConnector::capabilities(self)
    }

    async fn start(&self) -> Result<(), ConnectorError> {
        TokenConnector::start(self).await
    }

    async fn create_token_pool(
        &self,
        op_id: OperationId,
        pool: &CreatePoolRequest,
    ) -> Result<PoolSubmission, ConnectorError> {
        self.issuer.create_pool(op_id, pool).await
    }

    async fn activate_token_pool(
        &self,
        op_id: OperationId,
        pool: &ActivatePoolRequest,
    ) -> Result<PoolSubmission, ConnectorError> {
        self.issuer.activate_pool(op_id, pool).await
    }

    async fn mint_tokens(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        mint: &TransferRequest,
    ) -> Result<(), ConnectorError> {
        self.issuer.mint(op_id, pool_locator, mint).await
    }

    async fn burn_tokens(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        burn: &TransferRequest,
    ) -> Result<(), ConnectorError> {
        self.issuer.burn(op_id, pool_locator, burn).await
    }

    async fn transfer_tokens(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        transfer: &TransferRequest,
    ) -> Result<(), ConnectorError> {
        self.issuer.transfer(op_id, pool_locator, transfer).await
    }

    async fn tokens_approval(
        &self,
        op_id: OperationId,
        pool_locator: &str,
        approval: &ApprovalRequest,
    ) -> Result<(), ConnectorError> {
        self.issuer.approve(op_id, pool_locator, approval).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory_channel;
    use crate::ports::{MockCommandTransport, RecordingCallbacks};

    #[tokio::test]
    async fn test_init_requires_url() {
        let err = TokenConnector::init(
            "tok",
            &ConnectorConfig::default(),
            Arc::new(RecordingCallbacks::new()),
        )
        .err()
        .unwrap();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_init_does_not_connect() {
        // Nothing listens here; init must still succeed.
        let connector = TokenConnector::init(
            "tok",
            &ConnectorConfig::with_url("http://127.0.0.1:1"),
            Arc::new(RecordingCallbacks::new()),
        )
        .unwrap();
        assert_eq!(connector.name(), "fftokens");
        assert_eq!(connector.configured_name(), "tok");
        assert_eq!(connector.capabilities(), &Capabilities::default());
        assert_eq!(connector.channel_state(), ChannelState::Disconnected);

        connector.shutdown();
        assert_eq!(connector.join().await.unwrap().unwrap(), LoopExit::Cancelled);
        assert!(connector.join().await.is_none());
    }

    #[tokio::test]
    async fn test_start_twice_rejected() {
        let (channel_connector, channel, _peer) = in_memory_channel();
        let connector = TokenConnector::init_with_transports(
            "tok",
            Arc::new(RecordingCallbacks::new()),
            Transports {
                commands: Arc::new(MockCommandTransport::new()),
                connector: Arc::new(channel_connector),
                channel,
            },
        );
        connector.start().await.unwrap();
        assert_eq!(connector.channel_state(), ChannelState::Receiving);
        assert!(matches!(
            connector.start().await,
            Err(ConnectorError::InvalidState(ChannelState::Receiving))
        ));
    }

    #[tokio::test]
    async fn test_start_failure_closes() {
        let (channel_connector, channel, _peer) = in_memory_channel();
        channel_connector.refuse_connection();
        let connector = TokenConnector::init_with_transports(
            "tok",
            Arc::new(RecordingCallbacks::new()),
            Transports {
                commands: Arc::new(MockCommandTransport::new()),
                connector: Arc::new(channel_connector),
                channel,
            },
        );
        assert!(matches!(
            connector.start().await,
            Err(ConnectorError::Transport(_))
        ));
        assert_eq!(connector.channel_state(), ChannelState::Closed);
        assert_eq!(
            connector.join().await.unwrap().unwrap(),
            LoopExit::ChannelClosed
        );
    }
}
