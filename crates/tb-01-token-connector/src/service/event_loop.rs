//! # Event Loop
//!
//! Consumes the event channel one frame at a time, in arrival order:
//!
//! 1. Parse the envelope. Unparseable frames are logged and discarded.
//! 2. Decode the payload and hand the record to the node callbacks.
//! 3. Acknowledge the delivery once the callback has returned successfully.
//!
//! Receipts are never acknowledged and never stop the loop. A failing
//! callback or a failed ack terminates the loop without acknowledging, so
//! the connector redelivers once a new channel is opened.

use super::shutdown::ShutdownSignal;
use crate::domain::{
    ack_frame, ChannelState, ChannelStatus, Decoded, EventCodec, EventEnvelope, EventKind,
    SkipReason, TransportError,
};
use crate::ports::{EventChannel, TokenCallbacks};
use bridge_telemetry::{
    metric_inc, CONNECTOR_ACKS_SENT, CONNECTOR_EVENTS_RECEIVED, CONNECTOR_EVENTS_SKIPPED,
    CONNECTOR_FRAMES_DISCARDED,
};
use shared_types::{CallbackError, TransferType};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Clean loop termination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopExit {
    /// Shutdown was requested.
    Cancelled,
    /// The peer closed the channel (or it never connected).
    ChannelClosed,
}

/// Fatal loop termination.
#[derive(Debug, Error)]
pub enum EventLoopError {
    /// A node callback rejected a record.
    #[error("Event {event_id} ({kind}) rejected by callback: {source}")]
    Dispatch {
        /// Delivery ID of the event
        event_id: String,
        /// Event kind
        kind: EventKind,
        /// Callback error
        source: CallbackError,
    },

    /// The ack could not be written.
    #[error("Failed to acknowledge event {event_id}: {source}")]
    Acknowledge {
        /// Delivery ID of the event
        event_id: String,
        /// Transport error
        source: TransportError,
    },

    /// The loop task panicked or was aborted.
    #[error("Event loop task failed: {0}")]
    Task(String),
}

/// Event channel client for one connector instance.
pub struct EventLoop<C> {
    channel: C,
    codec: Arc<EventCodec>,
    callbacks: Arc<dyn TokenCallbacks>,
    shutdown: ShutdownSignal,
    status: ChannelStatus,
}

impl<C: EventChannel> EventLoop<C> {
    /// Create a new loop over `channel`.
    pub fn new(
        channel: C,
        codec: Arc<EventCodec>,
        callbacks: Arc<dyn TokenCallbacks>,
        shutdown: ShutdownSignal,
        status: ChannelStatus,
    ) -> Self {
        Self {
            channel,
            codec,
            callbacks,
            shutdown,
            status,
        }
    }

    /// Run until shutdown, channel close or a fatal error. Always closes the
    /// channel before returning.
    pub async fn run(mut self) -> Result<LoopExit, EventLoopError> {
        let result = loop {
            let frame = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break Ok(LoopExit::Cancelled),
                frame = self.channel.receive() => frame,
            };
            let Some(frame) = frame else {
                break Ok(LoopExit::ChannelClosed);
            };
            self.status
                .transition_from(ChannelState::Connecting, ChannelState::Receiving);
            if let Err(e) = self.process_frame(&frame).await {
                break Err(e);
            }
        };

        self.channel.close().await;
        self.status.close();

        let connector = self.codec.connector();
        match &result {
            Ok(exit) => debug!(connector = %connector, exit = ?exit, "Event loop exiting"),
            Err(e) => error!(connector = %connector, error = %e, "Event loop exiting"),
        }
        result
    }

    /// Handle one inbound frame.
    async fn process_frame(&mut self, frame: &[u8]) -> Result<(), EventLoopError> {
        let connector = self.codec.connector().to_string();
        let envelope = match EventEnvelope::parse(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                metric_inc!(CONNECTOR_FRAMES_DISCARDED);
                error!(
                    connector = %connector,
                    error = %e,
                    frame = %String::from_utf8_lossy(frame),
                    "Message cannot be parsed as JSON"
                );
                return Ok(());
            }
        };

        let kind = envelope.kind();
        metric_inc!(CONNECTOR_EVENTS_RECEIVED, &[kind.as_str()]);
        debug!(
            connector = %connector,
            event_id = %envelope.id,
            kind = %envelope.event,
            "Received event"
        );

        self.dispatch(kind, &envelope)
            .await
            .map_err(|source| EventLoopError::Dispatch {
                event_id: envelope.id.clone(),
                kind,
                source,
            })?;

        if kind.requires_ack() && !envelope.id.is_empty() {
            self.acknowledge(&envelope.id).await?;
        }
        Ok(())
    }

    async fn dispatch(&self, kind: EventKind, envelope: &EventEnvelope) -> Result<(), CallbackError> {
        if let Some(transfer_type) = kind.transfer_type() {
            return self.dispatch_transfer(transfer_type, envelope).await;
        }

        let connector = self.codec.connector();
        let data = envelope.data();
        match kind {
            EventKind::Receipt => {
                match self.codec.decode_receipt(data) {
                    Decoded::Record(update) => {
                        self.callbacks.token_op_update(connector, update).await
                    }
                    Decoded::Skip(reason) => self.log_skip(kind, envelope, &reason),
                }
                Ok(())
            }
            EventKind::TokenPool => match self.codec.decode_pool(data) {
                Decoded::Record(pool) => self.callbacks.token_pool_created(connector, pool).await,
                Decoded::Skip(reason) => {
                    self.log_skip(kind, envelope, &reason);
                    Ok(())
                }
            },
            EventKind::TokenApproval => match self.codec.decode_approval(data) {
                Decoded::Record(approval) => {
                    self.callbacks.tokens_approved(connector, approval).await
                }
                Decoded::Skip(reason) => {
                    self.log_skip(kind, envelope, &reason);
                    Ok(())
                }
            },
            _ => {
                info!(
                    connector = %connector,
                    event_id = %envelope.id,
                    kind = %envelope.event,
                    "Unexpected event type, ignoring"
                );
                Ok(())
            }
        }
    }

    async fn dispatch_transfer(
        &self,
        transfer_type: TransferType,
        envelope: &EventEnvelope,
    ) -> Result<(), CallbackError> {
        match self.codec.decode_transfer(transfer_type, envelope.data()) {
            Decoded::Record(transfer) => {
                self.callbacks
                    .tokens_transferred(self.codec.connector(), transfer)
                    .await
            }
            Decoded::Skip(reason) => {
                self.log_skip(envelope.kind(), envelope, &reason);
                Ok(())
            }
        }
    }

    fn log_skip(&self, kind: EventKind, envelope: &EventEnvelope, reason: &SkipReason) {
        metric_inc!(CONNECTOR_EVENTS_SKIPPED, &[kind.as_str()]);
        error!(
            connector = %self.codec.connector(),
            event_id = %envelope.id,
            kind = %kind,
            reason = %reason,
            data = %serde_json::Value::Object(envelope.data().clone()),
            "Event is incomplete, ignoring"
        );
    }

    async fn acknowledge(&mut self, event_id: &str) -> Result<(), EventLoopError> {
        self.set_state(ChannelState::Acknowledging);
        let sent = self.channel.send(ack_frame(event_id)).await;
        self.set_state(ChannelState::Receiving);

        sent.map_err(|source| EventLoopError::Acknowledge {
            event_id: event_id.to_string(),
            source,
        })?;
        metric_inc!(CONNECTOR_ACKS_SENT);
        debug!(connector = %self.codec.connector(), event_id = %event_id, "Sent ack");
        Ok(())
    }

    fn set_state(&self, next: ChannelState) {
        if let Err(e) = self.status.transition(next) {
            debug!(connector = %self.codec.connector(), "{}", e);
        }
    }
}
