//! In-memory event channel.
//!
//! Stands in for the WebSocket when driving the connector without a network:
//! the [`InMemoryPeer`] plays the token connector, pushing event frames and
//! reading back the acks the event loop writes.

use crate::domain::TransportError;
use crate::ports::{ChannelConnector, EventChannel};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Link {
    Pending,
    Up,
    Failed,
}

/// Create a connected connector/channel/peer triple.
pub fn in_memory_channel() -> (InMemoryConnector, InMemoryEventChannel, InMemoryPeer) {
    let (link_tx, link_rx) = watch::channel(Link::Pending);
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let fail_sends = Arc::new(AtomicBool::new(false));
    let sent = Arc::new(AtomicUsize::new(0));

    let connector = InMemoryConnector {
        link: link_tx,
        refuse: AtomicBool::new(false),
    };
    let channel = InMemoryEventChannel {
        link: link_rx,
        inbound: inbound_rx,
        outbound: Some(outbound_tx),
        fail_sends: fail_sends.clone(),
        sent: sent.clone(),
    };
    let peer = InMemoryPeer {
        inbound: Some(inbound_tx),
        outbound: outbound_rx,
        fail_sends,
        sent,
    };
    (connector, channel, peer)
}

/// Connects the in-memory channel.
pub struct InMemoryConnector {
    link: watch::Sender<Link>,
    refuse: AtomicBool,
}

impl InMemoryConnector {
    /// Make the next `connect` fail.
    pub fn refuse_connection(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChannelConnector for InMemoryConnector {
    async fn connect(&self) -> Result<(), TransportError> {
        if *self.link.borrow() != Link::Pending {
            return Err(TransportError::AlreadyConnected);
        }
        if self.refuse.load(Ordering::SeqCst) {
            self.link.send_replace(Link::Failed);
            return Err(TransportError::Connect("connection refused".to_string()));
        }
        self.link.send_replace(Link::Up);
        Ok(())
    }
}

/// Event loop side of the in-memory channel.
pub struct InMemoryEventChannel {
    link: watch::Receiver<Link>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    fail_sends: Arc<AtomicBool>,
    sent: Arc<AtomicUsize>,
}

#[async_trait]
impl EventChannel for InMemoryEventChannel {
    async fn receive(&mut self) -> Option<Vec<u8>> {
        let link = match self.link.wait_for(|l| *l != Link::Pending).await {
            Ok(link) => *link,
            Err(_) => Link::Failed,
        };
        if link != Link::Up {
            return None;
        }
        self.inbound.recv().await
    }

    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Send("peer rejected frame".to_string()));
        }
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        outbound.send(frame).map_err(|_| TransportError::Closed)?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) {
        self.outbound = None;
        self.inbound.close();
    }
}

/// Token connector side of the in-memory channel.
pub struct InMemoryPeer {
    inbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    fail_sends: Arc<AtomicBool>,
    sent: Arc<AtomicUsize>,
}

impl InMemoryPeer {
    /// Deliver a raw frame. False once the channel is closed.
    pub fn push(&self, frame: impl Into<Vec<u8>>) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(frame.into()).is_ok())
    }

    /// Deliver a JSON frame.
    pub fn push_json(&self, frame: &serde_json::Value) -> bool {
        self.push(frame.to_string())
    }

    /// Next frame written by the event loop, parsed as JSON. `None` once the
    /// channel is closed and drained.
    pub async fn next_sent(&mut self) -> Option<serde_json::Value> {
        let frame = self.outbound.recv().await?;
        serde_json::from_slice(&frame).ok()
    }

    /// Frame already written by the event loop, if any.
    pub fn try_next_sent(&mut self) -> Option<serde_json::Value> {
        let frame = self.outbound.try_recv().ok()?;
        serde_json::from_slice(&frame).ok()
    }

    /// Make every subsequent write from the event loop fail.
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    /// Shared count of frames successfully written by the event loop.
    pub fn sent_counter(&self) -> Arc<AtomicUsize> {
        self.sent.clone()
    }

    /// Close the connection from the peer side.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }
}
