//! WebSocket event channel over tokio-tungstenite.
//!
//! [`ws_event_channel`] returns two halves sharing one connection: the
//! [`WsConnector`] kept by the facade to open it, and the [`WsEventChannel`]
//! owned by the event loop. Once connected, a reader task forwards text and
//! binary frames to the loop over an mpsc channel; the loop writes acks
//! through the shared sink.

use crate::domain::{ConnectorConfig, ConnectorError, TransportError};
use crate::ports::{ChannelConnector, EventChannel};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type SharedSink = Arc<Mutex<Option<WsSink>>>;

/// Build the connector/channel pair for the configured event URL.
pub fn ws_event_channel(
    config: &ConnectorConfig,
) -> Result<(WsConnector, WsEventChannel), ConnectorError> {
    let url = config.ws_url()?;
    let (inbound_tx, inbound_rx) = mpsc::channel(config.event_buffer_size);
    let writer: SharedSink = Arc::new(Mutex::new(None));

    let connector = WsConnector {
        url: url.to_string(),
        connect_timeout: config.connect_timeout(),
        inbound_tx: parking_lot::Mutex::new(Some(inbound_tx)),
        writer: writer.clone(),
    };
    let channel = WsEventChannel {
        inbound: inbound_rx,
        writer,
    };
    Ok((connector, channel))
}

/// Opens the WebSocket connection.
pub struct WsConnector {
    url: String,
    connect_timeout: Duration,
    inbound_tx: parking_lot::Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    writer: SharedSink,
}

impl WsConnector {
    /// Event channel URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChannelConnector for WsConnector {
    async fn connect(&self) -> Result<(), TransportError> {
        // Taking the sender makes this a one-shot; on failure it is dropped
        // and the event loop sees the channel close.
        let inbound_tx = self
            .inbound_tx
            .lock()
            .take()
            .ok_or(TransportError::AlreadyConnected)?;

        let (stream, _) = tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| TransportError::Connect(format!("timed out connecting to {}", self.url)))?
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let (write, read) = stream.split();
        *self.writer.lock().await = Some(write);
        tokio::spawn(read_frames(read, inbound_tx));

        debug!(url = %self.url, "Event channel connected");
        Ok(())
    }
}

/// Forward inbound frames until the socket closes or the loop goes away.
/// Pings are answered by tungstenite itself while the stream is polled.
async fn read_frames(mut read: SplitStream<WsStream>, inbound: mpsc::Sender<Vec<u8>>) {
    while let Some(msg) = read.next().await {
        let frame = match msg {
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Close(frame)) => {
                debug!(?frame, "Event channel closed by peer");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "Event channel read failed");
                break;
            }
        };
        if inbound.send(frame).await.is_err() {
            break;
        }
    }
}

/// Event loop side of the WebSocket connection.
pub struct WsEventChannel {
    inbound: mpsc::Receiver<Vec<u8>>,
    writer: SharedSink,
}

#[async_trait]
impl EventChannel for WsEventChannel {
    async fn receive(&mut self) -> Option<Vec<u8>> {
        self.inbound.recv().await
    }

    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let text = String::from_utf8(frame).map_err(|e| TransportError::Send(e.to_string()))?;
        let mut guard = self.writer.lock().await;
        let sink = guard.as_mut().ok_or(TransportError::Closed)?;
        sink.send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        if let Some(mut sink) = self.writer.lock().await.take() {
            let _ = sink.close().await;
        }
        self.inbound.close();
    }
}
