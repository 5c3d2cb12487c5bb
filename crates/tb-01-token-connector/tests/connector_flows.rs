//! End-to-end flows through the connector facade: commands over a mocked REST
//! API, confirmations over the in-memory event channel.

use async_trait::async_trait;
use serde_json::json;
use shared_types::{
    BigInt, CallbackError, CreatePoolRequest, OpStatus, OperationId, OperationUpdate,
    TokenApproval, TokenPool, TokenTransfer, TokenType, TransactionRef, TransactionType,
    TransferEndpoints, TransferRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tb_01_token_connector::{
    in_memory_channel, ChannelState, ConnectorConfig, ConnectorError, EventLoopError,
    HttpCommandTransport, InMemoryPeer, LoopExit, MockCommandTransport, PoolSubmission,
    RecordingCallbacks, TokenCallbacks, TokenConnector, TokenConnectorApi, Transports,
};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn connector_with(
    commands: Arc<dyn tb_01_token_connector::CommandTransport>,
    callbacks: Arc<dyn TokenCallbacks>,
) -> (TokenConnector, InMemoryPeer) {
    let (channel_connector, channel, peer) = in_memory_channel();
    let connector = TokenConnector::init_with_transports(
        "erc20",
        callbacks,
        Transports {
            commands,
            connector: Arc::new(channel_connector),
            channel,
        },
    );
    (connector, peer)
}

async fn next_sent(peer: &mut InMemoryPeer) -> Option<serde_json::Value> {
    tokio::time::timeout(Duration::from_secs(2), peer.next_sent())
        .await
        .expect("timed out waiting for a frame")
}

#[tokio::test]
async fn receipt_reports_success_without_ack() {
    let callbacks = Arc::new(RecordingCallbacks::new());
    let (connector, mut peer) = connector_with(Arc::new(MockCommandTransport::new()), callbacks.clone());
    connector.start().await.unwrap();

    let op = OperationId::new();
    peer.push_json(&json!({
        "event": "receipt",
        "id": "r1",
        "data": {"id": op.to_string(), "success": true, "transactionHash": "0xabc"}
    }));
    // Marker event: once its ack arrives the receipt has been processed
    peer.push_json(&json!({
        "event": "token-pool",
        "id": "marker",
        "data": {"type": "fungible", "poolLocator": "pool0"}
    }));

    let ack = next_sent(&mut peer).await.unwrap();
    assert_eq!(ack["data"]["id"], "marker");

    let updates = callbacks.updates.lock();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].operation_id, op);
    assert_eq!(updates[0].status, OpStatus::Succeeded);
    assert_eq!(updates[0].transaction_hash.as_deref(), Some("0xabc"));
}

#[tokio::test]
async fn pool_without_blockchain_is_delivered_and_acked() {
    let callbacks = Arc::new(RecordingCallbacks::new());
    let (connector, mut peer) = connector_with(Arc::new(MockCommandTransport::new()), callbacks.clone());
    connector.start().await.unwrap();

    peer.push_json(&json!({
        "event": "token-pool",
        "id": "e1",
        "data": {"type": "fungible", "poolLocator": "pool1"}
    }));
    assert_eq!(
        next_sent(&mut peer).await.unwrap(),
        json!({"event": "ack", "data": {"id": "e1"}})
    );

    let pools = callbacks.pools.lock();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].pool_locator, "pool1");
    assert_eq!(pools[0].connector, "erc20");
    assert!(pools[0].event.is_none());
}

#[tokio::test]
async fn pool_missing_locator_is_acked_and_loop_continues() {
    let callbacks = Arc::new(RecordingCallbacks::new());
    let (connector, mut peer) = connector_with(Arc::new(MockCommandTransport::new()), callbacks.clone());
    connector.start().await.unwrap();

    peer.push_json(&json!({"event": "token-pool", "id": "e1", "data": {"type": "fungible"}}));
    peer.push_json(&json!({"event": "token-pool", "id": "e2", "data": {"type": "fungible", "poolLocator": "pool2"}}));

    assert_eq!(next_sent(&mut peer).await.unwrap()["data"]["id"], "e1");
    assert_eq!(next_sent(&mut peer).await.unwrap()["data"]["id"], "e2");
    let pools = callbacks.pools.lock();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].pool_locator, "pool2");
}

#[tokio::test]
async fn pool_callback_error_stops_loop() {
    let callbacks = Arc::new(RecordingCallbacks::new());
    callbacks.fail_with(CallbackError::Storage("database closed".into()));
    let (connector, mut peer) = connector_with(Arc::new(MockCommandTransport::new()), callbacks.clone());
    connector.start().await.unwrap();

    peer.push_json(&json!({"event": "token-pool", "id": "e1", "data": {"type": "fungible", "poolLocator": "p1"}}));
    peer.push_json(&json!({"event": "token-pool", "id": "e2", "data": {"type": "fungible", "poolLocator": "p2"}}));

    let exit = connector.join().await.unwrap();
    assert!(matches!(exit, Err(EventLoopError::Dispatch { .. })));
    assert_eq!(connector.channel_state(), ChannelState::Closed);
    // No acks at all, and the second event was never dispatched
    assert_eq!(next_sent(&mut peer).await, None);
    assert_eq!(callbacks.pools.lock().len(), 1);
}

/// Callbacks that check no ack has gone out for the event being delivered.
struct AckOrderCallbacks {
    acks_sent: Arc<AtomicUsize>,
    delivered: AtomicUsize,
}

impl AckOrderCallbacks {
    async fn check(&self) -> Result<(), CallbackError> {
        let before = self.delivered.load(Ordering::SeqCst);
        // Give an eager ack every chance to overtake the callback
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.acks_sent.load(Ordering::SeqCst) != before {
            return Err(CallbackError::Dispatch("ack sent before callback returned".into()));
        }
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl TokenCallbacks for AckOrderCallbacks {
    async fn token_op_update(&self, _connector: &str, _update: OperationUpdate) {}

    async fn token_pool_created(&self, _connector: &str, _pool: TokenPool) -> Result<(), CallbackError> {
        self.check().await
    }

    async fn tokens_transferred(
        &self,
        _connector: &str,
        _transfer: TokenTransfer,
    ) -> Result<(), CallbackError> {
        self.check().await
    }

    async fn tokens_approved(
        &self,
        _connector: &str,
        _approval: TokenApproval,
    ) -> Result<(), CallbackError> {
        self.check().await
    }
}

#[tokio::test]
async fn each_event_acked_once_after_its_callback() {
    let (channel_connector, channel, mut peer) = in_memory_channel();
    let callbacks = Arc::new(AckOrderCallbacks {
        acks_sent: peer.sent_counter(),
        delivered: AtomicUsize::new(0),
    });
    let connector = TokenConnector::init_with_transports(
        "erc20",
        callbacks.clone(),
        Transports {
            commands: Arc::new(MockCommandTransport::new()),
            connector: Arc::new(channel_connector),
            channel,
        },
    );
    connector.start().await.unwrap();

    let transfer = |id: &str, event: &str| {
        json!({
            "event": event,
            "id": id,
            "data": {
                "subject": id, "poolLocator": "p1", "signer": "0x0",
                "from": "0x1", "to": "0x2", "amount": "1"
            }
        })
    };
    peer.push_json(&transfer("m1", "token-mint"));
    peer.push_json(&transfer("b1", "token-burn"));
    peer.push_json(&transfer("t1", "token-transfer"));
    peer.push_json(&json!({
        "event": "token-approval",
        "id": "a1",
        "data": {"subject": "a1", "poolLocator": "p1", "signer": "0x0", "operator": "0x3", "approved": true}
    }));

    for expected in ["m1", "b1", "t1", "a1"] {
        assert_eq!(next_sent(&mut peer).await.unwrap()["data"]["id"], expected);
    }
    assert_eq!(callbacks.delivered.load(Ordering::SeqCst), 4);

    connector.shutdown();
    assert_eq!(connector.join().await.unwrap().unwrap(), LoopExit::Cancelled);
    assert!(peer.try_next_sent().is_none());
}

#[tokio::test]
async fn create_pool_round_trips_correlation_data() {
    let transport = Arc::new(MockCommandTransport::new());
    let callbacks = Arc::new(RecordingCallbacks::new());
    let (connector, mut peer) = connector_with(transport.clone(), callbacks.clone());
    connector.start().await.unwrap();

    let tx = Uuid::new_v4();
    let request = CreatePoolRequest {
        pool_type: TokenType::NonFungible,
        signer: "0x123".into(),
        name: "pool".into(),
        symbol: "NFT".into(),
        config: Default::default(),
        tx: TransactionRef::new(tx, TransactionType::TokenPool),
    };
    let outcome = connector
        .create_token_pool(OperationId::new(), &request)
        .await
        .unwrap();
    assert_eq!(outcome, PoolSubmission::Pending);

    // The connector echoes `data` back on the confirmation event
    let (_, body) = transport.requests().remove(0);
    let echoed = body["data"].clone();
    peer.push_json(&json!({
        "event": "token-pool",
        "id": "e1",
        "data": {
            "type": "nonfungible",
            "poolLocator": "N1",
            "data": echoed,
            "blockchain": {"id": "000001", "info": {"transactionHash": "0x1"}}
        }
    }));
    next_sent(&mut peer).await.unwrap();

    let pools = callbacks.pools.lock();
    assert_eq!(pools[0].tx, TransactionRef::new(tx, TransactionType::TokenPool));
    assert_eq!(pools[0].pool_type, TokenType::NonFungible);
    assert_eq!(pools[0].event.as_ref().unwrap().source, "fftokens:erc20");
}

#[tokio::test]
async fn mint_failure_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/mint"))
        .respond_with(ResponseTemplate::new(500).set_body_string("{\"error\":\"pop\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let callbacks = Arc::new(RecordingCallbacks::new());
    let commands = Arc::new(HttpCommandTransport::new(&ConnectorConfig::with_url(server.uri())).unwrap());
    let (connector, _peer) = connector_with(commands, callbacks.clone());

    let request = TransferRequest {
        endpoints: TransferEndpoints::Mint { to: "0xb".into() },
        token_index: None,
        amount: BigInt::from(100u8),
        signer: "0x123".into(),
        tx: TransactionRef::new(Uuid::new_v4(), TransactionType::TokenTransfer),
        message: None,
        message_hash: None,
    };
    let err = connector
        .mint_tokens(OperationId::new(), "pool1", &request)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::Rest { status: 500, .. }));
    assert!(callbacks.transfers.lock().is_empty());
}

#[tokio::test]
async fn synchronous_pool_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/activatepool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "fungible",
            "poolLocator": "F1",
            "standard": "ERC20",
            "symbol": "FFT"
        })))
        .mount(&server)
        .await;

    let callbacks = Arc::new(RecordingCallbacks::new());
    let commands = Arc::new(HttpCommandTransport::new(&ConnectorConfig::with_url(server.uri())).unwrap());
    let (connector, _peer) = connector_with(commands, callbacks.clone());

    let outcome = connector
        .activate_token_pool(
            OperationId::new(),
            &shared_types::ActivatePoolRequest {
                pool_locator: "F1".into(),
                config: Default::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome, PoolSubmission::Complete);
    assert_eq!(callbacks.pools.lock()[0].standard.as_deref(), Some("ERC20"));
}

#[tokio::test]
async fn shutdown_cancels_idle_loop() {
    let (connector, _peer) = connector_with(
        Arc::new(MockCommandTransport::new()),
        Arc::new(RecordingCallbacks::new()),
    );
    connector.start().await.unwrap();
    connector.shutdown();
    assert_eq!(connector.join().await.unwrap().unwrap(), LoopExit::Cancelled);
    assert_eq!(connector.channel_state(), ChannelState::Closed);
}
