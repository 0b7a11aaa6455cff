//! End-to-end tests: the real router on an ephemeral port, driven by
//! `tokio-tungstenite` clients and `reqwest`.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use fanout_gateway::api::build_app;
use fanout_gateway::app_state::AppState;
use fanout_gateway::config::GatewayConfig;
use fanout_gateway::domain::{ConnectionId, Message};
use fanout_gateway::manager::ConnectionManager;
use fanout_gateway::ws::OnMessage;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(10);

async fn serve(state: AppState) -> SocketAddr {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    let app = build_app(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Server with the default relay handler.
async fn relay_server() -> (SocketAddr, AppState) {
    let state = AppState::new(GatewayConfig::default());
    (serve(state.clone()).await, state)
}

/// Server whose handler only counts inbound messages.
async fn counting_server() -> (SocketAddr, AppState, Arc<AtomicUsize>) {
    let config = GatewayConfig::default();
    let manager = ConnectionManager::new(config.manager_config());
    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    let on_message: OnMessage = Arc::new(move |_: ConnectionId, _: Message| -> BoxFuture<'static, ()> {
        counter.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {})
    });
    let state = AppState::with_handler(config, manager, on_message);
    (serve(state.clone()).await, state, received)
}

async fn connect(addr: SocketAddr) -> Client {
    match tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await {
        Ok((client, _)) => client,
        Err(err) => panic!("websocket connect failed: {err}"),
    }
}

/// Polls the manager until exactly `n` connections are registered.
async fn wait_for_connections(state: &AppState, n: usize) {
    let polled = tokio::time::timeout(WAIT, async {
        loop {
            if let Ok(ids) = state.manager.connections().await
                && ids.len() == n
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    if polled.is_err() {
        panic!("expected {n} connections within {WAIT:?}");
    }
}

async fn next_message(client: &mut Client) -> Message {
    let read = tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(WsFrame::Text(text))) => return Message::<Value>::decode(text.as_str()).ok(),
                Some(Ok(WsFrame::Ping(_) | WsFrame::Pong(_))) => {}
                _ => return None,
            }
        }
    })
    .await;
    match read {
        Ok(Some(message)) => message,
        _ => panic!("no message within {WAIT:?}"),
    }
}

async fn send(client: &mut Client, message: &Message) {
    let Ok(text) = message.encode() else {
        panic!("encode failed");
    };
    if client.send(WsFrame::text(text)).await.is_err() {
        panic!("client send failed");
    }
}

#[tokio::test]
async fn three_clients_each_receive_one_ping() {
    let (addr, state) = relay_server().await;
    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(connect(addr).await);
    }
    wait_for_connections(&state, 3).await;

    let ping = Message::new("ping", json!(1));
    let marker = Message::new("marker", json!(null));
    assert!(state.manager.broadcast(ping.clone()).await.is_ok());
    assert!(state.manager.broadcast(marker.clone()).await.is_ok());

    // The marker right after the ping proves no duplicate was delivered.
    for client in &mut clients {
        assert_eq!(next_message(client).await, ping);
        assert_eq!(next_message(client).await, marker);
    }
}

#[tokio::test]
async fn relay_forwards_inbound_messages_to_everyone() {
    let (addr, state) = relay_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    wait_for_connections(&state, 2).await;

    let chat = Message::new("chat", json!({"from": "alice", "text": "hi"}));
    send(&mut alice, &chat).await;

    assert_eq!(next_message(&mut bob).await, chat);
    assert_eq!(next_message(&mut alice).await, chat);
}

#[tokio::test]
async fn client_disconnect_unregisters_connection() {
    let (addr, state) = relay_server().await;
    let mut leaving = connect(addr).await;
    let mut staying = connect(addr).await;
    wait_for_connections(&state, 2).await;

    let _ = leaving.close(None).await;
    wait_for_connections(&state, 1).await;

    let after = Message::new("after", json!(2));
    assert!(state.manager.broadcast(after.clone()).await.is_ok());
    assert_eq!(next_message(&mut staying).await, after);
}

#[tokio::test]
async fn malformed_frame_drops_the_sender() {
    let (addr, state) = relay_server().await;
    let mut client = connect(addr).await;
    wait_for_connections(&state, 1).await;

    let _ = client.send(WsFrame::text("definitely not json")).await;
    wait_for_connections(&state, 0).await;
}

#[tokio::test]
async fn rest_broadcast_reaches_websocket_clients() {
    let (addr, state) = relay_server().await;
    let mut client = connect(addr).await;
    wait_for_connections(&state, 1).await;

    let http = reqwest::Client::new();
    let Ok(response) = http
        .post(format!("http://{addr}/api/v1/broadcast"))
        .json(&json!({"type": "news", "data": {"headline": "launch"}}))
        .send()
        .await
    else {
        panic!("broadcast request failed");
    };
    assert_eq!(response.status().as_u16(), 202);

    assert_eq!(
        next_message(&mut client).await,
        Message::new("news", json!({"headline": "launch"}))
    );

    let Ok(response) = http
        .get(format!("http://{addr}/api/v1/connections"))
        .send()
        .await
    else {
        panic!("connections request failed");
    };
    let Ok(body) = response.json::<Value>().await else {
        panic!("connections body was not json");
    };
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn every_inbound_message_is_seen_exactly_once() {
    const CLIENTS: usize = 8;
    const PER_CLIENT: usize = 250;

    let (addr, state, received) = counting_server().await;
    let mut clients = Vec::new();
    for _ in 0..CLIENTS {
        clients.push(connect(addr).await);
    }
    wait_for_connections(&state, CLIENTS).await;

    let mut senders = tokio::task::JoinSet::new();
    for (c, mut client) in clients.into_iter().enumerate() {
        senders.spawn(async move {
            for n in 0..PER_CLIENT {
                send(&mut client, &Message::new("load", json!([c, n]))).await;
            }
            client
        });
    }
    let mut clients = Vec::new();
    while let Some(joined) = senders.join_next().await {
        let Ok(client) = joined else {
            panic!("sender task panicked");
        };
        clients.push(client);
    }

    let expected = CLIENTS * PER_CLIENT;
    let counted = tokio::time::timeout(WAIT, async {
        while received.load(Ordering::SeqCst) < expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(counted.is_ok(), "only {} messages seen", received.load(Ordering::SeqCst));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(received.load(Ordering::SeqCst), expected);
    drop(clients);
}

#[tokio::test]
async fn shutdown_closes_clients_and_refuses_new_ones() {
    let (addr, state) = relay_server().await;
    let mut client = connect(addr).await;
    wait_for_connections(&state, 1).await;

    assert!(tokio::time::timeout(WAIT, state.manager.shutdown()).await.is_ok());

    let closed = tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(WsFrame::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "client was not closed");

    let refused = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await;
    assert!(refused.is_err());
}
