#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use hubsocket_core::protocol::envelope::METHOD_SOCKET_CONNECTED;
use hubsocket_core::protocol::Envelope;
use hubsocket_gateway::app_state::AppState;
use hubsocket_gateway::router::{self, WS_PATH};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router::build_router(state)).await.unwrap();
    });
    addr
}

async fn open(addr: SocketAddr) -> (Ws, String) {
    let (mut ws, _resp) = connect_async(format!("ws://{addr}{WS_PATH}")).await.unwrap();
    let boot = next_envelope(&mut ws).await;
    assert_eq!(boot.method_name.as_deref(), Some(METHOD_SOCKET_CONNECTED));
    let id = boot.data.as_str().unwrap().to_string();
    (ws, id)
}

async fn next_envelope(ws: &mut Ws) -> Envelope {
    loop {
        let msg = tokio::time::timeout(common::RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .unwrap();
        match msg {
            Message::Text(text) => return Envelope::decode(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn call(ws: &mut Ws, method: &str, data: serde_json::Value, promise: serde_json::Value) {
    let text = Envelope::call(method, data, Some(promise)).encode().unwrap();
    ws.send(Message::Text(text)).await.unwrap();
}

async fn wait_until_empty(state: &AppState) {
    let deadline = tokio::time::Instant::now() + common::RECV_TIMEOUT;
    while !state.registry().is_empty() || state.metrics().connections_active.get(&[]) != 0 {
        assert!(tokio::time::Instant::now() < deadline, "connection was never removed");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn echo_over_websocket() {
    let state = common::builtin_state();
    let addr = spawn_server(state.clone()).await;
    let (mut ws, id) = open(addr).await;
    assert_eq!(state.registry().ids()[0].to_string(), id);

    // far larger than the 16 byte read buffer
    let long = "ünïcödé ".repeat(64);
    call(&mut ws, "Echo", json!({ "text": long }), json!("e1")).await;
    assert_eq!(
        next_envelope(&mut ws).await,
        Envelope::reply(json!(long), Some(json!("e1")))
    );

    call(&mut ws, "CounterHub.Increment", json!(null), json!("ignored")).await;
    call(&mut ws, "increment", json!(null), json!("c1")).await;
    assert_eq!(next_envelope(&mut ws).await, Envelope::reply(json!(1), Some(json!("c1"))));

    ws.close(None).await.unwrap();
    wait_until_empty(&state).await;
    assert_eq!(state.metrics().connections_accepted.get(&[]), 1);
}

#[tokio::test]
async fn broadcast_between_websocket_peers() {
    let state = common::builtin_state();
    let addr = spawn_server(state.clone()).await;
    let (mut a, a_id) = open(addr).await;
    let (mut b, _b_id) = open(addr).await;

    call(&mut a, "Broadcast", json!({ "message": "hey" }), json!("x")).await;
    let expected = Envelope::push(None, json!({ "from": a_id, "message": "hey" }));
    assert_eq!(next_envelope(&mut a).await, expected);
    assert_eq!(next_envelope(&mut b).await, expected);

    drop(a);
    drop(b);
    wait_until_empty(&state).await;
}

#[tokio::test]
async fn draining_gateway_refuses_upgrades() {
    let state = common::builtin_state();
    let addr = spawn_server(state.clone()).await;

    let (mut ws, _id) = open(addr).await;
    state.set_draining();

    assert!(connect_async(format!("ws://{addr}{WS_PATH}")).await.is_err());

    // existing connections keep working while draining
    call(&mut ws, "Echo", json!({ "text": "still up" }), json!(1)).await;
    assert_eq!(
        next_envelope(&mut ws).await,
        Envelope::reply(json!("still up"), Some(json!(1)))
    );
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut out = String::new();
    tokio::time::timeout(common::RECV_TIMEOUT, stream.read_to_string(&mut out))
        .await
        .unwrap()
        .unwrap();
    out
}

#[tokio::test]
async fn ops_endpoints_report_state() {
    let state = common::builtin_state();
    let addr = spawn_server(state.clone()).await;

    assert!(http_get(addr, "/healthz").await.starts_with("HTTP/1.1 200"));

    let ready = http_get(addr, "/readyz").await;
    assert!(ready.starts_with("HTTP/1.1 200"));
    assert!(ready.contains("EchoHub,ChatHub,CounterHub"));

    let (_ws, _id) = open(addr).await;
    let metrics = http_get(addr, "/metrics").await;
    assert!(metrics.contains("hubsocket_connections_accepted_total{} 1"));
    assert!(metrics.contains("hubsocket_registry_connections 1"));

    state.set_draining();
    assert!(http_get(addr, "/readyz").await.starts_with("HTTP/1.1 503"));
    assert!(http_get(addr, "/metrics").await.contains("hubsocket_draining 1"));
}
