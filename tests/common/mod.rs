#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{any, get};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::Instant;

use voxpool::config::Config;

/// Config pointed at a mock gateway, with short timers so tests run fast.
pub fn test_config(gateway_url: String) -> Config {
    Config {
        gateway_url,
        identity_url: String::new(),
        gate_url: String::new(),
        credentials_path: PathBuf::from("tokens.txt"),
        guild_id: "guild-1".to_string(),
        channel_id: "vc-1".to_string(),
        self_mute: true,
        self_deaf: false,
        stagger_ms: 0,
        reconnect_base_ms: 100,
        reconnect_jitter_ms: 100,
        join_delay_ms: 150,
    }
}

/// What the mock gateway does with each incoming connection.
#[derive(Clone, Default)]
pub struct GatewayBehavior {
    /// When set, send HELLO with this heartbeat interval right after connect.
    pub hello_interval_ms: Option<u64>,
    /// Frames pushed to the client immediately after HELLO.
    pub post_hello_frames: Vec<serde_json::Value>,
    /// Close the connection server-side once the frames above are sent.
    pub close_after_hello: bool,
    /// When set, answer a received voice-state update with another HELLO
    /// carrying this interval.
    pub hello_after_join_ms: Option<u64>,
}

/// Everything observable about the mock gateway, in arrival order.
#[derive(Debug)]
pub enum GatewayEvent {
    Connected { conn: usize, at: Instant },
    Frame { conn: usize, value: serde_json::Value },
    Closed { conn: usize },
}

#[derive(Clone)]
struct GatewayState {
    /// Behavior per connection index; the last entry repeats for any
    /// further connections.
    behaviors: Arc<Vec<GatewayBehavior>>,
    events: mpsc::UnboundedSender<GatewayEvent>,
    counter: Arc<AtomicUsize>,
}

/// Spawns a mock gateway on an ephemeral port. Returns its ws URL and the
/// stream of observed events.
pub async fn spawn_gateway(
    behavior: GatewayBehavior,
) -> (String, mpsc::UnboundedReceiver<GatewayEvent>) {
    spawn_gateway_seq(vec![behavior]).await
}

/// Like `spawn_gateway`, but with a distinct behavior per connection index
/// (the last one repeats), for reconnect scenarios.
pub async fn spawn_gateway_seq(
    behaviors: Vec<GatewayBehavior>,
) -> (String, mpsc::UnboundedReceiver<GatewayEvent>) {
    assert!(!behaviors.is_empty());
    let (tx, rx) = mpsc::unbounded_channel();
    let state = GatewayState {
        behaviors: Arc::new(behaviors),
        events: tx,
        counter: Arc::new(AtomicUsize::new(0)),
    };
    let app = Router::new().route("/", any(gateway_ws)).with_state(state);
    let port = serve(app).await;
    (format!("ws://127.0.0.1:{port}"), rx)
}

async fn gateway_ws(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(move |socket| gateway_conn(socket, state))
}

async fn gateway_conn(mut socket: WebSocket, state: GatewayState) {
    let conn = state.counter.fetch_add(1, Ordering::SeqCst);
    let behavior = state.behaviors[conn.min(state.behaviors.len() - 1)].clone();
    let _ = state.events.send(GatewayEvent::Connected {
        conn,
        at: Instant::now(),
    });

    if let Some(ms) = behavior.hello_interval_ms {
        let hello = serde_json::json!({ "op": 10, "d": { "heartbeat_interval": ms } });
        if socket
            .send(Message::Text(hello.to_string().into()))
            .await
            .is_err()
        {
            return;
        }
    }
    for frame in &behavior.post_hello_frames {
        if socket
            .send(Message::Text(frame.to_string().into()))
            .await
            .is_err()
        {
            return;
        }
    }
    if behavior.close_after_hello {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    while let Some(Ok(msg)) = socket.recv().await {
        if let Message::Text(text) = msg {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                let is_join = value["op"] == 4;
                let _ = state.events.send(GatewayEvent::Frame { conn, value });
                if is_join {
                    if let Some(ms) = behavior.hello_after_join_ms {
                        let hello =
                            serde_json::json!({ "op": 10, "d": { "heartbeat_interval": ms } });
                        if socket
                            .send(Message::Text(hello.to_string().into()))
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                }
            }
        }
    }
    let _ = state.events.send(GatewayEvent::Closed { conn });
}

/// Spawns a mock identity endpoint accepting exactly the given credentials
/// as Authorization headers. Returns the endpoint URL.
pub async fn spawn_identity(valid: &[&str]) -> String {
    let valid: HashSet<String> = valid.iter().map(|s| s.to_string()).collect();
    let app = Router::new().route(
        "/users/@me",
        get(move |headers: HeaderMap| async move {
            match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                Some(credential) if valid.contains(credential) => StatusCode::OK,
                _ => StatusCode::UNAUTHORIZED,
            }
        }),
    );
    let port = serve(app).await;
    format!("http://127.0.0.1:{port}/users/@me")
}

/// Spawns a mock license server returning the given code→bool map.
pub async fn spawn_gate(map: serde_json::Value) -> String {
    let app = Router::new().route(
        "/keys.json",
        get(move || async move { Json(map.clone()) }),
    );
    let port = serve(app).await;
    format!("http://127.0.0.1:{port}/keys.json")
}

/// Spawns a license server that always errors.
pub async fn spawn_broken_gate() -> String {
    let app = Router::new().route(
        "/keys.json",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let port = serve(app).await;
    format!("http://127.0.0.1:{port}/keys.json")
}

async fn serve(app: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

/// Next event within the deadline, panicking on timeout.
pub async fn recv_event(
    rx: &mut mpsc::UnboundedReceiver<GatewayEvent>,
    millis: u64,
) -> GatewayEvent {
    tokio::time::timeout(Duration::from_millis(millis), rx.recv())
        .await
        .expect("timed out waiting for gateway event")
        .expect("gateway event channel closed")
}

/// Skips events until a frame with the given opcode arrives.
pub async fn next_frame_with_op(
    rx: &mut mpsc::UnboundedReceiver<GatewayEvent>,
    op: u8,
    millis: u64,
) -> serde_json::Value {
    let deadline = Instant::now() + Duration::from_millis(millis);
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .unwrap_or(Duration::ZERO);
        let event = tokio::time::timeout(remaining, rx.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for frame with op {op}"))
            .expect("gateway event channel closed");
        if let GatewayEvent::Frame { value, .. } = event {
            if value["op"] == op {
                return value;
            }
        }
    }
}

/// Collects every frame observed during the given window as (conn, opcode)
/// pairs. Frames without a numeric opcode are skipped.
pub async fn frames_within(
    rx: &mut mpsc::UnboundedReceiver<GatewayEvent>,
    millis: u64,
) -> Vec<(usize, u64)> {
    let deadline = Instant::now() + Duration::from_millis(millis);
    let mut seen = Vec::new();
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .unwrap_or(Duration::ZERO);
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(GatewayEvent::Frame { conn, value })) => {
                if let Some(op) = value["op"].as_u64() {
                    seen.push((conn, op));
                }
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => return seen,
        }
    }
}

/// Skips events until a connection with the given index is established,
/// returning when it happened.
pub async fn next_connect(
    rx: &mut mpsc::UnboundedReceiver<GatewayEvent>,
    conn: usize,
    millis: u64,
) -> Instant {
    let deadline = Instant::now() + Duration::from_millis(millis);
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .unwrap_or(Duration::ZERO);
        let event = tokio::time::timeout(remaining, rx.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for connection {conn}"))
            .expect("gateway event channel closed");
        if let GatewayEvent::Connected { conn: c, at } = event {
            if c == conn {
                return at;
            }
        }
    }
}
