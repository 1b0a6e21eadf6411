use futures_util::{SinkExt, StreamExt};
use lan_call_signaling::config::ServerConfig;
use lan_call_signaling::server::SignalingServer;
use lan_call_signaling::websocket::create_router;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long a test waits for a frame before giving up
#[allow(dead_code)]
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A relay listening on an ephemeral loopback port.
#[allow(dead_code)]
pub struct TestRelay {
    pub addr: SocketAddr,
    pub server: Arc<SignalingServer>,
}

impl TestRelay {
    #[allow(dead_code)]
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Start a relay with default configuration
#[allow(dead_code)]
pub async fn start_relay() -> TestRelay {
    start_relay_with_config(ServerConfig::default()).await
}

/// Start a relay with a custom configuration.
///
/// The HTTP listener is deliberately not tied to the relay's shutdown token so
/// tests can observe how the relay answers new upgrades while shutting down.
#[allow(dead_code)]
pub async fn start_relay_with_config(config: ServerConfig) -> TestRelay {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let server = SignalingServer::new(config);
    let router = create_router("*").with_state(server.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestRelay { addr, server }
}

/// A WebSocket client speaking the relay's JSON protocol.
#[allow(dead_code)]
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[allow(dead_code)]
impl TestClient {
    pub async fn connect(relay: &TestRelay) -> Self {
        let (stream, _) = tokio::time::timeout(RECV_TIMEOUT, connect_async(relay.ws_url()))
            .await
            .expect("WebSocket connection timed out")
            .expect("Failed to connect");
        Self { stream }
    }

    pub async fn send_json(&mut self, value: Value) {
        self.send_text(&value.to_string()).await;
    }

    pub async fn send_text(&mut self, text: &str) {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .expect("send failed");
    }

    pub async fn send_binary(&mut self, payload: Vec<u8>) {
        self.stream
            .send(Message::binary(payload))
            .await
            .expect("send failed");
    }

    /// Next JSON message from the relay, skipping control frames.
    pub async fn recv_json(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("connection closed")
                .expect("WebSocket error");
            match frame {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_str()).expect("relay sent invalid JSON")
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Next message whose `type` is `message_type`, discarding others.
    pub async fn recv_type(&mut self, message_type: &str) -> Value {
        loop {
            let message = self.recv_json().await;
            if message["type"] == message_type {
                return message;
            }
        }
    }

    /// Wait for a `client_list` whose ids are exactly `ids`, in order.
    pub async fn recv_client_list(&mut self, ids: &[&str]) -> Value {
        loop {
            let message = self.recv_type("client_list").await;
            if client_ids(&message) == ids {
                return message;
            }
        }
    }

    /// Assert no application message arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        match tokio::time::timeout(window, self.stream.next()).await {
            Err(_) => {}
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {}
            Ok(other) => panic!("expected no message, got {other:?}"),
        }
    }

    /// Register and wait for the broadcast that includes this client.
    pub async fn register(&mut self, user_id: &str, name: &str) -> Value {
        self.send_json(serde_json::json!({
            "type": "register",
            "user_id": user_id,
            "name": name,
        }))
        .await;
        loop {
            let message = self.recv_type("client_list").await;
            if client_ids(&message).iter().any(|id| id == user_id) {
                return message;
            }
        }
    }

    /// True once the relay has ended the connection.
    pub async fn is_closed_by_server(&mut self) -> bool {
        loop {
            match tokio::time::timeout(RECV_TIMEOUT, self.stream.next()).await {
                Err(_) => return false,
                Ok(None | Some(Err(_)) | Some(Ok(Message::Close(_)))) => return true,
                Ok(Some(Ok(_))) => continue,
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// The `id`s of a `client_list` message, in broadcast order.
#[allow(dead_code)]
pub fn client_ids(message: &Value) -> Vec<String> {
    message["clients"]
        .as_array()
        .expect("client_list without clients")
        .iter()
        .map(|client| client["id"].as_str().unwrap_or_default().to_string())
        .collect()
}
