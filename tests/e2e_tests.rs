mod test_helpers;

use lan_call_signaling::config::ServerConfig;
use serde_json::json;
use test_helpers::{client_ids, start_relay, start_relay_with_config, TestClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Duration;

const QUIET_WINDOW: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_full_call_handshake_between_two_peers() {
    let relay = start_relay().await;

    let mut alice = TestClient::connect(&relay).await;
    let first = alice.register("alice", "Alice").await;
    assert_eq!(first["clients"], json!([{"id": "alice", "name": "Alice"}]));

    let mut bob = TestClient::connect(&relay).await;
    bob.register("bob", "Bob").await;
    let roster = alice.recv_client_list(&["alice", "bob"]).await;
    assert_eq!(
        roster,
        json!({
            "type": "client_list",
            "clients": [
                {"id": "alice", "name": "Alice"},
                {"id": "bob", "name": "Bob"}
            ]
        })
    );

    bob.send_json(json!({
        "type": "offer",
        "target_id": "alice",
        "offer": {"type": "offer", "sdp": "v=0 bob"}
    }))
    .await;
    let offer = alice.recv_type("offer").await;
    assert_eq!(
        offer,
        json!({
            "type": "offer",
            "target_id": "alice",
            "offer": {"type": "offer", "sdp": "v=0 bob"},
            "sender_id": "bob",
            "sender_name": "Bob"
        })
    );

    alice
        .send_json(json!({
            "type": "answer",
            "target_id": "bob",
            "answer": {"type": "answer", "sdp": "v=0 alice"}
        }))
        .await;
    let answer = bob.recv_type("answer").await;
    assert_eq!(answer["sender_id"], "alice");
    assert_eq!(answer["answer"]["sdp"], "v=0 alice");

    bob.send_json(json!({
        "type": "ice_candidate",
        "target_id": "alice",
        "candidate": {"candidate": "candidate:1 1 udp 2122260223 192.168.1.20 54321 typ host"}
    }))
    .await;
    let candidate = alice.recv_type("ice_candidate").await;
    assert_eq!(candidate["sender_id"], "bob");
    assert_eq!(
        candidate["candidate"]["candidate"],
        "candidate:1 1 udp 2122260223 192.168.1.20 54321 typ host"
    );

    alice
        .send_json(json!({"type": "hangup", "target_id": "bob"}))
        .await;
    let hangup = bob.recv_type("hangup").await;
    assert_eq!(hangup["sender_id"], "alice");
    assert_eq!(hangup["sender_name"], "Alice");

    // The counter is bumped after the hand-off to the target's queue.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let metrics = relay.server.metrics().snapshot();
    assert_eq!(metrics.signals_forwarded, 4);
    assert_eq!(metrics.registrations, 2);
}

#[tokio::test]
async fn test_unregistered_sender_is_reported_as_unknown() {
    let relay = start_relay().await;

    let mut alice = TestClient::connect(&relay).await;
    alice.register("alice", "Alice").await;

    let mut stranger = TestClient::connect(&relay).await;
    stranger
        .send_json(json!({"type": "offer", "target_id": "alice", "offer": {}}))
        .await;

    let offer = alice.recv_type("offer").await;
    assert_eq!(offer["sender_id"], "unknown");
    assert_eq!(offer["sender_name"], "unknown");

    // Sending a signal does not register the stranger.
    let registered: Vec<String> = relay
        .server
        .registry()
        .snapshot()
        .await
        .into_iter()
        .map(|client| client.id)
        .collect();
    assert_eq!(registered, vec!["alice"]);
}

#[tokio::test]
async fn test_signal_to_absent_target_is_dropped_silently() {
    let relay = start_relay().await;

    let mut alice = TestClient::connect(&relay).await;
    alice.register("alice", "Alice").await;

    alice
        .send_json(json!({"type": "offer", "target_id": "ghost", "offer": {}}))
        .await;
    alice
        .send_json(json!({"type": "answer", "answer": {}}))
        .await;
    alice.expect_silence(QUIET_WINDOW).await;

    let metrics = relay.server.metrics().snapshot();
    assert_eq!(metrics.signals_dropped, 2);
    assert_eq!(metrics.signals_forwarded, 0);
}

#[tokio::test]
async fn test_disconnect_removes_participant_and_rebroadcasts() {
    let relay = start_relay().await;

    let mut alice = TestClient::connect(&relay).await;
    alice.register("alice", "Alice").await;
    let mut bob = TestClient::connect(&relay).await;
    bob.register("bob", "Bob").await;
    alice.recv_client_list(&["alice", "bob"]).await;

    bob.close().await;
    alice.recv_client_list(&["alice"]).await;

    assert!(relay
        .server
        .registry()
        .find_by_user_id("bob")
        .await
        .is_none());
}

#[tokio::test]
async fn test_update_name_is_broadcast() {
    let relay = start_relay().await;

    let mut alice = TestClient::connect(&relay).await;
    alice.register("alice", "Alice").await;
    let mut bob = TestClient::connect(&relay).await;
    bob.register("bob", "Bob").await;
    alice.recv_client_list(&["alice", "bob"]).await;

    bob.send_json(json!({"type": "update_name", "user_id": "bob", "name": "Robert"}))
        .await;

    loop {
        let roster = alice.recv_type("client_list").await;
        if roster["clients"][1]["name"] == "Robert" {
            assert_eq!(roster["clients"][1]["id"], "bob");
            break;
        }
    }

    // The new name is used on subsequent signals.
    bob.send_json(json!({"type": "hangup", "target_id": "alice"}))
        .await;
    let hangup = alice.recv_type("hangup").await;
    assert_eq!(hangup["sender_name"], "Robert");
}

#[tokio::test]
async fn test_malformed_frames_keep_connection_open() {
    let relay = start_relay().await;

    let mut client = TestClient::connect(&relay).await;
    client.send_text("this is not json").await;
    client.send_text("[1, 2, 3]").await;
    client.send_json(json!({"user_id": "no-type"})).await;
    client.send_json(json!({"type": "dance"})).await;
    client.expect_silence(QUIET_WINDOW).await;

    let roster = client.register("carol", "Carol").await;
    assert_eq!(client_ids(&roster), vec!["carol"]);

    let metrics = relay.server.metrics().snapshot();
    assert_eq!(metrics.decode_errors, 3);
    assert_eq!(metrics.disconnections, 0);
}

#[tokio::test]
async fn test_binary_json_frames_are_accepted() {
    let relay = start_relay().await;

    let mut client = TestClient::connect(&relay).await;
    client
        .send_binary(br#"{"type":"register","user_id":"dave","name":"Dave"}"#.to_vec())
        .await;

    let roster = client.recv_type("client_list").await;
    assert_eq!(roster["clients"], json!([{"id": "dave", "name": "Dave"}]));
}

#[tokio::test]
async fn test_oversized_frame_is_dropped_without_closing() {
    let relay = start_relay_with_config(ServerConfig {
        max_message_size: 1024,
        ..ServerConfig::default()
    })
    .await;

    let mut alice = TestClient::connect(&relay).await;
    alice.register("alice", "Alice").await;
    let mut bob = TestClient::connect(&relay).await;
    bob.register("bob", "Bob").await;
    alice.recv_client_list(&["alice", "bob"]).await;

    bob.send_json(json!({
        "type": "offer",
        "target_id": "alice",
        "offer": {"sdp": "x".repeat(4096)}
    }))
    .await;
    alice.expect_silence(QUIET_WINDOW).await;

    bob.send_json(json!({"type": "offer", "target_id": "alice", "offer": {"sdp": "small"}}))
        .await;
    let offer = alice.recv_type("offer").await;
    assert_eq!(offer["offer"]["sdp"], "small");

    assert_eq!(relay.server.metrics().snapshot().oversized_frames, 1);
}

#[tokio::test]
async fn test_shutdown_closes_connections_and_rejects_new_ones() {
    let relay = start_relay().await;

    let mut alice = TestClient::connect(&relay).await;
    alice.register("alice", "Alice").await;

    relay.server.begin_shutdown();

    assert!(alice.is_closed_by_server().await);
    assert!(
        relay
            .server
            .wait_for_connections(Duration::from_secs(5))
            .await
    );
    assert!(relay.server.registry().is_empty().await);

    let url = relay.ws_url();
    match tokio_tungstenite::connect_async(url).await {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), 503);
        }
        Err(other) => panic!("expected HTTP 503, got {other:?}"),
        Ok(_) => panic!("upgrade accepted during shutdown"),
    }
}

#[tokio::test]
async fn test_health_endpoint_over_http() {
    let relay = start_relay().await;

    let mut stream = tokio::net::TcpStream::connect(relay.addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    tokio::time::timeout(
        Duration::from_secs(5),
        stream.read_to_string(&mut response),
    )
    .await
    .expect("health check timed out")
    .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("OK"), "{response}");
}
