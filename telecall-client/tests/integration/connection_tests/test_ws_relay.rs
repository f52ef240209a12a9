use std::time::Duration;

use telecall_client::{
    CallRole, CallSession, RelayError, SessionConfig, SessionError, SignalingRelay,
    SyntheticDevices, WsRelay,
};
use telecall_core::CallState;
use url::Url;

use crate::integration::{init_tracing, test_config};
use crate::utils::{CONNECTION_TIMEOUT_MS, SIGNAL_TIMEOUT_MS, TestRelayServer, wait_for_state};

fn relay_config(server: &TestRelayServer, role: CallRole, polite: bool) -> SessionConfig {
    SessionConfig {
        relay_url: server.url(),
        auth_token: Some("secret".to_owned()),
        ..test_config(role, polite)
    }
}

#[tokio::test]
async fn test_ws_relay_echoes_to_group() {
    init_tracing();

    let server = TestRelayServer::spawn("secret")
        .await
        .expect("Failed to start relay server");
    let endpoint = relay_config(&server, CallRole::Initiator, false)
        .relay_endpoint()
        .expect("Invalid relay url");

    let mut a = WsRelay::connect(endpoint.clone())
        .await
        .expect("First client failed to connect");
    let mut b = WsRelay::connect(endpoint)
        .await
        .expect("Second client failed to connect");

    tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), async {
        while server.member_count() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Both clients should join the group");

    a.send(r#"{"message":"hello"}"#.to_owned())
        .await
        .expect("Failed to send");

    let timeout = Duration::from_millis(SIGNAL_TIMEOUT_MS);
    let got_b = tokio::time::timeout(timeout, b.recv()).await.expect("b timed out");
    let got_a = tokio::time::timeout(timeout, a.recv()).await.expect("a timed out");
    assert_eq!(got_b.as_deref(), Some(r#"{"message":"hello"}"#));
    assert_eq!(got_a.as_deref(), Some(r#"{"message":"hello"}"#));

    a.close().await;
    assert!(matches!(
        a.send("{}".to_owned()).await,
        Err(RelayError::Closed)
    ));
    b.close().await;
}

#[tokio::test]
async fn test_ws_relay_rejects_missing_token() {
    init_tracing();

    let server = TestRelayServer::spawn("secret")
        .await
        .expect("Failed to start relay server");
    let endpoint = Url::parse(&server.url()).expect("Invalid relay url");

    let result = WsRelay::connect(endpoint).await;
    assert!(matches!(result, Err(RelayError::WebSocket(_))));
}

#[tokio::test]
async fn test_call_over_websocket_relay() {
    init_tracing();

    let server = TestRelayServer::spawn("secret")
        .await
        .expect("Failed to start relay server");

    let (callee, mut callee_events) = CallSession::connect(
        relay_config(&server, CallRole::Responder, true),
        SyntheticDevices::new("callee"),
    )
    .await
    .expect("Callee failed to connect");

    tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), async {
        while server.member_count() < 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Callee should join the group");

    let (caller, mut caller_events) = CallSession::connect(
        relay_config(&server, CallRole::Initiator, false),
        SyntheticDevices::new("caller"),
    )
    .await
    .expect("Caller failed to connect");

    wait_for_state(&mut caller_events, CallState::Connected, CONNECTION_TIMEOUT_MS)
        .await
        .expect("Caller did not connect over websocket");
    wait_for_state(&mut callee_events, CallState::Connected, CONNECTION_TIMEOUT_MS)
        .await
        .expect("Callee did not connect over websocket");

    caller.hang_up().await.expect("Failed to hang up");
    callee.hang_up().await.expect("Failed to hang up");
}

#[tokio::test]
async fn test_connect_with_bad_url_fails() {
    let config = SessionConfig {
        relay_url: "not a url".to_owned(),
        ..test_config(CallRole::Initiator, false)
    };

    let result = CallSession::connect(config, SyntheticDevices::default()).await;
    assert!(matches!(result, Err(SessionError::Relay(RelayError::Url(_)))));
}
