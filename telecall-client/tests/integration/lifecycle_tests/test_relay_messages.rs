use serde_json::json;

use telecall_client::{CallRole, RelayError, SessionError, SessionEvent, SyntheticDevices};

use crate::integration::{init_tracing, join_call, test_config};
use crate::utils::{MockRelayHub, SIGNAL_TIMEOUT_MS, wait_for_event};

#[tokio::test]
async fn test_chat_frames_pass_through() {
    init_tracing();

    let hub = MockRelayHub::new();
    let alice = join_call(
        &hub,
        test_config(CallRole::Responder, false),
        SyntheticDevices::new("alice"),
    )
    .await;
    let mut bob = join_call(
        &hub,
        test_config(CallRole::Responder, true),
        SyntheticDevices::new("bob"),
    )
    .await;

    alice
        .handle
        .send_chat("see you at 5")
        .await
        .expect("Failed to send chat");

    let event = wait_for_event(&mut bob.events, SIGNAL_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::RelayMessage(_))
    })
    .await
    .expect("Chat message never arrived");
    assert_eq!(
        event,
        SessionEvent::RelayMessage(json!({ "message": "see you at 5" }))
    );

    let frames = alice.probe.sent_frames().await;
    assert_eq!(frames, vec![r#"{"message":"see you at 5"}"#.to_owned()]);
}

#[tokio::test]
async fn test_garbage_frames_are_dropped() {
    init_tracing();

    let hub = MockRelayHub::new();
    let mut peer = join_call(
        &hub,
        test_config(CallRole::Responder, false),
        SyntheticDevices::new("solo"),
    )
    .await;

    hub.inject("not json at all");
    hub.inject("[1, 2, 3]");
    hub.inject(r#"{"type":"offer","offer":"missing sdp"}"#);
    hub.inject(r#"{"type":"presence","user":"bob"}"#);

    let event = wait_for_event(&mut peer.events, SIGNAL_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::RelayMessage(_))
    })
    .await
    .expect("Unknown message types should pass through");
    assert_eq!(
        event,
        SessionEvent::RelayMessage(json!({ "type": "presence", "user": "bob" }))
    );

    assert!(!peer.handle.is_finished());
    assert_eq!(peer.probe.sent_signals("answer").await, 0);
}

#[tokio::test]
async fn test_relay_loss_is_reported_and_session_survives() {
    init_tracing();

    let hub = MockRelayHub::new();
    let mut peer = join_call(
        &hub,
        test_config(CallRole::Responder, false),
        SyntheticDevices::new("solo"),
    )
    .await;

    hub.kick(&peer.probe);

    wait_for_event(&mut peer.events, SIGNAL_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::RelayClosed)
    })
    .await
    .expect("Relay loss was not reported");

    let result = peer.handle.send_chat("anyone there?").await;
    assert!(matches!(
        result,
        Err(SessionError::Relay(RelayError::Closed))
    ));

    let state = peer.handle.media_state().await.expect("Session should survive");
    assert!(!state.muted);
}

#[tokio::test]
async fn test_failed_chat_send_reports_relay_loss() {
    init_tracing();

    let hub = MockRelayHub::new();
    let mut peer = join_call(
        &hub,
        test_config(CallRole::Responder, false),
        SyntheticDevices::new("solo"),
    )
    .await;

    peer.probe.break_outbound();

    let result = peer.handle.send_chat("hello?").await;
    assert!(matches!(
        result,
        Err(SessionError::Relay(RelayError::Closed))
    ));

    wait_for_event(&mut peer.events, SIGNAL_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::RelayClosed)
    })
    .await
    .expect("Failed chat send did not report relay loss");

    let result = peer.handle.send_chat("still there?").await;
    assert!(matches!(
        result,
        Err(SessionError::Relay(RelayError::Closed))
    ));
    assert!(peer.probe.sent_frames().await.is_empty());
}
