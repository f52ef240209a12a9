use std::time::Duration;

use telecall_client::{CallRole, SyntheticDevices};
use telecall_core::{CallState, PeerId};

use crate::integration::{init_tracing, join_call, test_config};
use crate::utils::{CONNECTION_TIMEOUT_MS, MockRelayHub, wait_for_state};

/// The relay holds every offer and answer back, so each side sees the
/// other's ICE candidates before it has a remote description.
#[tokio::test]
async fn test_candidates_before_description_still_connect() {
    init_tracing();

    let hub = MockRelayHub::with_description_delay(Duration::from_millis(500));
    let mut callee = join_call(
        &hub,
        test_config(CallRole::Responder, true),
        SyntheticDevices::new("callee"),
    )
    .await;
    let mut caller = join_call(
        &hub,
        test_config(CallRole::Initiator, false),
        SyntheticDevices::new("caller"),
    )
    .await;

    wait_for_state(&mut caller.events, CallState::Connected, CONNECTION_TIMEOUT_MS)
        .await
        .expect("Caller did not connect with early candidates");
    wait_for_state(&mut callee.events, CallState::Connected, CONNECTION_TIMEOUT_MS)
        .await
        .expect("Callee did not connect with early candidates");

    let delivered = hub.delivered_signals();
    let first = |peer: PeerId, kind: &str| {
        delivered
            .iter()
            .position(|(from, k)| *from == Some(peer) && k == kind)
            .unwrap_or_else(|| panic!("No {kind} from {peer} reached the room: {delivered:?}"))
    };

    let caller_id = caller.handle.peer_id();
    let callee_id = callee.handle.peer_id();
    assert!(
        first(caller_id, "ice-candidate") < first(caller_id, "offer"),
        "Callee must see caller candidates before the offer: {:?}",
        delivered
    );
    assert!(
        first(callee_id, "ice-candidate") < first(callee_id, "answer"),
        "Caller must see callee candidates before the answer: {:?}",
        delivered
    );

    caller.handle.hang_up().await.expect("Failed to hang up");
    callee.handle.hang_up().await.expect("Failed to hang up");
}

#[tokio::test]
async fn test_stray_candidate_without_call_is_harmless() {
    init_tracing();

    let hub = MockRelayHub::new();
    let callee = join_call(
        &hub,
        test_config(CallRole::Responder, true),
        SyntheticDevices::new("callee"),
    )
    .await;

    hub.inject(
        r#"{"type":"ice-candidate","candidate":{"candidate":"candidate:1 1 udp 2130706431 127.0.0.1 50000 typ host","sdpMid":"0","sdpMLineIndex":0}}"#,
    );
    tokio::time::sleep(Duration::from_millis(200)).await;

    let state = callee
        .handle
        .media_state()
        .await
        .expect("Session should still be running");
    assert!(!state.muted);
    assert!(!callee.handle.is_finished());
}
