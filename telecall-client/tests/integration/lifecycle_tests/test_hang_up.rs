use std::time::Duration;

use telecall_client::{CallRole, SessionError, SessionEvent, SyntheticDevices};
use telecall_core::CallState;

use crate::integration::{init_tracing, join_call, test_config};
use crate::utils::{
    CONNECTION_TIMEOUT_MS, MockRelayHub, SIGNAL_TIMEOUT_MS, wait_for_event, wait_for_state,
};

#[tokio::test]
async fn test_hang_up_closes_relay_and_connection() {
    init_tracing();

    let hub = MockRelayHub::new();
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
        .expect("Caller did not connect");
    wait_for_state(&mut callee.events, CallState::Connected, CONNECTION_TIMEOUT_MS)
        .await
        .expect("Callee did not connect");

    caller.handle.hang_up().await.expect("Failed to hang up");

    let event = wait_for_event(&mut caller.events, SIGNAL_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::Closed { .. })
    })
    .await
    .expect("Session never reported closing");
    assert_eq!(
        event,
        SessionEvent::Closed {
            connection_closed: true
        }
    );
    assert!(caller.probe.is_closed());
    assert_eq!(hub.member_count(), 1);

    tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), async {
        while !caller.handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Session task never released its command channel");

    assert!(matches!(
        caller.handle.toggle_mute().await,
        Err(SessionError::SessionEnded)
    ));
    assert!(matches!(
        caller.handle.hang_up().await,
        Err(SessionError::SessionEnded)
    ));

    callee.handle.hang_up().await.expect("Failed to hang up");
}

#[tokio::test]
async fn test_dropping_every_handle_ends_session() {
    init_tracing();

    let hub = MockRelayHub::new();
    let peer = join_call(
        &hub,
        test_config(CallRole::Responder, false),
        SyntheticDevices::new("solo"),
    )
    .await;
    let mut events = peer.events;
    let probe = peer.probe;

    let extra = peer.handle.clone();
    drop(peer.handle);
    assert!(!extra.is_finished(), "A live clone keeps the session running");
    drop(extra);

    wait_for_state(&mut events, CallState::Closed, SIGNAL_TIMEOUT_MS)
        .await
        .expect("Session did not close after handles dropped");
    assert!(probe.is_closed());
}
