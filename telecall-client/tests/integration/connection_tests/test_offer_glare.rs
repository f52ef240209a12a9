use std::time::Duration;

use telecall_client::{CallRole, SessionEvent, SyntheticDevices};
use telecall_core::CallState;

use crate::integration::{init_tracing, join_call, test_config};
use crate::utils::{CONNECTION_TIMEOUT_MS, MockRelayHub, drain_events, wait_for_state};

/// Offers are held back by the relay, so each side receives the other's
/// offer while its own is still outstanding. The polite side must give way
/// and answer; the impolite side must ignore the colliding offer.
#[tokio::test]
async fn test_colliding_offers_resolve_to_one_call() {
    init_tracing();

    let hub = MockRelayHub::with_description_delay(Duration::from_millis(400));
    let mut polite = join_call(
        &hub,
        test_config(CallRole::Initiator, true),
        SyntheticDevices::new("polite"),
    )
    .await;
    let mut impolite = join_call(
        &hub,
        test_config(CallRole::Initiator, false),
        SyntheticDevices::new("impolite"),
    )
    .await;
    let mut polite_log = polite.handle.subscribe();

    wait_for_state(&mut polite.events, CallState::Connected, CONNECTION_TIMEOUT_MS)
        .await
        .expect("Polite side did not connect");
    wait_for_state(&mut impolite.events, CallState::Connected, CONNECTION_TIMEOUT_MS)
        .await
        .expect("Impolite side did not connect");

    let delivered = hub.delivered_signals();
    let polite_offer = delivered
        .iter()
        .position(|(from, kind)| *from == Some(polite.handle.peer_id()) && kind == "offer")
        .expect("Polite offer never reached the room");
    let impolite_offer = delivered
        .iter()
        .position(|(from, kind)| *from == Some(impolite.handle.peer_id()) && kind == "offer")
        .expect("Impolite offer never reached the room");
    let first_answer = delivered
        .iter()
        .position(|(_, kind)| kind == "answer")
        .expect("No answer reached the room");
    assert!(
        polite_offer < first_answer && impolite_offer < first_answer,
        "Both offers must be outstanding at once: {:?}",
        delivered
    );

    assert_eq!(polite.probe.sent_signals("offer").await, 1);
    assert_eq!(impolite.probe.sent_signals("offer").await, 1);
    assert_eq!(
        polite.probe.sent_signals("answer").await,
        1,
        "Polite side must answer the colliding offer"
    );
    assert_eq!(
        impolite.probe.sent_signals("answer").await,
        0,
        "Impolite side must never answer a colliding offer"
    );

    let events = drain_events(&mut polite_log, 300).await;
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, SessionEvent::NegotiationFailed(_))),
        "Yielding must not fail the round: {:?}",
        events
    );

    polite.handle.hang_up().await.expect("Failed to hang up");
    impolite.handle.hang_up().await.expect("Failed to hang up");
}
