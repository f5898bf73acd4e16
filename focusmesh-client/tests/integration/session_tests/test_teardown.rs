use focusmesh_client::SessionError;
use focusmesh_core::PeerId;

use focusmesh_core::{SessionDescription, SignalMessage};

use crate::integration::{init_tracing, spawn_peer};
use crate::utils::{
    MockBehavior, SIGNAL_TIMEOUT_MS, TestPeer, TestPeerConfig, TransportCall,
    perform_answer_exchange, perform_offer_exchange,
};

#[tokio::test]
async fn test_relay_close_tears_everything_down() {
    init_tracing();

    let mut a = spawn_peer("A");
    let to_b = perform_offer_exchange(&mut a, &PeerId::from("B"))
        .await
        .expect("B failed to connect");
    let to_c = perform_answer_exchange(&mut a, &PeerId::from("C"))
        .await
        .expect("C failed to connect");

    a.close_relay();
    a.wait_for_exit().await.expect("Session did not stop");

    assert!(to_b.is_closed());
    assert!(to_c.is_closed());
    let media = a.media.as_ref().unwrap();
    assert!(media.is_stopped());

    let snapshot = a.handle.snapshot();
    assert!(!snapshot.active);
    assert!(snapshot.participants.is_empty());
    assert!(!snapshot.has_local_media);

    assert!(matches!(a.handle.send_chat("late"), Err(SessionError::Closed)));
}

#[tokio::test]
async fn test_leave_command_tears_down() {
    init_tracing();

    let mut a = spawn_peer("A");
    let to_b = perform_offer_exchange(&mut a, &PeerId::from("B"))
        .await
        .expect("B failed to connect");

    a.handle.leave().unwrap();
    a.wait_for_exit().await.expect("Session did not stop");

    assert!(to_b.is_closed());
    assert!(a.media.as_ref().unwrap().is_stopped());
}

#[tokio::test]
async fn test_handle_closed_resolves_after_teardown() {
    init_tracing();

    let a = spawn_peer("A");
    let mut watcher = a.handle.clone();
    a.close_relay();

    tokio::time::timeout(std::time::Duration::from_secs(2), watcher.closed())
        .await
        .expect("closed() never resolved");
}

#[tokio::test]
async fn test_leave_closes_transport_mid_negotiation() {
    init_tracing();

    let mut a = TestPeer::spawn(
        "A",
        TestPeerConfig {
            behavior: MockBehavior {
                stall_offer: true,
                ..Default::default()
            },
            ..Default::default()
        },
    );
    let remote = PeerId::from("B");

    a.deliver(SignalMessage::NewPeer { id: remote.clone() });
    let transport = a
        .factory
        .wait_for_transport(&remote, 1, SIGNAL_TIMEOUT_MS)
        .await
        .expect("Transport not created");
    assert!(
        transport
            .wait_for_call(&TransportCall::CreateOffer, SIGNAL_TIMEOUT_MS)
            .await
    );

    a.handle.leave().unwrap();
    a.wait_for_exit().await.expect("Session did not stop");

    assert!(transport.is_closed());
    assert_eq!(a.signaling.count(|m| matches!(m, SignalMessage::Offer { .. })), 0);
}

#[tokio::test]
async fn test_relay_close_while_answering_closes_transport() {
    init_tracing();

    let mut a = TestPeer::spawn(
        "A",
        TestPeerConfig {
            behavior: MockBehavior {
                stall_offer: true,
                ..Default::default()
            },
            ..Default::default()
        },
    );

    // C's offer gets answered; our own offer to D never finishes.
    a.deliver(SignalMessage::Offer {
        offer: SessionDescription::offer("v=0"),
        from: "C".into(),
        to: Some("A".into()),
    });
    a.deliver(SignalMessage::NewPeer { id: "D".into() });
    let to_c = a
        .factory
        .wait_for_transport(&PeerId::from("C"), 1, SIGNAL_TIMEOUT_MS)
        .await
        .expect("C transport not created");
    let to_d = a
        .factory
        .wait_for_transport(&PeerId::from("D"), 1, SIGNAL_TIMEOUT_MS)
        .await
        .expect("D transport not created");
    assert!(
        to_d.wait_for_call(&TransportCall::CreateOffer, SIGNAL_TIMEOUT_MS)
            .await
    );
    assert!(
        to_c.wait_for_call(&TransportCall::CreateAnswer, SIGNAL_TIMEOUT_MS)
            .await
    );

    a.close_relay();
    a.wait_for_exit().await.expect("Session did not stop");

    assert!(to_c.is_closed());
    assert!(to_d.is_closed());
    assert!(a.handle.snapshot().participants.is_empty());
}
