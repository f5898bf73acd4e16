use focusmesh_core::SignalMessage;

use crate::integration::{init_tracing, spawn_peer};

#[tokio::test]
async fn test_malformed_and_unknown_messages_are_skipped() {
    init_tracing();

    let mut a = spawn_peer("A");
    a.deliver_raw("{definitely not json");
    a.deliver_raw(r#"{"type":"wave","id":"B"}"#);
    a.deliver_raw(r#"{"type":"members"}"#);
    a.deliver(SignalMessage::Members { count: 5 });

    let snapshot = a
        .wait_for_snapshot(|s| s.member_count == 5)
        .await
        .expect("Session stopped on bad input");
    assert!(snapshot.active);
}
