use focusmesh_core::{SignalMessage, TimerActionKind, TimerPayload};

use crate::integration::init_tracing;
use crate::utils::{TestClient, TestRelay};

#[tokio::test]
async fn test_late_joiner_gets_running_timer() {
    init_tracing();
    let relay = TestRelay::start().await;
    let url = relay.room_url("study");

    let mut a = TestClient::join(&url, "A").await.unwrap();
    a.drain_join().await.unwrap();

    let start = SignalMessage::Timer {
        action: TimerActionKind::Start,
        data: TimerPayload {
            duration: Some(900),
            time_left: None,
        },
        from: Some("A".into()),
    };
    a.send(&start).await.unwrap();
    // Forwarded verbatim, including back to the sender.
    assert_eq!(a.recv().await.unwrap(), start);

    let mut c = TestClient::join(&url, "C").await.unwrap();
    let SignalMessage::TimerSync { data } = c.recv().await.unwrap() else {
        panic!("First frame for a joiner must be timer-sync");
    };
    assert!(data.is_running);
    assert!(data.time_left <= 900 && data.time_left >= 890);
}

#[tokio::test]
async fn test_reset_restores_the_default() {
    init_tracing();
    let relay = TestRelay::start().await;
    let url = relay.room_url("study");

    let mut a = TestClient::join(&url, "A").await.unwrap();
    a.drain_join().await.unwrap();
    a.send_raw(r#"{"type":"timer","action":"pause","data":{"timeLeft":42},"from":"A"}"#)
        .await
        .unwrap();
    a.recv().await.unwrap();
    a.send_raw(r#"{"type":"timer","action":"reset","from":"A"}"#)
        .await
        .unwrap();
    a.recv().await.unwrap();

    let mut c = TestClient::join(&url, "C").await.unwrap();
    let SignalMessage::TimerSync { data } = c.recv().await.unwrap() else {
        panic!("First frame for a joiner must be timer-sync");
    };
    assert!(!data.is_running);
    assert_eq!(data.time_left, 1500);
}
