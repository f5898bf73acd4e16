use std::sync::Arc;

use focusmesh_client::{
    ClientConfig, NoMedia, Session, SessionHandle, TransportConfig, WebrtcTransportFactory,
};
use focusmesh_core::{RoomName, TimerAction};

use crate::integration::init_tracing;
use crate::utils::TestRelay;

async fn join(relay: &TestRelay, room: &str, label: &str) -> SessionHandle {
    let config = ClientConfig {
        relay_url: relay.base_url(),
        transport: TransportConfig {
            ice_servers: vec![],
        },
        self_label: label.to_owned(),
        ..Default::default()
    };
    let factory = Arc::new(WebrtcTransportFactory::new(config.transport.clone()));
    Session::join(RoomName::from(room), config, &NoMedia, factory)
        .await
        .expect("Session failed to join")
}

async fn wait(
    handle: &mut SessionHandle,
    f: impl FnMut(&focusmesh_client::SessionSnapshot) -> bool,
) -> focusmesh_client::SessionSnapshot {
    tokio::time::timeout(std::time::Duration::from_secs(3), handle.wait_for(f))
        .await
        .expect("Timeout waiting for snapshot")
        .expect("Session closed")
}

#[tokio::test]
async fn test_sessions_share_chat_timer_and_member_count() {
    init_tracing();
    let relay = TestRelay::start().await;

    let mut ana = join(&relay, "Math Study", "Ana").await;
    wait(&mut ana, |s| s.member_count == 1).await;
    let mut bo = join(&relay, "Math Study", "Bo").await;

    wait(&mut ana, |s| s.member_count == 2).await;
    wait(&mut bo, |s| s.member_count == 2).await;

    ana.send_chat("ready?").unwrap();
    let snapshot = wait(&mut bo, |s| !s.chat.is_empty()).await;
    assert_eq!(snapshot.chat[0].sender, "Ana");
    assert_eq!(snapshot.chat[0].text, "ready?");

    bo.send_timer_action(TimerAction::Start { duration: 1500 })
        .unwrap();
    let snapshot = wait(&mut ana, |s| s.timer.running).await;
    assert!(snapshot.timer.time_left <= 1500);

    // Neither side captured media, so nobody offered or connected.
    assert!(snapshot.participants.is_empty());

    // Own chat is not duplicated by the relay echo.
    wait(&mut ana, |s| s.chat.len() == 1).await;
    bo.leave().unwrap();
    wait(&mut ana, |s| s.member_count == 1).await;
    assert_eq!(ana.snapshot().chat.len(), 1);
}

#[tokio::test]
async fn test_late_session_adopts_the_room_timer() {
    init_tracing();
    let relay = TestRelay::start().await;

    let mut ana = join(&relay, "focus", "Ana").await;
    ana.send_timer_action(TimerAction::Pause { time_left: 321 })
        .unwrap();
    wait(&mut ana, |s| s.timer.time_left == 321).await;
    // Give the relay a moment to see the action before the next join.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let mut cy = join(&relay, "focus", "Cy").await;
    let snapshot = wait(&mut cy, |s| s.timer.time_left == 321).await;
    assert!(!snapshot.timer.running);
}

#[tokio::test]
async fn test_join_fails_without_a_relay() {
    init_tracing();
    let config = ClientConfig {
        relay_url: "ws://127.0.0.1:1".to_owned(),
        ..Default::default()
    };
    let factory = Arc::new(WebrtcTransportFactory::new(TransportConfig::default()));
    let result = Session::join(RoomName::from("study"), config, &NoMedia, factory).await;
    assert!(result.is_err());
}
