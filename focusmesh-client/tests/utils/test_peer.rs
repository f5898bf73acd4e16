use anyhow::{Context, Result};
use focusmesh_client::{
    CandidatePolicy, ClientConfig, LocalMedia, LocalTrack, RelayEvent, Session, SessionHandle,
    SessionParts, SessionSnapshot, TrackKind,
};
use focusmesh_core::{PeerId, RoomName, SignalMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::mock_signaling::MockSignalingOutput;
use super::mock_transport::{MockBehavior, MockTransportFactory};
use super::signal_helpers::SNAPSHOT_TIMEOUT_MS;

/// Configuration for a [`TestPeer`].
#[derive(Debug, Clone)]
pub struct TestPeerConfig {
    pub with_media: bool,
    pub candidate_policy: CandidatePolicy,
    pub behavior: MockBehavior,
}

impl Default for TestPeerConfig {
    fn default() -> Self {
        Self {
            with_media: true,
            candidate_policy: CandidatePolicy::Buffer,
            behavior: MockBehavior::default(),
        }
    }
}

/// A running session wired to a fake relay and mock transports.
pub struct TestPeer {
    pub id: PeerId,
    pub handle: SessionHandle,
    /// Feeds the session as if the relay had sent it something.
    pub relay: mpsc::UnboundedSender<RelayEvent>,
    /// Everything the session sent to the relay.
    pub signals: mpsc::UnboundedReceiver<SignalMessage>,
    pub signaling: MockSignalingOutput,
    pub factory: MockTransportFactory,
    /// A clone of the captured media, to check it gets stopped.
    pub media: Option<LocalMedia>,
    pub task: JoinHandle<()>,
}

impl TestPeer {
    pub fn spawn(id: &str, config: TestPeerConfig) -> Self {
        let id = PeerId::from(id);
        let (signaling, signals) = MockSignalingOutput::new();
        let (relay, relay_events) = mpsc::unbounded_channel();
        let factory = MockTransportFactory::with_behavior(config.behavior);
        let media = config.with_media.then(test_media);

        let (session, handle) = Session::new(SessionParts {
            local_id: id.clone(),
            room: RoomName::from("study"),
            signaling: Arc::new(signaling.clone()),
            relay_events,
            relay_link: None,
            factory: Arc::new(factory.clone()),
            local_media: media.clone(),
            config: ClientConfig {
                candidate_policy: config.candidate_policy,
                ..Default::default()
            },
        });
        let task = tokio::spawn(session.run());

        Self {
            id,
            handle,
            relay,
            signals,
            signaling,
            factory,
            media,
            task,
        }
    }

    pub fn deliver(&self, msg: SignalMessage) {
        let text = serde_json::to_string(&msg).unwrap();
        self.deliver_raw(&text);
    }

    pub fn deliver_raw(&self, text: &str) {
        let _ = self.relay.send(RelayEvent::Message(text.to_owned()));
    }

    pub fn close_relay(&self) {
        let _ = self.relay.send(RelayEvent::Closed(None));
    }

    pub async fn wait_for_snapshot(
        &mut self,
        f: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot> {
        tokio::time::timeout(
            Duration::from_millis(SNAPSHOT_TIMEOUT_MS),
            self.handle.wait_for(f),
        )
        .await
        .context("Timeout waiting for snapshot")?
        .context("Session closed")
    }

    /// Wait for the session loop to finish its teardown.
    pub async fn wait_for_exit(&mut self) -> Result<()> {
        tokio::time::timeout(Duration::from_millis(SNAPSHOT_TIMEOUT_MS), &mut self.task)
            .await
            .context("Session did not exit")?
            .context("Session task panicked")
    }
}

pub fn test_media() -> LocalMedia {
    LocalMedia::new(
        "local",
        vec![
            LocalTrack::detached("mic", TrackKind::Audio),
            LocalTrack::detached("cam", TrackKind::Video),
        ],
    )
}
