use crate::config::ClientConfig;
use crate::coordinator::Coordinator;
use crate::error::{Result, SessionError};
use crate::media::{LocalMedia, MediaSource, TrackKind};
use crate::session::{ChatRelay, TimerSynchronizer};
use crate::signaling::{
    Inbound, RelayConnection, RelayEvent, RelayLink, SignalingChannel, SignalingOutput,
};
use crate::store::{SessionSnapshot, SessionStore};
use crate::transport::{TransportEvent, TransportFactory};
use focusmesh_core::{PeerId, RoomName, TimerAction};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const TRANSPORT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    SendChat(String),
    SendTimerAction(TimerAction),
    SetTrackEnabled { kind: TrackKind, enabled: bool },
    Leave,
}

/// UI side of a running session. Dropping every handle leaves the room.
#[derive(Clone)]
pub struct SessionHandle {
    local_id: PeerId,
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    fn command(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Closed)
    }

    pub fn send_chat(&self, text: impl Into<String>) -> Result<()> {
        self.command(SessionCommand::SendChat(text.into()))
    }

    pub fn send_timer_action(&self, action: TimerAction) -> Result<()> {
        self.command(SessionCommand::SendTimerAction(action))
    }

    pub fn set_track_enabled(&self, kind: TrackKind, enabled: bool) -> Result<()> {
        self.command(SessionCommand::SetTrackEnabled { kind, enabled })
    }

    pub fn leave(&self) -> Result<()> {
        self.command(SessionCommand::Leave)
    }

    /// Waits until a published snapshot satisfies `f`.
    pub async fn wait_for(
        &mut self,
        f: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot> {
        self.snapshot
            .wait_for(f)
            .await
            .map(|snapshot| snapshot.clone())
            .map_err(|_| SessionError::Closed)
    }

    /// Resolves once the session has torn down.
    pub async fn closed(&mut self) {
        let _ = self.snapshot.wait_for(|s| !s.active).await;
    }
}

/// Everything a session loop needs, already connected.
pub struct SessionParts {
    pub local_id: PeerId,
    pub room: RoomName,
    pub signaling: Arc<dyn SignalingOutput>,
    pub relay_events: mpsc::UnboundedReceiver<RelayEvent>,
    pub relay_link: Option<RelayLink>,
    pub factory: Arc<dyn TransportFactory>,
    pub local_media: Option<LocalMedia>,
    pub config: ClientConfig,
}

pub struct Session {
    config: ClientConfig,
    store: SessionStore,
    channel: SignalingChannel,
    coordinator: Coordinator,
    timer: TimerSynchronizer,
    chat: ChatRelay,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    relay_events: mpsc::UnboundedReceiver<RelayEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    published: u64,
    relay_link: Option<RelayLink>,
}

impl Session {
    pub fn new(parts: SessionParts) -> (Self, SessionHandle) {
        let SessionParts {
            local_id,
            room,
            signaling,
            relay_events,
            relay_link,
            factory,
            local_media,
            config,
        } = parts;

        let mut store = SessionStore::new(local_id.clone(), config.default_timer_secs);
        store.set_room(Some(room));
        store.set_local_media(local_media);

        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(store.snapshot(true));
        let published = store.revision();

        let session = Self {
            channel: SignalingChannel::new(local_id.clone(), signaling.clone()),
            coordinator: Coordinator::new(
                local_id.clone(),
                factory,
                transport_tx,
                signaling.clone(),
                config.candidate_policy,
            ),
            timer: TimerSynchronizer::new(
                local_id.clone(),
                signaling.clone(),
                config.default_timer_secs,
            ),
            chat: ChatRelay::new(local_id.clone(), signaling, config.self_label.clone()),
            config,
            store,
            commands,
            relay_events,
            transport_rx,
            published,
            snapshot_tx,
            relay_link,
        };
        let handle = SessionHandle {
            local_id,
            commands: command_tx,
            snapshot,
        };
        (session, handle)
    }

    /// Captures media, connects to the relay and spawns the session loop.
    /// A failed capture is not fatal; the session joins without a stream.
    pub async fn join(
        room: RoomName,
        config: ClientConfig,
        media: &dyn MediaSource,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<SessionHandle> {
        let local_media = match media.acquire().await {
            Ok(local_media) => Some(local_media),
            Err(e) => {
                warn!("Joining {} without local media: {}", room, e);
                None
            }
        };

        let relay = match RelayConnection::connect(&config.room_url(&room)).await {
            Ok(relay) => relay,
            Err(e) => {
                if let Some(local_media) = &local_media {
                    local_media.stop_all();
                }
                return Err(e);
            }
        };

        let (session, handle) = Self::new(SessionParts {
            local_id: PeerId::new(),
            room,
            signaling: relay.output,
            relay_events: relay.events,
            relay_link: Some(relay.link),
            factory,
            local_media,
            config,
        });
        tokio::spawn(session.run());
        Ok(handle)
    }

    pub async fn run(mut self) {
        info!(
            "Session {} joining room {:?}",
            self.store.local_id(),
            self.store.room()
        );
        self.channel.announce();

        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            let negotiating = self.coordinator.has_pending_tasks();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Leave) | None => {
                        info!("Leaving room");
                        break;
                    }
                    Some(command) => self.handle_command(command),
                },
                event = self.relay_events.recv() => match event {
                    Some(RelayEvent::Message(text)) => self.handle_relay_text(&text),
                    Some(RelayEvent::Closed(reason)) => {
                        warn!("Relay closed: {:?}", reason);
                        break;
                    }
                    None => {
                        warn!("Relay event stream ended");
                        break;
                    }
                },
                Some(event) = self.transport_rx.recv() => {
                    self.coordinator.handle_transport_event(event, &mut self.store);
                }
                Some(outcome) = self.coordinator.next_outcome(), if negotiating => {
                    self.coordinator.handle_outcome(outcome, &mut self.store);
                }
                _ = ticker.tick() => self.timer.tick(&mut self.store),
            }
            self.publish();
        }

        self.teardown().await;
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SendChat(text) => {
                self.chat.send(&mut self.store, &text);
            }
            SessionCommand::SendTimerAction(action) => {
                self.timer.send_action(&mut self.store, action);
            }
            SessionCommand::SetTrackEnabled { kind, enabled } => {
                let toggled = self
                    .store
                    .local_media()
                    .map_or(0, |media| media.set_enabled(kind, enabled));
                debug!("Set {} {} track(s) enabled={}", toggled, kind, enabled);
            }
            SessionCommand::Leave => {}
        }
    }

    fn handle_relay_text(&mut self, text: &str) {
        let Some(msg) = SignalingChannel::decode(text) else {
            return;
        };
        debug!("Relay -> {}", msg.type_name());
        let Some(inbound) = self.channel.route(msg) else {
            return;
        };

        match inbound {
            Inbound::Peer(event) => self.coordinator.handle_peer_event(event, &mut self.store),
            Inbound::Members(count) => self.store.set_member_count(count),
            Inbound::Chat { text, sender, from } => {
                self.chat.receive(&mut self.store, text, sender, from.as_ref());
            }
            Inbound::Timer { action, data, from } => {
                self.timer
                    .receive(&mut self.store, action, &data, from.as_ref());
            }
            Inbound::TimerSync(snapshot) => self.timer.adopt(&mut self.store, snapshot),
        }
    }

    fn publish(&mut self) {
        let revision = self.store.revision();
        if revision == self.published {
            return;
        }
        self.published = revision;
        self.snapshot_tx.send_replace(self.store.snapshot(true));
    }

    async fn teardown(&mut self) {
        self.coordinator.shutdown(&mut self.store).await;
        if let Some(media) = self.store.take_local_media() {
            media.stop_all();
        }
        self.channel.reset();
        self.relay_link.take();
        self.snapshot_tx.send_replace(self.store.snapshot(false));
        info!("Session {} closed", self.store.local_id());
    }
}
