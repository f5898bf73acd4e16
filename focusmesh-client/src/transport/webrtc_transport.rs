use crate::media::{LocalTrack, TrackKind};
use crate::transport::{
    ConnectionKey, LinkState, PeerTransport, RemoteStream, TransportConfig, TransportEvent,
    TransportFactory,
};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use focusmesh_core::{IceCandidate, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

pub struct WebrtcTransportFactory {
    config: TransportConfig,
}

impl WebrtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for WebrtcTransportFactory {
    async fn connect(
        &self,
        key: ConnectionKey,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>> {
        let transport = WebrtcTransport::new(key, &self.config, events).await?;
        Ok(Arc::new(transport))
    }
}

pub struct WebrtcTransport {
    key: ConnectionKey,
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebrtcTransport {
    /// Builds the peer connection and wires its callbacks into `event_tx`.
    pub async fn new(
        key: ConnectionKey,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_tx = event_tx.clone();
        let state_key = key.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let key = state_key.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {:?}", key, s);
                    let Some(state) = link_state(s) else { return };
                    let _ = tx.send(TransportEvent::StateChanged(key, state)).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        let ice_key = key.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let key = ice_key.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(key, candidate))
                    .await;
            })
        }));

        let track_tx = event_tx.clone();
        let track_key = key.clone();
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let key = track_key.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    _ => TrackKind::Video,
                };
                let stream = RemoteStream {
                    stream_id: track.stream_id(),
                    track_id: track.id(),
                    kind,
                };
                debug!("Remote {:?} track {} from {}", kind, stream.track_id, key);

                // Nothing renders remote media here; keep draining so the
                // receive buffers never stall the connection.
                tokio::spawn(async move {
                    while track.read_rtp().await.is_ok() {}
                });

                let _ = tx.send(TransportEvent::TrackAttached(key, stream)).await;
            })
        }));

        Ok(Self {
            key,
            peer_connection,
        })
    }
}

#[async_trait]
impl PeerTransport for WebrtcTransport {
    async fn add_tracks(&self, tracks: &[LocalTrack]) -> Result<()> {
        for track in tracks {
            let Some(rtc) = track.rtc() else {
                continue;
            };
            let sender = self
                .peer_connection
                .add_track(rtc.clone() as Arc<dyn TrackLocal + Send + Sync>)
                .await
                .with_context(|| format!("Failed to add track {}", track.id()))?;

            // RTCP has to be read for interceptors (NACK, reports) to work.
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while sender.read(&mut buf).await.is_ok() {}
            });
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        from_rtc(&offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        from_rtc(&answer)
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(description)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(description)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .with_context(|| format!("Failed to add ICE candidate for {}", self.key))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn link_state(state: RTCPeerConnectionState) -> Option<LinkState> {
    match state {
        RTCPeerConnectionState::New | RTCPeerConnectionState::Connecting => {
            Some(LinkState::Connecting)
        }
        RTCPeerConnectionState::Connected => Some(LinkState::Connected),
        RTCPeerConnectionState::Disconnected => Some(LinkState::Disconnected),
        RTCPeerConnectionState::Failed => Some(LinkState::Failed),
        RTCPeerConnectionState::Closed => Some(LinkState::Closed),
        _ => None,
    }
}

fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
        SdpKind::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
        SdpKind::Rollback => bail!("Rollback descriptions are not supported"),
    };
    Ok(desc)
}

fn from_rtc(description: &RTCSessionDescription) -> Result<SessionDescription> {
    let kind = match description.sdp_type {
        RTCSdpType::Offer => SdpKind::Offer,
        RTCSdpType::Answer => SdpKind::Answer,
        RTCSdpType::Pranswer => SdpKind::Pranswer,
        RTCSdpType::Rollback => SdpKind::Rollback,
        other => bail!("Unexpected SDP type {:?}", other),
    };
    Ok(SessionDescription {
        kind,
        sdp: description.sdp.clone(),
    })
}
