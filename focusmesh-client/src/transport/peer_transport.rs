use crate::media::LocalTrack;
use crate::transport::{ConnectionKey, TransportEvent};
use anyhow::Result;
use async_trait::async_trait;
use focusmesh_core::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The offer/answer/ICE primitives of one peer-to-peer connection.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn add_tracks(&self, tracks: &[LocalTrack]) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Creates transports. Every transport reports its callbacks through
/// `events`, tagged with the key it was created for.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn connect(
        &self,
        key: ConnectionKey,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>>;
}
