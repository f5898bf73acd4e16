use anyhow::{Context, Result};
use focusmesh_client::SessionSnapshot;
use focusmesh_core::{PeerId, SessionDescription, SignalMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::mock_transport::MockTransport;
use super::test_peer::TestPeer;

/// Timeout for signal exchange operations (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 2000;

/// Timeout for roster and timer changes to show up in a snapshot (ms).
pub const SNAPSHOT_TIMEOUT_MS: u64 = 2000;

/// How long to wait before concluding that something did not happen (ms).
pub const QUIET_PERIOD_MS: u64 = 150;

/// Wait for the first outbound signal matching `f`, skipping the rest.
pub async fn wait_for_signal(
    signal_rx: &mut mpsc::UnboundedReceiver<SignalMessage>,
    mut f: impl FnMut(&SignalMessage) -> bool,
    timeout_ms: u64,
) -> Result<SignalMessage> {
    let wait = async {
        while let Some(msg) = signal_rx.recv().await {
            if f(&msg) {
                return Ok(msg);
            }
        }
        anyhow::bail!("Signal channel closed")
    };
    tokio::time::timeout(Duration::from_millis(timeout_ms), wait)
        .await
        .context("Timeout waiting for signal")?
}

pub fn offer_to(remote: &PeerId) -> impl FnMut(&SignalMessage) -> bool + '_ {
    move |msg| matches!(msg, SignalMessage::Offer { to: Some(to), .. } if to == remote)
}

pub fn answer_to(remote: &PeerId) -> impl FnMut(&SignalMessage) -> bool + '_ {
    move |msg| matches!(msg, SignalMessage::Answer { to: Some(to), .. } if to == remote)
}

pub fn has_participant(snapshot: &SessionSnapshot, id: &PeerId) -> bool {
    snapshot.participants.iter().any(|p| &p.id == id)
}

/// Drive `peer` as the offering side of a connection to `remote` until the
/// remote is in its roster.
pub async fn perform_offer_exchange(
    peer: &mut TestPeer,
    remote: &PeerId,
) -> Result<Arc<MockTransport>> {
    let generation = peer.factory.transports_for(remote).len() + 1;
    peer.deliver(SignalMessage::NewPeer { id: remote.clone() });

    let offer = wait_for_signal(&mut peer.signals, offer_to(remote), SIGNAL_TIMEOUT_MS)
        .await
        .context("Offer was not sent")?;
    tracing::debug!("[SignalHelper] {} offered to {}", peer.id, remote);
    let SignalMessage::Offer { from, .. } = offer else {
        anyhow::bail!("Expected an offer");
    };

    let transport = peer
        .factory
        .wait_for_transport(remote, generation, SIGNAL_TIMEOUT_MS)
        .await
        .context("Transport was not created")?;

    peer.deliver(SignalMessage::Answer {
        answer: SessionDescription::answer(format!("answer-from-{remote}")),
        from: remote.clone(),
        to: Some(from),
    });
    transport.ice_connected().await;
    transport.attach_track().await;

    peer.wait_for_snapshot(|s| has_participant(s, remote))
        .await
        .context("Remote never reached the roster")?;
    Ok(transport)
}

/// Drive `peer` as the answering side of a connection to `remote`.
pub async fn perform_answer_exchange(
    peer: &mut TestPeer,
    remote: &PeerId,
) -> Result<Arc<MockTransport>> {
    let generation = peer.factory.transports_for(remote).len() + 1;
    peer.deliver(SignalMessage::Offer {
        offer: SessionDescription::offer(format!("offer-from-{remote}")),
        from: remote.clone(),
        to: Some(peer.id.clone()),
    });

    wait_for_signal(&mut peer.signals, answer_to(remote), SIGNAL_TIMEOUT_MS)
        .await
        .context("Answer was not sent")?;
    let transport = peer
        .factory
        .wait_for_transport(remote, generation, SIGNAL_TIMEOUT_MS)
        .await
        .context("Transport was not created")?;

    transport.ice_connected().await;
    transport.attach_track().await;
    peer.wait_for_snapshot(|s| has_participant(s, remote))
        .await
        .context("Remote never reached the roster")?;
    Ok(transport)
}
