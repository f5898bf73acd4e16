
use tracing::Level;

use crate::utils::{TestPeer, TestPeerConfig};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn spawn_peer(id: &str) -> TestPeer {
    TestPeer::spawn(id, TestPeerConfig::default())
}

pub fn spawn_peer_without_media(id: &str) -> TestPeer {
    TestPeer::spawn(
        id,
        TestPeerConfig {
            with_media: false,
            ..Default::default()
        },
    )
}
