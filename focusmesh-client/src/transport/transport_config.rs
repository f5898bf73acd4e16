use focusmesh_core::IceServerConfig;
use focusmesh_core::utils::default_stun_servers;
use serde::{Deserialize, Serialize};

/// ICE servers handed to every peer connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: default_stun_servers(),
                username: None,
                credential: None,
            }],
        }
    }
}
