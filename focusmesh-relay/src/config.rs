use focusmesh_core::utils::DEFAULT_TIMER_SECS;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Timer value of a freshly created room and of `reset`.
    pub default_timer_secs: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000)),
            default_timer_secs: DEFAULT_TIMER_SECS,
        }
    }
}
