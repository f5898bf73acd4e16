pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Length of a focus block when nobody asked for anything else: 25 minutes.
pub const DEFAULT_TIMER_SECS: u32 = 25 * 60;

pub fn default_stun_servers() -> Vec<String> {
    vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()]
}
