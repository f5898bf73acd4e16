pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("relay connection failed: {0}")]
    Relay(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("session is closed")]
    Closed,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
