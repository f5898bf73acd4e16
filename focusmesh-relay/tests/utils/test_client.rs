use anyhow::{Context, Result, bail};
use focusmesh_core::{PeerId, SignalMessage};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single relay frame (ms).
pub const RECV_TIMEOUT_MS: u64 = 2000;

/// How long to listen before concluding nothing was delivered (ms).
pub const SILENCE_MS: u64 = 200;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A bare WebSocket client speaking the relay protocol.
pub struct TestClient {
    pub peer_id: PeerId,
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
}

impl TestClient {
    /// Connects without announcing.
    pub async fn connect(url: &str, peer_id: &str) -> Result<Self> {
        let (ws, _) = connect_async(url).await.context("Failed to connect")?;
        let (write, read) = ws.split();
        Ok(Self {
            peer_id: PeerId::from(peer_id),
            write,
            read,
        })
    }

    /// Connects and sends `join`.
    pub async fn join(url: &str, peer_id: &str) -> Result<Self> {
        let mut client = Self::connect(url, peer_id).await?;
        client
            .send(&SignalMessage::Join {
                id: client.peer_id.clone(),
            })
            .await?;
        Ok(client)
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        let text = serde_json::to_string(msg)?;
        self.send_raw(&text).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.write
            .send(Message::Text(text.to_owned()))
            .await
            .context("Failed to send frame")
    }

    /// Next text frame, or `None` once the relay closed the socket.
    pub async fn recv_text(&mut self) -> Result<Option<String>> {
        let wait = async {
            while let Some(frame) = self.read.next().await {
                match frame {
                    Ok(Message::Text(text)) => return Some(text),
                    Ok(Message::Close(_)) | Err(_) => return None,
                    Ok(_) => continue,
                }
            }
            None
        };
        tokio::time::timeout(Duration::from_millis(RECV_TIMEOUT_MS), wait)
            .await
            .context("Timeout waiting for relay frame")
    }

    pub async fn recv(&mut self) -> Result<SignalMessage> {
        match self.recv_text().await? {
            Some(text) => serde_json::from_str(&text).context("Relay sent invalid JSON"),
            None => bail!("Relay closed the connection"),
        }
    }

    /// Skip frames until one matches `f`.
    pub async fn recv_until(
        &mut self,
        mut f: impl FnMut(&SignalMessage) -> bool,
    ) -> Result<SignalMessage> {
        loop {
            let msg = self.recv().await?;
            if f(&msg) {
                return Ok(msg);
            }
        }
    }

    /// True when nothing arrives for a while.
    pub async fn is_silent(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(SILENCE_MS), self.read.next())
            .await
            .is_err()
    }

    /// Drains the frames a fresh join produces (timer-sync and members).
    pub async fn drain_join(&mut self) -> Result<()> {
        self.recv_until(|m| matches!(m, SignalMessage::TimerSync { .. }))
            .await?;
        self.recv_until(|m| matches!(m, SignalMessage::Members { .. }))
            .await?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<()> {
        self.write.send(Message::Close(None)).await?;
        Ok(())
    }
}
