use crate::error::Result;
use crate::signaling::SignalingOutput;
use focusmesh_core::SignalMessage;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// One text frame, still undecoded.
    Message(String),
    /// The relay went away. Carries the reason when there was one.
    Closed(Option<String>),
}

/// Serializes outbound messages onto the socket's send queue.
pub struct RelaySender {
    tx: mpsc::UnboundedSender<Message>,
}

impl SignalingOutput for RelaySender {
    fn send_signal(&self, msg: SignalMessage) {
        let text = match serde_json::to_string(&msg) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize {}: {}", msg.type_name(), e);
                return;
            }
        };
        if self.tx.send(Message::Text(text)).is_err() {
            warn!("Relay is gone, dropping {}", msg.type_name());
        }
    }
}

/// Keeps the socket tasks alive; aborts them when dropped.
pub struct RelayLink {
    send_task: JoinHandle<()>,
    recv_task: JoinHandle<()>,
}

impl Drop for RelayLink {
    fn drop(&mut self) {
        self.send_task.abort();
        self.recv_task.abort();
    }
}

/// One open relay WebSocket, split into an outbound sender and a stream of
/// inbound events.
pub struct RelayConnection {
    pub output: Arc<dyn SignalingOutput>,
    pub events: mpsc::UnboundedReceiver<RelayEvent>,
    pub link: RelayLink,
}

impl RelayConnection {
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to relay {}", url);
        let (ws_stream, _) = connect_async(url).await?;
        info!("Relay connected");

        let (write, read) = ws_stream.split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();

        let send_task = tokio::spawn(send_loop(write, out_rx));
        let recv_task = tokio::spawn(recv_loop(read, event_tx));

        Ok(Self {
            output: Arc::new(RelaySender { tx: out_tx }),
            events,
            link: RelayLink {
                send_task,
                recv_task,
            },
        })
    }
}

async fn send_loop(
    mut write: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = write.send(msg).await {
            error!("Failed to send relay message: {}", e);
            return;
        }
    }
    let _ = write.send(Message::Close(None)).await;
    debug!("Relay send loop finished");
}

async fn recv_loop(mut read: SplitStream<WsStream>, events: mpsc::UnboundedSender<RelayEvent>) {
    let reason = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                if events.send(RelayEvent::Message(text)).is_err() {
                    return;
                }
            }
            Some(Ok(Message::Close(frame))) => {
                break frame.map(|f| f.reason.to_string());
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                error!("Relay connection error: {}", e);
                break Some(e.to_string());
            }
            None => break None,
        }
    };
    info!("Relay connection closed");
    let _ = events.send(RelayEvent::Closed(reason));
}
