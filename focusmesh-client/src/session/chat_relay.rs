use crate::signaling::SignalingOutput;
use crate::store::SessionStore;
use focusmesh_core::{PeerId, SignalMessage};
use std::sync::Arc;

const ANONYMOUS: &str = "Anonymous";

pub struct ChatRelay {
    local_id: PeerId,
    output: Arc<dyn SignalingOutput>,
    self_label: String,
}

impl ChatRelay {
    pub fn new(local_id: PeerId, output: Arc<dyn SignalingOutput>, self_label: String) -> Self {
        Self {
            local_id,
            output,
            self_label,
        }
    }

    /// Appends locally, then sends. Blank text is ignored.
    pub fn send(&self, store: &mut SessionStore, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        store.push_chat(self.self_label.clone(), text);
        self.output.send_signal(SignalMessage::Chat {
            text: text.to_owned(),
            sender: Some(self.self_label.clone()),
            from: Some(self.local_id.clone()),
        });
        true
    }

    pub fn receive(
        &self,
        store: &mut SessionStore,
        text: String,
        sender: Option<String>,
        from: Option<&PeerId>,
    ) -> bool {
        if from == Some(&self.local_id) {
            return false;
        }
        store.push_chat(sender.unwrap_or_else(|| ANONYMOUS.to_owned()), text);
        true
    }
}
