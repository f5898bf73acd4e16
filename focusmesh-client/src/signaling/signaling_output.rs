use focusmesh_core::SignalMessage;

/// Outbound half of the relay. Sends are fire-and-forget; a dead relay is
/// reported through the inbound side.
pub trait SignalingOutput: Send + Sync {
    fn send_signal(&self, msg: SignalMessage);
}

/// Keeps every outbound signal for assertions.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct SentSignals(std::sync::Mutex<Vec<SignalMessage>>);

#[cfg(test)]
impl SentSignals {
    pub(crate) fn messages(&self) -> Vec<SignalMessage> {
        self.0.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SignalingOutput for SentSignals {
    fn send_signal(&self, msg: SignalMessage) {
        self.0.lock().unwrap().push(msg);
    }
}
