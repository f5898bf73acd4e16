use crate::signaling::SignalingOutput;
use crate::store::SessionStore;
use focusmesh_core::{
    FocusKind, PeerId, SignalMessage, TimerAction, TimerActionKind, TimerPayload, TimerSnapshot,
};
use std::sync::Arc;
use tracing::debug;

/// Sole writer of the timer replica. Local actions apply first and are then
/// broadcast; remote ones apply as they arrive, last one wins.
pub struct TimerSynchronizer {
    local_id: PeerId,
    output: Arc<dyn SignalingOutput>,
    default_secs: u32,
}

impl TimerSynchronizer {
    pub fn new(local_id: PeerId, output: Arc<dyn SignalingOutput>, default_secs: u32) -> Self {
        Self {
            local_id,
            output,
            default_secs,
        }
    }

    pub fn send_action(&self, store: &mut SessionStore, action: TimerAction) {
        store.update_timer(|t| t.apply(action, self.default_secs));
        match action {
            TimerAction::Start { duration } => store.push_focus(FocusKind::Study, duration),
            TimerAction::Pause { time_left } => {
                store.push_focus(FocusKind::Break, self.default_secs.saturating_sub(time_left))
            }
            TimerAction::Resume { .. } | TimerAction::Reset => {}
        }

        let (kind, data) = action.to_wire();
        self.output.send_signal(SignalMessage::Timer {
            action: kind,
            data,
            from: Some(self.local_id.clone()),
        });
    }

    /// Returns false for our own echo.
    pub fn receive(
        &self,
        store: &mut SessionStore,
        kind: TimerActionKind,
        data: &TimerPayload,
        from: Option<&PeerId>,
    ) -> bool {
        if from == Some(&self.local_id) {
            return false;
        }
        let action = TimerAction::from_wire(kind, data, self.default_secs);
        debug!("Applying remote timer action {:?} from {:?}", action, from);
        store.update_timer(|t| t.apply(action, self.default_secs));
        true
    }

    pub fn adopt(&self, store: &mut SessionStore, snapshot: TimerSnapshot) {
        debug!("Adopting timer state {:?}", snapshot);
        store.update_timer(|t| t.adopt(snapshot));
    }

    pub fn tick(&self, store: &mut SessionStore) {
        store.update_timer(|t| t.tick());
    }
}
