use crate::model::signaling::{TimerActionKind, TimerPayload, TimerSnapshot};
use crate::utils::DEFAULT_TIMER_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start { duration: u32 },
    Pause { time_left: u32 },
    Resume { time_left: u32 },
    Reset,
}

impl TimerAction {
    /// Decode a wire action. Missing fields fall back the way browser
    /// clients expect: `start` uses `default_secs`, `pause`/`resume` use 0.
    pub fn from_wire(kind: TimerActionKind, data: &TimerPayload, default_secs: u32) -> Self {
        match kind {
            TimerActionKind::Start => TimerAction::Start {
                duration: data.duration.unwrap_or(default_secs),
            },
            TimerActionKind::Pause => TimerAction::Pause {
                time_left: data.time_left.unwrap_or(0),
            },
            TimerActionKind::Resume => TimerAction::Resume {
                time_left: data.time_left.unwrap_or(0),
            },
            TimerActionKind::Reset => TimerAction::Reset,
        }
    }

    pub fn to_wire(&self) -> (TimerActionKind, TimerPayload) {
        match *self {
            TimerAction::Start { duration } => (
                TimerActionKind::Start,
                TimerPayload {
                    duration: Some(duration),
                    time_left: None,
                },
            ),
            TimerAction::Pause { time_left } => (
                TimerActionKind::Pause,
                TimerPayload {
                    duration: None,
                    time_left: Some(time_left),
                },
            ),
            TimerAction::Resume { time_left } => (
                TimerActionKind::Resume,
                TimerPayload {
                    duration: None,
                    time_left: Some(time_left),
                },
            ),
            TimerAction::Reset => (TimerActionKind::Reset, TimerPayload::default()),
        }
    }
}

/// One replica of the shared countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub running: bool,
    pub time_left: u32,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            running: false,
            time_left: DEFAULT_TIMER_SECS,
        }
    }
}

impl TimerState {
    pub fn idle(time_left: u32) -> Self {
        Self {
            running: false,
            time_left,
        }
    }

    /// A timer at zero never counts as running.
    pub fn set(&mut self, running: bool, time_left: u32) {
        self.time_left = time_left;
        self.running = running && time_left > 0;
    }

    pub fn apply(&mut self, action: TimerAction, reset_secs: u32) {
        match action {
            TimerAction::Start { duration } => self.set(true, duration),
            TimerAction::Pause { time_left } => self.set(false, time_left),
            TimerAction::Resume { time_left } => self.set(true, time_left),
            TimerAction::Reset => self.set(false, reset_secs),
        }
    }

    /// One second of local countdown. No-op while paused.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.running = false;
        }
    }

    /// The state after `secs` seconds of countdown.
    pub fn advanced_by(&self, secs: u64) -> Self {
        if !self.running {
            return *self;
        }
        let secs = u32::try_from(secs).unwrap_or(u32::MAX);
        let mut next = *self;
        next.set(true, self.time_left.saturating_sub(secs));
        next
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            is_running: self.running,
            time_left: self.time_left,
        }
    }

    pub fn adopt(&mut self, snapshot: TimerSnapshot) {
        self.set(snapshot.is_running, snapshot.time_left);
    }
}
