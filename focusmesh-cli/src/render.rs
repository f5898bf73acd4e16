use colored::*;
use focusmesh_client::SessionSnapshot;
use focusmesh_core::{FocusKind, PeerId, TimerState};

pub fn clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Turns successive snapshots into the lines worth printing.
#[derive(Debug, Default)]
pub struct Renderer {
    last: Option<SessionSnapshot>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&mut self, snapshot: &SessionSnapshot) -> Vec<String> {
        let mut lines = Vec::new();
        let last = self.last.as_ref();

        let seen_chat = last.and_then(|s| s.chat.last()).map(|c| c.id);
        for entry in &snapshot.chat {
            if seen_chat.is_some_and(|id| entry.id <= id) {
                continue;
            }
            lines.push(format!("{} {}", format!("[{}]", entry.sender).cyan().bold(), entry.text));
        }

        let seen_focus = last.and_then(|s| s.focus_log.last()).map(|f| f.id);
        for entry in &snapshot.focus_log {
            if seen_focus.is_some_and(|id| entry.id <= id) {
                continue;
            }
            let label = match entry.kind {
                FocusKind::Study => "study".green(),
                FocusKind::Break => "break".yellow(),
            };
            lines.push(format!("Logged {} {}", label, clock(entry.duration)));
        }

        if let Some(line) = timer_change(last.map(|s| &s.timer), &snapshot.timer) {
            lines.push(line);
        }

        let previous: Vec<&PeerId> = last
            .map(|s| s.participants.iter().map(|p| &p.id).collect())
            .unwrap_or_default();
        for participant in &snapshot.participants {
            if !previous.contains(&&participant.id) {
                lines.push(format!("{} {}", "+".green().bold(), participant.id));
            }
        }
        for id in previous {
            if snapshot.participants.iter().all(|p| &p.id != id) {
                lines.push(format!("{} {}", "-".red().bold(), id));
            }
        }

        if last.map(|s| s.member_count) != Some(snapshot.member_count) {
            lines.push(format!("{} in room", snapshot.member_count).dimmed().to_string());
        }

        if !snapshot.active && last.is_some_and(|s| s.active) {
            lines.push("Session closed".red().to_string());
        }

        self.last = Some(snapshot.clone());
        lines
    }
}

/// Ticks are silent; jumps and run/stop transitions are shown.
fn timer_change(last: Option<&TimerState>, now: &TimerState) -> Option<String> {
    let state = if now.running {
        "running".green()
    } else {
        "paused".yellow()
    };
    let line = format!("Timer {} {}", state, clock(now.time_left).bold());

    let Some(last) = last else {
        return Some(line);
    };
    if last.running != now.running {
        return Some(line);
    }
    let ticked = now.running && last.time_left.saturating_sub(1) == now.time_left;
    (last.time_left != now.time_left && !ticked).then_some(line)
}
