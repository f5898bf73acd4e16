use focusmesh_client::TrackKind;
use focusmesh_core::{TimerAction, TimerState};

/// One line typed into the join front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Timer(TimerAction),
    Track { kind: TrackKind, enabled: bool },
    Chat(String),
    Quit,
    Empty,
    Invalid(String),
}

/// Pause and resume carry the countdown as currently shown.
pub fn parse(line: &str, timer: &TimerState, default_secs: u32) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Chat(line.to_owned());
    };

    let mut words = command.split_whitespace();
    let name = words.next().unwrap_or_default();
    let arg = words.next();

    match name {
        "start" => match arg.map(str::parse::<u32>) {
            None => Input::Timer(TimerAction::Start {
                duration: default_secs,
            }),
            Some(Ok(duration)) if duration > 0 => Input::Timer(TimerAction::Start { duration }),
            Some(_) => Input::Invalid("/start expects a positive number of seconds".to_owned()),
        },
        "pause" => Input::Timer(TimerAction::Pause {
            time_left: timer.time_left,
        }),
        "resume" => Input::Timer(TimerAction::Resume {
            time_left: timer.time_left,
        }),
        "reset" => Input::Timer(TimerAction::Reset),
        "mute" | "unmute" => match arg.and_then(track_kind) {
            Some(kind) => Input::Track {
                kind,
                enabled: name == "unmute",
            },
            None => Input::Invalid(format!("/{} expects audio or video", name)),
        },
        "quit" | "exit" => Input::Quit,
        other => Input::Invalid(format!("Unknown command /{}", other)),
    }
}

fn track_kind(word: &str) -> Option<TrackKind> {
    match word {
        "audio" | "mic" => Some(TrackKind::Audio),
        "video" | "cam" => Some(TrackKind::Video),
        _ => None,
    }
}
