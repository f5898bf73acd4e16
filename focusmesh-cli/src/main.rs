mod input;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use focusmesh_client::{
    CandidatePolicy, ClientConfig, MediaSource, NoMedia, Session, SessionHandle, SyntheticMedia,
    WebrtcTransportFactory,
};
use focusmesh_core::RoomName;
use focusmesh_core::utils::DEFAULT_TIMER_SECS;
use focusmesh_relay::RelayConfig;
use input::Input;
use render::Renderer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "focusmesh", version, about = "Shared study rooms over a WebRTC mesh")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Relay {
        #[arg(long, env = "FOCUSMESH_BIND", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        #[arg(long, env = "FOCUSMESH_TIMER_SECS", default_value_t = DEFAULT_TIMER_SECS)]
        timer_secs: u32,
    },
    /// Join a room and read commands from stdin.
    Join {
        room: String,

        #[arg(long, env = "FOCUSMESH_RELAY", default_value = "ws://localhost:8000")]
        relay: String,

        #[arg(long, env = "FOCUSMESH_NAME", default_value = "Me")]
        name: String,

        #[arg(long, env = "FOCUSMESH_TIMER_SECS", default_value_t = DEFAULT_TIMER_SECS)]
        timer_secs: u32,

        /// Join without a local stream.
        #[arg(long)]
        no_media: bool,

        /// Discard candidates that arrive before their offer.
        #[arg(long)]
        drop_early_candidates: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command {
        Commands::Relay { bind, timer_secs } => {
            let config = RelayConfig {
                bind,
                default_timer_secs: timer_secs,
            };
            focusmesh_relay::serve(config)
                .await
                .context("Relay stopped")?;
        }
        Commands::Join {
            room,
            relay,
            name,
            timer_secs,
            no_media,
            drop_early_candidates,
        } => {
            let config = ClientConfig {
                relay_url: relay,
                candidate_policy: if drop_early_candidates {
                    CandidatePolicy::Drop
                } else {
                    CandidatePolicy::Buffer
                },
                default_timer_secs: timer_secs,
                self_label: name,
                ..Default::default()
            };
            let media: Box<dyn MediaSource> = if no_media {
                Box::new(NoMedia)
            } else {
                Box::new(SyntheticMedia::new("focusmesh"))
            };
            let factory = Arc::new(WebrtcTransportFactory::new(config.transport.clone()));

            println!("{} {}", "Joining".green().bold(), room.bold());
            let handle = Session::join(RoomName::from(room), config, media.as_ref(), factory)
                .await
                .context("Failed to join room")?;
            println!("{}", "Type to chat, /quit to leave".dimmed());

            run_front_end(handle, timer_secs).await?;
        }
    }

    Ok(())
}

async fn run_front_end(mut handle: SessionHandle, default_secs: u32) -> Result<()> {
    let mut snapshots = handle.subscribe();
    let mut renderer = Renderer::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let initial = snapshots.borrow_and_update().clone();
    for line in renderer.changes(&initial) {
        println!("{}", line);
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if handle.leave().is_err() {
                    break;
                }
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                for line in renderer.changes(&snapshot) {
                    println!("{}", line);
                }
                if !snapshot.active {
                    break;
                }
            }

            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    stdin_open = false;
                    if handle.leave().is_err() {
                        break;
                    }
                    continue;
                };
                let timer = handle.snapshot().timer;
                let sent = match input::parse(&line, &timer, default_secs) {
                    Input::Chat(text) => handle.send_chat(text),
                    Input::Timer(action) => handle.send_timer_action(action),
                    Input::Track { kind, enabled } => handle.set_track_enabled(kind, enabled),
                    Input::Quit => handle.leave(),
                    Input::Empty => Ok(()),
                    Input::Invalid(message) => {
                        println!("{}", message.red());
                        Ok(())
                    }
                };
                if sent.is_err() {
                    break;
                }
            }
        }
    }

    handle.closed().await;
    Ok(())
}
