//! ama-watch - follow an AMA room from the terminal
//!
//! Run with:
//! ```bash
//! cargo run -p ama-client -- <room-id>
//! cargo run -p ama-client -- create-room "Rust async"
//! cargo run -p ama-client -- ask <room-id> "How do I cancel a task?"
//! ```
//!
//! Configuration is loaded from environment variables (`AMA_API_URL`, `AMA_WS_URL`, ...)
//! and a `.env` file if present.

use std::time::Duration;

use ama_client::HttpRoomApi;
use ama_common::{try_init_tracing_with_config, AppError, ClientConfig, ErrorResponse, TracingConfig};
use ama_core::{MessageId, RoomId};
use ama_sync::{RoomSession, RoomView, SessionNoticeKind};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

const LOAD_ATTEMPTS: u32 = 5;

#[derive(Parser)]
#[command(name = "ama-watch")]
#[command(about = "Follow an AMA room: questions, answers and reaction counts")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Room to watch
    room_id: Option<String>,

    /// React to a message once the room is loaded
    #[arg(long, value_name = "MESSAGE_ID")]
    react: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a room and print its id
    CreateRoom { theme: String },
    /// Post a question to a room
    Ask { room_id: String, text: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(cli, config).await {
        let code = e
            .downcast_ref::<AppError>()
            .map_or("INTERNAL_ERROR", AppError::error_code);
        error!(code, error = %format!("{e:#}"), "ama-watch failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> anyhow::Result<()> {
    match (cli.command, cli.room_id) {
        (Some(Command::CreateRoom { theme }), _) => {
            let api = HttpRoomApi::new(&config.api).map_err(AppError::from)?;
            let room_id = api.create_room(&theme).await.map_err(AppError::from)?;
            println!("{room_id}");
            Ok(())
        }
        (Some(Command::Ask { room_id, text }), _) => {
            let api = HttpRoomApi::new(&config.api).map_err(AppError::from)?;
            let message_id = api
                .create_message(&RoomId::from(room_id), &text)
                .await
                .map_err(AppError::from)?;
            println!("{message_id}");
            Ok(())
        }
        (None, Some(room_id)) => watch(&config, RoomId::from(room_id), cli.react).await,
        (None, None) => anyhow::bail!("a room id or a subcommand is required (see --help)"),
    }
}

async fn watch(config: &ClientConfig, room_id: RoomId, react: Option<String>) -> anyhow::Result<()> {
    info!(room_id = %room_id, api = %config.api.base_url, "Watching room");

    let session = ama_client::connect(config, room_id).map_err(AppError::from)?;
    let mut notices = session.notices();
    let mut views = session.watch();

    let loaded = load_with_retry(&session).await;
    match loaded {
        Ok(count) => info!(count, "Room loaded"),
        Err(e) => {
            session.close().await;
            return Err(e).context("initial bulk read failed");
        }
    }
    print_view(&views.borrow_and_update());

    if let Some(message_id) = react {
        let message_id = MessageId::from(message_id);
        match session.toggle_reaction(&message_id).await {
            Ok(receipt) => info!(
                message_id = %receipt.message_id,
                direction = ?receipt.direction,
                count = receipt.count,
                "Reaction confirmed"
            ),
            Err(e) => warn!(
                message_id = %message_id,
                response = ?ErrorResponse::from(AppError::from(e)),
                "Reaction failed"
            ),
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, leaving room");
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                print_view(&views.borrow_and_update());
            }
            notice = notices.recv() => match notice {
                Ok(notice) => match &notice.kind {
                    SessionNoticeKind::Degraded { attempts } => {
                        warn!(attempts, at = %notice.at, "{}", notice.message());
                    }
                    SessionNoticeKind::Recovered { attempts } => {
                        info!(attempts, "{}", notice.message());
                    }
                    SessionNoticeKind::LoadFailed(e) | SessionNoticeKind::ReactionFailed { error: e, .. } => {
                        warn!(code = e.code(), error = %e, "{}", notice.message());
                    }
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Dropped notices"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.close().await;
    Ok(())
}

/// Retry the bulk read with a linear backoff while the failure is transient
async fn load_with_retry(session: &RoomSession) -> Result<usize, AppError> {
    let mut attempt = 1;
    loop {
        match session.load().await {
            Ok(count) => return Ok(count),
            Err(e) if e.is_retryable() && attempt < LOAD_ATTEMPTS => {
                let delay = Duration::from_secs(u64::from(attempt));
                warn!(attempt, delay_secs = delay.as_secs(), error = %e, "Bulk read failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(AppError::from(e)),
        }
    }
}

fn print_view(view: &RoomView) {
    println!("--- {} messages, live channel {} ---", view.len(), view.connection);
    for message in view.messages.iter() {
        let marker = if message.answered { "answered" } else { "open" };
        let mine = if view.shows_reacted(&message.id) { "*" } else { " " };
        println!(
            "{mine} [{id}] {count:>4} | {marker:<8} | {text}",
            id = message.id,
            count = message.reaction_count,
            text = message.preview(80),
        );
    }
}
