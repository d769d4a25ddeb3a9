//! Plays one game against a dropfour bot through the full service.
//!
//! A single player queues, nobody else shows up, and the matchmaker falls
//! back to a bot. The player's own moves come from the Easy engine.
//!
//! ```text
//! cargo run -p bot-match -- hard
//! RUST_LOG=dropfour_session=debug cargo run -p bot-match
//! ```

use std::sync::Arc;
use std::time::Duration;

use dropfour::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PLAYER: PlayerId = PlayerId(1);

#[tokio::main]
async fn main() -> Result<(), DropFourError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let difficulty: Difficulty = std::env::args()
        .nth(1)
        .as_deref()
        .unwrap_or("medium")
        .parse()?;

    let notifier = Arc::new(ChannelNotifier::new());
    let store = Arc::new(MemoryStore::new());
    let service = GameServiceBuilder::new()
        .queue_config(QueueConfig {
            wait_timeout: Duration::from_secs(1),
        })
        .build(Arc::clone(&notifier), Arc::clone(&store));

    let mut inbox = notifier.register(PLAYER);
    service
        .request_match(PlayerInfo::new(PLAYER, "demo"), difficulty)
        .await?;

    let mut seat = Seat::First;
    let mut session = None;
    while let Some(message) = inbox.recv().await {
        let Outbound::Event(event) = message else {
            warn!("disconnected by server");
            break;
        };
        if let Ok(json) = serde_json::to_string(&event) {
            tracing::debug!(%json, "event");
        }

        let to_move = match event {
            GameEvent::QueueJoined { difficulty } => {
                info!(%difficulty, "waiting for an opponent");
                None
            }
            GameEvent::GameStarted {
                session_id,
                opponent,
                seat: mine,
                turn,
                board,
            } => {
                info!(%session_id, opponent = %opponent.username, seat = %mine, "game started");
                seat = mine;
                session = Some(session_id);
                (turn == mine).then_some(board)
            }
            GameEvent::MoveApplied {
                column,
                seat: mover,
                board,
                next_turn,
                ..
            } => {
                info!(%mover, column, "move");
                (next_turn == Some(seat)).then_some(board)
            }
            GameEvent::GameOver {
                outcome,
                reason,
                board,
                ..
            } => {
                let result = match outcome {
                    Outcome::Winner(winner) if winner == seat => "you win",
                    Outcome::Winner(_) => "the bot wins",
                    Outcome::Draw => "draw",
                };
                println!("{board}\n\n{result} ({reason})");
                break;
            }
            GameEvent::Error { code, message } => {
                warn!(code, %message, "request refused");
                None
            }
            _ => None,
        };

        if let (Some(board), Some(session_id)) = (to_move, session) {
            let Some(column) = dropfour::bot::select_move(&board, seat, Difficulty::Easy) else {
                break;
            };
            service.submit_move(session_id, PLAYER, column).await?;
        }
    }

    // Let the finished game reach the store.
    tokio::time::sleep(Duration::from_millis(10)).await;
    info!(stored = store.records().len(), "finished games persisted");
    service.shutdown().await;
    Ok(())
}
