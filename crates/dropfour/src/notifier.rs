//! A [`Notifier`] that routes events into per-player channels.
//!
//! The transport layer registers each connection when it comes up and
//! drains the receiver into its socket. Events for players with no
//! registered channel are dropped.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::mpsc;

use dropfour_protocol::{GameEvent, PlayerId};
use dropfour_session::Notifier;

/// What the service pushes to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Event(GameEvent),
    /// The server is closing this connection.
    Disconnect { reason: String },
}

/// Sender half used to push [`Outbound`] messages to one player.
pub type PlayerSender = mpsc::UnboundedSender<Outbound>;

/// Fans events out to registered player channels.
#[derive(Debug, Default)]
pub struct ChannelNotifier {
    senders: RwLock<HashMap<PlayerId, PlayerSender>>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a channel for `player`, replacing any previous one.
    pub fn register(&self, player: PlayerId) -> mpsc::UnboundedReceiver<Outbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player, tx);
        rx
    }

    /// Forgets `player`'s channel. Returns `false` if none was registered.
    pub fn unregister(&self, player: PlayerId) -> bool {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&player)
            .is_some()
    }

    pub fn is_registered(&self, player: PlayerId) -> bool {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&player)
    }

    fn send(&self, player: PlayerId, message: Outbound) -> bool {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
        match senders.get(&player) {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }
}

impl Notifier for ChannelNotifier {
    fn send_to_player(&self, player: PlayerId, event: GameEvent) {
        if !self.send(player, Outbound::Event(event)) {
            tracing::debug!(player_id = %player, "dropping event for unreachable player");
        }
    }

    fn disconnect(&self, player: PlayerId, reason: &str) {
        self.send(
            player,
            Outbound::Disconnect {
                reason: reason.to_string(),
            },
        );
        self.unregister(player);
        tracing::info!(player_id = %player, reason, "player disconnected by server");
    }
}
