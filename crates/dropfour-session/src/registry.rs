//! The session registry: which sessions exist and who sits in them.
//!
//! Two maps are kept in step behind one lock:
//!
//! - session id → session
//! - player id → session id (at most one session per human)
//!
//! [`SessionRegistry::create`] and [`SessionRegistry::remove`] are the only
//! ways to change them, and each updates both maps under a single write
//! lock.
//!
//! # Lock order
//!
//! A caller may hold a session lock while taking the registry lock, never
//! the other way round. Registry methods never touch session locks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use dropfour_protocol::{PlayerId, SessionId};

use crate::{GameSession, SessionError};

#[derive(Default)]
struct Maps {
    sessions: HashMap<SessionId, Arc<GameSession>>,
    players: HashMap<PlayerId, SessionId>,
}

/// In-memory index of live sessions.
#[derive(Default)]
pub struct SessionRegistry {
    maps: RwLock<Maps>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `session` and maps both of its human players to it.
    ///
    /// `supersedes` names a session this one replaces (a rematch). Its
    /// players may be remapped, and it is dropped from the registry in the
    /// same step.
    ///
    /// # Errors
    /// [`SessionError::AlreadyInSession`] if a player already maps to any
    /// other session. Nothing is changed in that case.
    pub async fn create(
        &self,
        session: Arc<GameSession>,
        supersedes: Option<SessionId>,
    ) -> Result<(), SessionError> {
        let mut maps = self.maps.write().await;

        for player in session.humans() {
            if let Some(&current) = maps.players.get(&player) {
                if Some(current) != supersedes {
                    return Err(SessionError::AlreadyInSession(player, current));
                }
            }
        }

        if let Some(old) = supersedes {
            if let Some(previous) = maps.sessions.remove(&old) {
                for player in previous.humans() {
                    if maps.players.get(&player) == Some(&old) {
                        maps.players.remove(&player);
                    }
                }
            }
        }

        let id = session.id();
        for player in session.humans() {
            maps.players.insert(player, id);
        }
        maps.sessions.insert(id, session);

        tracing::debug!(session_id = %id, superseded = ?supersedes, "session registered");
        Ok(())
    }

    pub async fn lookup_by_id(&self, id: SessionId) -> Option<Arc<GameSession>> {
        self.maps.read().await.sessions.get(&id).cloned()
    }

    pub async fn lookup_by_player(&self, player: PlayerId) -> Option<Arc<GameSession>> {
        let maps = self.maps.read().await;
        let id = maps.players.get(&player)?;
        maps.sessions.get(id).cloned()
    }

    /// The session id `player` maps to, if any.
    pub async fn session_of(&self, player: PlayerId) -> Option<SessionId> {
        self.maps.read().await.players.get(&player).copied()
    }

    /// Erases a session and the player mappings that still point at it.
    ///
    /// Safe to call any number of times. Mappings already taken over by a
    /// newer session are left alone.
    pub async fn remove(&self, id: SessionId) -> Option<Arc<GameSession>> {
        let mut maps = self.maps.write().await;
        let session = maps.sessions.remove(&id)?;
        for player in session.humans() {
            if maps.players.get(&player) == Some(&id) {
                maps.players.remove(&player);
            }
        }
        tracing::debug!(session_id = %id, "session unregistered");
        Some(session)
    }

    /// Every registered session, in no particular order.
    pub async fn all(&self) -> Vec<Arc<GameSession>> {
        self.maps.read().await.sessions.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.maps.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.maps.read().await.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropfour_protocol::{Difficulty, Opponent, PlayerInfo};

    fn pvp(a: u64, b: u64) -> Arc<GameSession> {
        Arc::new(GameSession::new(
            PlayerInfo::new(PlayerId(a), format!("p{a}")),
            Opponent::Human(PlayerInfo::new(PlayerId(b), format!("p{b}"))),
        ))
    }

    #[tokio::test]
    async fn test_create_maps_both_players() {
        let registry = SessionRegistry::new();
        let session = pvp(1, 2);
        let id = session.id();
        registry.create(session, None).await.unwrap();

        assert_eq!(registry.session_of(PlayerId(1)).await, Some(id));
        assert_eq!(registry.session_of(PlayerId(2)).await, Some(id));
        assert!(registry.lookup_by_id(id).await.is_some());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_player_already_seated() {
        let registry = SessionRegistry::new();
        let first = pvp(1, 2);
        let first_id = first.id();
        registry.create(first, None).await.unwrap();

        let err = registry.create(pvp(3, 2), None).await.unwrap_err();
        assert_eq!(err, SessionError::AlreadyInSession(PlayerId(2), first_id));
        // Player 3 must not have been mapped by the failed attempt.
        assert_eq!(registry.session_of(PlayerId(3)).await, None);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_bot_sentinel_is_never_mapped() {
        let registry = SessionRegistry::new();
        for id in [1, 2] {
            let session = Arc::new(GameSession::new(
                PlayerInfo::new(PlayerId(id), "human"),
                Opponent::Bot {
                    difficulty: Difficulty::Easy,
                },
            ));
            registry.create(session, None).await.unwrap();
        }
        assert_eq!(registry.session_of(PlayerId::BOT).await, None);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = SessionRegistry::new();
        let session = pvp(1, 2);
        let id = session.id();
        registry.create(session, None).await.unwrap();

        assert!(registry.remove(id).await.is_some());
        assert!(registry.remove(id).await.is_none());
        assert_eq!(registry.session_of(PlayerId(1)).await, None);
        assert_eq!(registry.session_of(PlayerId(2)).await, None);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_supersede_swaps_sessions_atomically() {
        let registry = SessionRegistry::new();
        let old = pvp(1, 2);
        let old_id = old.id();
        let next = Arc::new(old.rematch());
        let next_id = next.id();
        registry.create(old, None).await.unwrap();

        registry.create(next, Some(old_id)).await.unwrap();
        assert!(registry.lookup_by_id(old_id).await.is_none());
        assert_eq!(registry.session_of(PlayerId(1)).await, Some(next_id));

        // Late teardown of the old session must not unmap the players.
        assert!(registry.remove(old_id).await.is_none());
        assert_eq!(registry.session_of(PlayerId(2)).await, Some(next_id));
    }
}
