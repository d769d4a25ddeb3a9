//! One match between two seats, plus its post-game life.
//!
//! A [`GameSession`] wraps a [`Game`] with player identities, a phase that
//! outlives the game itself, and the timers attached to that phase.
//!
//! ```text
//!   Active ──(win / draw)──→ PostGameWindow ──(request)──→ RematchPending
//!     │                           │                            │
//!     │ (disconnect)              │ (window lapses)            │ (accept / decline / timeout)
//!     ▼                           ▼                            ▼
//!   Closed ◄──────────────────────┴────────────────────────────┘
//! ```
//!
//! All fields that change live in [`SessionState`] behind the session's
//! own mutex. Whoever holds the lock may move the session forward; timer
//! callbacks take the same lock and re-check the phase before acting.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

use dropfour_protocol::{
    Board, Difficulty, EndReason, Opponent, Outcome, PlayerId, PlayerInfo, Seat, SessionId,
};
use dropfour_rules::{Game, GameStatus, MoveOutcome, MoveRejection};
use dropfour_timer::{cancel_slot, Timer};

use crate::{FinishedGame, SessionError};

/// Counter for generating unique session IDs.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Where a session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    /// The game is running.
    Active,
    /// The game ended; a rematch may still be requested.
    PostGameWindow,
    /// A human asked for a rematch and the other side has not answered.
    RematchPending { requester: PlayerId },
    /// Torn down. Nothing can happen to this session anymore.
    Closed { reason: CloseReason },
}

impl SessionPhase {
    /// Whether the game is over (any phase but `Active`).
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// A player left mid-game.
    Abandoned,
    /// A player left after the game ended.
    PlayerLeft,
    /// Nobody asked for a rematch in time.
    WindowExpired,
    RematchDeclined,
    RematchTimedOut,
    /// A rematch session took its place.
    Superseded,
    /// Removed by the periodic sweep.
    Swept,
    Shutdown,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Abandoned => "abandoned",
            Self::PlayerLeft => "player left",
            Self::WindowExpired => "post-game window expired",
            Self::RematchDeclined => "rematch declined",
            Self::RematchTimedOut => "rematch timed out",
            Self::Superseded => "superseded by rematch",
            Self::Swept => "swept",
            Self::Shutdown => "shutdown",
        };
        f.write_str(text)
    }
}

/// The mutable part of a session. Only reachable through
/// [`GameSession::lock`].
#[derive(Debug)]
pub struct SessionState {
    pub(crate) game: Game,
    pub(crate) phase: SessionPhase,
    /// Set when the game ends, by a move or by abandonment.
    pub(crate) result: Option<(Outcome, EndReason)>,
    pub(crate) finished_at: Option<Instant>,
    pub(crate) post_game_timer: Option<Timer>,
    pub(crate) rematch_timer: Option<Timer>,
    pub(crate) bot_timer: Option<Timer>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            game: Game::new(),
            phase: SessionPhase::Active,
            result: None,
            finished_at: None,
            post_game_timer: None,
            rematch_timer: None,
            bot_timer: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn result(&self) -> Option<(Outcome, EndReason)> {
        self.result
    }

    /// Plays `seat`'s piece into `column`.
    ///
    /// # Errors
    /// - [`MoveRejection::SessionNotActive`] unless the phase is `Active`
    /// - [`MoveRejection::NotYourTurn`] if `seat` is not the seat to move
    /// - any rules error from the game itself
    pub(crate) fn apply_move(
        &mut self,
        seat: Seat,
        column: usize,
    ) -> Result<MoveOutcome, SessionError> {
        if self.phase != SessionPhase::Active {
            return Err(MoveRejection::SessionNotActive.into());
        }
        if self.game.current_turn() != seat {
            return Err(MoveRejection::NotYourTurn.into());
        }
        Ok(self.game.apply_move(column)?)
    }

    /// Records the end of the game and opens the post-game window.
    pub(crate) fn finish(&mut self, outcome: Outcome, reason: EndReason) {
        cancel_slot(&mut self.bot_timer);
        self.result = Some((outcome, reason));
        self.finished_at = Some(Instant::now());
        self.phase = SessionPhase::PostGameWindow;
    }

    /// Cancels every timer and marks the session closed.
    ///
    /// Returns `false` if it was already closed. A pending rematch request
    /// dies with its timer, so the silent side never hears a timeout.
    pub(crate) fn close(&mut self, reason: CloseReason) -> bool {
        if matches!(self.phase, SessionPhase::Closed { .. }) {
            return false;
        }
        self.cancel_pending_rematch();
        cancel_slot(&mut self.post_game_timer);
        cancel_slot(&mut self.bot_timer);
        self.phase = SessionPhase::Closed { reason };
        true
    }

    /// Drops an outstanding rematch request and its response timer.
    pub(crate) fn cancel_pending_rematch(&mut self) {
        cancel_slot(&mut self.rematch_timer);
        if matches!(self.phase, SessionPhase::RematchPending { .. }) {
            self.phase = SessionPhase::PostGameWindow;
        }
    }
}

/// A read-only picture of a session, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub seats: [PlayerInfo; 2],
    pub bot: Option<Difficulty>,
    pub phase: SessionPhase,
    pub status: GameStatus,
    pub outcome: Option<Outcome>,
    pub end_reason: Option<EndReason>,
    pub board: Board,
    pub turn: Seat,
    pub move_count: u32,
    pub post_game_timer_armed: bool,
    pub rematch_timer_armed: bool,
    pub bot_move_pending: bool,
}

/// One match. Shared as `Arc<GameSession>` between the registry, the
/// manager, and the session's own timers.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    /// Indexed by seat. A bot always sits in [`Seat::Second`].
    seats: [PlayerInfo; 2],
    bot: Option<Difficulty>,
    created_at: Instant,
    state: Mutex<SessionState>,
}

impl GameSession {
    /// A fresh Active session with a new id. `first` moves first.
    pub fn new(first: PlayerInfo, second: Opponent) -> Self {
        let id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            seats: [first, second.info()],
            bot: second.bot_difficulty(),
            created_at: Instant::now(),
            state: Mutex::new(SessionState::new()),
        }
    }

    /// A fresh session with the same seating as this one.
    pub fn rematch(&self) -> Self {
        let second = match self.bot {
            Some(difficulty) => Opponent::Bot { difficulty },
            None => Opponent::Human(self.seats[1].clone()),
        };
        Self::new(self.seats[0].clone(), second)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn player(&self, seat: Seat) -> &PlayerInfo {
        &self.seats[seat.index()]
    }

    /// The bot's difficulty, or `None` for a human-vs-human session.
    pub fn bot_difficulty(&self) -> Option<Difficulty> {
        self.bot
    }

    /// The seat the bot plays, if any.
    pub fn bot_seat(&self) -> Option<Seat> {
        self.bot.map(|_| Seat::Second)
    }

    /// The seat `player` occupies. Never matches the bot sentinel.
    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        if player.is_bot() {
            return None;
        }
        [Seat::First, Seat::Second]
            .into_iter()
            .find(|&seat| self.seats[seat.index()].id == player)
    }

    /// The human participants, in seat order.
    pub fn humans(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.seats
            .iter()
            .map(|info| info.id)
            .filter(|id| !id.is_bot())
    }

    /// Takes the session lock.
    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            id: self.id,
            seats: self.seats.clone(),
            bot: self.bot,
            phase: state.phase,
            status: state.game.status(),
            outcome: state.result.map(|(outcome, _)| outcome),
            end_reason: state.result.map(|(_, reason)| reason),
            board: *state.game.board(),
            turn: state.game.current_turn(),
            move_count: state.game.move_count(),
            post_game_timer_armed: state.post_game_timer.is_some(),
            rematch_timer_armed: state.rematch_timer.is_some(),
            bot_move_pending: state.bot_timer.is_some(),
        }
    }

    /// The persistence record for a finished game. `None` while the game
    /// is still running.
    pub(crate) fn record(&self, state: &SessionState) -> Option<FinishedGame> {
        let (outcome, end_reason) = state.result?;
        let finished_at = state.finished_at.unwrap_or_else(Instant::now);
        Some(FinishedGame {
            session_id: self.id,
            seats: self.seats.clone(),
            outcome,
            winner: outcome.winner().map(|seat| self.player(seat).id),
            end_reason,
            move_count: state.game.move_count(),
            duration_secs: finished_at.duration_since(self.created_at).as_secs(),
            final_board: *state.game.board(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropfour_rules::RulesError;

    fn alice() -> PlayerInfo {
        PlayerInfo::new(PlayerId(1), "alice")
    }

    fn bob() -> PlayerInfo {
        PlayerInfo::new(PlayerId(2), "bob")
    }

    #[tokio::test]
    async fn test_new_session_is_active_with_first_to_move() {
        let session = GameSession::new(alice(), Opponent::Human(bob()));
        let snap = session.snapshot().await;
        assert_eq!(snap.phase, SessionPhase::Active);
        assert_eq!(snap.turn, Seat::First);
        assert_eq!(snap.move_count, 0);
        assert_eq!(snap.outcome, None);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = GameSession::new(alice(), Opponent::Human(bob()));
        let b = GameSession::new(alice(), Opponent::Human(bob()));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_seat_of_ignores_bot_sentinel() {
        let session = GameSession::new(
            alice(),
            Opponent::Bot {
                difficulty: Difficulty::Hard,
            },
        );
        assert_eq!(session.seat_of(PlayerId(1)), Some(Seat::First));
        assert_eq!(session.seat_of(PlayerId::BOT), None);
        assert_eq!(session.seat_of(PlayerId(9)), None);
        assert_eq!(session.bot_seat(), Some(Seat::Second));
        assert_eq!(session.humans().collect::<Vec<_>>(), vec![PlayerId(1)]);
    }

    #[test]
    fn test_rematch_keeps_seating() {
        let session = GameSession::new(alice(), Opponent::Human(bob()));
        let next = session.rematch();
        assert_ne!(next.id(), session.id());
        assert_eq!(next.player(Seat::First), &alice());
        assert_eq!(next.player(Seat::Second), &bob());
        assert_eq!(next.bot_difficulty(), None);
    }

    #[tokio::test]
    async fn test_apply_move_rejects_wrong_turn_without_change() {
        let session = GameSession::new(alice(), Opponent::Human(bob()));
        let mut state = session.lock().await;

        let err = state.apply_move(Seat::Second, 3).unwrap_err();
        assert_eq!(
            err,
            SessionError::Rules(RulesError::InvalidMove(MoveRejection::NotYourTurn))
        );
        assert_eq!(state.game().move_count(), 0);

        state.apply_move(Seat::First, 3).unwrap();
        assert_eq!(state.game().current_turn(), Seat::Second);
    }

    #[tokio::test]
    async fn test_apply_move_rejects_after_finish() {
        let session = GameSession::new(alice(), Opponent::Human(bob()));
        let mut state = session.lock().await;
        state.finish(Outcome::Winner(Seat::First), EndReason::Abandoned);

        let err = state.apply_move(Seat::First, 0).unwrap_err();
        assert_eq!(err, SessionError::from(MoveRejection::SessionNotActive));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let session = GameSession::new(alice(), Opponent::Human(bob()));
        let mut state = session.lock().await;
        assert!(state.close(CloseReason::Shutdown));
        assert!(!state.close(CloseReason::Swept));
        assert_eq!(
            state.phase(),
            SessionPhase::Closed {
                reason: CloseReason::Shutdown
            }
        );
    }

    #[tokio::test]
    async fn test_record_credits_winner_identity() {
        let session = GameSession::new(
            alice(),
            Opponent::Bot {
                difficulty: Difficulty::Easy,
            },
        );
        let mut state = session.lock().await;
        assert!(session.record(&state).is_none());

        state.finish(Outcome::Winner(Seat::Second), EndReason::Abandoned);
        let record = session.record(&state).unwrap();
        assert_eq!(record.winner, Some(PlayerId::BOT));
        assert_eq!(record.end_reason, EndReason::Abandoned);
        assert_eq!(record.seats[0], alice());
    }
}
