//! The session manager: every operation that moves a session forward.
//!
//! [`SessionManager`] owns the [`SessionRegistry`] and the two
//! collaborators, and runs each operation under the target session's
//! lock:
//!
//! - moves from players, and delayed moves from the bot
//! - disconnects and forced cleanup before re-queueing
//! - rematch requests and answers
//! - timer expiry (post-game window, rematch response)
//! - the periodic sweep and shutdown
//!
//! # Timers
//!
//! Timers are armed while the session lock is held and stored in the
//! session state. When one fires, its callback takes the lock and checks
//! that the state still holds that exact timer before doing anything, so
//! a timer that was cancelled or replaced in the meantime is a no-op.
//!
//! # Persistence
//!
//! Finished games are handed to the [`GameStore`] on a spawned task after
//! the session lock is released. Failures are logged and forgotten.

use std::sync::{Arc, Weak};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use dropfour_protocol::{
    EndReason, GameEvent, Opponent, Outcome, PlayerId, PlayerInfo, RematchDecision, Seat,
    SessionId,
};
use dropfour_rules::{GameStatus, MoveOutcome};
use dropfour_timer::{cancel_slot, holds, Timer, TimerId};

use crate::{
    CloseReason, FinishedGame, GameSession, GameStore, Notifier, SessionConfig, SessionError,
    SessionPhase, SessionRegistry, SessionState,
};

/// What a successful rematch request led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RematchProgress {
    /// The other human has been asked and has until the response window
    /// closes to answer.
    AwaitingResponse,
    /// A new session started right away (bot opponent).
    Started(SessionId),
}

/// Runs the lifecycle of every game session.
///
/// Cheap to clone: clones share the same registry and collaborators.
pub struct SessionManager<N, S> {
    inner: Arc<Inner<N, S>>,
}

impl<N, S> Clone for SessionManager<N, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<N, S> {
    registry: SessionRegistry,
    notifier: N,
    store: S,
    config: SessionConfig,
}

impl<N: Notifier, S: GameStore> SessionManager<N, S> {
    pub fn new(config: SessionConfig, notifier: N, store: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: SessionRegistry::new(),
                notifier,
                store,
                config,
            }),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn notifier(&self) -> &N {
        &self.inner.notifier
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Starts a game between `first` (who moves first) and `second`, and
    /// sends both humans a `GameStarted` event.
    ///
    /// # Errors
    /// [`SessionError::AlreadyInSession`] if either human is still seated
    /// somewhere else.
    pub async fn start_session(
        &self,
        first: PlayerInfo,
        second: Opponent,
    ) -> Result<SessionId, SessionError> {
        let session = Arc::new(GameSession::new(first, second));
        let mut state = session.lock().await;
        self.inner.registry.create(Arc::clone(&session), None).await?;

        self.inner.announce_start(&session, &state);
        self.inner.schedule_bot_if_due(&session, &mut state);

        info!(
            session_id = %session.id(),
            first = %session.player(Seat::First).id,
            second = %session.player(Seat::Second).id,
            bot = ?session.bot_difficulty(),
            "session started"
        );
        Ok(session.id())
    }

    /// Plays `player`'s piece into `column`.
    ///
    /// Both humans get `MoveApplied`; if the move ends the game they also
    /// get `GameOver`, the post-game window opens, and the game is
    /// persisted. If the bot is next, its reply is scheduled.
    ///
    /// # Errors
    /// - [`SessionError::SessionNotFound`] for an unknown session
    /// - [`SessionError::NotAParticipant`] if `player` is not seated
    /// - an `InvalidMove` or `ColumnFull` rules error; the game is untouched
    pub async fn submit_move(
        &self,
        session_id: SessionId,
        player: PlayerId,
        column: usize,
    ) -> Result<MoveOutcome, SessionError> {
        let session = self
            .inner
            .registry
            .lookup_by_id(session_id)
            .await
            .ok_or(SessionError::SessionNotFound)?;
        let seat = session
            .seat_of(player)
            .ok_or(SessionError::NotAParticipant(player))?;

        let mut state = session.lock().await;
        let (outcome, record) = match self.inner.play(&session, &mut state, seat, column) {
            Ok(played) => played,
            Err(err) => {
                debug!(%session_id, player_id = %player, column, error = %err, "move rejected");
                return Err(err);
            }
        };
        drop(state);

        if let Some(record) = record {
            self.inner.persist(record);
        }
        Ok(outcome)
    }

    /// Handles a player's connection going away.
    ///
    /// Mid-game this ends the session as an abandonment won by the other
    /// seat, and the result is persisted. After the game is over it only
    /// tears the session down.
    ///
    /// # Errors
    /// [`SessionError::SessionNotFound`] if the player has no session.
    pub async fn handle_disconnect(&self, player: PlayerId) -> Result<(), SessionError> {
        let session = self
            .inner
            .registry
            .lookup_by_player(player)
            .await
            .ok_or(SessionError::SessionNotFound)?;
        self.inner.leave(&session, player).await;
        Ok(())
    }

    /// Clears whatever session `player` still owns so they can queue again.
    ///
    /// Same semantics as [`handle_disconnect`](Self::handle_disconnect).
    /// Returns `false` if there was nothing to clean up.
    pub async fn force_cleanup_for_player(&self, player: PlayerId) -> bool {
        let Some(session) = self.inner.registry.lookup_by_player(player).await else {
            return false;
        };
        info!(player_id = %player, session_id = %session.id(), "forcing session cleanup");
        self.inner.leave(&session, player).await;
        true
    }

    /// Asks for a rematch of `player`'s finished game.
    ///
    /// Against a bot the new session starts immediately. Against a human
    /// the other player is asked and the response timer starts; the
    /// post-game window timer is cancelled.
    ///
    /// # Errors
    /// - [`SessionError::SessionNotFound`] if the player has no live session
    /// - [`SessionError::GameInProgress`] before the game is over
    /// - [`SessionError::RematchAlreadyPending`] if a request is outstanding
    pub async fn request_rematch(&self, player: PlayerId) -> Result<RematchProgress, SessionError> {
        let session = self
            .inner
            .registry
            .lookup_by_player(player)
            .await
            .ok_or(SessionError::SessionNotFound)?;
        if session.seat_of(player).is_none() {
            return Err(SessionError::NotAParticipant(player));
        }

        let mut state = session.lock().await;
        match state.phase {
            SessionPhase::Active => Err(SessionError::GameInProgress),
            SessionPhase::Closed { .. } => Err(SessionError::SessionNotFound),
            SessionPhase::RematchPending { .. } => Err(SessionError::RematchAlreadyPending),
            SessionPhase::PostGameWindow if session.bot_difficulty().is_some() => {
                let next = self.inner.start_rematch(&session, &mut state).await?;
                Ok(RematchProgress::Started(next))
            }
            SessionPhase::PostGameWindow => {
                cancel_slot(&mut state.post_game_timer);
                state.phase = SessionPhase::RematchPending { requester: player };
                self.inner.arm_rematch_timer(&session, &mut state);

                let respond_within_secs = self.inner.config.rematch_response_window.as_secs();
                for other in session.humans().filter(|&id| id != player) {
                    self.inner.notifier.send_to_player(
                        other,
                        GameEvent::RematchRequested {
                            session_id: session.id(),
                            requester: player,
                            respond_within_secs,
                        },
                    );
                }
                info!(session_id = %session.id(), requester = %player, "rematch requested");
                Ok(RematchProgress::AwaitingResponse)
            }
        }
    }

    /// Answers the pending rematch request in `player`'s session.
    ///
    /// Accepting returns the id of the new session. Declining notifies both
    /// players and tears the session down.
    ///
    /// # Errors
    /// - [`SessionError::NoRematchPending`] if nothing is waiting for an answer
    /// - [`SessionError::CannotRespondToOwnRequest`] for the requester
    pub async fn respond_to_rematch(
        &self,
        player: PlayerId,
        decision: RematchDecision,
    ) -> Result<Option<SessionId>, SessionError> {
        let session = self
            .inner
            .registry
            .lookup_by_player(player)
            .await
            .ok_or(SessionError::SessionNotFound)?;
        if session.seat_of(player).is_none() {
            return Err(SessionError::NotAParticipant(player));
        }

        let mut state = session.lock().await;
        let SessionPhase::RematchPending { requester } = state.phase else {
            return Err(SessionError::NoRematchPending);
        };
        if requester == player {
            return Err(SessionError::CannotRespondToOwnRequest);
        }

        match decision {
            RematchDecision::Accept => {
                let next = self.inner.start_rematch(&session, &mut state).await?;
                Ok(Some(next))
            }
            RematchDecision::Decline => {
                state.cancel_pending_rematch();
                self.inner.broadcast(
                    &session,
                    GameEvent::RematchDeclined {
                        session_id: session.id(),
                    },
                );
                info!(session_id = %session.id(), responder = %player, "rematch declined");
                self.inner
                    .teardown(&session, &mut state, CloseReason::RematchDeclined)
                    .await;
                Ok(None)
            }
        }
    }

    /// Removes stale sessions and returns how many went.
    ///
    /// Stale means closed but still registered, finished for longer than
    /// `finished_retention`, or active for longer than `max_active_age`.
    /// Humans in an over-age active session are disconnected.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let config = &self.inner.config;
        let mut removed = 0;

        for session in self.inner.registry.all().await {
            let mut state = session.lock().await;
            let stale = match state.phase {
                SessionPhase::Closed { .. } => true,
                SessionPhase::Active => {
                    now.saturating_duration_since(session.created_at()) >= config.max_active_age
                }
                SessionPhase::PostGameWindow | SessionPhase::RematchPending { .. } => state
                    .finished_at
                    .is_some_and(|at| now.saturating_duration_since(at) >= config.finished_retention),
            };
            if !stale {
                continue;
            }

            if state.phase == SessionPhase::Active {
                for player in session.humans() {
                    self.inner.notifier.disconnect(player, "session expired");
                }
            }
            self.inner
                .teardown(&session, &mut state, CloseReason::Swept)
                .await;
            removed += 1;
        }

        if removed > 0 {
            info!(removed, "sweep removed stale sessions");
        }
        removed
    }

    /// Tears down every session and cancels all of their timers.
    pub async fn shutdown(&self) -> usize {
        let sessions = self.inner.registry.all().await;
        let count = sessions.len();
        for session in sessions {
            let mut state = session.lock().await;
            self.inner
                .teardown(&session, &mut state, CloseReason::Shutdown)
                .await;
        }
        info!(sessions = count, "session manager shut down");
        count
    }
}

impl<N: Notifier, S: GameStore> Inner<N, S> {
    /// Applies a move, notifies, and either finishes the game or schedules
    /// the bot. Returns the record to persist once the lock is released.
    fn play(
        self: &Arc<Self>,
        session: &Arc<GameSession>,
        state: &mut SessionState,
        seat: Seat,
        column: usize,
    ) -> Result<(MoveOutcome, Option<FinishedGame>), SessionError> {
        let outcome = state.apply_move(seat, column)?;
        self.broadcast(
            session,
            GameEvent::MoveApplied {
                session_id: session.id(),
                column,
                row: outcome.row,
                seat,
                board: *state.game.board(),
                next_turn: outcome.next_turn,
            },
        );

        let (result, reason) = match outcome.status {
            GameStatus::Active => {
                self.schedule_bot_if_due(session, state);
                return Ok((outcome, None));
            }
            GameStatus::Won => (Outcome::Winner(seat), EndReason::FourInARow),
            GameStatus::Draw => (Outcome::Draw, EndReason::BoardFull),
        };

        state.finish(result, reason);
        self.announce_game_over(session, state, true);
        self.arm_post_game_timer(session, state);
        info!(
            session_id = %session.id(),
            outcome = ?result,
            %reason,
            moves = state.game.move_count(),
            "game finished"
        );
        Ok((outcome, session.record(state)))
    }

    /// Ends the session on `player`'s departure.
    async fn leave(self: &Arc<Self>, session: &Arc<GameSession>, player: PlayerId) {
        let mut state = session.lock().await;

        let mut record = None;
        if state.phase == SessionPhase::Active {
            if let Some(seat) = session.seat_of(player) {
                state.finish(Outcome::Winner(seat.other()), EndReason::Abandoned);
                self.announce_game_over(session, &state, false);
                info!(session_id = %session.id(), player_id = %player, "session abandoned");
                record = session.record(&state);
            }
        }

        let reason = if record.is_some() {
            CloseReason::Abandoned
        } else {
            CloseReason::PlayerLeft
        };
        self.teardown(session, &mut state, reason).await;
        drop(state);

        if let Some(record) = record {
            self.persist(record);
        }
    }

    /// Replaces a finished session with a fresh one with the same seating.
    async fn start_rematch(
        self: &Arc<Self>,
        session: &Arc<GameSession>,
        state: &mut SessionState,
    ) -> Result<SessionId, SessionError> {
        let next = Arc::new(session.rematch());
        let mut next_state = next.lock().await;
        self.registry
            .create(Arc::clone(&next), Some(session.id()))
            .await?;
        state.close(CloseReason::Superseded);

        self.broadcast(
            session,
            GameEvent::RematchAccepted {
                session_id: session.id(),
                new_session_id: next.id(),
            },
        );
        self.announce_start(&next, &next_state);
        self.schedule_bot_if_due(&next, &mut next_state);

        info!(session_id = %session.id(), new_session_id = %next.id(), "rematch started");
        Ok(next.id())
    }

    /// Closes the session and drops it from the registry. Both steps are
    /// idempotent.
    async fn teardown(&self, session: &GameSession, state: &mut SessionState, reason: CloseReason) {
        if state.close(reason) {
            info!(session_id = %session.id(), %reason, "session closed");
        }
        self.registry.remove(session.id()).await;
    }

    fn schedule_bot_if_due(self: &Arc<Self>, session: &Arc<GameSession>, state: &mut SessionState) {
        let Some(bot_seat) = session.bot_seat() else {
            return;
        };
        if state.phase != SessionPhase::Active || state.game.current_turn() != bot_seat {
            return;
        }

        let (inner, weak) = (Arc::downgrade(self), Arc::downgrade(session));
        cancel_slot(&mut state.bot_timer);
        state.bot_timer = Some(Timer::schedule(
            self.config.bot_move_delay,
            move |id| async move {
                if let Some((inner, session)) = upgrade(&inner, &weak) {
                    inner.play_bot_move(&session, id).await;
                }
            },
        ));
    }

    async fn play_bot_move(self: &Arc<Self>, session: &Arc<GameSession>, id: TimerId) {
        let mut state = session.lock().await;
        if !holds(&state.bot_timer, id) {
            debug!(session_id = %session.id(), timer = %id, "stale bot move timer");
            return;
        }
        state.bot_timer.take();

        let (Some(seat), Some(difficulty)) = (session.bot_seat(), session.bot_difficulty()) else {
            return;
        };
        if state.phase != SessionPhase::Active || state.game.current_turn() != seat {
            debug!(session_id = %session.id(), "bot move no longer due");
            return;
        }

        let Some(column) = dropfour_bot::select_move(state.game.board(), seat, difficulty) else {
            warn!(session_id = %session.id(), "bot found no legal column");
            return;
        };
        match self.play(session, &mut state, seat, column) {
            Ok((_, record)) => {
                drop(state);
                if let Some(record) = record {
                    self.persist(record);
                }
            }
            Err(err) => warn!(session_id = %session.id(), column, error = %err, "bot move rejected"),
        }
    }

    fn arm_post_game_timer(self: &Arc<Self>, session: &Arc<GameSession>, state: &mut SessionState) {
        let (inner, weak) = (Arc::downgrade(self), Arc::downgrade(session));
        cancel_slot(&mut state.post_game_timer);
        state.post_game_timer = Some(Timer::schedule(
            self.config.post_game_window,
            move |id| async move {
                if let Some((inner, session)) = upgrade(&inner, &weak) {
                    inner.expire_post_game_window(&session, id).await;
                }
            },
        ));
    }

    async fn expire_post_game_window(&self, session: &GameSession, id: TimerId) {
        let mut state = session.lock().await;
        if !holds(&state.post_game_timer, id) || state.phase != SessionPhase::PostGameWindow {
            debug!(session_id = %session.id(), timer = %id, "stale post-game timer");
            return;
        }
        state.post_game_timer.take();
        self.teardown(session, &mut state, CloseReason::WindowExpired)
            .await;
    }

    fn arm_rematch_timer(self: &Arc<Self>, session: &Arc<GameSession>, state: &mut SessionState) {
        let (inner, weak) = (Arc::downgrade(self), Arc::downgrade(session));
        cancel_slot(&mut state.rematch_timer);
        state.rematch_timer = Some(Timer::schedule(
            self.config.rematch_response_window,
            move |id| async move {
                if let Some((inner, session)) = upgrade(&inner, &weak) {
                    inner.expire_rematch_request(&session, id).await;
                }
            },
        ));
    }

    async fn expire_rematch_request(&self, session: &GameSession, id: TimerId) {
        let mut state = session.lock().await;
        if !holds(&state.rematch_timer, id) {
            debug!(session_id = %session.id(), timer = %id, "stale rematch timer");
            return;
        }
        state.rematch_timer.take();
        if !matches!(state.phase, SessionPhase::RematchPending { .. }) {
            return;
        }

        self.broadcast(
            session,
            GameEvent::RematchTimedOut {
                session_id: session.id(),
            },
        );
        info!(session_id = %session.id(), "rematch request timed out");
        self.teardown(session, &mut state, CloseReason::RematchTimedOut)
            .await;
    }

    fn persist(self: &Arc<Self>, record: FinishedGame) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let session_id = record.session_id;
            match inner.store.save_finished_game(record).await {
                Ok(()) => debug!(%session_id, "finished game persisted"),
                Err(err) => warn!(%session_id, error = %err, "failed to persist finished game"),
            }
        });
    }

    fn announce_start(&self, session: &GameSession, state: &SessionState) {
        for seat in [Seat::First, Seat::Second] {
            let me = session.player(seat);
            if me.is_bot() {
                continue;
            }
            self.notifier.send_to_player(
                me.id,
                GameEvent::GameStarted {
                    session_id: session.id(),
                    opponent: session.player(seat.other()).clone(),
                    seat,
                    turn: state.game.current_turn(),
                    board: *state.game.board(),
                },
            );
        }
    }

    fn announce_game_over(&self, session: &GameSession, state: &SessionState, rematch_offered: bool) {
        let Some((outcome, reason)) = state.result else {
            return;
        };
        self.broadcast(
            session,
            GameEvent::GameOver {
                session_id: session.id(),
                outcome,
                winner: outcome.winner().map(|seat| session.player(seat).id),
                reason,
                board: *state.game.board(),
                rematch_offered,
            },
        );
    }

    /// Sends `event` to every human in the session.
    fn broadcast(&self, session: &GameSession, event: GameEvent) {
        for player in session.humans() {
            self.notifier.send_to_player(player, event.clone());
        }
    }
}

fn upgrade<T, U>(a: &Weak<T>, b: &Weak<U>) -> Option<(Arc<T>, Arc<U>)> {
    Some((a.upgrade()?, b.upgrade()?))
}
