//! Conversation sessions.
//!
//! A [`Session`] owns one conversation's history and allows at most one turn
//! in flight. The [`SessionStore`] maps session IDs to sessions for the HTTP
//! server; the [`Orchestrator`] runs turns against a session.

pub mod intent;
pub mod orchestrator;

pub use intent::Intent;
pub use orchestrator::{Orchestrator, TurnEvent, TurnSettings};

use crate::core::History;
use crate::error::{Result, SessionError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

/// Minutes a session may sit idle before it is evicted.
pub const DEFAULT_IDLE_MINUTES: u64 = 30;

/// [`DEFAULT_IDLE_MINUTES`] as a duration.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(DEFAULT_IDLE_MINUTES * 60);

/// The turn currently awaiting a response.
#[derive(Debug)]
struct InFlight {
    turn_id: u64,
    abort: Option<AbortHandle>,
}

#[derive(Debug)]
struct SessionState {
    history: History,
    topics: Vec<String>,
    awaiting_answer: bool,
    in_flight: Option<InFlight>,
    next_turn: u64,
    last_active: Instant,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            history: History::default(),
            topics: Vec::new(),
            awaiting_answer: false,
            in_flight: None,
            next_turn: 0,
            last_active: Instant::now(),
        }
    }
}

/// What a turn sees of its session when it starts.
#[derive(Debug, Clone)]
pub struct TurnTicket {
    /// Identifies the turn within its session.
    pub turn_id: u64,
    /// History before the turn.
    pub history: History,
    /// Topics chosen by earlier question turns.
    pub topics: Vec<String>,
    /// Whether the last completed turn asked a question.
    pub awaiting_answer: bool,
}

/// Serializable view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Session ID.
    pub id: Uuid,
    /// Practice topics.
    pub topics: Vec<String>,
    /// Whether a turn is in flight.
    pub busy: bool,
    /// Completed turns.
    pub history: History,
}

/// One conversation.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    state: Mutex<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates an empty session with a random ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Session ID.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the completed history.
    #[must_use]
    pub fn history(&self) -> History {
        self.state().history.clone()
    }

    /// Current practice topics.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.state().topics.clone()
    }

    /// Whether a turn is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state().in_flight.is_some()
    }

    /// Time since the session was last used.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.state().last_active.elapsed()
    }

    /// Marks the session as used now.
    pub fn touch(&self) {
        self.state().last_active = Instant::now();
    }

    /// Serializable view of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            id: self.id,
            topics: state.topics.clone(),
            busy: state.in_flight.is_some(),
            history: state.history.clone(),
        }
    }

    /// Marks a new turn in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] if a turn is already in flight.
    pub fn begin_turn(&self) -> Result<TurnTicket> {
        let mut state = self.state();
        if state.in_flight.is_some() {
            return Err(SessionError::Busy.into());
        }
        state.next_turn += 1;
        state.last_active = Instant::now();
        let turn_id = state.next_turn;
        state.in_flight = Some(InFlight {
            turn_id,
            abort: None,
        });
        Ok(TurnTicket {
            turn_id,
            history: state.history.clone(),
            topics: state.topics.clone(),
            awaiting_answer: state.awaiting_answer,
        })
    }

    /// Registers the task running `turn_id` so it can be aborted. If the turn
    /// was already cancelled, the task is aborted immediately.
    pub fn attach_abort(&self, turn_id: u64, handle: AbortHandle) {
        let mut state = self.state();
        if let Some(in_flight) = state.in_flight.as_mut()
            && in_flight.turn_id == turn_id
        {
            in_flight.abort = Some(handle);
            return;
        }
        drop(state);
        handle.abort();
    }

    /// Appends a completed exchange and ends the turn.
    ///
    /// Returns `false`, leaving history unchanged, if `turn_id` is no longer
    /// the turn in flight.
    pub fn commit(
        &self,
        turn_id: u64,
        intent: &Intent,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) -> bool {
        let mut state = self.state();
        if !state
            .in_flight
            .as_ref()
            .is_some_and(|f| f.turn_id == turn_id)
        {
            return false;
        }

        state.history.push_exchange(user, assistant);
        if let Intent::Ask { topics } = intent
            && !topics.is_empty()
        {
            state.topics.clone_from(topics);
        }
        state.awaiting_answer = matches!(intent, Intent::Ask { .. });
        state.in_flight = None;
        state.last_active = Instant::now();
        true
    }

    /// Ends `turn_id` without touching history. No-op if another turn (or
    /// none) is in flight.
    pub fn finish(&self, turn_id: u64) {
        let mut state = self.state();
        if state
            .in_flight
            .as_ref()
            .is_some_and(|f| f.turn_id == turn_id)
        {
            state.in_flight = None;
            state.last_active = Instant::now();
        }
    }

    /// Aborts the turn in flight, if any. Returns whether one was cancelled.
    pub fn cancel(&self) -> bool {
        let Some(in_flight) = self.state().in_flight.take() else {
            return false;
        };
        if let Some(abort) = in_flight.abort {
            abort.abort();
        }
        debug!(session = %self.id, turn = in_flight.turn_id, "cancelled turn");
        true
    }

    /// Cancels any turn in flight and clears history and topics.
    pub fn reset(&self) {
        self.cancel();
        let mut state = self.state();
        state.history.clear();
        state.topics.clear();
        state.awaiting_answer = false;
        state.last_active = Instant::now();
    }
}

/// Clears a turn's in-flight marker when dropped, however the turn ends.
#[derive(Debug)]
pub struct TurnGuard {
    session: Arc<Session>,
    turn_id: u64,
}

impl TurnGuard {
    /// Guards `turn_id` on `session`.
    #[must_use]
    pub const fn new(session: Arc<Session>, turn_id: u64) -> Self {
        Self { session, turn_id }
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.session.finish(self.turn_id);
    }
}

/// All live sessions, keyed by ID.
///
/// Sessions idle for longer than the idle timeout with no turn in flight
/// are evicted by [`SessionStore::evict_idle`], which also runs on every
/// [`SessionStore::create`].
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            sessions: RwLock::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long a session may stay idle before eviction.
    #[must_use]
    pub const fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Idle time after which sessions are evicted.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Drops sessions idle for at least the idle timeout. Busy sessions are
    /// kept. Returns how many were evicted.
    pub fn evict_idle(&self) -> usize {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session.is_busy() || session.idle_for() < self.idle_timeout;
            if !keep {
                debug!(session = %id, "evicted idle session");
            }
            keep
        });
        before - sessions.len()
    }

    /// Creates and registers a new session.
    pub fn create(&self) -> Arc<Session> {
        self.evict_idle();
        let session = Arc::new(Session::new());
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id(), Arc::clone(&session));
        debug!(session = %session.id(), "created session");
        session
    }

    /// Looks up a session by its string ID and marks it used.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the ID is malformed or unknown.
    pub fn get(&self, id: &str) -> Result<Arc<Session>> {
        let uuid = parse_id(id)?;
        let session = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&uuid)
            .cloned()
            .ok_or_else(|| not_found(id))?;
        session.touch();
        Ok(session)
    }

    /// Removes a session, cancelling any turn in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the ID is malformed or unknown.
    pub fn remove(&self, id: &str) -> Result<Arc<Session>> {
        let uuid = parse_id(id)?;
        let session = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&uuid)
            .ok_or_else(|| not_found(id))?;
        session.cancel();
        debug!(session = %uuid, "removed session");
        Ok(session)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| not_found(id).into())
}

fn not_found(id: &str) -> SessionError {
    SessionError::NotFound { id: id.to_string() }
}
