use log::info;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{SessionError, SessionResult};
use crate::models::connections::{ConnectionId, Role};
use crate::models::game_state::{GameId, GameSession};
use crate::models::messages::SessionSummary;

/// A session behind its own lock
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Result of detaching a connection from its session
pub struct Departure {
    pub role: Role,
    /// The session, or `None` when this was the last attached socket and the
    /// session has been dropped from the registry.
    pub session: Option<SharedSession>,
}

/// All live sessions, keyed by id.
///
/// The registry lock covers the map; each session has its own lock so moves in
/// different games do not serialise on each other. When both are needed the
/// registry lock is taken first.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<GameId, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    /// Creates a session with `creator` seated as white.
    pub fn create_session(&self, creator: &str, conn: ConnectionId) -> (GameId, SharedSession) {
        let mut sessions = self.sessions.lock();
        let mut id = GameId::generate();
        while sessions.contains_key(&id) {
            id = GameId::generate();
        }

        let mut session = GameSession::new(id.clone(), creator);
        session.seat_white(conn);
        let session = Arc::new(Mutex::new(session));
        sessions.insert(id.clone(), Arc::clone(&session));
        info!("Game {} created by {} ({} live)", id, creator, sessions.len());
        (id, session)
    }

    /// Seats `name` as black.
    pub fn join_session(
        &self,
        id: &GameId,
        name: &str,
        conn: ConnectionId,
    ) -> SessionResult<SharedSession> {
        let sessions = self.sessions.lock();
        let session = sessions.get(id).ok_or(SessionError::SessionNotFound)?;
        session.lock().seat_black(name, conn)?;
        info!("Player {} joined game {} as black", name, id);
        Ok(Arc::clone(session))
    }

    /// Adds a spectator. There is no limit on their number.
    pub fn spectate(
        &self,
        id: &GameId,
        name: &str,
        conn: ConnectionId,
    ) -> SessionResult<SharedSession> {
        let sessions = self.sessions.lock();
        let session = sessions.get(id).ok_or(SessionError::SessionNotFound)?;
        session.lock().add_spectator(name, conn);
        info!("{} is spectating game {}", name, id);
        Ok(Arc::clone(session))
    }

    pub fn lookup(&self, id: &GameId) -> SessionResult<SharedSession> {
        self.sessions
            .lock()
            .get(id)
            .cloned()
            .ok_or(SessionError::SessionNotFound)
    }

    /// Detaches `conn` from session `id`; the session is dropped once nothing
    /// is attached to it any more.
    pub fn remove_connection(
        &self,
        id: &GameId,
        conn: ConnectionId,
        name: &str,
    ) -> Option<Departure> {
        let mut sessions = self.sessions.lock();
        let session = Arc::clone(sessions.get(id)?);
        let mut guard = session.lock();
        let role = guard.detach(conn, name)?;

        if guard.is_abandoned() {
            drop(guard);
            sessions.remove(id);
            info!("Game {} removed as all connections left ({} live)", id, sessions.len());
            return Some(Departure {
                role,
                session: None,
            });
        }

        drop(guard);
        Some(Departure {
            role,
            session: Some(session),
        })
    }

    pub fn contains(&self, id: &GameId) -> bool {
        self.sessions.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lobby listing, sorted by game id.
    pub fn summaries(&self) -> Vec<SessionSummary> {
        let sessions: Vec<SharedSession> = self.sessions.lock().values().cloned().collect();
        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .map(|session| {
                let session = session.lock();
                SessionSummary {
                    game_id: session.id().clone(),
                    white_player_name: session.white_name().to_string(),
                    black_player_name: session.black_name().map(str::to_string),
                    status: session.status(),
                    spectators: session.spectator_count(),
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        summaries
    }
}
