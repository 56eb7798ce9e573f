//! Error types for the session server

use thiserror::Error;

use crate::game::MoveRejection;
use crate::models::GameStatus;

/// Domain errors. They never end a connection; the `Display` text is what the
/// requesting client receives in an `error` message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Game not found")]
    SessionNotFound,

    #[error("Game is full")]
    SessionFull,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("{0}")]
    InvalidMove(MoveRejection),

    #[error("Invalid move: would leave your king in check")]
    MoveLeavesKingInCheck,

    #[error("Game is over: {0}")]
    GameOver(GameStatus),

    #[error("You are not playing in this game")]
    NotAPlayer,

    #[error("You are not part of this game")]
    NotInGame,

    #[error("You are already in this game")]
    AlreadyJoined,
}

impl From<MoveRejection> for SessionError {
    fn from(rejection: MoveRejection) -> Self {
        match rejection {
            MoveRejection::NotYourTurn => SessionError::NotYourTurn,
            MoveRejection::LeavesKingInCheck => SessionError::MoveLeavesKingInCheck,
            other => SessionError::InvalidMove(other),
        }
    }
}

/// Invalid server configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
