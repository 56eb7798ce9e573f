use actix::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

use crate::game::{Board, Color, Square};
use crate::models::connections::Role;
use crate::models::game_state::{GameId, GameStatus};

fn default_player_name() -> String {
    "Player".to_string()
}

fn default_spectator_name() -> String {
    "Spectator".to_string()
}

/// Message sent from client to server, tagged by its `type` field
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateGame {
        #[serde(default = "default_player_name")]
        player_name: String,
    },
    JoinGame {
        game_id: GameId,
        #[serde(default = "default_player_name")]
        player_name: String,
    },
    SpectateGame {
        game_id: GameId,
        #[serde(default = "default_spectator_name")]
        player_name: String,
    },
    MakeMove {
        game_id: GameId,
        from_pos: [i32; 2],
        to_pos: [i32; 2],
    },
    ChatMessage {
        game_id: GameId,
        #[serde(default)]
        text: String,
    },
    RequestState {
        game_id: GameId,
    },
    GetMoves {
        game_id: GameId,
        square: [i32; 2],
    },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::CreateGame { .. } => "create_game",
            ClientMessage::JoinGame { .. } => "join_game",
            ClientMessage::SpectateGame { .. } => "spectate_game",
            ClientMessage::MakeMove { .. } => "make_move",
            ClientMessage::ChatMessage { .. } => "chat_message",
            ClientMessage::RequestState { .. } => "request_state",
            ClientMessage::GetMoves { .. } => "get_moves",
        }
    }
}

/// Message sent from server to client
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameCreated {
        game_id: GameId,
        player_color: Role,
        game_state: GameSnapshot,
    },
    GameJoined {
        game_id: GameId,
        player_color: Role,
        game_state: GameSnapshot,
    },
    GameSpectating {
        game_id: GameId,
        player_color: Role,
        game_state: GameSnapshot,
    },
    GameStateUpdate {
        game_state: GameSnapshot,
    },
    OpponentJoined {
        opponent_name: String,
        game_state: GameSnapshot,
    },
    OpponentLeft {
        opponent_color: Color,
        game_state: GameSnapshot,
    },
    AvailableMoves {
        game_id: GameId,
        square: [i32; 2],
        moves: Vec<Square>,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl ToString) -> Self {
        ServerMessage::Error {
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::GameCreated { .. } => "game_created",
            ServerMessage::GameJoined { .. } => "game_joined",
            ServerMessage::GameSpectating { .. } => "game_spectating",
            ServerMessage::GameStateUpdate { .. } => "game_state_update",
            ServerMessage::OpponentJoined { .. } => "opponent_joined",
            ServerMessage::OpponentLeft { .. } => "opponent_left",
            ServerMessage::AvailableMoves { .. } => "available_moves",
            ServerMessage::Error { .. } => "error",
        }
    }
}

/// Move-log line
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub sender: String,
    pub text: String,
}

/// Chat line
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub sender: String,
    pub text: String,
    #[serde(serialize_with = "epoch_seconds")]
    pub timestamp: DateTime<Utc>,
}

/// Full state of one game as pushed to every attached connection
#[derive(Serialize, Debug, Clone)]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub board: Board,
    pub turn: Color,
    pub status: GameStatus,
    pub messages: Vec<LogEntry>,
    pub chat_messages: Vec<ChatEntry>,
    #[serde(serialize_with = "epoch_seconds")]
    pub last_update: DateTime<Utc>,
    pub white_player_name: String,
    pub black_player_name: String,
}

/// Lobby view of a live game
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub game_id: GameId,
    pub white_player_name: String,
    pub black_player_name: Option<String>,
    pub status: GameStatus,
    pub spectators: usize,
}

/// Unix time in fractional seconds
pub fn to_epoch_seconds(at: &DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

fn epoch_seconds<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(to_epoch_seconds(at))
}

/// Serialised frame on its way to one connection actor
#[derive(Message)]
#[rtype(result = "()")]
pub struct Deliver(pub Arc<str>);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_every_inbound_kind() {
        let cases = [
            (json!({"type": "create_game", "player_name": "Ann"}), "create_game"),
            (json!({"type": "join_game", "game_id": "g", "player_name": "Bo"}), "join_game"),
            (json!({"type": "spectate_game", "game_id": "g"}), "spectate_game"),
            (
                json!({"type": "make_move", "game_id": "g", "from_pos": [6, 4], "to_pos": [4, 4]}),
                "make_move",
            ),
            (json!({"type": "chat_message", "game_id": "g", "text": "hi"}), "chat_message"),
            (json!({"type": "request_state", "game_id": "g"}), "request_state"),
            (json!({"type": "get_moves", "game_id": "g", "square": [7, 1]}), "get_moves"),
        ];
        for (value, kind) in cases {
            let message: ClientMessage = serde_json::from_value(value).unwrap();
            assert_eq!(message.kind(), kind);
        }
    }

    #[test]
    fn names_default_when_missing() {
        let message: ClientMessage = serde_json::from_str(r#"{"type":"create_game"}"#).unwrap();
        assert_eq!(
            message,
            ClientMessage::CreateGame {
                player_name: "Player".to_string()
            }
        );
        let message: ClientMessage =
            serde_json::from_str(r#"{"type":"spectate_game","game_id":"g"}"#).unwrap();
        assert_eq!(
            message,
            ClientMessage::SpectateGame {
                game_id: GameId::from("g"),
                player_name: "Spectator".to_string()
            }
        );
    }

    #[test]
    fn unknown_or_incomplete_messages_are_rejected() {
        let unknown = r#"{"type":"resign","game_id":"g"}"#;
        assert!(serde_json::from_str::<ClientMessage>(unknown).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"join_game"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"game_id":"g"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[test]
    fn outbound_messages_are_tagged() {
        let value = serde_json::to_value(ServerMessage::error("Game not found")).unwrap();
        assert_eq!(value, json!({"type": "error", "message": "Game not found"}));

        let value = serde_json::to_value(ServerMessage::AvailableMoves {
            game_id: GameId::from("g"),
            square: [6, 0],
            moves: vec![Square::new(5, 0).unwrap()],
        })
        .unwrap();
        assert_eq!(value["type"], "available_moves");
        assert_eq!(value["moves"], json!([[5, 0]]));
    }
}
