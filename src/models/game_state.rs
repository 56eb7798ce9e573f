use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};
use crate::game::rules::{self, Move, MoveRejection, Verdict};
use crate::game::{Board, Color, Piece, Square};
use crate::models::bounded_log::BoundedLog;
use crate::models::connections::{ConnectionId, Role};
use crate::models::messages::{ChatEntry, GameSnapshot, LogEntry};

pub const MOVE_LOG_CAPACITY: usize = 10;
pub const CHAT_LOG_CAPACITY: usize = 20;

/// Name reported for the black seat until someone takes it
pub const WAITING_FOR_OPPONENT: &str = "Waiting for opponent...";
pub const SYSTEM_SENDER: &str = "System";

/// Opaque game identifier handed out on creation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn generate() -> Self {
        GameId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        GameId(id.to_string())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Game status. Everything but `InProgress` is terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    WhiteWins,
    BlackWins,
    Stalemate,
}

impl GameStatus {
    pub fn won_by(color: Color) -> Self {
        match color {
            Color::White => GameStatus::WhiteWins,
            Color::Black => GameStatus::BlackWins,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != GameStatus::InProgress
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::InProgress => "in_progress",
            GameStatus::WhiteWins => "white_wins",
            GameStatus::BlackWins => "black_wins",
            GameStatus::Stalemate => "stalemate",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an accepted move did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub mv: Move,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub verdict: Verdict,
}

/// One game's authoritative state plus the connections attached to it.
///
/// Mutated only through the methods below, always while the owning registry
/// entry's lock is held.
#[derive(Debug)]
pub struct GameSession {
    id: GameId,
    board: Board,
    turn: Color,
    status: GameStatus,
    messages: BoundedLog<LogEntry>,
    chat: BoundedLog<ChatEntry>,
    last_update: DateTime<Utc>,
    white_name: String,
    black_name: Option<String>,
    white_conn: Option<ConnectionId>,
    black_conn: Option<ConnectionId>,
    spectators: BTreeSet<ConnectionId>,
}

impl GameSession {
    pub fn new(id: GameId, creator_name: &str) -> Self {
        let mut session = GameSession {
            id,
            board: Board::standard(),
            turn: Color::White,
            status: GameStatus::InProgress,
            messages: BoundedLog::new(MOVE_LOG_CAPACITY),
            chat: BoundedLog::new(CHAT_LOG_CAPACITY),
            last_update: Utc::now(),
            white_name: creator_name.to_string(),
            black_name: None,
            white_conn: None,
            black_conn: None,
            spectators: BTreeSet::new(),
        };
        session.add_message(SYSTEM_SENDER, "Game created!");
        session.add_chat(SYSTEM_SENDER, "Chat enabled. Type messages below.");
        session
    }

    /// Builds a session around an arbitrary position, mainly for tests and tools.
    pub fn from_position(id: GameId, board: Board, turn: Color) -> Self {
        let mut session = GameSession::new(id, "White Player");
        session.board = board;
        session.turn = turn;
        session
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn white_name(&self) -> &str {
        &self.white_name
    }

    pub fn black_name(&self) -> Option<&str> {
        self.black_name.as_deref()
    }

    pub fn messages(&self) -> &BoundedLog<LogEntry> {
        &self.messages
    }

    pub fn chat(&self) -> &BoundedLog<ChatEntry> {
        &self.chat
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn seat_white(&mut self, conn: ConnectionId) {
        self.white_conn = Some(conn);
    }

    /// Hands the black seat to `name`. First come, first served.
    pub fn seat_black(&mut self, name: &str, conn: ConnectionId) -> SessionResult<()> {
        if self.black_name.is_some() {
            return Err(SessionError::SessionFull);
        }
        self.black_name = Some(name.to_string());
        self.black_conn = Some(conn);
        self.add_message(SYSTEM_SENDER, format!("{name} has joined as Black!"));
        self.add_chat(SYSTEM_SENDER, format!("{name} has joined the game."));
        Ok(())
    }

    pub fn add_spectator(&mut self, name: &str, conn: ConnectionId) {
        self.spectators.insert(conn);
        self.add_chat(SYSTEM_SENDER, format!("{name} is now spectating"));
    }

    /// Detaches `conn`, recording the departure in the logs.
    pub fn detach(&mut self, conn: ConnectionId, name: &str) -> Option<Role> {
        let role = self.role_of(conn)?;
        match role {
            Role::White => self.white_conn = None,
            Role::Black => self.black_conn = None,
            Role::Spectator => {
                self.spectators.remove(&conn);
            }
        }
        match role.color() {
            Some(color) => {
                let text = format!("{name} ({}) has left the game", color.title());
                self.add_message(SYSTEM_SENDER, text.clone());
                self.add_chat(SYSTEM_SENDER, text);
            }
            None => self.add_chat(SYSTEM_SENDER, format!("{name} has stopped spectating")),
        }
        Some(role)
    }

    pub fn role_of(&self, conn: ConnectionId) -> Option<Role> {
        if self.white_conn == Some(conn) {
            Some(Role::White)
        } else if self.black_conn == Some(conn) {
            Some(Role::Black)
        } else if self.spectators.contains(&conn) {
            Some(Role::Spectator)
        } else {
            None
        }
    }

    pub fn player_connection(&self, color: Color) -> Option<ConnectionId> {
        match color {
            Color::White => self.white_conn,
            Color::Black => self.black_conn,
        }
    }

    pub fn spectators(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.spectators.iter().copied()
    }

    pub fn spectator_count(&self) -> usize {
        self.spectators.len()
    }

    /// White, then black, then spectators.
    pub fn attached(&self) -> Vec<ConnectionId> {
        self.white_conn
            .into_iter()
            .chain(self.black_conn)
            .chain(self.spectators.iter().copied())
            .collect()
    }

    /// True once no socket at all is attached.
    pub fn is_abandoned(&self) -> bool {
        self.white_conn.is_none() && self.black_conn.is_none() && self.spectators.is_empty()
    }

    /// Validates and plays a move for `mover`, then settles check, mate and
    /// stalemate for the side now to move. A rejected move changes nothing.
    pub fn apply_move(
        &mut self,
        from: [i32; 2],
        to: [i32; 2],
        mover: Color,
    ) -> SessionResult<MoveRecord> {
        if self.status.is_terminal() {
            return Err(SessionError::GameOver(self.status));
        }
        let mv = rules::check_move_coords(&self.board, self.turn, mover, from, to)?;
        let piece = self.board.get(mv.from).ok_or(MoveRejection::EmptySquare)?;

        let captured = self.board.move_piece(mv.from, mv.to);
        let mut text = format!("{piece} moved from {} to {}", mv.from, mv.to);
        if let Some(captured) = captured {
            text.push_str(&format!(", capturing {captured}"));
        }
        self.add_message(SYSTEM_SENDER, text);

        self.turn = mover.opponent();
        let verdict = rules::evaluate(&self.board, self.turn);
        match verdict {
            Verdict::Checkmate => {
                self.status = GameStatus::won_by(mover);
                self.add_message(SYSTEM_SENDER, format!("Checkmate! {} wins!", mover.title()));
                self.add_chat(SYSTEM_SENDER, "Game has ended.");
            }
            Verdict::Check => {
                self.add_message(SYSTEM_SENDER, format!("{} is in check!", self.turn.title()));
            }
            Verdict::Stalemate => {
                self.status = GameStatus::Stalemate;
                self.add_message(SYSTEM_SENDER, "Stalemate! The game is a draw.");
                self.add_chat(SYSTEM_SENDER, "Game has ended.");
            }
            Verdict::Ongoing => {}
        }

        Ok(MoveRecord {
            mv,
            piece,
            captured,
            verdict,
        })
    }

    /// Legal destinations for the piece on `square`, whoever's turn it is.
    pub fn legal_moves_from(&self, square: [i32; 2]) -> SessionResult<Vec<Square>> {
        let from = Square::new(square[0], square[1]).ok_or(MoveRejection::OutOfBounds)?;
        Ok(rules::legal_moves_from(&self.board, from))
    }

    pub fn add_message(&mut self, sender: &str, text: impl Into<String>) {
        self.messages.push(LogEntry {
            sender: sender.to_string(),
            text: text.into(),
        });
        self.last_update = Utc::now();
    }

    pub fn add_chat(&mut self, sender: &str, text: impl Into<String>) {
        let now = Utc::now();
        self.chat.push(ChatEntry {
            sender: sender.to_string(),
            text: text.into(),
            timestamp: now,
        });
        self.last_update = now;
    }

    /// Chat line from an attached connection. Spectators are tagged as such.
    pub fn add_player_chat(&mut self, role: Role, name: &str, text: &str) {
        let sender = match role {
            Role::Spectator => format!("[Spectator] {name}"),
            Role::White | Role::Black => name.to_string(),
        };
        self.add_chat(&sender, text);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game_id: self.id.clone(),
            board: self.board.clone(),
            turn: self.turn,
            status: self.status,
            messages: self.messages.iter().cloned().collect(),
            chat_messages: self.chat.iter().cloned().collect(),
            last_update: self.last_update,
            white_player_name: self.white_name.clone(),
            black_player_name: self
                .black_name
                .clone()
                .unwrap_or_else(|| WAITING_FOR_OPPONENT.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PieceKind, Square};

    fn sq(row: i32, col: i32) -> Square {
        Square::new(row, col).unwrap()
    }

    fn new_session() -> GameSession {
        GameSession::new(GameId::from("game-1"), "Alice")
    }

    #[test]
    fn fresh_session() {
        let session = new_session();
        assert_eq!(session.turn(), Color::White);
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.board(), &Board::standard());
        assert_eq!(session.board().piece_count(), 32);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.chat().len(), 1);
        assert!(session.is_abandoned());

        let snapshot = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(snapshot["game_id"], "game-1");
        assert_eq!(snapshot["turn"], "white");
        assert_eq!(snapshot["status"], "in_progress");
        assert_eq!(snapshot["white_player_name"], "Alice");
        assert_eq!(snapshot["black_player_name"], WAITING_FOR_OPPONENT);
        assert!(snapshot["last_update"].is_f64());
        assert!(snapshot["chat_messages"][0]["timestamp"].is_f64());
    }

    #[test]
    fn turn_alternates_with_accepted_moves() {
        let mut session = new_session();
        let moves = [
            ([6, 4], [4, 4]),
            ([1, 4], [3, 4]),
            ([7, 6], [5, 5]),
            ([0, 1], [2, 2]),
            ([7, 5], [4, 2]),
        ];
        for (n, (from, to)) in moves.into_iter().enumerate() {
            let mover = session.turn();
            session.apply_move(from, to, mover).unwrap();
            let played = n + 1;
            assert_eq!(session.turn() == Color::White, played % 2 == 0);
        }
        assert_eq!(
            session.messages().last().unwrap().text,
            "white bishop moved from (7,5) to (4,2)"
        );
    }

    #[test]
    fn rejected_move_changes_nothing() {
        let mut session = new_session();
        let before = session.board().clone();

        assert_eq!(
            session.apply_move([1, 4], [3, 4], Color::Black),
            Err(SessionError::NotYourTurn)
        );
        assert_eq!(
            session.apply_move([6, 4], [3, 4], Color::White),
            Err(SessionError::InvalidMove(MoveRejection::IllegalShape))
        );
        assert_eq!(
            session.apply_move([6, 4], [9, 4], Color::White),
            Err(SessionError::InvalidMove(MoveRejection::OutOfBounds))
        );
        assert_eq!(session.board(), &before);
        assert_eq!(session.turn(), Color::White);
    }

    #[test]
    fn move_into_check_is_refused_with_its_own_reason() {
        let board = Board::with_pieces([
            (sq(7, 4), Piece::new(PieceKind::King, Color::White)),
            (sq(6, 4), Piece::new(PieceKind::Bishop, Color::White)),
            (sq(2, 4), Piece::new(PieceKind::Rook, Color::Black)),
            (sq(0, 0), Piece::new(PieceKind::King, Color::Black)),
        ]);
        let mut session =
            GameSession::from_position(GameId::from("pin"), board.clone(), Color::White);
        assert_eq!(
            session.apply_move([6, 4], [5, 5], Color::White),
            Err(SessionError::MoveLeavesKingInCheck)
        );
        assert_eq!(session.board(), &board);
        assert_eq!(session.turn(), Color::White);
    }

    #[test]
    fn fools_mate_ends_the_game() {
        let mut session = new_session();
        session.apply_move([6, 5], [5, 5], Color::White).unwrap();
        session.apply_move([1, 4], [3, 4], Color::Black).unwrap();
        session.apply_move([6, 6], [4, 6], Color::White).unwrap();
        assert_eq!(session.status(), GameStatus::InProgress);

        let record = session.apply_move([0, 3], [4, 7], Color::Black).unwrap();
        assert_eq!(record.verdict, Verdict::Checkmate);
        assert_eq!(session.status(), GameStatus::BlackWins);
        assert_eq!(session.messages().last().unwrap().text, "Checkmate! Black wins!");

        assert_eq!(
            session.apply_move([6, 0], [5, 0], Color::White),
            Err(SessionError::GameOver(GameStatus::BlackWins))
        );
    }

    #[test]
    fn check_is_logged_but_game_goes_on() {
        let mut session = new_session();
        for (from, to) in [([6, 4], [4, 4]), ([1, 5], [2, 5]), ([7, 3], [3, 7])] {
            let mover = session.turn();
            session.apply_move(from, to, mover).unwrap();
        }
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.messages().last().unwrap().text, "Black is in check!");
    }

    #[test]
    fn stalemate_with_lone_king() {
        let board = Board::with_pieces([
            (sq(0, 0), Piece::new(PieceKind::King, Color::Black)),
            (sq(3, 1), Piece::new(PieceKind::Queen, Color::White)),
            (sq(7, 7), Piece::new(PieceKind::King, Color::White)),
        ]);
        let mut session = GameSession::from_position(GameId::from("stale"), board, Color::White);
        let record = session.apply_move([3, 1], [2, 1], Color::White).unwrap();
        assert_eq!(record.verdict, Verdict::Stalemate);
        assert_eq!(session.status(), GameStatus::Stalemate);
    }

    #[test]
    fn capture_is_recorded() {
        let mut session = new_session();
        for (from, to) in [([6, 4], [4, 4]), ([1, 3], [3, 3])] {
            let mover = session.turn();
            session.apply_move(from, to, mover).unwrap();
        }
        let record = session.apply_move([4, 4], [3, 3], Color::White).unwrap();
        assert_eq!(record.captured, Some(Piece::new(PieceKind::Pawn, Color::Black)));
        assert_eq!(
            session.messages().last().unwrap().text,
            "white pawn moved from (4,4) to (3,3), capturing black pawn"
        );
        assert_eq!(session.board().piece_count(), 31);
    }

    #[test]
    fn logs_are_bounded() {
        let mut session = new_session();
        for i in 0..30 {
            session.add_message("System", format!("m{i}"));
            session.add_chat("Bob", format!("c{i}"));
        }
        assert_eq!(session.messages().len(), MOVE_LOG_CAPACITY);
        assert_eq!(session.chat().len(), CHAT_LOG_CAPACITY);
        assert_eq!(session.messages().iter().next().unwrap().text, "m20");
        assert_eq!(session.chat().iter().next().unwrap().text, "c10");
    }

    #[test]
    fn seats_and_departures() {
        let mut session = new_session();
        let white = ConnectionId::new();
        let black = ConnectionId::new();
        let watcher = ConnectionId::new();

        session.seat_white(white);
        session.seat_black("Bob", black).unwrap();
        assert_eq!(
            session.seat_black("Carol", ConnectionId::new()),
            Err(SessionError::SessionFull)
        );
        session.add_spectator("Dave", watcher);
        assert_eq!(session.attached(), vec![white, black, watcher]);
        assert_eq!(session.role_of(watcher), Some(Role::Spectator));

        session.add_player_chat(Role::Spectator, "Dave", "hi");
        assert_eq!(session.chat().last().unwrap().sender, "[Spectator] Dave");

        assert_eq!(session.detach(black, "Bob"), Some(Role::Black));
        assert_eq!(session.messages().last().unwrap().text, "Bob (Black) has left the game");
        assert_eq!(session.detach(black, "Bob"), None);
        assert_eq!(session.detach(watcher, "Dave"), Some(Role::Spectator));
        assert!(!session.is_abandoned());
        assert_eq!(session.detach(white, "Alice"), Some(Role::White));
        assert!(session.is_abandoned());
        // The seat stays taken once named.
        assert_eq!(session.black_name(), Some("Bob"));
    }
}
