//! Chess rule engine. Pure functions over [`Board`]; no I/O and no locking.
//!
//! Castling, en passant and promotion are not part of this rule set.

pub mod attack;
pub mod board;
pub mod movegen;
pub mod rules;

pub use attack::{is_attacked, is_in_check, would_cause_check};
pub use board::{Board, Color, Piece, PieceKind, Square, BOARD_SIZE};
pub use movegen::{is_shape_move, legal_shape_moves};
pub use rules::{
    all_legal_moves, check_move, is_checkmate, is_stalemate, legal_moves_from, Move,
    MoveRejection, Verdict,
};
