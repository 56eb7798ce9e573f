//! Move legality and terminal-state evaluation.

use serde::Serialize;
use thiserror::Error;

use super::attack::{is_in_check, would_cause_check};
use super::board::{Board, Color, Square};
use super::movegen::{is_shape_move, legal_shape_moves};

/// A from/to pair
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

/// Why a requested move was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("Square is off the board")]
    OutOfBounds,

    #[error("No piece at that square")]
    EmptySquare,

    #[error("Invalid piece selection")]
    NotYourPiece,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Cannot capture your own piece")]
    OwnPieceAtDestination,

    #[error("That piece cannot move there")]
    IllegalShape,

    #[error("Invalid move: would leave your king in check")]
    LeavesKingInCheck,
}

/// Outcome of looking at the side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ongoing,
    Check,
    Checkmate,
    Stalemate,
}

/// Validates a move for `mover` when it is `turn`'s move.
pub fn check_move(
    board: &Board,
    turn: Color,
    mover: Color,
    from: Square,
    to: Square,
) -> Result<(), MoveRejection> {
    if mover != turn {
        return Err(MoveRejection::NotYourTurn);
    }
    let piece = board.get(from).ok_or(MoveRejection::EmptySquare)?;
    if piece.color != mover {
        return Err(MoveRejection::NotYourPiece);
    }
    if matches!(board.get(to), Some(target) if target.color == mover) {
        return Err(MoveRejection::OwnPieceAtDestination);
    }
    if !is_shape_move(board, from, to) {
        return Err(MoveRejection::IllegalShape);
    }
    if would_cause_check(board, from, to, mover) {
        return Err(MoveRejection::LeavesKingInCheck);
    }
    Ok(())
}

/// Same as [`check_move`] but from raw `[row, col]` coordinates.
pub fn check_move_coords(
    board: &Board,
    turn: Color,
    mover: Color,
    from: [i32; 2],
    to: [i32; 2],
) -> Result<Move, MoveRejection> {
    if mover != turn {
        return Err(MoveRejection::NotYourTurn);
    }
    let from = Square::new(from[0], from[1]).ok_or(MoveRejection::OutOfBounds)?;
    let to = Square::new(to[0], to[1]).ok_or(MoveRejection::OutOfBounds)?;
    check_move(board, turn, mover, from, to)?;
    Ok(Move { from, to })
}

/// Destinations of the piece on `from` that keep its own king safe.
pub fn legal_moves_from(board: &Board, from: Square) -> Vec<Square> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };
    legal_shape_moves(board, from)
        .into_iter()
        .filter(|to| !would_cause_check(board, from, *to, piece.color))
        .collect()
}

/// Every legal move available to `color`.
pub fn all_legal_moves(board: &Board, color: Color) -> Vec<Move> {
    board
        .pieces(color)
        .flat_map(|(from, _)| {
            legal_moves_from(board, from)
                .into_iter()
                .map(move |to| Move { from, to })
        })
        .collect()
}

/// Short-circuiting form of `!all_legal_moves(..).is_empty()`.
pub fn has_legal_move(board: &Board, color: Color) -> bool {
    board.pieces(color).any(|(from, _)| {
        legal_shape_moves(board, from)
            .into_iter()
            .any(|to| !would_cause_check(board, from, to, color))
    })
}

pub fn is_checkmate(board: &Board, color: Color) -> bool {
    is_in_check(board, color) && !has_legal_move(board, color)
}

pub fn is_stalemate(board: &Board, color: Color) -> bool {
    !is_in_check(board, color) && !has_legal_move(board, color)
}

/// Classifies the position for the side about to move.
pub fn evaluate(board: &Board, to_move: Color) -> Verdict {
    let in_check = is_in_check(board, to_move);
    match (in_check, has_legal_move(board, to_move)) {
        (true, false) => Verdict::Checkmate,
        (true, true) => Verdict::Check,
        (false, false) => Verdict::Stalemate,
        (false, true) => Verdict::Ongoing,
    }
}
