//! Attack detection and check evaluation.
//!
//! Attacks are found by looking outward from the target square: pawn
//! diagonals, knight jumps, king adjacency and the eight sliding rays.

use super::board::{Board, Color, PieceKind, Square};
use super::movegen::{BISHOP_DIRECTIONS, KING_OFFSETS, KNIGHT_OFFSETS, ROOK_DIRECTIONS};

/// Check whether `square` is attacked by any piece of `by_color`.
pub fn is_attacked(board: &Board, square: Square, by_color: Color) -> bool {
    let holds = |target: Option<Square>, kind: PieceKind| {
        target
            .and_then(|s| board.get(s))
            .map_or(false, |p| p.kind == kind && p.color == by_color)
    };

    // An attacking pawn sits one row behind the target from its own point of view.
    let pawn_row = -by_color.pawn_direction();
    if [-1, 1]
        .iter()
        .any(|&dc| holds(square.offset(pawn_row, dc), PieceKind::Pawn))
    {
        return true;
    }

    if KNIGHT_OFFSETS
        .iter()
        .any(|&(dr, dc)| holds(square.offset(dr, dc), PieceKind::Knight))
    {
        return true;
    }

    if KING_OFFSETS
        .iter()
        .any(|&(dr, dc)| holds(square.offset(dr, dc), PieceKind::King))
    {
        return true;
    }

    ray_attacked(board, square, by_color, &ROOK_DIRECTIONS, PieceKind::Rook)
        || ray_attacked(board, square, by_color, &BISHOP_DIRECTIONS, PieceKind::Bishop)
}

/// Walks each ray until the first occupant, which attacks only if it is ours
/// and moves along that kind of ray (or is a queen).
fn ray_attacked(
    board: &Board,
    square: Square,
    by_color: Color,
    directions: &[(i8, i8)],
    slider: PieceKind,
) -> bool {
    for &(dr, dc) in directions {
        let mut current = square;
        while let Some(next) = current.offset(dr, dc) {
            if let Some(piece) = board.get(next) {
                let matches_ray = piece.kind == slider || piece.kind == PieceKind::Queen;
                if piece.color == by_color && matches_ray {
                    return true;
                }
                break;
            }
            current = next;
        }
    }
    false
}

/// Is the king of `color` attacked by the other side.
///
/// A board without that king reports `false`.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    match board.find_king(color) {
        Some(king) => is_attacked(board, king, color.opponent()),
        None => false,
    }
}

/// Would moving `from` -> `to` leave (or put) the king of `color` in check.
///
/// The move is played on a scratch copy; `board` is never touched.
pub fn would_cause_check(board: &Board, from: Square, to: Square, color: Color) -> bool {
    let mut scratch = board.clone();
    scratch.move_piece(from, to);
    is_in_check(&scratch, color)
}
