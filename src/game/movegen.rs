//! Geometric move generation.
//!
//! Destinations follow each piece's movement rule and board occupancy only;
//! whether the move exposes the mover's king is decided in `rules`.

use super::board::{Board, Color, PieceKind, Square};

pub(crate) const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];
pub(crate) const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];
pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Every destination reachable by the piece on `from`, ignoring self-check.
///
/// Squares holding a piece of the mover's colour are never returned and sliding
/// pieces stop at the first occupied square (included when it is a capture).
/// An empty `from` yields no moves.
pub fn legal_shape_moves(board: &Board, from: Square) -> Vec<Square> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };

    let mut moves = Vec::new();
    match piece.kind {
        PieceKind::Pawn => pawn_moves(board, from, piece.color, &mut moves),
        PieceKind::Knight => step_moves(board, from, piece.color, &KNIGHT_OFFSETS, &mut moves),
        PieceKind::King => step_moves(board, from, piece.color, &KING_OFFSETS, &mut moves),
        PieceKind::Bishop => slide_moves(board, from, piece.color, &BISHOP_DIRECTIONS, &mut moves),
        PieceKind::Rook => slide_moves(board, from, piece.color, &ROOK_DIRECTIONS, &mut moves),
        PieceKind::Queen => {
            slide_moves(board, from, piece.color, &ROOK_DIRECTIONS, &mut moves);
            slide_moves(board, from, piece.color, &BISHOP_DIRECTIONS, &mut moves);
        }
    }
    moves
}

/// True when `to` is among the shape moves of the piece on `from`.
pub fn is_shape_move(board: &Board, from: Square, to: Square) -> bool {
    legal_shape_moves(board, from).contains(&to)
}

fn pawn_moves(board: &Board, from: Square, color: Color, moves: &mut Vec<Square>) {
    let dir = color.pawn_direction();

    if let Some(one) = from.offset(dir, 0) {
        if board.get(one).is_none() {
            moves.push(one);
            if from.row() == color.pawn_start_row() {
                if let Some(two) = from.offset(2 * dir, 0) {
                    if board.get(two).is_none() {
                        moves.push(two);
                    }
                }
            }
        }
    }

    // No en passant: a diagonal step needs an enemy piece on the target.
    for dc in [-1, 1] {
        if let Some(target) = from.offset(dir, dc) {
            if matches!(board.get(target), Some(p) if p.color != color) {
                moves.push(target);
            }
        }
    }
}

fn step_moves(
    board: &Board,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Square>,
) {
    for &(dr, dc) in offsets {
        if let Some(target) = from.offset(dr, dc) {
            match board.get(target) {
                Some(p) if p.color == color => {}
                _ => moves.push(target),
            }
        }
    }
}

fn slide_moves(
    board: &Board,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
    moves: &mut Vec<Square>,
) {
    for &(dr, dc) in directions {
        let mut current = from;
        while let Some(next) = current.offset(dr, dc) {
            match board.get(next) {
                None => moves.push(next),
                Some(p) => {
                    if p.color != color {
                        moves.push(next);
                    }
                    break;
                }
            }
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Piece;

    fn sq(row: i32, col: i32) -> Square {
        Square::new(row, col).unwrap()
    }

    fn piece(kind: PieceKind, color: Color) -> Piece {
        Piece::new(kind, color)
    }

    fn sorted(mut squares: Vec<Square>) -> Vec<Square> {
        squares.sort();
        squares
    }

    #[test]
    fn empty_square_has_no_moves() {
        assert!(legal_shape_moves(&Board::standard(), sq(4, 4)).is_empty());
    }

    #[test]
    fn pawns_push_once_or_twice_from_start() {
        let board = Board::standard();
        assert_eq!(sorted(legal_shape_moves(&board, sq(6, 4))), vec![sq(4, 4), sq(5, 4)]);
        assert_eq!(sorted(legal_shape_moves(&board, sq(1, 2))), vec![sq(2, 2), sq(3, 2)]);
    }

    #[test]
    fn double_push_needs_both_squares_empty() {
        let mut board = Board::standard();
        board.set(sq(5, 4), Some(piece(PieceKind::Knight, Color::Black)));
        assert!(legal_shape_moves(&board, sq(6, 4)).is_empty());

        let mut board = Board::standard();
        board.set(sq(4, 4), Some(piece(PieceKind::Knight, Color::Black)));
        assert_eq!(legal_shape_moves(&board, sq(6, 4)), vec![sq(5, 4)]);
    }

    #[test]
    fn shape_move_membership() {
        let board = Board::standard();
        assert!(is_shape_move(&board, sq(7, 1), sq(5, 2)));
        assert!(!is_shape_move(&board, sq(7, 1), sq(6, 3)));
        assert!(!is_shape_move(&board, sq(7, 0), sq(5, 0)));
    }

    #[test]
    fn pawn_off_start_row_pushes_once() {
        let board = Board::with_pieces([(sq(5, 0), piece(PieceKind::Pawn, Color::White))]);
        assert_eq!(legal_shape_moves(&board, sq(5, 0)), vec![sq(4, 0)]);
    }

    #[test]
    fn pawn_captures_only_enemy_diagonals() {
        let board = Board::with_pieces([
            (sq(4, 4), piece(PieceKind::Pawn, Color::White)),
            (sq(3, 3), piece(PieceKind::Rook, Color::Black)),
            (sq(3, 5), piece(PieceKind::Rook, Color::White)),
            (sq(3, 4), piece(PieceKind::Knight, Color::Black)),
        ]);
        assert_eq!(legal_shape_moves(&board, sq(4, 4)), vec![sq(3, 3)]);
    }

    #[test]
    fn knight_in_corner_and_at_start() {
        let board = Board::with_pieces([(sq(0, 0), piece(PieceKind::Knight, Color::Black))]);
        assert_eq!(sorted(legal_shape_moves(&board, sq(0, 0))), vec![sq(1, 2), sq(2, 1)]);

        let board = Board::standard();
        assert_eq!(sorted(legal_shape_moves(&board, sq(7, 1))), vec![sq(5, 0), sq(5, 2)]);
    }

    #[test]
    fn rook_stops_at_first_occupant() {
        let board = Board::with_pieces([
            (sq(4, 0), piece(PieceKind::Rook, Color::White)),
            (sq(4, 3), piece(PieceKind::Pawn, Color::Black)),
            (sq(1, 0), piece(PieceKind::Pawn, Color::White)),
        ]);
        let moves = sorted(legal_shape_moves(&board, sq(4, 0)));
        assert_eq!(
            moves,
            vec![
                sq(2, 0),
                sq(3, 0),
                sq(4, 1),
                sq(4, 2),
                sq(4, 3),
                sq(5, 0),
                sq(6, 0),
                sq(7, 0)
            ]
        );
    }

    #[test]
    fn queen_on_open_board_reaches_27_squares() {
        let board = Board::with_pieces([(sq(3, 3), piece(PieceKind::Queen, Color::White))]);
        assert_eq!(legal_shape_moves(&board, sq(3, 3)).len(), 27);
    }

    #[test]
    fn pieces_boxed_in_at_start() {
        let board = Board::standard();
        for col in [0, 2, 3, 4, 5, 7] {
            assert!(legal_shape_moves(&board, sq(7, col)).is_empty());
            assert!(legal_shape_moves(&board, sq(0, col)).is_empty());
        }
    }

    #[test]
    fn never_lands_on_own_piece_or_jumps_a_blocker() {
        let mut board = Board::standard();
        board.move_piece(sq(6, 4), sq(4, 4));
        board.move_piece(sq(1, 3), sq(3, 3));
        board.move_piece(sq(7, 3), sq(5, 5));
        board.move_piece(sq(0, 5), sq(4, 1));

        for from in Square::all() {
            let Some(mover) = board.get(from) else { continue };
            for to in legal_shape_moves(&board, from) {
                if let Some(target) = board.get(to) {
                    assert_ne!(target.color, mover.color, "{from} -> {to}");
                }
                if matches!(mover.kind, PieceKind::Rook | PieceKind::Bishop | PieceKind::Queen) {
                    let dr = (to.row() as i8 - from.row() as i8).signum();
                    let dc = (to.col() as i8 - from.col() as i8).signum();
                    let mut current = from.offset(dr, dc).unwrap();
                    while current != to {
                        assert!(board.get(current).is_none(), "{from} -> {to} jumps {current}");
                        current = current.offset(dr, dc).unwrap();
                    }
                }
            }
        }
    }
}
