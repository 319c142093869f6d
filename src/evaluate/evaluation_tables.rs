//! Fixed material values and piece-square bonus tables.
//!
//! Tables are laid out from white's side of the board, indexed by square with
//! a1 = 0 in rank-major order. Black lookups read through the vertical mirror
//! so both sides share one set of tables.

use chess::Piece;

use super::Score;

pub fn material_value(piece: Piece) -> Score {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 0,
    }
}

pub fn bonus_table(piece: Piece) -> &'static [Score; 64] {
    match piece {
        Piece::Pawn => &PAWN_BONUS,
        Piece::Knight => &KNIGHT_BONUS,
        Piece::Bishop => &BISHOP_BONUS,
        Piece::Rook => &ROOK_BONUS,
        Piece::Queen => &QUEEN_BONUS,
        Piece::King => &KING_BONUS,
    }
}

#[rustfmt::skip]
const PAWN_BONUS: [Score; 64] = [
     0,  0,  0,   0,   0,  0,  0,  0,
     5, 10, 10, -20, -20, 10, 10,  5,
     5, -5, -10,  0,   0, -10, -5,  5,
     0,  0,  0,  20,  20,  0,  0,  0,
     5,  5, 10,  25,  25, 10,  5,  5,
    10, 10, 20,  30,  30, 20, 10, 10,
    50, 50, 50,  50,  50, 50, 50, 50,
     0,  0,  0,   0,   0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_BONUS: [Score; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_BONUS: [Score; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_BONUS: [Score; 64] = [
     0,  0,  0,  5,  5,  0,  0,  0,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     5, 10, 10, 10, 10, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_BONUS: [Score; 64] = [
    -20, -10, -10, -5, -5, -10, -10, -20,
    -10,   0,   0,  0,  0,   0,   0, -10,
    -10,   5,   5,  5,  5,   5,   0, -10,
      0,   0,   5,  5,  5,   5,   0,  -5,
     -5,   0,   5,  5,  5,   5,   0,  -5,
    -10,   0,   5,  5,  5,   5,   0, -10,
    -10,   0,   0,  0,  0,   0,   0, -10,
    -20, -10, -10, -5, -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_BONUS: [Score; 64] = [
     20,  30,  10,   0,   0,  10,  30,  20,
     20,  20,   0,   0,   0,   0,  20,  20,
    -10, -20, -20, -20, -20, -20, -20, -10,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
];
