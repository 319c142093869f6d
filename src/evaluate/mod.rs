//! Static position evaluation: material plus piece-square bonuses, scored
//! from the perspective of the side to move.

use chess::{Color, Piece, ALL_PIECES};

use crate::board::Position;

use self::evaluation_tables::{bonus_table, material_value};

mod evaluation_tables;

/// Centipawn score from the perspective of the side to move. The same
/// position scores `s` for one player and `-s` for the other.
pub type Score = i32;

/// Sentinel magnitude for a decided game, larger than any material and
/// positional total a legal position can reach.
pub const CHECKMATE: Score = 9_999;

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnding {
    Checkmate,
    Stalemate,
    Draw,
}

/// Returns the ending state if the position is decided, otherwise `None`.
pub fn game_ending(position: &Position) -> Option<GameEnding> {
    if position.is_checkmate() {
        Some(GameEnding::Checkmate)
    } else if position.is_stalemate() {
        Some(GameEnding::Stalemate)
    } else if position.is_insufficient_material() {
        Some(GameEnding::Draw)
    } else {
        None
    }
}

/// Scores the position for the side to move.
///
/// Checkmate is the worst outcome for the mover, who is the one in check
/// with no reply, so the sentinel comes back negative regardless of
/// material. Stalemate and dead draws score zero.
pub fn score(position: &Position) -> Score {
    match game_ending(position) {
        Some(GameEnding::Checkmate) => return -CHECKMATE,
        Some(GameEnding::Stalemate) | Some(GameEnding::Draw) => return 0,
        None => (),
    }

    let mut total = 0;
    for &piece in ALL_PIECES.iter() {
        total += side_score(position, piece, Color::White);
        total -= side_score(position, piece, Color::Black);
    }

    match position.side_to_move() {
        Color::White => total,
        Color::Black => -total,
    }
}

/// Material plus positional value of one side's pieces of one kind, in the
/// white-positive frame. Black pieces read the shared bonus tables through
/// the vertical mirror.
fn side_score(position: &Position, piece: Piece, color: Color) -> Score {
    let table = bonus_table(piece);
    let value = material_value(piece);

    let mut sum = 0;
    for square in position.pieces(piece, color) {
        let index = match color {
            Color::White => square.to_index(),
            Color::Black => Position::mirror_square(square).to_index(),
        };
        sum += value + table[index];
    }
    sum
}
