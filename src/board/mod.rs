//! The board and move-generation surface the search runs against.
//!
//! Chess rules live in the `chess` crate; this module wraps its copy-make
//! board behind the apply/undo discipline the searcher relies on. Applying a
//! move pushes the successor position onto a stack and undoing pops it, so a
//! position handed to the searcher is restored bit-for-bit by the time the
//! search returns.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chess::{
    BitBoard, Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square, ALL_SQUARES, EMPTY,
};
use smallvec::SmallVec;
use thiserror::Error;

/// Legal moves for a position, in move-generator order.
pub type MoveList = SmallVec<[ChessMove; 64]>;

const LIGHT_SQUARES: BitBoard = BitBoard(0x55AA_55AA_55AA_55AA);
const DARK_SQUARES: BitBoard = BitBoard(0xAA55_AA55_AA55_AA55);

#[derive(Error, Debug)]
pub enum PositionError {
    #[error("invalid FEN: {0}")]
    InvalidFen(chess::Error),
    #[error("unparseable move: {0}")]
    InvalidSan(chess::Error),
    #[error("move `{0}` is not legal in this position")]
    IllegalMove(String),
}

/// A chess position together with the line of moves that produced it.
#[derive(Clone)]
pub struct Position {
    board: Board,
    previous: Vec<(Board, ChessMove)>,
}

impl Position {
    /// The standard starting position.
    pub fn starting() -> Self {
        Self::from_board(Board::default())
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let board = Board::from_str(fen).map_err(PositionError::InvalidFen)?;
        Ok(Self::from_board(board))
    }

    fn from_board(board: Board) -> Self {
        Self {
            board,
            previous: Vec::new(),
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Zobrist hash of the current position.
    pub fn hash(&self) -> u64 {
        self.board.get_hash()
    }

    /// Number of moves applied since this position was created.
    pub fn ply(&self) -> usize {
        self.previous.len()
    }

    /// The moves applied so far, oldest first.
    pub fn history(&self) -> impl Iterator<Item = ChessMove> + '_ {
        self.previous.iter().map(|(_, chess_move)| *chess_move)
    }

    /// All legal moves in the current position. The generator's order is
    /// deterministic for a fixed position, which keeps the searcher's
    /// tie-breaking reproducible.
    pub fn legal_moves(&self) -> MoveList {
        MoveGen::new_legal(&self.board).collect()
    }

    /// Applies a legal move. Every `apply` must be balanced by an `undo`.
    pub fn apply(&mut self, chess_move: ChessMove) {
        let next = self.board.make_move_new(chess_move);
        self.previous.push((self.board, chess_move));
        self.board = next;
    }

    /// Reverses the most recent `apply`, returning the move that was undone,
    /// or `None` when the position is back at its creation state.
    pub fn undo(&mut self) -> Option<ChessMove> {
        self.previous.pop().map(|(board, chess_move)| {
            self.board = board;
            chess_move
        })
    }

    /// True if the move takes an enemy piece, including en passant (a pawn
    /// leaving its file for an empty square).
    pub fn is_capture(&self, chess_move: ChessMove) -> bool {
        if self.board.piece_on(chess_move.get_dest()).is_some() {
            return true;
        }
        self.board.piece_on(chess_move.get_source()) == Some(Piece::Pawn)
            && chess_move.get_source().get_file() != chess_move.get_dest().get_file()
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    /// True when neither side retains mating material: bare kings, a lone
    /// minor piece, or bishops all standing on one square color. Any pawn,
    /// rook, or queen is enough to play on.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.board.pieces(Piece::Pawn)
            | self.board.pieces(Piece::Rook)
            | self.board.pieces(Piece::Queen);
        if heavy != EMPTY {
            return false;
        }

        let knights = *self.board.pieces(Piece::Knight);
        let bishops = *self.board.pieces(Piece::Bishop);
        if (knights | bishops).popcnt() <= 1 {
            return true;
        }

        knights == EMPTY
            && (bishops & LIGHT_SQUARES == EMPTY || bishops & DARK_SQUARES == EMPTY)
    }

    /// Squares occupied by the given piece kind of the given color.
    pub fn pieces(&self, piece: Piece, color: Color) -> BitBoard {
        self.board.pieces(piece) & self.board.color_combined(color)
    }

    /// Parses a move in standard algebraic notation against the current
    /// position.
    pub fn parse_san(&self, san: &str) -> Result<ChessMove, PositionError> {
        ChessMove::from_san(&self.board, san).map_err(PositionError::InvalidSan)
    }

    /// Parses a move in coordinate notation ("e2e4", "e7e8q") by matching it
    /// against the legal moves of the current position.
    pub fn parse_move(&self, text: &str) -> Result<ChessMove, PositionError> {
        MoveGen::new_legal(&self.board)
            .find(|chess_move| chess_move.to_string() == text)
            .ok_or_else(|| PositionError::IllegalMove(text.to_string()))
    }

    /// The square's vertical mirror (a1 <-> a8), used to read white-oriented
    /// bonus tables for black pieces.
    pub fn mirror_square(square: Square) -> Square {
        ALL_SQUARES[square.to_index() ^ 56]
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(fen: &str) -> Result<Self, Self::Err> {
        Self::from_fen(fen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(name: &str) -> Square {
        Square::from_str(name).unwrap()
    }

    fn chess_move(from: &str, to: &str) -> ChessMove {
        ChessMove::new(square(from), square(to), None)
    }

    #[test]
    fn test_apply_undo_restores_position() {
        let mut position = Position::starting();
        let fen_before = position.to_string();
        let hash_before = position.hash();

        position.apply(chess_move("e2", "e4"));
        assert_ne!(position.to_string(), fen_before);
        assert_eq!(position.ply(), 1);

        let undone = position.undo();
        assert_eq!(undone, Some(chess_move("e2", "e4")));
        assert_eq!(position.to_string(), fen_before);
        assert_eq!(position.hash(), hash_before);
        assert_eq!(position.undo(), None);
    }

    #[test]
    fn test_is_capture_detects_ordinary_captures() {
        let position = Position::from_fen("k7/8/8/3q4/4P3/8/8/K7 w - - 0 1").unwrap();
        assert!(position.is_capture(chess_move("e4", "d5")));
        assert!(!position.is_capture(chess_move("e4", "e5")));
    }

    #[test]
    fn test_is_capture_detects_en_passant() {
        let position =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        assert!(position.is_capture(chess_move("e5", "f6")));
        assert!(!position.is_capture(chess_move("e5", "e6")));
    }

    #[test]
    fn test_insufficient_material() {
        let bare_kings = Position::from_fen("K7/8/k7/8/8/8/8/8 w - - 0 1").unwrap();
        assert!(bare_kings.is_insufficient_material());

        let lone_knight = Position::from_fen("K7/8/k7/8/8/8/8/6N1 w - - 0 1").unwrap();
        assert!(lone_knight.is_insufficient_material());

        let same_color_bishops =
            Position::from_fen("k4b2/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert!(same_color_bishops.is_insufficient_material());

        let opposite_color_bishops =
            Position::from_fen("k1b5/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert!(!opposite_color_bishops.is_insufficient_material());

        let lone_pawn = Position::from_fen("K7/8/k7/8/8/8/6P1/8 w - - 0 1").unwrap();
        assert!(!lone_pawn.is_insufficient_material());

        assert!(!Position::starting().is_insufficient_material());
    }

    #[test]
    fn test_terminal_predicates() {
        let mated = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert!(mated.is_checkmate());
        assert!(!mated.is_stalemate());

        let stalemated = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(stalemated.is_stalemate());
        assert!(!stalemated.is_checkmate());
    }

    #[test]
    fn test_mirror_square() {
        assert_eq!(Position::mirror_square(square("e2")), square("e7"));
        assert_eq!(Position::mirror_square(square("a1")), square("a8"));
        assert_eq!(Position::mirror_square(square("h8")), square("h1"));
    }

    #[test]
    fn test_from_fen_rejects_garbage() {
        assert!(Position::from_fen("not a fen").is_err());
    }
}
