//! Game session bookkeeping around the search core: move history, results,
//! status messages, and the book-then-search move selection the engine side
//! of a game uses.

use std::fmt::{self, Display, Formatter};

use chess::{ChessMove, Color, Piece, ALL_PIECES};
use log::debug;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::board::{Position, PositionError};
use crate::book::{Book, BookMove};
use crate::evaluate::{self, GameEnding};
use crate::searcher::{SearchError, Searcher};

/// Game configuration.
#[derive(Clone)]
pub struct GameConfig {
    pub search_depth: u8,
    pub starting_position: Position,
    pub white_player: String,
    pub black_player: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            search_depth: 3,
            starting_position: Position::starting(),
            white_player: "White".to_string(),
            black_player: "Black".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("the game is already over")]
    GameOver,
    #[error("no move to undo")]
    NothingToUndo,
    #[error(transparent)]
    InvalidMove(#[from] PositionError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Final result of a game, in conventional score notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
}

impl Display for GameResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::WhiteWins => write!(f, "1-0"),
            GameResult::BlackWins => write!(f, "0-1"),
            GameResult::Draw => write!(f, "1/2-1/2"),
        }
    }
}

/// One entry of the move history.
#[derive(Debug, Clone)]
pub struct MoveRecord {
    pub chess_move: ChessMove,
    pub notation: String,
    pub color: Color,
}

/// Per-side material in whole-pawn units, as shown on a scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialSummary {
    pub white_score: u32,
    pub black_score: u32,
    pub white_pieces: u32,
    pub black_pieces: u32,
}

fn scoreboard_value(piece: Piece) -> u32 {
    match piece {
        Piece::Pawn => 1,
        Piece::Knight | Piece::Bishop => 3,
        Piece::Rook => 5,
        Piece::Queen => 9,
        Piece::King => 0,
    }
}

/// A chess game between two players, either of which may be the engine.
pub struct Game {
    position: Position,
    starting_position: Position,
    searcher: Searcher,
    history: Vec<MoveRecord>,
    white_player: String,
    black_player: String,
    in_book: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        // Book lines are recorded from the standard starting position, so a
        // custom position starts out of book.
        let in_book = config.starting_position.hash() == Position::starting().hash();

        Self {
            position: config.starting_position.clone(),
            starting_position: config.starting_position,
            searcher: Searcher::new(config.search_depth),
            history: Vec::new(),
            white_player: config.white_player,
            black_player: config.black_player,
            in_book,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn result(&self) -> Option<GameResult> {
        let result = match evaluate::game_ending(&self.position)? {
            GameEnding::Checkmate => match self.position.side_to_move() {
                Color::White => GameResult::BlackWins,
                Color::Black => GameResult::WhiteWins,
            },
            GameEnding::Stalemate | GameEnding::Draw => GameResult::Draw,
        };
        Some(result)
    }

    pub fn is_over(&self) -> bool {
        self.result().is_some()
    }

    /// Plays a move given in coordinate notation ("e2e4").
    pub fn make_move(&mut self, text: &str) -> Result<ChessMove, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let chess_move = self.position.parse_move(text)?;
        self.record_and_apply(chess_move);
        Ok(chess_move)
    }

    /// Plays a move given in standard algebraic notation.
    pub fn make_move_san(&mut self, san: &str) -> Result<ChessMove, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let chess_move = self.position.parse_san(san)?;
        self.record_and_apply(chess_move);
        Ok(chess_move)
    }

    /// Lets the engine pick and play a move: a book continuation while the
    /// game is still in book, the searcher otherwise.
    pub fn make_engine_move(&mut self) -> Result<ChessMove, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }

        if let Some(book_move) = self.book_move() {
            debug!("playing book move {}", book_move);
            self.record_and_apply(book_move);
            return Ok(book_move);
        }

        let chess_move = self.searcher.search(&mut self.position)?;
        self.record_and_apply(chess_move);
        Ok(chess_move)
    }

    fn book_move(&mut self) -> Option<ChessMove> {
        if !self.in_book {
            return None;
        }

        let line: Vec<BookMove> = self.position.history().map(BookMove::from).collect();
        let continuations = Book::shared().get_next_moves(&line);
        let choice = match continuations.choose(&mut rand::thread_rng()) {
            Some((book_move, _)) => *book_move,
            None => {
                self.in_book = false;
                return None;
            }
        };

        self.position
            .legal_moves()
            .iter()
            .copied()
            .find(|legal| choice.matches(*legal))
    }

    fn record_and_apply(&mut self, chess_move: ChessMove) {
        self.history.push(MoveRecord {
            chess_move,
            notation: chess_move.to_string(),
            color: self.position.side_to_move(),
        });
        self.position.apply(chess_move);
    }

    /// Takes back the most recent move.
    pub fn undo_last_move(&mut self) -> Result<ChessMove, GameError> {
        match self.position.undo() {
            Some(chess_move) => {
                self.history.pop();
                Ok(chess_move)
            }
            None => Err(GameError::NothingToUndo),
        }
    }

    /// Returns the game to its starting position.
    pub fn reset(&mut self) {
        self.position = self.starting_position.clone();
        self.history.clear();
        self.in_book = self.position.hash() == Position::starting().hash();
        self.searcher.reset_stats();
    }

    pub fn material_summary(&self) -> MaterialSummary {
        let mut summary = MaterialSummary {
            white_score: 0,
            black_score: 0,
            white_pieces: 0,
            black_pieces: 0,
        };

        for &piece in ALL_PIECES.iter() {
            let white = self.position.pieces(piece, Color::White).popcnt();
            let black = self.position.pieces(piece, Color::Black).popcnt();
            summary.white_pieces += white;
            summary.black_pieces += black;
            summary.white_score += white * scoreboard_value(piece);
            summary.black_score += black * scoreboard_value(piece);
        }

        summary
    }

    fn player_name(&self, color: Color) -> &str {
        match color {
            Color::White => &self.white_player,
            Color::Black => &self.black_player,
        }
    }

    pub fn status_message(&self) -> String {
        match self.result() {
            Some(GameResult::WhiteWins) => format!("{} wins!", self.white_player),
            Some(GameResult::BlackWins) => format!("{} wins!", self.black_player),
            Some(GameResult::Draw) => "The game is a draw.".to_string(),
            None => {
                let color = self.position.side_to_move();
                let color_name = match color {
                    Color::White => "White",
                    Color::Black => "Black",
                };
                format!(
                    "The game is ongoing. It's {}'s turn ({}).",
                    self.player_name(color),
                    color_name
                )
            }
        }
    }
}
