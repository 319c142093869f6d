//! Opening book data structures and operations.
//!
//! Lines are stored as a trie of from/to square pairs keyed by the moves
//! played from the starting position. The book is an alternative move
//! selector with the searcher's contract: it either knows a continuation for
//! the line played so far or it has nothing to offer.

use std::str::FromStr;

use chess::{ChessMove, Square};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

static DEFAULT_BOOK: Lazy<Book> = Lazy::new(Book::default);

// A handful of mainline continuations, in coordinate notation from the
// starting position.
const OPENING_LINES: [(&str, &str); 12] = [
    ("Ruy Lopez", "e2e4 e7e5 g1f3 b8c6 f1b5"),
    ("Italian Game", "e2e4 e7e5 g1f3 b8c6 f1c4"),
    ("Sicilian Defense, Open", "e2e4 c7c5 g1f3 d7d6 d2d4"),
    ("French Defense", "e2e4 e7e6 d2d4 d7d5"),
    ("Caro-Kann Defense", "e2e4 c7c6 d2d4 d7d5"),
    ("Scandinavian Defense", "e2e4 d7d5 e4d5 d8d5 b1c3"),
    ("Queen's Gambit", "d2d4 d7d5 c2c4"),
    ("Queen's Gambit Declined", "d2d4 d7d5 c2c4 e7e6 b1c3"),
    ("Slav Defense", "d2d4 d7d5 c2c4 c7c6"),
    ("King's Indian Defense", "d2d4 g8f6 c2c4 g7g6"),
    ("Nimzo-Indian Defense", "d2d4 g8f6 c2c4 e7e6 b1c3 f8b4"),
    ("English Opening", "c2c4 e7e5"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookMove(Square, Square);

impl BookMove {
    pub fn new(from: Square, to: Square) -> Self {
        BookMove(from, to)
    }

    pub fn from_square(&self) -> Square {
        self.0
    }

    pub fn to_square(&self) -> Square {
        self.1
    }

    /// True if the legal move plays this book move. Book lines never reach a
    /// promotion, so the squares identify the move completely.
    pub fn matches(&self, chess_move: ChessMove) -> bool {
        self.0 == chess_move.get_source() && self.1 == chess_move.get_dest()
    }
}

impl From<ChessMove> for BookMove {
    fn from(chess_move: ChessMove) -> Self {
        BookMove(chess_move.get_source(), chess_move.get_dest())
    }
}

pub struct OpeningLine {
    pub name: String,
    pub moves: String,
}

#[derive(Default)]
pub struct BookNode {
    lines: FxHashMap<BookMove, Box<BookNode>>,
    line_name: Option<String>,
}

impl BookNode {
    fn new() -> Self {
        Default::default()
    }
}

pub struct Book {
    root: BookNode,
}

impl Default for Book {
    fn default() -> Self {
        let mut book = Book::new();
        for (name, moves) in OPENING_LINES.iter() {
            book.add_line(OpeningLine {
                name: (*name).to_string(),
                moves: (*moves).to_string(),
            });
        }
        book
    }
}

impl Book {
    pub fn new() -> Self {
        Self {
            root: BookNode::default(),
        }
    }

    /// The process-wide book built from the compiled-in opening lines.
    pub fn shared() -> &'static Book {
        &DEFAULT_BOOK
    }

    pub fn add_line(&mut self, line: OpeningLine) {
        let moves = line.moves.split(' ');
        let moves_count = moves.clone().count();
        if moves_count == 0 {
            return;
        }

        let mut curr_node = &mut self.root;

        for (i, raw_move) in moves.enumerate() {
            let raw_from_square: String = raw_move.chars().take(2).collect();
            let raw_to_square: String = raw_move.chars().skip(2).take(2).collect();
            let from_square = Square::from_str(&raw_from_square)
                .unwrap_or_else(|_| panic!("invalid square: {}", raw_from_square));
            let to_square = Square::from_str(&raw_to_square)
                .unwrap_or_else(|_| panic!("invalid square: {}", raw_to_square));
            let book_move = BookMove::new(from_square, to_square);

            let next_node = curr_node
                .lines
                .entry(book_move)
                .or_insert_with(|| Box::new(BookNode::new()));

            if i == moves_count - 1 {
                next_node.line_name = Some(line.name.clone());
            }

            curr_node = next_node;
        }
    }

    /// Returns the known continuations after the given line of play, with
    /// the opening's name when the continuation completes a line.
    pub fn get_next_moves(&self, line: &[BookMove]) -> Vec<(BookMove, Option<String>)> {
        let mut curr_node = &self.root;

        for book_move in line.iter() {
            match curr_node.lines.get(book_move) {
                Some(next) => curr_node = next,
                None => return vec![],
            }
        }

        curr_node
            .lines
            .iter()
            .map(|(book_move, node)| (*book_move, node.line_name.clone()))
            .collect()
    }
}
