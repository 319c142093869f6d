//! Alpha-beta negamax search with a capture-only quiescence extension.
//!
//! The searcher borrows the caller's [`Position`] for the duration of one
//! search, explores it depth-first with the negamax sign convention (every
//! ply negates the score and flips the window), and leaves the position
//! exactly as it found it. Depth-exhausted leaves are handed to quiescence
//! search, which keeps following captures until the position is quiet, so a
//! fixed-depth cutoff cannot stop in the middle of an exchange.

use chess::ChessMove;
use log::debug;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::board::Position;
use crate::evaluate::{self, Score};

type SearchNode = (u64, Score, Score, u8); // position_hash, alpha, beta, depth
type SearchResult = Score; // best_score

// Root window bounds, wider than any evaluation the scorer can produce so
// they never collide with the checkmate sentinel.
const ROOT_ALPHA: Score = -100_000;
const ROOT_BETA: Score = 100_000;
const INITIAL_BEST_VALUE: Score = -99_999;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("no available moves")]
    NoAvailableMoves,
}

pub struct Searcher {
    search_depth: u8,
    search_result_cache: FxHashMap<SearchNode, SearchResult>,
    searched_position_count: usize,
    cache_hit_count: usize,
    termination_count: usize,
}

impl Searcher {
    pub fn new(depth: u8) -> Self {
        Self {
            search_depth: depth,
            search_result_cache: FxHashMap::default(),
            searched_position_count: 0,
            cache_hit_count: 0,
            termination_count: 0,
        }
    }

    pub fn search_depth(&self) -> u8 {
        self.search_depth
    }

    pub fn searched_position_count(&self) -> usize {
        self.searched_position_count
    }

    pub fn cache_hit_count(&self) -> usize {
        self.cache_hit_count
    }

    pub fn termination_count(&self) -> usize {
        self.termination_count
    }

    pub fn reset_stats(&mut self) {
        self.searched_position_count = 0;
        self.cache_hit_count = 0;
        self.termination_count = 0;
    }

    /// Picks the best move for the side to move, searching to the configured
    /// depth.
    ///
    /// Root moves are tried in generator order; the first strictly better
    /// score wins, so ties keep the earliest candidate. The position is
    /// restored before returning.
    pub fn search(&mut self, position: &mut Position) -> Result<ChessMove, SearchError> {
        self.reset_stats();

        let candidates = position.legal_moves();
        if candidates.is_empty() {
            return Err(SearchError::NoAvailableMoves);
        }

        let mut best_move = None;
        let mut best_value = INITIAL_BEST_VALUE;
        let mut alpha = ROOT_ALPHA;
        let beta = ROOT_BETA;

        let subtree_depth = self.search_depth.saturating_sub(1);

        for &chess_move in candidates.iter() {
            position.apply(chess_move);
            let value = -self.alpha_beta(position, -beta, -alpha, subtree_depth);
            position.undo();

            debug!("root candidate {}: {}", chess_move, value);

            if value > best_value {
                best_value = value;
                best_move = Some(chess_move);
            }
            if value > alpha {
                alpha = value;
            }
        }

        debug!(
            "searched {} positions, {} cutoffs, {} cache hits",
            self.searched_position_count, self.termination_count, self.cache_hit_count
        );

        best_move.ok_or(SearchError::NoAvailableMoves)
    }

    /// Negamax search of the subtree below `position`, returning its score
    /// from the perspective of the side to move there.
    ///
    /// Cutoffs return the refuting score as soon as it meets `beta`; a node
    /// with no legal moves falls through the loop and keeps the sentinel,
    /// which the parent negates into a mate score.
    fn alpha_beta(
        &mut self,
        position: &mut Position,
        mut alpha: Score,
        beta: Score,
        depth: u8,
    ) -> Score {
        self.searched_position_count += 1;

        if depth == 0 {
            return self.quiescence(position, alpha, beta);
        }

        let cache_key = (position.hash(), alpha, beta, depth);
        if let Some(cached_score) = self.check_cache(cache_key) {
            return cached_score;
        }

        let mut best_score = -evaluate::CHECKMATE;

        for chess_move in position.legal_moves() {
            position.apply(chess_move);
            let score = -self.alpha_beta(position, -beta, -alpha, depth - 1);
            position.undo();

            if score >= beta {
                self.termination_count += 1;
                self.set_cache(cache_key, score);
                return score;
            }
            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
            }
        }

        self.set_cache(cache_key, best_score);
        best_score
    }

    /// Capture-only extension run below the nominal depth.
    ///
    /// The static evaluation acts as a stand-pat floor: the mover may always
    /// decline to capture, so a quiet continuation can never be forced below
    /// it. Recursion is bounded by the number of pieces left to take.
    fn quiescence(&mut self, position: &mut Position, mut alpha: Score, beta: Score) -> Score {
        self.searched_position_count += 1;

        let stand_pat = evaluate::score(position);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        for chess_move in position.legal_moves() {
            if !position.is_capture(chess_move) {
                continue;
            }

            position.apply(chess_move);
            let score = -self.quiescence(position, -beta, -alpha);
            position.undo();

            if score >= beta {
                self.termination_count += 1;
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }

    fn set_cache(&mut self, search_node: SearchNode, score: Score) {
        self.search_result_cache.insert(search_node, score);
    }

    fn check_cache(&mut self, search_node: SearchNode) -> Option<Score> {
        match self.search_result_cache.get(&search_node) {
            Some(&prev_best_score) => {
                self.cache_hit_count += 1;
                Some(prev_best_score)
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chess::Square;

    use super::*;

    fn chess_move(from: &str, to: &str) -> ChessMove {
        ChessMove::new(
            Square::from_str(from).unwrap(),
            Square::from_str(to).unwrap(),
            None,
        )
    }

    #[test]
    fn test_find_mate_in_1_white() {
        let mut position = Position::from_fen("6k1/8/6K1/8/8/8/8/R7 w - - 0 1").unwrap();
        let mut searcher = Searcher::new(1);

        let best = searcher.search(&mut position).unwrap();
        assert_eq!(best, chess_move("a1", "a8"));

        // The mating line carries the full checkmate sentinel back to the
        // root.
        let score = searcher.alpha_beta(&mut position, ROOT_ALPHA, ROOT_BETA, 1);
        assert_eq!(score, evaluate::CHECKMATE);
    }

    #[test]
    fn test_find_mate_in_1_black() {
        let mut position = Position::from_fen("r7/8/8/8/8/6k1/8/6K1 b - - 0 1").unwrap();
        let mut searcher = Searcher::new(1);

        let best = searcher.search(&mut position).unwrap();
        assert_eq!(best, chess_move("a8", "a1"));
    }

    #[test]
    fn test_find_back_rank_mate_in_2_white() {
        let mut position = Position::from_fen("1k5r/ppp5/8/8/8/8/3Q4/K2R4 w - - 0 1").unwrap();
        let mut searcher = Searcher::new(3);

        // Qd8+ is the only check in the position; the recapture is forced
        // and the rook delivers the back-rank mate behind it.
        let expected_moves = [
            chess_move("d2", "d8"),
            chess_move("h8", "d8"),
            chess_move("d1", "d8"),
        ];

        for expected in expected_moves.iter() {
            let found = searcher.search(&mut position).unwrap();
            assert_eq!(expected, &found);
            position.apply(found);
        }

        assert!(position.is_checkmate());
    }

    #[test]
    fn test_selects_a_move_from_the_starting_position() {
        let mut position = Position::starting();
        let mut searcher = Searcher::new(1);

        let best = searcher.search(&mut position).unwrap();
        assert!(position.legal_moves().contains(&best));
        assert!(searcher.searched_position_count() > 0);
    }

    #[test]
    fn test_no_available_moves() {
        let mut stalemated = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut searcher = Searcher::new(2);
        assert!(matches!(
            searcher.search(&mut stalemated),
            Err(SearchError::NoAvailableMoves)
        ));

        let mut mated = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert!(matches!(
            searcher.search(&mut mated),
            Err(SearchError::NoAvailableMoves)
        ));
    }

    #[test]
    fn test_hanging_queen_is_captured_at_every_depth() {
        // Quiescence resolves the capture even at depth 1, so deeper searches
        // must agree on the material outcome.
        for depth in 1..=3 {
            let mut position = Position::from_fen("k7/8/8/3q4/4P3/8/8/K7 w - - 0 1").unwrap();
            let mut searcher = Searcher::new(depth);

            let best = searcher.search(&mut position).unwrap();
            assert_eq!(best, chess_move("e4", "d5"), "depth {}", depth);
        }
    }

    #[test]
    fn test_search_restores_the_position() {
        let mut position = Position::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
        )
        .unwrap();
        let fen_before = position.to_string();
        let hash_before = position.hash();

        let mut searcher = Searcher::new(3);
        searcher.search(&mut position).unwrap();

        assert_eq!(position.to_string(), fen_before);
        assert_eq!(position.hash(), hash_before);
        assert_eq!(position.ply(), 0);
    }

    #[test]
    fn test_quiescence_on_quiet_position() {
        // With no captures available, quiescence must return the static
        // evaluation clamped into the window.
        let mut position = Position::starting();
        let mut searcher = Searcher::new(1);

        assert_eq!(searcher.quiescence(&mut position, ROOT_ALPHA, ROOT_BETA), 0);
        assert_eq!(searcher.quiescence(&mut position, 50, 100), 50);
        assert_eq!(searcher.quiescence(&mut position, -100, -50), -50);
    }

    // Reference implementations without any pruning. Pruning and caching may
    // only change how many nodes get visited, never the returned score.

    fn unpruned_quiescence(position: &mut Position) -> Score {
        let mut best = evaluate::score(position);
        for chess_move in position.legal_moves() {
            if !position.is_capture(chess_move) {
                continue;
            }
            position.apply(chess_move);
            let score = -unpruned_quiescence(position);
            position.undo();
            if score > best {
                best = score;
            }
        }
        best
    }

    fn unpruned_negamax(position: &mut Position, depth: u8) -> Score {
        if depth == 0 {
            return unpruned_quiescence(position);
        }
        let mut best = -evaluate::CHECKMATE;
        for chess_move in position.legal_moves() {
            position.apply(chess_move);
            let score = -unpruned_negamax(position, depth - 1);
            position.undo();
            if score > best {
                best = score;
            }
        }
        best
    }

    #[test]
    fn test_alpha_beta_matches_unpruned_minimax() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "k7/8/8/3q4/4P3/8/8/K7 w - - 0 1",
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 4 4",
        ];

        for fen in fens.iter() {
            let mut position = Position::from_fen(fen).unwrap();
            let mut searcher = Searcher::new(2);

            let pruned = searcher.alpha_beta(&mut position, ROOT_ALPHA, ROOT_BETA, 2);
            let unpruned = unpruned_negamax(&mut position, 2);
            assert_eq!(pruned, unpruned, "{}", fen);
        }
    }
}
