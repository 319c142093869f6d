//! CLI argument parsing using StructOpt.

use structopt::StructOpt;

use crate::cli::commands::{best_move::BestMoveArgs, evaluate::EvaluateArgs};

#[derive(StructOpt)]
#[structopt(
    name = "tactician",
    about = "An alpha-beta chess engine core implemented in Rust ♞"
)]
pub enum Tactician {
    #[structopt(
        name = "best-move",
        about = "Search a position for the best move using alpha-beta pruning at the given `--depth` (default: 3). The position is provided in FEN notation with `--fen` (default: starting position)."
    )]
    BestMove(BestMoveArgs),
    #[structopt(
        name = "evaluate",
        about = "Print the static evaluation of a position, in centipawns from the perspective of the side to move. The position is provided in FEN notation with `--fen` (required)."
    )]
    Evaluate(EvaluateArgs),
}

impl crate::cli::commands::Command for Tactician {
    fn execute(self) {
        match self {
            Self::BestMove(cmd) => cmd.execute(),
            Self::Evaluate(cmd) => cmd.execute(),
        }
    }
}
