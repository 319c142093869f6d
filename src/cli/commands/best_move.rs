//! Best move command - search a position for the strongest move.

use structopt::StructOpt;
use tactician::board::Position;
use tactician::searcher::Searcher;

use super::Command;

#[derive(StructOpt)]
pub struct BestMoveArgs {
    #[structopt(short, long, default_value = "3")]
    pub depth: u8,
    #[structopt(
        long = "fen",
        default_value = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    )]
    pub position: Position,
}

impl Command for BestMoveArgs {
    fn execute(self) {
        let mut position = self.position;
        let mut searcher = Searcher::new(self.depth);

        match searcher.search(&mut position) {
            Ok(best_move) => println!("{}", best_move),
            Err(err) => eprintln!("Failed to calculate best move: {}", err),
        }
    }
}
