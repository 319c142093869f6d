//! Evaluate command - print the static score of a position.

use structopt::StructOpt;
use tactician::board::Position;
use tactician::evaluate;

use super::Command;

#[derive(StructOpt)]
pub struct EvaluateArgs {
    #[structopt(long = "fen")]
    pub position: Position,
}

impl Command for EvaluateArgs {
    fn execute(self) {
        println!("{}", evaluate::score(&self.position));
    }
}
