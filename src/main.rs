use structopt::StructOpt;

use crate::cli::commands::Command;
use crate::cli::Tactician;

mod cli;

fn main() {
    env_logger::init();
    Tactician::from_args().execute();
}
