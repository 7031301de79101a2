#![doc = "Beacon chain epoch indexer."]

use clap::Parser;

mod cli;
mod node;

fn main() {
    epoch_indexer_cli::backtrace::enable();

    if let Err(err) = cli::Cli::parse().run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
