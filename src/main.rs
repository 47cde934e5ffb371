//! Treewatch demo - loads a document, watches paths, applies scoped writes.

use clap::Parser;
use tracing::{Level, span};
use treewatch::{
    cli::{self, Cli, formatting::format_error},
    tracing_config,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_config::init()?;
    let _span = span!(Level::INFO, "treewatch_main").entered();

    let cli = Cli::parse();

    match cli::run(&cli) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("{}: {}", format_error("Error"), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
