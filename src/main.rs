//! apimtool CLI entry point
//!
//! Parses arguments, runs the command and turns failures into a coloured
//! error with a suggestion and exit code 1.

use anyhow::Result;
use apimtool::cli;
use apimtool::core::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
