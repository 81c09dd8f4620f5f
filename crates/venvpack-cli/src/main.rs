//! venvpack CLI
//!
//! Bundles a virtual environment into a relocatable archive, unpacks it
//! elsewhere, and repairs the embedded interpreter paths.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Bundle { root, output } => commands::run_bundle(&root, output.as_deref()),
        Commands::Unpack {
            archive,
            output_dir,
            no_repair,
            shebang,
            python,
        } => commands::run_unpack(
            &archive,
            &output_dir,
            !no_repair,
            shebang.as_deref(),
            python.as_deref(),
        ),
        Commands::Repair {
            root,
            shebang,
            python,
        } => commands::run_repair(&root, shebang.as_deref(), python.as_deref()),
    }
}
