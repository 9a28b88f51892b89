//! cli-e2e - end-to-end runner for the container CLI
//!
//! Runs the e2e scenarios against a built CLI binary and exposes the
//! output filters for use from shell scripts.

use clap::Parser;
use cli_e2e::common::logging;
use cli_e2e::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "cli-e2e", about = "End-to-end scenarios for the container CLI")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Keeps the file writer alive until exit
    let _guard = match &cli.command {
        Commands::Run {
            log_file: Some(path),
            ..
        } => match logging::init_with_file(path) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Error: could not open log file '{}': {e}", path.display());
                std::process::exit(1);
            }
        },
        _ => {
            logging::init_cli();
            None
        }
    };

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
