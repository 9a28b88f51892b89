//! CLI command definitions
//!
//! Defines the clap commands for the e2e runner.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run e2e scenarios
    Run {
        /// Scenario names to run (default: all)
        names: Vec<String>,

        /// Path to the CLI binary under test
        #[arg(long)]
        cli: Option<PathBuf>,

        /// Harness configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print a JSON summary instead of progress lines
        #[arg(long)]
        json: bool,

        /// Also write logs to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// List available scenarios
    List,

    /// Print the golden file name for this platform
    Golden {
        /// Fixture base name
        name: String,
    },

    /// Print the non-blank lines of stdin
    Lines,

    /// Print the space-separated columns of each stdin line
    Columns,
}
