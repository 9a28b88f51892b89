//! CLI command handling
//!
//! Dispatches runner commands and formats their output.

use std::path::PathBuf;

use colored::Colorize;
use tokio::io::AsyncReadExt;

use crate::commands::Commands;
use crate::common::{Config, Error, Result};
use crate::framework::{self, ConsoleReporter, Reporter, TracingReporter};
use crate::scenarios::{run_scenario, Scenario, ScenarioResult, ScenarioStatus};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            names,
            cli,
            config,
            json,
            log_file: _,
        } => {
            let config = load_config(config, cli)?;
            let scenarios = select_scenarios(&names)?;
            let results = run_all(&scenarios, &config, json).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_summary(&results);
            }

            let failed = results.iter().filter(|r| r.failed()).count();
            if failed > 0 {
                return Err(Error::TestAssertion(format!(
                    "{} of {} scenario(s) failed",
                    failed,
                    results.len()
                )));
            }
            Ok(())
        }

        Commands::List => {
            for scenario in Scenario::ALL {
                println!("{:<24} {}", scenario.name(), scenario.description());
            }
            Ok(())
        }

        Commands::Golden { name } => {
            println!("{}", framework::golden_file(&name));
            Ok(())
        }

        Commands::Lines => {
            let input = read_stdin().await?;
            for line in framework::lines(&input) {
                println!("{line}");
            }
            Ok(())
        }

        Commands::Columns => {
            let input = read_stdin().await?;
            for line in framework::lines(&input) {
                for column in framework::columns(line) {
                    println!("{column}");
                }
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>, cli: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let mut config = Config::from_file(&path)?;
            config.apply_env();
            config
        }
        None => Config::load()?,
    };
    if let Some(cli) = cli {
        config.cli.path = cli;
    }
    Ok(config)
}

fn select_scenarios(names: &[String]) -> Result<Vec<Scenario>> {
    if names.is_empty() {
        return Ok(Scenario::ALL.to_vec());
    }
    names
        .iter()
        .map(|name| {
            Scenario::from_name(name).ok_or_else(|| {
                let known: Vec<&str> = Scenario::ALL.iter().map(|s| s.name()).collect();
                Error::Config(format!(
                    "Unknown scenario '{}'. Available: {}",
                    name,
                    known.join(", ")
                ))
            })
        })
        .collect()
}

async fn run_all(scenarios: &[Scenario], config: &Config, json: bool) -> Vec<ScenarioResult> {
    let console = ConsoleReporter;
    let tracing_reporter = TracingReporter;
    let reporter: &dyn Reporter = if json { &tracing_reporter } else { &console };

    let mut results = Vec::with_capacity(scenarios.len());
    for &scenario in scenarios {
        if !json {
            println!(
                "\n{} {}",
                "Running Scenario:".blue().bold(),
                scenario.name().white().bold()
            );
            println!("  {}", scenario.description().dimmed());
        }

        let result = run_scenario(scenario, config, reporter).await;

        if !json {
            match result.status {
                ScenarioStatus::Passed => {}
                ScenarioStatus::Skipped => println!(
                    "  {} {}",
                    "-".yellow(),
                    result.reason.as_deref().unwrap_or("skipped").dimmed()
                ),
                ScenarioStatus::Failed => println!(
                    "  {} {}",
                    "✗".red(),
                    result.error.as_deref().unwrap_or("failed")
                ),
            }
        }
        results.push(result);
    }
    results
}

fn print_summary(results: &[ScenarioResult]) {
    let count = |status: ScenarioStatus| results.iter().filter(|r| r.status == status).count();
    let passed = count(ScenarioStatus::Passed);
    let skipped = count(ScenarioStatus::Skipped);
    let failed = count(ScenarioStatus::Failed);

    let line = format!("{passed} passed, {skipped} skipped, {failed} failed");
    if failed == 0 {
        println!("\n{} {}\n", "✓".green().bold(), line.green().bold());
    } else {
        println!("\n{} {}\n", "✗".red().bold(), line.red().bold());
    }
}

async fn read_stdin() -> Result<String> {
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_by_default() {
        assert_eq!(select_scenarios(&[]).unwrap(), Scenario::ALL.to_vec());
    }

    #[test]
    fn test_select_unknown_scenario() {
        let err = select_scenarios(&["bogus".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Unknown scenario 'bogus'"));
    }

    #[test]
    fn test_cli_flag_overrides_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "[cli]\npath = \"/from/file\"\n").unwrap();

        let config = load_config(Some(file.clone()), None).unwrap();
        if std::env::var_os(crate::common::config::CLI_BIN_ENV).is_none() {
            assert_eq!(config.cli.path, PathBuf::from("/from/file"));
        }

        let config = load_config(Some(file), Some(PathBuf::from("/from/flag"))).unwrap();
        assert_eq!(config.cli.path, PathBuf::from("/from/flag"));
    }
}
