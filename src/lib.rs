//! cli-e2e - end-to-end harness for a container-management CLI
//!
//! This library provides the pieces the e2e scenarios are built from:
//! output filters, golden-file naming, labelled steps, condition polling
//! and process orchestration around the CLI binary under test.

pub mod cli;
pub mod commands;
pub mod common;
pub mod framework;
pub mod scenarios;

// Re-export commonly used types for tests
pub use common::{Config, Error, Result};
pub use scenarios::{run_scenario, Scenario, ScenarioResult, ScenarioStatus};
