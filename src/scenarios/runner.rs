//! Scenario runner
//!
//! Creates a suite per scenario, runs it, and turns the outcome into a
//! serializable result. A failing scenario never stops the caller from
//! running the next one.

use std::time::Instant;

use serde::Serialize;

use crate::common::Config;
use crate::framework::{Reporter, Suite};

use super::{Outcome, Scenario};

/// Final status of a scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Skipped,
    Failed,
}

/// Result of a scenario run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenarioResult {
    pub fn failed(&self) -> bool {
        self.status == ScenarioStatus::Failed
    }
}

/// Run one scenario in a fresh suite
pub async fn run_scenario(
    scenario: Scenario,
    config: &Config,
    reporter: &dyn Reporter,
) -> ScenarioResult {
    let start = Instant::now();
    tracing::info!(scenario = %scenario, "Running scenario");

    let outcome = match Suite::new(scenario.name(), config.clone()) {
        Ok(suite) => scenario.run(&suite, reporter).await,
        Err(e) => Err(e),
    };

    let (status, reason, error) = match outcome {
        Ok(Outcome::Ran) => (ScenarioStatus::Passed, None, None),
        Ok(Outcome::Skipped(reason)) => {
            tracing::info!(scenario = %scenario, %reason, "Scenario skipped");
            (ScenarioStatus::Skipped, Some(reason), None)
        }
        Err(e) => {
            tracing::error!(scenario = %scenario, error = %e, "Scenario failed");
            (ScenarioStatus::Failed, None, Some(e.to_string()))
        }
    };

    ScenarioResult {
        name: scenario.name().to_string(),
        status,
        duration_ms: start.elapsed().as_millis(),
        reason,
        error,
    }
}
