//! E2E scenarios
//!
//! Each scenario drives the CLI under test (and sometimes a server and a
//! Node client) inside its own [`Suite`] and asserts on what it observes.

mod api_server;
mod kill_child;
mod runner;

use std::cell::RefCell;
use std::fmt;

use crate::common::{Error, Result};
use crate::framework::{Reporter, Suite};

pub use runner::{run_scenario, ScenarioResult, ScenarioStatus};

/// What a scenario body did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// All steps ran and passed
    Ran,
    /// Preconditions were not met; nothing was asserted
    Skipped(String),
}

/// Known scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    KillChildOnCancel,
    ApiServer,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::KillChildOnCancel, Scenario::ApiServer];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::KillChildOnCancel => "kill-child-on-cancel",
            Scenario::ApiServer => "api-server",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Scenario::KillChildOnCancel => {
                "Cancelling a build kills the legacy helper process it started"
            }
            Scenario::ApiServer => "The serve command answers a Node API client",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Run the scenario body inside `suite`
    pub async fn run(self, suite: &Suite, reporter: &dyn Reporter) -> Result<Outcome> {
        match self {
            Scenario::KillChildOnCancel => kill_child::run(suite, reporter).await,
            Scenario::ApiServer => api_server::run(suite, reporter).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checks the process list for a name
///
/// Listing failures are kept aside instead of being folded into `false`,
/// so a broken `ps` is reported as itself rather than as a wait timeout.
struct ProcessProbe<'a> {
    suite: &'a Suite,
    name: &'a str,
    failure: RefCell<Option<Error>>,
}

impl<'a> ProcessProbe<'a> {
    fn new(suite: &'a Suite, name: &'a str) -> Self {
        Self {
            suite,
            name,
            failure: RefCell::new(None),
        }
    }

    async fn listed(&self) -> Result<bool> {
        let out = self.suite.list_processes_command().exec().await?;
        Ok(out.contains(self.name))
    }

    /// Poll helper: true once the name shows up (or listing failed)
    async fn present(&self) -> bool {
        match self.listed().await {
            Ok(found) => found,
            Err(e) => {
                self.failure.replace(Some(e));
                true
            }
        }
    }

    /// Poll helper: true once the name is gone (or listing failed)
    async fn absent(&self) -> bool {
        match self.listed().await {
            Ok(found) => !found,
            Err(e) => {
                self.failure.replace(Some(e));
                true
            }
        }
    }

    /// Return the listing error recorded while polling, if any
    fn check(&self) -> Result<()> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::from_name(scenario.name()), Some(scenario));
        }
        assert_eq!(Scenario::from_name("nope"), None);
    }

    #[test]
    fn test_display_uses_name() {
        assert_eq!(Scenario::ApiServer.to_string(), "api-server");
    }
}
