//! Labelled test steps
//!
//! A step runs its body on the calling thread and then tells a
//! [`Reporter`] that it passed. A failing body panics (or returns `Err`
//! for async steps) and the reporter is never called.

use std::future::Future;
use std::sync::Mutex;

use colored::Colorize;

use crate::common::Result;

/// Receives the outcome of each step
pub trait Reporter {
    /// Called once after a step body returned normally
    fn passed(&self, description: &str);
}

/// Reports steps as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn passed(&self, description: &str) {
        tracing::info!("Passed: {}", description);
    }
}

/// Prints a coloured check mark per step on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn passed(&self, description: &str) {
        println!("  {} {}", "✓".green(), description.dimmed());
    }
}

/// Keeps passed step descriptions in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    passed: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptions of the passed steps, in order
    pub fn passed_steps(&self) -> Vec<String> {
        match self.passed.lock() {
            Ok(steps) => steps.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Reporter for RecordingReporter {
    fn passed(&self, description: &str) {
        let mut steps = match self.passed.lock() {
            Ok(steps) => steps,
            Err(poisoned) => poisoned.into_inner(),
        };
        steps.push(description.to_string());
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn passed(&self, description: &str) {
        (**self).passed(description)
    }
}

/// Run `test` and report `description` as passed once it returns
pub fn it<R, F>(reporter: &R, description: &str, test: F)
where
    R: Reporter + ?Sized,
    F: FnOnce(),
{
    test();
    reporter.passed(description);
}

/// Await `test` and report `description` as passed if it returned `Ok`
pub async fn it_async<R, Fut>(reporter: &R, description: &str, test: Fut) -> Result<()>
where
    R: Reporter + ?Sized,
    Fut: Future<Output = Result<()>>,
{
    test.await?;
    reporter.passed(description);
    Ok(())
}
