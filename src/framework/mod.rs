//! E2E test framework
//!
//! Building blocks for driving the CLI under test from scenarios:
//! output filters, platform naming, labelled steps, condition polling
//! and process orchestration.

pub mod command;
pub mod platform;
pub mod server;
pub mod step;
pub mod suite;
pub mod text;
pub mod wait;

pub use command::{CliCommand, CommandOutput};
pub use platform::{golden_file, is_windows, Endpoint, OsFamily};
pub use server::ServerProcess;
pub use step::{it, it_async, ConsoleReporter, RecordingReporter, Reporter, TracingReporter};
pub use suite::Suite;
pub use text::{columns, lines};
pub use wait::wait_for;
