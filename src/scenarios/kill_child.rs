//! Cancelling a build must take the legacy helper down with it

use tokio::sync::{mpsc, oneshot};

use crate::common::{Error, Result};
use crate::framework::{it_async, wait_for, Reporter, Suite};

use super::{Outcome, ProcessProbe};

/// Build that keeps the helper busy long enough to be cancelled
const DOCKERFILE: &str = "FROM alpine:3.10\nRUN sleep 100";

pub(super) async fn run(suite: &Suite, reporter: &dyn Reporter) -> Result<Outcome> {
    let description = format!(
        "should kill {} if parent command is cancelled",
        suite.config().cli.legacy_helper
    );
    it_async(reporter, &description, kill_child_on_cancel(suite)).await?;
    Ok(Outcome::Ran)
}

async fn kill_child_on_cancel(suite: &Suite) -> Result<()> {
    let helper = suite.config().cli.legacy_helper.as_str();
    let timeouts = &suite.config().timeouts;
    let probe = ProcessProbe::new(suite, helper);

    let out = suite.list_processes_command().exec().await?;
    if out.contains(helper) {
        return Err(Error::assertion(format!(
            "'{helper}' is already running before the build started"
        )));
    }

    suite.write_file("Dockerfile", DOCKERFILE)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let (err_tx, mut errs) = mpsc::channel(1);
    let build = suite
        .new_cli_command(["build", "--no-cache", "-t", "test-sleep-image", "."])
        .within_directory(suite.config_dir())
        .with_shutdown(shutdown_rx);
    let build_task = tokio::spawn(async move {
        if let Err(e) = build.exec().await {
            let _ = err_tx.send(e).await;
        }
    });

    wait_for(
        timeouts.poll_tick(),
        timeouts.helper_start(),
        Some(&mut errs),
        || probe.present(),
    )
    .await?;
    probe.check()?;

    tracing::info!("Killing {} process", suite.cli_path().display());
    drop(shutdown_tx);

    wait_for(timeouts.poll_tick(), timeouts.helper_stop(), None, || {
        probe.absent()
    })
    .await
    .map_err(|e| match e {
        Error::WaitTimeout(t) => Error::assertion(format!(
            "'{helper}' still running {t:?} after the build was cancelled"
        )),
        other => other,
    })?;
    probe.check()?;

    if let Err(e) = build_task.await {
        tracing::warn!(error = %e, "Build task did not finish cleanly");
    }
    Ok(())
}
