//! API server driven by the Node client

use std::path::Path;

use crate::common::{Error, Result};
use crate::framework::{it_async, Reporter, ServerProcess, Suite};

use super::Outcome;

/// Context the Node client lists containers from
const CONTEXT_NAME: &str = "test-example";

/// Container the example backend always reports
const EXPECTED_CONTAINER: &str = "nginx";

pub(super) async fn run(suite: &Suite, reporter: &dyn Reporter) -> Result<Outcome> {
    let package_manager = match suite.config().node_package_manager() {
        Some(path) => path,
        None => {
            let reason = format!(
                "skipping, {} not installed or SKIP_NODE set",
                suite.config().node.package_manager
            );
            return Ok(Outcome::Skipped(reason));
        }
    };

    it_async(
        reporter,
        "can run 'serve' command",
        serve_to_node_client(suite, &package_manager),
    )
    .await?;
    Ok(Outcome::Ran)
}

async fn serve_to_node_client(suite: &Suite, package_manager: &Path) -> Result<()> {
    suite
        .new_cli_command(["context", "create", CONTEXT_NAME, "example"])
        .exec()
        .await?;

    let (server_address, client_address) = suite.server_addresses();
    let mut server = suite.serve_api(&server_address)?;

    let result = query_with_client(suite, &mut server, package_manager, &client_address).await;
    let killed = server.kill().await;
    result?;
    killed
}

async fn query_with_client(
    suite: &Suite,
    server: &mut ServerProcess,
    package_manager: &Path,
    client_address: &str,
) -> Result<()> {
    let timeouts = &suite.config().timeouts;
    server
        .wait_ready(timeouts.poll_tick(), timeouts.server_ready())
        .await?;

    let client_dir = &suite.config().node.client_dir;
    suite
        .new_command(package_manager, ["install"])
        .within_directory(client_dir)
        .exec()
        .await?;
    let output = suite
        .new_command(
            package_manager,
            ["run", "start", CONTEXT_NAME, client_address],
        )
        .within_directory(client_dir)
        .exec()
        .await?;

    if !output.contains(EXPECTED_CONTAINER) {
        return Err(Error::assertion(format!(
            "expected '{EXPECTED_CONTAINER}' in client output, got:\n{output}"
        )));
    }
    Ok(())
}
