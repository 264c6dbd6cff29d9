#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # cql-user
//!
//! Converges one Cassandra login onto a requested state and reports what
//! changed as a single JSON object.

pub mod cli;
pub mod json;

use cql_user_core::{PrincipalRequest, Result};
use cql_user_gateway::{CassandraSession, Gateway, GatewayConfig, ServerCapabilities};
use cql_user_reconciler::{ReconcilerBuilder, ReconciliationResult};
use tracing::{debug, info};

use crate::cli::Cli;

/// Run one invocation end to end: validate, connect, reconcile, disconnect.
///
/// Every failure is folded into the returned result.
pub async fn run(cli: &Cli) -> ReconciliationResult {
    match connect_and_reconcile(cli).await {
        Ok(result) => result,
        Err(e) => ReconciliationResult::failed(cli.name.as_str(), &e),
    }
}

async fn connect_and_reconcile(cli: &Cli) -> Result<ReconciliationResult> {
    let request = cli.request()?;
    let config = cli.gateway_config()?;

    let session = CassandraSession::connect(&config).await?;
    let outcome = reconcile_with(&session, &config, &request, cli.check).await;
    session.close();
    outcome
}

/// Probe the server behind `gateway` and reconcile `request` against it.
///
/// # Errors
///
/// Returns an error only when the capability probe fails; reconciliation
/// failures are reported inside the result.
pub async fn reconcile_with(
    gateway: &dyn Gateway,
    config: &GatewayConfig,
    request: &PrincipalRequest,
    check: bool,
) -> Result<ReconciliationResult> {
    let capabilities = ServerCapabilities::probe(gateway, config.protocol_version).await?;
    debug!(
        release_version = ?capabilities.release_version,
        drop_if_exists = capabilities.drop_if_exists,
        "Probed server"
    );

    let reconciler = ReconcilerBuilder::new()
        .with_capabilities(capabilities)
        .with_login(config.login())
        .check_mode(check)
        .build()?;

    let result = reconciler.run(gateway, request).await;
    info!(name = %result.name, changed = result.changed, "Finished");
    Ok(result)
}
