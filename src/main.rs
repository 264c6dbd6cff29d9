//! # cql-user
//!
//! Entry point. Parses arguments, runs one reconciliation, prints a single
//! JSON object on stdout and exits 0 on success (including no change) or 1
//! on failure. Diagnostics go to stderr, filtered by `RUST_LOG`.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cql_user::cli::Cli;
use cql_user::json::Report;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let result = cql_user::run(&cli).await;
    let report = Report::new(&result);

    let rendered = report.to_json().context("Failed to serialize result")?;
    writeln!(std::io::stdout(), "{rendered}").context("Failed to write result")?;

    Ok(report.exit_code())
}

/// Initialize tracing subscriber with environment filter, writing to stderr.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
