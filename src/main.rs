//! nzb-cleaner CLI entry point.
//!
//! Initializes logging and delegates to the CLI module for the batch run.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so verbosity can drive the log filter
    let cli = nzb_cleaner::cli::parse_cli();

    // Priority: RUST_LOG env var > --verbose CLI flag > default "info"
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_filter().to_string());

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)))
        .init();

    if cli.verbose {
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            "{}",
            env!("CARGO_PKG_NAME")
        );
    }

    nzb_cleaner::cli::run_with_cli(cli).await
}
