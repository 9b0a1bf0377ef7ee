//! Memdump CLI binary.

use anyhow::Result;
use memdump::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the memdump CLI.
///
/// Uses tokio's `current_thread` runtime: loading is sequential I/O and the
/// analyses are single-threaded.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let config = cli.load_config().await?;

    // Initialize tracing subscriber
    // Can be controlled via RUST_LOG environment variable, then the
    // configuration file's log_filter.
    // Example: RUST_LOG=memdump=debug,memdump_jsonl=trace memdump diff a.json b.json out.json
    // Logs go to stderr so records written to stdout stay parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting memdump CLI");

    cli.execute(&config).await?;

    tracing::debug!("Memdump CLI completed successfully");
    Ok(())
}
