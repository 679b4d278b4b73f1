//! Keep manifest inspector binary entry point.
//!
//! This is a thin wrapper around the keep-manifest-cli library that:
//! 1. Initializes logging
//! 2. Parses command-line arguments
//! 3. Validates configuration
//! 4. Runs the requested command against the manifest

use anyhow::Result;
use keep_manifest_cli::CliConfig;
use std::io::Write;

fn main() -> Result<()> {
    // Logs go to stderr so command output on stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::from_args();

    tracing::debug!(
        "Configuration loaded: manifest={}, format={:?}, policy={:?}",
        config.manifest.display(),
        config.format,
        config.policy
    );

    config.validate()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    keep_manifest_cli::run(&config, &mut out)?;
    out.flush()?;

    Ok(())
}
