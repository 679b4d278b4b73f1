//! Inspector configuration.
//!
//! Configuration comes from CLI arguments with environment variable
//! fallbacks for the options that tend to stay fixed across invocations:
//!
//! - `KEEP_MANIFEST_FORMAT`: `text` or `json`
//! - `KEEP_MANIFEST_POLICY`: `strict` or `lenient`
//!
//! # Example
//!
//! ```no_run
//! use keep_manifest_cli::CliConfig;
//!
//! let config = CliConfig::from_args();
//! config.validate().expect("Invalid configuration");
//! println!("Reading manifest from: {}", config.manifest.display());
//! ```

use crate::error::ConfigError;
use clap::{Parser, Subcommand, ValueEnum};
use keep_manifest::DecodePolicy;
use std::path::PathBuf;

/// Inspector configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "keep-manifest",
    about = "Decode and inspect Keep collection manifests",
    version
)]
pub struct CliConfig {
    /// Path to the manifest text file
    pub manifest: PathBuf,

    /// Output format
    #[arg(long, env = "KEEP_MANIFEST_FORMAT", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// How to handle malformed lines and block tokens
    #[arg(long, env = "KEEP_MANIFEST_POLICY", value_enum, default_value_t = Policy::Strict)]
    pub policy: Policy,

    /// What to print
    #[command(subcommand)]
    pub command: Command,
}

/// Inspector subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print one entry per stream
    Streams,
    /// Print one entry per block token occurrence
    Blocks {
        /// Collapse repeated blocks to their first occurrence
        #[arg(long)]
        unique: bool,
    },
    /// Print aggregate counts
    Summary,
    /// Print the block ranges that back one file
    Locate {
        /// Stream name, e.g. `.` or `./subdir`
        stream: String,
        /// File name within the stream, unescaped
        file: String,
    },
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable lines
    Text,
    /// One JSON document per line
    Json,
}

/// Decode policy as exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Stop at the first malformed line or block token
    Strict,
    /// Log and skip malformed lines and block tokens
    Lenient,
}

impl From<Policy> for DecodePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Strict => Self::FailFast,
            Policy::Lenient => Self::SkipMalformed,
        }
    }
}

impl CliConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Decode policy to use for traversals.
    #[must_use]
    pub fn decode_policy(&self) -> DecodePolicy {
        self.policy.into()
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The manifest file doesn't exist or is not a regular file
    /// - A `locate` stream name is neither `.` nor `./`-rooted
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.manifest.exists() {
            return Err(ConfigError::MissingManifest(self.manifest.clone()));
        }
        if !self.manifest.is_file() {
            return Err(ConfigError::NotAFile(self.manifest.clone()));
        }

        if let Command::Locate { stream, .. } = &self.command {
            let rooted = stream == "." || stream.strip_prefix("./").is_some_and(|s| !s.is_empty());
            if !rooted {
                return Err(ConfigError::InvalidStreamName(stream.clone()));
            }
        }

        Ok(())
    }
}
