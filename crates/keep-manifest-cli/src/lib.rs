//! Command-line inspector for Keep collection manifests.
//!
//! The binary is a thin wrapper around this library: it parses arguments,
//! initializes logging, validates configuration and calls [`run`]. All
//! decoding is done by the `keep-manifest` crate.

#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{execute, run};
pub use config::{CliConfig, Command, OutputFormat, Policy};
pub use error::{CommandError, ConfigError};
