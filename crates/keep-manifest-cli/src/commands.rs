//! Command execution.
//!
//! Every command reads the whole manifest file, then drives one of the lazy
//! traversals and writes each element as soon as it is decoded.

use crate::config::{CliConfig, Command, OutputFormat};
use crate::error::CommandError;
use anyhow::{Context, Result};
use keep_manifest::{BlockLocator, DecodePolicy, Manifest, ManifestStream};
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info, warn};

/// Load the manifest named by `config` and run its command, writing to `out`.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read, a traversal fails under
/// the strict policy, or writing to `out` fails.
pub fn run<W: Write>(config: &CliConfig, out: &mut W) -> Result<()> {
    let text = std::fs::read_to_string(&config.manifest)
        .with_context(|| format!("failed to read manifest {}", config.manifest.display()))?;
    info!(
        path = %config.manifest.display(),
        bytes = text.len(),
        "manifest loaded"
    );

    let manifest = Manifest::new(text);
    execute(&manifest, config, out)
}

/// Run the configured command against an already loaded manifest.
///
/// # Errors
///
/// See [`run`].
pub fn execute<W: Write>(manifest: &Manifest, config: &CliConfig, out: &mut W) -> Result<()> {
    let policy = config.decode_policy();
    let format = config.format;

    match &config.command {
        Command::Streams => {
            let mut streams = manifest.stream_iter_with_policy(policy);
            for stream in streams.by_ref() {
                let stream = stream.context("failed to decode stream")?;
                write_stream(out, format, &stream)?;
            }
            debug!(skipped = streams.skipped(), "streams listed");
        }
        Command::Blocks { unique: false } => {
            let mut blocks = manifest.block_iter_with_policy(policy);
            for block in blocks.by_ref() {
                let block = block.context("failed to decode block")?;
                write_block(out, format, &block)?;
            }
            debug!(skipped = blocks.skipped(), "blocks listed");
        }
        Command::Blocks { unique: true } => {
            if policy == DecodePolicy::SkipMalformed {
                warn!("lenient policy ignored: unique block listing stops at the first malformed token");
            }
            for block in manifest.unique_block_iter() {
                let block = block.context("failed to decode block")?;
                write_block(out, format, &block)?;
            }
        }
        Command::Summary => {
            let summary = manifest.summary().context("failed to summarize manifest")?;
            match format {
                OutputFormat::Json => write_json(out, &summary)?,
                OutputFormat::Text => {
                    writeln!(out, "streams: {}", summary.streams)?;
                    writeln!(out, "block occurrences: {}", summary.block_occurrences)?;
                    writeln!(out, "unique blocks: {}", summary.unique_blocks)?;
                    writeln!(out, "total bytes: {}", summary.total_bytes)?;
                    writeln!(out, "unique bytes: {}", summary.unique_bytes)?;
                    writeln!(out, "file segments: {}", summary.file_segments)?;
                }
            }
        }
        Command::Locate { stream, file } => {
            let found = find_stream(manifest, stream)?;
            let ranges = found
                .locate_file(file)
                .with_context(|| format!("failed to locate '{file}' in '{stream}'"))?;
            if ranges.is_empty() && !has_file(&found, file) {
                return Err(CommandError::FileNotFound {
                    stream: stream.clone(),
                    file: file.clone(),
                }
                .into());
            }
            for range in &ranges {
                match format {
                    OutputFormat::Json => write_json(out, range)?,
                    OutputFormat::Text => {
                        writeln!(out, "{} {} {}", range.locator, range.offset, range.length)?;
                    }
                }
            }
        }
    }

    Ok(())
}

fn find_stream(manifest: &Manifest, name: &str) -> Result<ManifestStream> {
    for stream in manifest.stream_iter() {
        let stream = stream.context("failed to decode stream")?;
        if stream.stream_name() == name || stream.unescaped_name() == name {
            return Ok(stream);
        }
    }
    Err(CommandError::StreamNotFound(name.to_string()).into())
}

fn has_file(stream: &ManifestStream, name: &str) -> bool {
    stream
        .file_segments()
        .filter_map(|segment| segment.ok())
        .any(|segment| segment.unescaped_name() == name)
}

fn write_stream<W: Write>(out: &mut W, format: OutputFormat, stream: &ManifestStream) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, stream),
        OutputFormat::Text => {
            writeln!(
                out,
                "{}\t{} blocks\t{} files",
                stream.unescaped_name(),
                stream.blocks().len(),
                stream.files().len()
            )?;
            Ok(())
        }
    }
}

fn write_block<W: Write>(out: &mut W, format: OutputFormat, block: &BlockLocator) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, block),
        OutputFormat::Text => {
            writeln!(out, "{block}")?;
            Ok(())
        }
    }
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("failed to encode JSON")?;
    writeln!(out)?;
    Ok(())
}
