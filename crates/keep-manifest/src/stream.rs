//! Manifest streams
//!
//! Each non-blank manifest line describes one stream:
//!
//! ```text
//! <stream name> <block token>* <file token>+
//! ```
//!
//! Tokens are separated by single spaces. The first token is the stream name,
//! then comes a contiguous run of block tokens, then a contiguous run of file
//! tokens. Tokens are told apart by shape (see [`is_block_token`]), not by
//! keyword.

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::error::{LineFault, ManifestError, Result};
use crate::locator::{BlockLocator, is_block_token};
use crate::segment::{FileSegment, unescape_name};

/// Name of the top-level stream
pub const ROOT_STREAM: &str = ".";

/// One decoded manifest line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManifestStream {
    /// Escaped stream name, `.` or `./`-rooted
    pub stream_name: String,
    /// Raw block tokens in line order
    pub blocks: Vec<String>,
    /// Raw file segment tokens in line order
    pub files: Vec<String>,
}

/// Byte range of one block that backs part of a file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockRange {
    /// Block holding the bytes
    pub locator: BlockLocator,
    /// Offset of the first byte within the block
    pub offset: u64,
    /// Number of bytes taken from the block
    pub length: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectName,
    ExpectBlocksOrFiles,
    ExpectFilesOnly,
}

impl ManifestStream {
    /// Decode one manifest line (without its line terminator)
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return Err(LineFault::MissingStreamName.into());
        }

        let mut stream_name = String::new();
        let mut blocks = Vec::new();
        let mut files = Vec::new();
        let mut state = State::ExpectName;

        for (position, token) in line.split(' ').enumerate() {
            if token.is_empty() {
                return Err(LineFault::EmptyToken { position }.into());
            }

            state = match state {
                State::ExpectName => {
                    if !is_valid_stream_name(token) {
                        return Err(LineFault::InvalidStreamName(token.to_string()).into());
                    }
                    stream_name = token.to_string();
                    State::ExpectBlocksOrFiles
                }
                State::ExpectBlocksOrFiles if is_block_token(token) => {
                    blocks.push(token.to_string());
                    State::ExpectBlocksOrFiles
                }
                State::ExpectBlocksOrFiles => {
                    files.push(token.to_string());
                    State::ExpectFilesOnly
                }
                State::ExpectFilesOnly if is_block_token(token) => {
                    return Err(LineFault::BlockAfterFile {
                        token: token.to_string(),
                    }
                    .into());
                }
                State::ExpectFilesOnly => {
                    files.push(token.to_string());
                    State::ExpectFilesOnly
                }
            };
        }

        if files.is_empty() {
            if blocks.is_empty() {
                return Err(LineFault::NoContent.into());
            }
            return Err(LineFault::NoFiles.into());
        }

        trace!(
            stream = %stream_name,
            blocks = blocks.len(),
            files = files.len(),
            "decoded stream"
        );

        Ok(Self {
            stream_name,
            blocks,
            files,
        })
    }

    /// Escaped stream name as written in the manifest
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Stream name with escapes decoded
    pub fn unescaped_name(&self) -> String {
        unescape_name(&self.stream_name)
    }

    /// Raw block tokens
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    /// Raw file segment tokens
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Decode block tokens lazily, in line order
    pub fn block_locators(&self) -> impl Iterator<Item = Result<BlockLocator>> + '_ {
        self.blocks.iter().map(|token| BlockLocator::parse(token))
    }

    /// Decode file segment tokens lazily, in line order
    pub fn file_segments(&self) -> impl Iterator<Item = Result<FileSegment>> + '_ {
        self.files.iter().map(|token| FileSegment::parse(token))
    }

    /// Total bytes backed by this stream's blocks
    pub fn data_size(&self) -> Result<u64> {
        let mut total = 0u64;
        for (index, locator) in self.block_locators().enumerate() {
            total = add_block_size(total, locator?.size, index)?;
        }
        Ok(total)
    }

    /// Map every segment of the file `name` onto the block ranges backing it
    ///
    /// `name` is compared against the unescaped file names. Ranges are
    /// returned in segment order; a file that appears in several segments
    /// yields the ranges of each segment in turn. An unknown name yields an
    /// empty list.
    pub fn locate_file(&self, name: &str) -> Result<Vec<BlockRange>> {
        let mut starts = Vec::with_capacity(self.blocks.len());
        let mut locators = Vec::with_capacity(self.blocks.len());
        let mut total = 0u64;
        for (index, locator) in self.block_locators().enumerate() {
            let locator = locator?;
            starts.push(total);
            total = add_block_size(total, locator.size, index)?;
            locators.push(locator);
        }

        let mut ranges = Vec::new();
        for segment in self.file_segments() {
            let segment = segment?;
            if segment.unescaped_name() != name {
                continue;
            }
            if segment.end() > total {
                return Err(ManifestError::SegmentOutOfRange {
                    offset: segment.offset,
                    length: segment.length,
                    available: total,
                });
            }

            let first = starts.partition_point(|&start| start <= segment.offset);
            let first = first.saturating_sub(1);
            for (start, locator) in starts[first..].iter().zip(&locators[first..]) {
                if *start >= segment.end() {
                    break;
                }
                // bounded by `total`, which was summed without overflow
                let block_end = start + locator.size;
                let from = segment.offset.max(*start);
                let to = segment.end().min(block_end);
                if from < to {
                    ranges.push(BlockRange {
                        locator: locator.clone(),
                        offset: from - start,
                        length: to - from,
                    });
                }
            }
        }
        Ok(ranges)
    }
}

impl fmt::Display for ManifestStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stream_name)?;
        for token in self.blocks.iter().chain(&self.files) {
            write!(f, " {token}")?;
        }
        Ok(())
    }
}

impl FromStr for ManifestStream {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Decode one manifest line into a [`ManifestStream`]
pub fn decode_stream(line: &str) -> Result<ManifestStream> {
    ManifestStream::parse(line)
}

/// Add a block size to a running byte count, failing instead of wrapping
pub(crate) fn add_block_size(total: u64, size: u64, index: usize) -> Result<u64> {
    total
        .checked_add(size)
        .ok_or(ManifestError::SizeOverflow { blocks: index + 1 })
}

fn is_valid_stream_name(name: &str) -> bool {
    if name == ROOT_STREAM {
        return true;
    }
    name.strip_prefix("./").is_some_and(|path| {
        path.split('/')
            .all(|component| !component.is_empty() && component != "." && component != "..")
    })
}
