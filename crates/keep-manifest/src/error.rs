//! Manifest decoding errors

use keep_digest::DigestError;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Errors produced while decoding manifest text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// The digest segment of a block token is not a valid digest
    #[error("malformed digest in block token '{token}': {source}")]
    MalformedDigest {
        /// Full block token
        token: String,
        /// Digest decoding failure
        #[source]
        source: DigestError,
    },

    /// The size segment of a block token is not a canonical decimal `u64`
    #[error("malformed size '{size}' in block token '{token}'")]
    MalformedSize {
        /// Full block token
        token: String,
        /// Offending size segment
        size: String,
    },

    /// A block token without a `+` separated size segment
    #[error("malformed block token '{0}': missing size field")]
    MalformedBlockToken(String),

    /// A manifest line that violates the stream grammar
    #[error("malformed manifest line: {0}")]
    MalformedLine(LineFault),

    /// A file segment token that is not `offset:length:name`
    #[error("malformed file segment '{token}': {reason}")]
    MalformedFileSegment {
        /// Full file segment token
        token: String,
        /// What was wrong with it
        reason: String,
    },

    /// A file segment references bytes past the end of its stream's blocks
    #[error("file segment {offset}:{length} exceeds stream data of {available} bytes")]
    SegmentOutOfRange {
        /// Segment offset within the stream
        offset: u64,
        /// Segment length
        length: u64,
        /// Total bytes backed by the stream's blocks
        available: u64,
    },

    /// Block sizes whose sum does not fit in a `u64`
    #[error("block sizes overflow a 64-bit byte count after {blocks} blocks")]
    SizeOverflow {
        /// Number of blocks summed before the overflow, including the offending one
        blocks: usize,
    },

    /// An error tied to a specific line of a manifest
    #[error("line {number}: {source}")]
    Line {
        /// 1-based line number
        number: usize,
        /// Underlying failure
        #[source]
        source: Box<ManifestError>,
    },
}

impl ManifestError {
    /// Wrap this error with the line it came from
    pub(crate) fn at_line(self, number: usize) -> Self {
        Self::Line {
            number,
            source: Box::new(self),
        }
    }

    /// The underlying error with any line information stripped
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Line { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The 1-based line number, if this error came from a manifest traversal
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Line { number, .. } => Some(*number),
            _ => None,
        }
    }
}

/// Structural problems with a single manifest line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineFault {
    /// The line has no tokens at all
    #[error("missing stream name")]
    MissingStreamName,

    /// The first token is neither `.` nor a `./`-rooted path
    #[error("invalid stream name '{0}'")]
    InvalidStreamName(String),

    /// Two adjacent separators, or a leading or trailing separator
    #[error("empty token at position {position}")]
    EmptyToken {
        /// 0-based token index within the line
        position: usize,
    },

    /// A stream name followed by neither blocks nor files
    #[error("stream has no block or file tokens")]
    NoContent,

    /// Block tokens without any file token
    #[error("stream has block tokens but no file tokens")]
    NoFiles,

    /// A block token found after file tokens have started
    #[error("block token '{token}' follows file tokens")]
    BlockAfterFile {
        /// The out-of-place block token
        token: String,
    },
}

impl From<LineFault> for ManifestError {
    fn from(fault: LineFault) -> Self {
        Self::MalformedLine(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_line() {
        let err = ManifestError::MalformedLine(LineFault::NoContent).at_line(7);
        assert_eq!(err.line_number(), Some(7));
        assert_eq!(
            err.root_cause(),
            &ManifestError::MalformedLine(LineFault::NoContent)
        );
        assert_eq!(
            err.to_string(),
            "line 7: malformed manifest line: stream has no block or file tokens"
        );
    }

    #[test]
    fn test_no_files_message() {
        let err = ManifestError::from(LineFault::NoFiles);
        assert_eq!(
            err.to_string(),
            "malformed manifest line: stream has block tokens but no file tokens"
        );
    }

    #[test]
    fn test_root_cause_of_plain_error() {
        let err = ManifestError::MalformedBlockToken("abc".to_string());
        assert_eq!(err.line_number(), None);
        assert_eq!(err.root_cause(), &err);
    }
}
