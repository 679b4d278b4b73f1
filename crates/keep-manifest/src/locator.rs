//! Block locators
//!
//! A block token has the form `<hexdigest>+<decimalsize>(+<hint>)*`. The digest
//! and size are validated; every remaining `+`-delimited segment is stored
//! verbatim as a hint.

use std::fmt;
use std::str::FromStr;

use keep_digest::BlockDigest;

use crate::error::{ManifestError, Result};
use crate::hint::Hint;

/// Reference to one immutable content block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockLocator {
    /// Content digest of the block
    pub digest: BlockDigest,
    /// Block size in bytes
    pub size: u64,
    /// Opaque hints in manifest order
    pub hints: Vec<String>,
}

impl BlockLocator {
    /// Create a locator without hints
    pub fn new(digest: BlockDigest, size: u64) -> Self {
        Self {
            digest,
            size,
            hints: Vec::new(),
        }
    }

    /// Decode a single block token
    pub fn parse(token: &str) -> Result<Self> {
        let mut segments = token.split('+');
        // split always yields at least one segment
        let digest_text = segments.next().unwrap_or_default();
        let Some(size_text) = segments.next() else {
            return Err(ManifestError::MalformedBlockToken(token.to_string()));
        };

        let digest =
            BlockDigest::parse(digest_text).map_err(|source| ManifestError::MalformedDigest {
                token: token.to_string(),
                source,
            })?;

        let size = parse_size(size_text).ok_or_else(|| ManifestError::MalformedSize {
            token: token.to_string(),
            size: size_text.to_string(),
        })?;

        Ok(Self {
            digest,
            size,
            hints: segments.map(str::to_string).collect(),
        })
    }

    /// Raw hint tokens in manifest order
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Hints classified by kind, in manifest order
    pub fn parsed_hints(&self) -> impl Iterator<Item = Hint> + '_ {
        self.hints.iter().map(|raw| Hint::classify(raw))
    }

    /// The first permission signature hint, if the locator is signed
    pub fn signature(&self) -> Option<Hint> {
        self.parsed_hints().find(Hint::is_signature)
    }

    /// `digest+size` with all hints removed
    pub fn strip_hints(&self) -> String {
        format!("{}+{}", self.digest, self.size)
    }
}

impl fmt::Display for BlockLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.digest, self.size)?;
        for hint in &self.hints {
            write!(f, "+{hint}")?;
        }
        Ok(())
    }
}

impl FromStr for BlockLocator {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Check whether a token has the shape of a block token
///
/// The first `+` segment must look like a digest and the second must be a
/// non-empty run of ASCII digits. This is a shape test only: a shaped token
/// can still fail [`BlockLocator::parse`] on leading zeros or overflow.
pub fn is_block_token(token: &str) -> bool {
    let mut segments = token.splitn(3, '+');
    let digest = segments.next().unwrap_or_default();
    let Some(size) = segments.next() else {
        return false;
    };
    BlockDigest::is_digest_shaped(digest)
        && !size.is_empty()
        && size.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a canonical decimal `u64`: digits only, no sign, no leading zeros
fn parse_size(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if text.len() > 1 && text.starts_with('0') {
        return None;
    }
    text.parse::<u64>().ok()
}
