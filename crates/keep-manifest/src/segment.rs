//! File segment tokens
//!
//! A file segment token is `offset:length:name`, where `offset` and `length`
//! address a byte range in the concatenation of a stream's blocks and `name`
//! is the escaped file name. Names may themselves contain `:`, so only the
//! first two colons are separators.
//!
//! Names use octal escapes for bytes that would break tokenization, most
//! commonly `\040` for space. `\\` stands for a literal backslash.

use std::fmt;

use crate::error::{ManifestError, Result};

/// One `offset:length:name` reference within a stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileSegment {
    /// Byte offset into the stream's concatenated blocks
    pub offset: u64,
    /// Number of bytes in this segment
    pub length: u64,
    /// File name with escapes left in place
    pub name: String,
}

impl FileSegment {
    /// Decode a single file segment token
    pub fn parse(token: &str) -> Result<Self> {
        let malformed = |reason: &str| ManifestError::MalformedFileSegment {
            token: token.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = token.splitn(3, ':');
        let offset = parts.next().unwrap_or_default();
        let length = parts.next().ok_or_else(|| malformed("missing length"))?;
        let name = parts.next().ok_or_else(|| malformed("missing name"))?;

        let offset = parse_decimal(offset).ok_or_else(|| malformed("invalid offset"))?;
        let length = parse_decimal(length).ok_or_else(|| malformed("invalid length"))?;
        if name.is_empty() {
            return Err(malformed("empty name"));
        }
        if offset.checked_add(length).is_none() {
            return Err(malformed("offset + length overflows"));
        }

        Ok(Self {
            offset,
            length,
            name: name.to_string(),
        })
    }

    /// Exclusive end offset of the segment
    pub fn end(&self) -> u64 {
        // Checked during parsing; saturate for hand-built values.
        self.offset.saturating_add(self.length)
    }

    /// The name exactly as written in the manifest
    pub fn raw_name(&self) -> &str {
        &self.name
    }

    /// The name with octal and backslash escapes decoded
    pub fn unescaped_name(&self) -> String {
        unescape_name(&self.name)
    }
}

impl fmt::Display for FileSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.length, self.name)
    }
}

/// Decode `\NNN` octal escapes and `\\` in a stream or file name
///
/// Sequences that are not valid escapes are left untouched.
pub fn unescape_name(name: &str) -> String {
    if !name.contains('\\') {
        return name.to_string();
    }

    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if bytes.get(i + 1) == Some(&b'\\') {
                out.push(b'\\');
                i += 2;
                continue;
            }
            if let Some(value) = bytes.get(i + 1..i + 4).and_then(octal_byte) {
                out.push(value);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn octal_byte(digits: &[u8]) -> Option<u8> {
    if digits.len() != 3 || !digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
        return None;
    }
    let value = digits
        .iter()
        .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
    u8::try_from(value).ok()
}

fn parse_decimal(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_segment() {
        let segment =
            FileSegment::parse("0:2310:qr1hi-8i9sb-ienvmpve1a0vpoi.log.txt").expect("valid");
        assert_eq!(segment.offset, 0);
        assert_eq!(segment.length, 2310);
        assert_eq!(segment.name, "qr1hi-8i9sb-ienvmpve1a0vpoi.log.txt");
        assert_eq!(segment.end(), 2310);
    }

    #[test]
    fn test_name_may_contain_colons() {
        let segment = FileSegment::parse("5:10:a:b:c").expect("valid");
        assert_eq!(segment.name, "a:b:c");
        assert_eq!(segment.to_string(), "5:10:a:b:c");
    }

    #[test]
    fn test_zero_length_segment() {
        let segment = FileSegment::parse("0:0:empty.txt").expect("valid");
        assert_eq!(segment.length, 0);
    }

    #[test]
    fn test_malformed_segments() {
        for (token, reason) in [
            ("0:10", "missing name"),
            ("0", "missing length"),
            ("x:10:a", "invalid offset"),
            ("0:-1:a", "invalid length"),
            ("0:10:", "empty name"),
            ("18446744073709551615:1:a", "offset + length overflows"),
        ] {
            assert_eq!(
                FileSegment::parse(token).unwrap_err(),
                ManifestError::MalformedFileSegment {
                    token: token.to_string(),
                    reason: reason.to_string(),
                },
                "token {token:?}"
            );
        }
    }

    #[test]
    fn test_unescape_space() {
        let segment = FileSegment::parse("0:3:my\\040file.txt").expect("valid");
        assert_eq!(segment.raw_name(), "my\\040file.txt");
        assert_eq!(segment.unescaped_name(), "my file.txt");
    }

    #[test]
    fn test_unescape_backslash_and_invalid_sequences() {
        assert_eq!(unescape_name("a\\\\b"), "a\\b");
        assert_eq!(unescape_name("a\\09b"), "a\\09b");
        assert_eq!(unescape_name("trailing\\"), "trailing\\");
        assert_eq!(unescape_name("\\072colon"), ":colon");
        assert_eq!(unescape_name("./dir\\040name"), "./dir name");
    }
}
