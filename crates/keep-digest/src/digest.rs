//! MD5 block digests

use md5::{Digest, Md5};
use std::fmt;
use std::str::FromStr;

use crate::error::DigestError;

/// Content digest (MD5 hash) identifying an immutable block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockDigest([u8; 16]);

impl BlockDigest {
    /// Size of the binary digest in bytes
    pub const LEN: usize = 16;

    /// Size of the textual digest in hex characters
    pub const HEX_LEN: usize = Self::LEN * 2;

    /// Create a digest from raw bytes
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create a digest from data by computing its MD5 hash
    pub fn from_data(data: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&result);
        Self(bytes)
    }

    /// Parse a digest from its textual form
    ///
    /// Accepts exactly [`Self::HEX_LEN`] hex characters in either case. The
    /// canonical form produced by [`Self::to_hex`] is always lowercase.
    pub fn parse(text: &str) -> Result<Self, DigestError> {
        if text.len() != Self::HEX_LEN {
            return Err(DigestError::InvalidLength {
                expected: Self::HEX_LEN,
                actual: text.len(),
            });
        }

        let mut bytes = [0u8; 16];
        hex::decode_to_slice(text, &mut bytes).map_err(|err| match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => DigestError::InvalidCharacter {
                character: c,
                index,
            },
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                DigestError::InvalidLength {
                    expected: Self::HEX_LEN,
                    actual: text.len(),
                }
            }
        })?;
        Ok(Self(bytes))
    }

    /// Check whether `text` has the shape of a textual digest without decoding it
    pub fn is_digest_shaped(text: &str) -> bool {
        text.len() == Self::HEX_LEN && text.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Get raw bytes
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for BlockDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for BlockDigest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; 16]> for BlockDigest {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BlockDigest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BlockDigest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
