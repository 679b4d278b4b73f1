//! Block locator hint classification
//!
//! The decoder keeps hints as opaque strings so that unknown hint kinds never
//! break decoding. Callers that care about specific kinds (permission
//! signatures, remote cluster signatures, location hints) classify them here.
//!
//! | Prefix | Form                               | Variant                   |
//! |--------|------------------------------------|---------------------------|
//! | `A`    | `A<signature>@<hex expiry>`        | [`Hint::Signature`]       |
//! | `R`    | `R<cluster>-<signature>@<expiry>`  | [`Hint::RemoteSignature`] |
//! | `K`    | `K<anything>`                      | [`Hint::Location`]        |
//! | other  | anything                           | [`Hint::Other`]           |

use std::fmt;

/// A classified block locator hint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Hint {
    /// Permission signature issued by the local cluster
    Signature {
        /// Hex signature
        signature: String,
        /// Hex expiry timestamp
        expires: String,
    },
    /// Permission signature issued by a remote cluster
    RemoteSignature {
        /// Five-character cluster prefix
        cluster: String,
        /// Hex signature
        signature: String,
        /// Hex expiry timestamp
        expires: String,
    },
    /// Storage location hint, kept verbatim without the `K` prefix
    Location(String),
    /// Any hint this crate does not recognize, kept verbatim
    Other(String),
}

impl Hint {
    /// Classify a raw hint token
    ///
    /// Classification never fails: anything that does not match a known form
    /// becomes [`Hint::Other`].
    pub fn classify(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix('A') {
            if let Some((signature, expires)) = split_signed(rest) {
                return Self::Signature {
                    signature: signature.to_string(),
                    expires: expires.to_string(),
                };
            }
        } else if let Some(rest) = raw.strip_prefix('R') {
            if let Some((cluster, signed)) = rest.split_once('-') {
                if let Some((signature, expires)) = split_signed(signed) {
                    if !cluster.is_empty() {
                        return Self::RemoteSignature {
                            cluster: cluster.to_string(),
                            signature: signature.to_string(),
                            expires: expires.to_string(),
                        };
                    }
                }
            }
        } else if let Some(rest) = raw.strip_prefix('K') {
            return Self::Location(rest.to_string());
        }
        Self::Other(raw.to_string())
    }

    /// Whether this hint is a permission signature (local or remote)
    pub fn is_signature(&self) -> bool {
        matches!(self, Self::Signature { .. } | Self::RemoteSignature { .. })
    }

    /// Expiry timestamp of a signature hint, in seconds since the epoch
    pub fn expires_at(&self) -> Option<u64> {
        match self {
            Self::Signature { expires, .. } | Self::RemoteSignature { expires, .. } => {
                u64::from_str_radix(expires, 16).ok()
            }
            Self::Location(_) | Self::Other(_) => None,
        }
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature { signature, expires } => write!(f, "A{signature}@{expires}"),
            Self::RemoteSignature {
                cluster,
                signature,
                expires,
            } => write!(f, "R{cluster}-{signature}@{expires}"),
            Self::Location(location) => write!(f, "K{location}"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// Split `<hex signature>@<hex expiry>`, requiring both halves to be hex
fn split_signed(text: &str) -> Option<(&str, &str)> {
    let (signature, expires) = text.split_once('@')?;
    let is_hex = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit());
    (is_hex(signature) && is_hex(expires)).then_some((signature, expires))
}
