//! Content digests for Keep block locators
//!
//! Every block stored in Keep is addressed by the MD5 hash of its content.
//! Manifests carry that hash as a 32-character hex string at the front of
//! each block locator. This crate provides the fixed-width binary digest
//! type and its validated textual encoding.
//!
//! # Examples
//!
//! ```
//! use keep_digest::BlockDigest;
//!
//! let digest = BlockDigest::parse("65a8e27d8879283831b664bd8b7f0ad4")
//!     .expect("valid digest");
//! assert_eq!(digest, BlockDigest::from_data(b"Hello, World!"));
//!
//! // Wrong-width text is rejected rather than padded or truncated
//! assert!(BlockDigest::parse("65a8e27d8879283831b664bd8b7f0ad").is_err());
//! ```

#![warn(missing_docs)]

pub mod digest;
pub mod error;

pub use digest::BlockDigest;
pub use error::DigestError;
