//! Decoder for Keep collection manifests
//!
//! A manifest describes a collection of files as an ordered set of streams.
//! Each non-blank line is one stream: a name, the blocks holding the stream's
//! bytes, and the file segments cut out of those bytes.
//!
//! ```text
//! . 365f83f5f808896ec834c8b595288735+2310+K@qr1hi 0:2310:log.txt
//! ./data b746e3d2104645f2f64cd3cc69dd895d+15693477 0:15693477:chr10.fj
//! ```
//!
//! # Components
//!
//! - [`BlockLocator`]: digest, size and opaque hints parsed from one block token
//! - [`ManifestStream`]: one decoded line, with raw block and file tokens
//! - [`FileSegment`]: one `offset:length:name` token
//! - [`Hint`]: optional classification of opaque locator hints
//! - [`Manifest`]: owns the text and hands out lazy traversals
//!
//! # Traversals
//!
//! Both traversals are pull-driven iterators over borrowed text. Nothing is
//! decoded until the caller asks for the next element, and a decode failure
//! ends the traversal with a line-numbered error.
//!
//! ```
//! use keep_manifest::Manifest;
//!
//! let manifest = Manifest::new(
//!     ". 365f83f5f808896ec834c8b595288735+2310 0:2310:a.txt\n\
//!      \n\
//!      ./sub 365f83f5f808896ec834c8b595288735+2310 0:2310:b.txt\n",
//! );
//!
//! let streams: Vec<_> = manifest
//!     .stream_iter()
//!     .collect::<Result<_, _>>()
//!     .expect("valid manifest");
//! assert_eq!(streams.len(), 2);
//!
//! // Blocks shared between streams are reported once per occurrence
//! let blocks = manifest.block_iter_with_duplicates().count();
//! assert_eq!(blocks, 2);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod hint;
pub mod locator;
pub mod manifest;
pub mod segment;
pub mod stream;

pub use error::{LineFault, ManifestError, Result};
pub use hint::Hint;
pub use keep_digest::{BlockDigest, DigestError};
pub use locator::{BlockLocator, is_block_token};
pub use manifest::{
    BlockIter, DecodePolicy, Manifest, ManifestSummary, StreamIter, UniqueBlockIter,
};
pub use segment::{FileSegment, unescape_name};
pub use stream::{BlockRange, ManifestStream, ROOT_STREAM, decode_stream};
