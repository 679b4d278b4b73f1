//! Manifest decoder and lazy traversals
//!
//! A [`Manifest`] owns the raw manifest text and never changes after
//! construction. Each traversal borrows the text and walks it with its own
//! cursor, decoding one line at a time as the caller pulls. Nothing is
//! decoded ahead of demand, so a manifest with thousands of blocks is walked
//! in memory proportional to its longest line.
//!
//! Dropping a traversal part way through is enough to abandon it; there is
//! no background work to cancel.

use std::collections::HashSet;
use std::iter::FusedIterator;

use keep_digest::BlockDigest;
use tracing::{debug, warn};

use crate::error::{ManifestError, Result};
use crate::locator::BlockLocator;
use crate::stream::{ManifestStream, add_block_size};

/// What a traversal does when it meets a line or token it cannot decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Yield the error and end the traversal
    #[default]
    FailFast,
    /// Log the error, skip the offending line or token, and keep going
    SkipMalformed,
}

/// Complete manifest text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    text: String,
}

impl Manifest {
    /// Wrap manifest text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The raw manifest text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Iterate the streams of the manifest, one per non-blank line
    ///
    /// Blank lines are skipped. The first malformed line ends the traversal
    /// with an error carrying its line number.
    pub fn stream_iter(&self) -> StreamIter<'_> {
        StreamIter::new(&self.text, DecodePolicy::FailFast)
    }

    /// Iterate the streams of the manifest under an explicit policy
    pub fn stream_iter_with_policy(&self, policy: DecodePolicy) -> StreamIter<'_> {
        StreamIter::new(&self.text, policy)
    }

    /// Iterate every block token occurrence in stream order, then line order
    ///
    /// A block referenced from several streams, or several times in one
    /// stream, is yielded once per occurrence.
    pub fn block_iter_with_duplicates(&self) -> BlockIter<'_> {
        BlockIter::new(self.stream_iter())
    }

    /// Iterate every block token occurrence under an explicit policy
    pub fn block_iter_with_policy(&self, policy: DecodePolicy) -> BlockIter<'_> {
        BlockIter::new(self.stream_iter_with_policy(policy))
    }

    /// Iterate distinct blocks in order of first occurrence
    ///
    /// Blocks are identified by digest and size; the hints of the first
    /// occurrence are kept.
    pub fn unique_block_iter(&self) -> UniqueBlockIter<'_> {
        UniqueBlockIter {
            blocks: self.block_iter_with_duplicates(),
            seen: HashSet::new(),
        }
    }

    /// Walk the whole manifest once and collect aggregate counts
    ///
    /// Fails with [`ManifestError::SizeOverflow`] if a byte total does not fit
    /// in a `u64`.
    pub fn summary(&self) -> Result<ManifestSummary> {
        let mut summary = ManifestSummary::default();
        let mut seen = HashSet::new();
        let mut streams = self.stream_iter();

        while let Some(stream) = streams.next() {
            let stream = stream?;
            summary.streams += 1;
            summary.file_segments += stream.files().len();
            for locator in stream.block_locators() {
                let line = streams.line_number;
                let locator = locator.map_err(|e| e.at_line(line))?;
                summary.total_bytes =
                    add_block_size(summary.total_bytes, locator.size, summary.block_occurrences)
                        .map_err(|e| e.at_line(line))?;
                summary.block_occurrences += 1;
                if seen.insert((locator.digest, locator.size)) {
                    summary.unique_bytes =
                        add_block_size(summary.unique_bytes, locator.size, summary.unique_blocks)
                            .map_err(|e| e.at_line(line))?;
                    summary.unique_blocks += 1;
                }
            }
        }

        Ok(summary)
    }
}

impl From<String> for Manifest {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Manifest {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Aggregate counts over one manifest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManifestSummary {
    /// Number of streams (non-blank lines)
    pub streams: usize,
    /// Number of block token occurrences, duplicates included
    pub block_occurrences: usize,
    /// Number of distinct `(digest, size)` pairs
    pub unique_blocks: usize,
    /// Sum of block sizes over all occurrences
    pub total_bytes: u64,
    /// Sum of block sizes over distinct blocks
    pub unique_bytes: u64,
    /// Number of file segment tokens
    pub file_segments: usize,
}

/// Lazy traversal of a manifest's streams
///
/// Created by [`Manifest::stream_iter`]. Single pass; start a new traversal
/// to walk the manifest again.
#[derive(Debug)]
pub struct StreamIter<'a> {
    text: &'a str,
    pos: usize,
    line_number: usize,
    policy: DecodePolicy,
    yielded: usize,
    skipped: usize,
    finished: bool,
}

impl<'a> StreamIter<'a> {
    fn new(text: &'a str, policy: DecodePolicy) -> Self {
        Self {
            text,
            pos: 0,
            line_number: 0,
            policy,
            yielded: 0,
            skipped: 0,
            finished: false,
        }
    }

    /// Number of malformed lines skipped so far under [`DecodePolicy::SkipMalformed`]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// 1-based number of the line most recently read
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Policy this traversal was created with
    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    fn next_line(&mut self) -> Option<&'a str> {
        if self.pos >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.pos..];
        let line = match rest.find('\n') {
            Some(end) => {
                self.pos += end + 1;
                &rest[..end]
            }
            None => {
                self.pos = self.text.len();
                rest
            }
        };
        self.line_number += 1;
        Some(line)
    }

    fn finish(&mut self) {
        self.finished = true;
        debug!(
            streams = self.yielded,
            skipped = self.skipped,
            lines = self.line_number,
            "stream traversal finished"
        );
    }
}

impl Iterator for StreamIter<'_> {
    type Item = Result<ManifestStream>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let Some(line) = self.next_line() else {
                self.finish();
                break;
            };
            if line.is_empty() || line == "\r" {
                continue;
            }

            match ManifestStream::parse(line) {
                Ok(stream) => {
                    self.yielded += 1;
                    return Some(Ok(stream));
                }
                Err(err) => match self.policy {
                    DecodePolicy::FailFast => {
                        let err = err.at_line(self.line_number);
                        self.finish();
                        return Some(Err(err));
                    }
                    DecodePolicy::SkipMalformed => {
                        warn!(line = self.line_number, error = %err, "skipping malformed manifest line");
                        self.skipped += 1;
                    }
                },
            }
        }
        None
    }
}

impl FusedIterator for StreamIter<'_> {}

/// Lazy traversal of every block token occurrence in a manifest
///
/// Created by [`Manifest::block_iter_with_duplicates`].
#[derive(Debug)]
pub struct BlockIter<'a> {
    streams: StreamIter<'a>,
    pending: std::vec::IntoIter<String>,
    skipped: usize,
    finished: bool,
}

impl<'a> BlockIter<'a> {
    fn new(streams: StreamIter<'a>) -> Self {
        Self {
            streams,
            pending: Vec::new().into_iter(),
            skipped: 0,
            finished: false,
        }
    }

    /// Number of lines and block tokens skipped so far under
    /// [`DecodePolicy::SkipMalformed`]
    pub fn skipped(&self) -> usize {
        self.skipped + self.streams.skipped()
    }
}

impl Iterator for BlockIter<'_> {
    type Item = Result<BlockLocator>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            if let Some(token) = self.pending.next() {
                match BlockLocator::parse(&token) {
                    Ok(locator) => return Some(Ok(locator)),
                    Err(err) => match self.streams.policy() {
                        DecodePolicy::FailFast => {
                            self.finished = true;
                            return Some(Err(err.at_line(self.streams.line_number())));
                        }
                        DecodePolicy::SkipMalformed => {
                            warn!(
                                line = self.streams.line_number(),
                                error = %err,
                                "skipping malformed block token"
                            );
                            self.skipped += 1;
                            continue;
                        }
                    },
                }
            }

            match self.streams.next() {
                Some(Ok(stream)) => self.pending = stream.blocks.into_iter(),
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(err));
                }
                None => self.finished = true,
            }
        }
        None
    }
}

impl FusedIterator for BlockIter<'_> {}

/// Lazy traversal of distinct blocks in a manifest
///
/// Created by [`Manifest::unique_block_iter`]. Memory grows with the number
/// of distinct blocks seen so far.
#[derive(Debug)]
pub struct UniqueBlockIter<'a> {
    blocks: BlockIter<'a>,
    seen: HashSet<(BlockDigest, u64)>,
}

impl Iterator for UniqueBlockIter<'_> {
    type Item = Result<BlockLocator>;

    fn next(&mut self) -> Option<Self::Item> {
        for block in self.blocks.by_ref() {
            match block {
                Ok(locator) => {
                    if self.seen.insert((locator.digest, locator.size)) {
                        return Some(Ok(locator));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

impl FusedIterator for UniqueBlockIter<'_> {}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::LineFault;
    use pretty_assertions::assert_eq;

    fn token(seed: &[u8], size: u64) -> String {
        format!("{}+{size}", BlockDigest::from_data(seed))
    }

    fn sample() -> Manifest {
        let a = token(b"a", 3);
        let b = token(b"b", 4);
        Manifest::new(format!(
            ". {a} {b} 0:3:a.txt 3:4:b.txt\n\n./sub {b} {a} 0:7:ba.txt\n./empty 0:0:nothing\n"
        ))
    }

    #[test]
    fn test_stream_iter_skips_blank_lines() {
        let manifest = sample();
        let names: Vec<_> = manifest
            .stream_iter()
            .map(|s| s.expect("valid").stream_name)
            .collect();
        assert_eq!(names, vec![".", "./sub", "./empty"]);
    }

    #[test]
    fn test_empty_manifest_yields_nothing() {
        assert_eq!(Manifest::new("").stream_iter().count(), 0);
        assert_eq!(Manifest::new("\n\n\r\n").stream_iter().count(), 0);
        assert_eq!(Manifest::default().block_iter_with_duplicates().count(), 0);
    }

    #[test]
    fn test_last_line_without_newline() {
        let manifest = Manifest::from(". 0:0:a");
        let streams: Vec<_> = manifest.stream_iter().collect();
        assert_eq!(streams.len(), 1);
    }

    #[test]
    fn test_block_iter_keeps_duplicates_in_order() {
        let manifest = sample();
        let blocks: Vec<_> = manifest
            .block_iter_with_duplicates()
            .map(|b| b.expect("valid").to_string())
            .collect();
        assert_eq!(
            blocks,
            vec![
                token(b"a", 3),
                token(b"b", 4),
                token(b"b", 4),
                token(b"a", 3)
            ]
        );
    }

    #[test]
    fn test_unique_block_iter() {
        let manifest = sample();
        let blocks: Vec<_> = manifest
            .unique_block_iter()
            .map(|b| b.expect("valid").to_string())
            .collect();
        assert_eq!(blocks, vec![token(b"a", 3), token(b"b", 4)]);
    }

    #[test]
    fn test_traversals_are_independent() {
        let manifest = sample();
        let mut first = manifest.stream_iter();
        let mut second = manifest.stream_iter();
        assert_eq!(
            first.next().expect("element").expect("valid"),
            second.next().expect("element").expect("valid")
        );
        let rest_first: Vec<_> = first.collect();
        let rest_second: Vec<_> = second.collect();
        assert_eq!(rest_first, rest_second);
    }

    #[test]
    fn test_fail_fast_stops_at_bad_line() {
        let manifest = Manifest::new(". 0:0:a\n.\n./x 0:0:b\n");
        let mut streams = manifest.stream_iter();
        assert!(streams.next().expect("element").is_ok());
        let err = streams.next().expect("element").unwrap_err();
        assert_eq!(err.line_number(), Some(2));
        assert_eq!(
            err.root_cause(),
            &ManifestError::MalformedLine(LineFault::NoContent)
        );
        assert!(streams.next().is_none());
        assert!(streams.next().is_none());
    }

    #[test]
    fn test_skip_malformed_continues() {
        let manifest = Manifest::new(". 0:0:a\n.\nbogus 0:0:c\n./x 0:0:b\n");
        let mut streams = manifest.stream_iter_with_policy(DecodePolicy::SkipMalformed);
        let names: Vec<_> = streams
            .by_ref()
            .map(|s| s.expect("skipped errors are not yielded").stream_name)
            .collect();
        assert_eq!(names, vec![".", "./x"]);
        assert_eq!(streams.skipped(), 2);
    }

    #[test]
    fn test_block_error_ends_block_iteration() {
        let good = token(b"good", 1);
        let manifest = Manifest::new(format!(
            ". {good} 0:1:a\n./bad 365f83f5f808896ec834c8b595288735+007 0:7:b\n./after {good} 0:1:c\n"
        ));
        let results: Vec<_> = manifest.block_iter_with_duplicates().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.line_number(), Some(2));
        assert!(matches!(
            err.root_cause(),
            ManifestError::MalformedSize { .. }
        ));
    }

    #[test]
    fn test_block_iter_skip_policy() {
        let good = token(b"good", 1);
        let manifest = Manifest::new(format!(
            ". {good} 0:1:a\n./bad 365f83f5f808896ec834c8b595288735+007 0:7:b\n.\n./after {good} 0:1:c\n"
        ));
        let mut blocks = manifest.block_iter_with_policy(DecodePolicy::SkipMalformed);
        let count = blocks.by_ref().filter(Result::is_ok).count();
        assert_eq!(count, 2);
        assert_eq!(blocks.skipped(), 2);
    }

    #[test]
    fn test_summary_counts() {
        let summary = sample().summary().expect("valid manifest");
        assert_eq!(
            summary,
            ManifestSummary {
                streams: 3,
                block_occurrences: 4,
                unique_blocks: 2,
                total_bytes: 14,
                unique_bytes: 7,
                file_segments: 4,
            }
        );
    }

    #[test]
    fn test_summary_reports_line_of_bad_block() {
        let manifest = Manifest::new(
            ". 0:0:a\n\n./x 365f83f5f808896ec834c8b595288735+99999999999999999999 0:1:b\n",
        );
        let err = manifest.summary().unwrap_err();
        assert_eq!(err.line_number(), Some(3));
    }

    #[test]
    fn test_summary_byte_overflow_is_an_error() {
        let big = token(b"big", u64::MAX);
        let small = token(b"small", 1);
        let manifest = Manifest::new(format!(". {big} 0:0:a\n./x {small} 0:0:b\n"));
        let err = manifest.summary().unwrap_err();
        assert_eq!(err.line_number(), Some(2));
        assert_eq!(
            err.root_cause(),
            &ManifestError::SizeOverflow { blocks: 2 }
        );
    }

    #[test]
    fn test_manifest_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Manifest>();
        assert_send_sync::<StreamIter<'_>>();
        assert_send_sync::<BlockIter<'_>>();
    }
}
