//! Error types for the dataset model, builder and collect flow.

use dicom_core::Tag;
use snafu::{Backtrace, Snafu};

/// A specialized `Result` type using this crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while assembling, addressing or mutating an
/// [`Elements`](crate::Elements) dataset.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// A tag-path operation was given a path shape that does not match the
    /// structure at that position (e.g. a sequence where a plain tag was
    /// expected, or an item index referring to no such item).
    #[snafu(display("invalid tag path at {}", tag))]
    InvalidPath { tag: Tag, backtrace: Backtrace },

    /// A keyword did not resolve to a known tag.
    #[snafu(display("unknown keyword `{}`", keyword))]
    UnknownKeyword {
        keyword: String,
        backtrace: Backtrace,
    },

    /// The collect flow's look-ahead buffer exceeded its configured cap.
    #[snafu(display("collect buffer exceeded {max_buffer_size} bytes while buffering tag {tag}"))]
    BufferOverflow {
        max_buffer_size: usize,
        tag: Tag,
        backtrace: Backtrace,
    },

    /// The underlying part stream failed.
    #[snafu(display("part stream failed while building an Elements value"))]
    Parse {
        source: dicom_parser::Error,
        backtrace: Backtrace,
    },

    /// A value chunk or item arrived with no open header or sequence to
    /// attach it to -- a malformed part stream (the parser itself never
    /// produces one; this only guards a caller feeding ad hoc parts).
    #[snafu(display("part stream out of sequence: {detail}"))]
    MalformedStream {
        detail: &'static str,
        backtrace: Backtrace,
    },
}
