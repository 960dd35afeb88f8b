//! Error types shared by the primitive layer.

use crate::tag::Tag;
use snafu::Snafu;

/// Errors produced while validating or converting DICOM primitives.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// A tag-path operation was given a path shape that does not match the
    /// structure it targets (e.g. addressing an item where a plain tag was
    /// expected).
    #[snafu(display("invalid tag path for operation at {}", tag))]
    InvalidPath { tag: Tag },

    /// A keyword did not resolve to a known tag.
    #[snafu(display("unknown keyword `{}`", keyword))]
    UnknownKeyword { keyword: String },
}

/// A specialized `Result` type using this module's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
