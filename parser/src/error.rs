//! Error types for the part-stream parser.

use dicom_core::Tag;
use snafu::{Backtrace, Snafu};

/// Type alias for a result using this crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal errors that terminate the part stream.
///
/// Non-fatal anomalies (odd value length, wrong FMI group length, an
/// oversized declared TSUID, an unrecognized item inside fragments, ...)
/// are never represented here -- they are logged through `tracing::warn!`
/// and the parser recovers in place, per the error handling design.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Could not recognize the input as DICOM content during autodetection.
    #[snafu(display("input does not look like DICOM content"))]
    NotDicom { backtrace: Backtrace },

    /// File Meta Information declared big-endian implicit VR, a combination
    /// the standard does not define.
    #[snafu(display("implicit VR big endian is not a supported combination"))]
    ImplicitBigEndianNotSupported { backtrace: Backtrace },

    /// The upstream source closed in the middle of a required read (a
    /// header, or a fixed-size FMI value).
    #[snafu(display("input truncated while reading {context}"))]
    Truncated {
        context: &'static str,
        backtrace: Backtrace,
    },

    /// The collect flow's look-ahead buffer exceeded its configured cap.
    #[snafu(display("collect buffer exceeded {max_buffer_size} bytes while buffering tag {tag}"))]
    BufferOverflow {
        max_buffer_size: usize,
        tag: Tag,
        backtrace: Backtrace,
    },

    /// An I/O error from the underlying byte source.
    #[snafu(display("I/O error reading DICOM content"))]
    Io {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}
