//! An incremental, pull-based parser producing a typed stream of DICOM
//! wire-level parts: the preamble, element headers, value chunks, and
//! item/sequence/fragment markers.
//!
//! This crate knows nothing about an in-memory dataset model -- it
//! speaks only the wire grammar. Turning a part stream into a dataset
//! (and back) is `dicom-object`'s job.
//!
//! The [`Parser`] itself never decompresses a deflated transfer syntax;
//! it surfaces the compressed bytes as [`Part::DeflatedChunk`]. The
//! [`parse`] entry point is the wrapping flow described by the
//! specification: it buffers those chunks, inflates them, and re-enters
//! a fresh parser over the plaintext, splicing its parts into the
//! stream the caller sees.

#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_import_braces)]

pub mod error;
pub mod header;
pub mod part;
pub mod source;
pub mod state;

pub use error::{Error, Result};
pub use part::Part;
pub use source::{ByteSource, ReadByteSource, SliceByteSource};
pub use state::{Parser, ParserOptions};

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use snafu::ResultExt;

use error::IoSnafu;

/// Options for the top-level [`parse`] entry point.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Maximum number of bytes per emitted value or deflate chunk.
    pub chunk_size: usize,
    /// Whether a deflated transfer syntax should be transparently
    /// inflated, with the resulting dataset parts spliced into the
    /// stream in place of the raw [`Part::DeflatedChunk`]s. When `false`,
    /// callers receive the compressed bytes verbatim.
    pub inflate: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            chunk_size: 8192,
            inflate: true,
        }
    }
}

/// Parses `reader` into a stream of [`Part`]s.
pub fn parse<R: Read + 'static>(reader: R, options: ParseOptions) -> Box<dyn Iterator<Item = Result<Part>>> {
    let parser = Parser::new(ReadByteSource::new(reader), ParserOptions { chunk_size: options.chunk_size });
    if !options.inflate {
        return Box::new(parser);
    }
    Box::new(InflatingParts {
        inner: Some(parser),
        chunk_size: options.chunk_size,
        deflated: Vec::new(),
        tail: None,
    })
}

/// Wraps a [`Parser`], transparently inflating a deflated transfer
/// syntax's dataset bytes and splicing the re-parsed plaintext's parts
/// into the stream.
struct InflatingParts<R> {
    inner: Option<Parser<ReadByteSource<R>>>,
    chunk_size: usize,
    deflated: Vec<u8>,
    tail: Option<Parser<SliceByteSource>>,
}

impl<R: Read> Iterator for InflatingParts<R> {
    type Item = Result<Part>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(tail) = self.tail.as_mut() {
            return tail.next();
        }

        let parser = self.inner.as_mut()?;
        loop {
            match parser.next() {
                Some(Ok(Part::DeflatedChunk { bytes, .. })) => {
                    self.deflated.extend_from_slice(&bytes);
                }
                Some(Ok(other)) => return Some(Ok(other)),
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    if self.deflated.is_empty() {
                        self.inner = None;
                        return None;
                    }
                    let big_endian = parser.is_big_endian();
                    let explicit_vr = parser.is_explicit_vr();
                    let nowrap = parser.is_deflate_nowrap();
                    self.inner = None;

                    let inflated = match inflate_all(&self.deflated, nowrap) {
                        Ok(bytes) => bytes,
                        Err(e) => return Some(Err(e)),
                    };
                    let mut tail = Parser::new_dataset_only(
                        SliceByteSource::new(inflated),
                        ParserOptions { chunk_size: self.chunk_size },
                        big_endian,
                        explicit_vr,
                    );
                    let first = tail.next();
                    self.tail = Some(tail);
                    return first;
                }
            }
        }
    }
}

fn inflate_all(bytes: &[u8], nowrap: bool) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    if nowrap {
        DeflateDecoder::new(bytes).read_to_end(&mut out).context(IoSnafu)?;
    } else {
        ZlibDecoder::new(bytes).read_to_end(&mut out).context(IoSnafu)?;
    }
    Ok(out)
}
