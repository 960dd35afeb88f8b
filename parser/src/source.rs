//! The pull-based byte source the state machine reads through.

use snafu::ResultExt;
use std::io::Read;

use crate::error::{IoSnafu, Result};

/// A byte source that the parser pulls from incrementally.
///
/// The state machine never blocks indefinitely on an upstream read it
/// cannot yet satisfy: it calls [`ensure`](ByteSource::ensure) to ask
/// whether at least `n` bytes are available, and only calls
/// [`take`](ByteSource::take) once that call returned `true`.
pub trait ByteSource {
    /// Attempts to make at least `n` unconsumed bytes available, reading
    /// from upstream as needed. Returns `true` once that many bytes are
    /// buffered, `false` if upstream closed first.
    fn ensure(&mut self, n: usize) -> Result<bool>;

    /// Consumes and returns the next `n` bytes.
    ///
    /// # Panics
    /// Panics if fewer than `n` bytes are currently buffered -- callers
    /// must `ensure(n)` and check its result first.
    fn take(&mut self, n: usize) -> Vec<u8>;

    /// The bytes currently buffered but not yet consumed, for peeking
    /// ahead without taking them.
    fn remaining_data(&self) -> &[u8];

    /// Whether the upstream reader has reported end-of-input.
    fn is_upstream_closed(&self) -> bool;

    /// Total number of bytes handed out via `take` so far.
    fn bytes_consumed(&self) -> u64;
}

/// A [`ByteSource`] backed by any [`Read`].
#[derive(Debug)]
pub struct ReadByteSource<R> {
    reader: R,
    buf: Vec<u8>,
    pos: usize,
    closed: bool,
    consumed: u64,
}

impl<R: Read> ReadByteSource<R> {
    pub fn new(reader: R) -> Self {
        ReadByteSource {
            reader,
            buf: Vec::new(),
            pos: 0,
            closed: false,
            consumed: 0,
        }
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.drain(0..self.pos);
            self.pos = 0;
        }
    }
}

impl<R: Read> ByteSource for ReadByteSource<R> {
    fn ensure(&mut self, n: usize) -> Result<bool> {
        while self.buf.len() - self.pos < n && !self.closed {
            self.compact();
            let mut chunk = [0u8; 8192];
            let read = self.reader.read(&mut chunk).context(IoSnafu)?;
            if read == 0 {
                self.closed = true;
            } else {
                self.buf.extend_from_slice(&chunk[..read]);
            }
        }
        Ok(self.buf.len() - self.pos >= n)
    }

    fn take(&mut self, n: usize) -> Vec<u8> {
        assert!(
            self.buf.len() - self.pos >= n,
            "take({n}) called without a prior successful ensure({n})"
        );
        let out = self.buf[self.pos..self.pos + n].to_vec();
        self.pos += n;
        self.consumed += n as u64;
        if self.pos > 64 * 1024 {
            self.compact();
        }
        out
    }

    fn remaining_data(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    fn is_upstream_closed(&self) -> bool {
        self.closed
    }

    fn bytes_consumed(&self) -> u64 {
        self.consumed
    }
}

/// A [`ByteSource`] backed by an owned in-memory buffer, handed out
/// whole. Used to re-feed inflated bytes to a fresh parser instance, and
/// in tests where the full input is already in memory.
#[derive(Debug)]
pub struct SliceByteSource {
    data: Vec<u8>,
    pos: usize,
}

impl SliceByteSource {
    pub fn new(data: Vec<u8>) -> Self {
        SliceByteSource { data, pos: 0 }
    }
}

impl ByteSource for SliceByteSource {
    fn ensure(&mut self, n: usize) -> Result<bool> {
        Ok(self.data.len() - self.pos >= n)
    }

    fn take(&mut self, n: usize) -> Vec<u8> {
        assert!(
            self.data.len() - self.pos >= n,
            "take({n}) called without a prior successful ensure({n})"
        );
        let out = self.data[self.pos..self.pos + n].to_vec();
        self.pos += n;
        out
    }

    fn remaining_data(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    fn is_upstream_closed(&self) -> bool {
        true
    }

    fn bytes_consumed(&self) -> u64 {
        self.pos as u64
    }
}
