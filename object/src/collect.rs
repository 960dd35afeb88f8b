//! The collect look-ahead flow: buffers a part stream while selectively
//! accumulating a whitelisted subset into an [`Elements`] value, then
//! replays the buffered parts unchanged and switches to pass-through.
//!
//! Grounded on the teacher's `DataSetReader`/token-buffering style
//! (`parser/src/dataset/read.rs`), adapted to this workspace's `Part`
//! stream and to the specification's whitelist/stop-condition design
//! rather than the teacher's own (different) lazy-reading scheme.

use std::collections::VecDeque;

use dicom_core::{Tag, TagPath, TagTree};
use dicom_dictionary_std::tags;
use dicom_parser::Part;
use snafu::IntoError;

use crate::builder::ElementSink;
use crate::elements::Elements;
use crate::error::{self, Result};

/// One item of a [`collect`] adapter's output stream: either the
/// synthetic, fully assembled [`Elements`] value for the collected
/// subset, or a pass-through wire part.
#[derive(Debug)]
pub enum CollectItem {
    /// Emitted exactly once, before any buffered [`Part`] is replayed.
    Elements(Elements),
    Part(Part),
}

/// Options governing a [`collect`] run.
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Maximum number of bytes the look-ahead buffer may hold before
    /// failing with [`Error::BufferOverflow`]. `0` means unbounded.
    pub max_buffer_size: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        CollectOptions { max_buffer_size: 0 }
    }
}

/// Wraps `parts` in a [`Collect`] adapter that accumulates every part
/// addressed by `whitelist` into a single [`Elements`] value, emitted as
/// soon as a top-level tag is seen past the whitelist's highest
/// top-level entry (or the stream ends), after which every part --
/// including the ones already buffered -- is yielded unchanged.
pub fn collect<I>(parts: I, whitelist: TagTree, options: CollectOptions) -> Collect<I::IntoIter>
where
    I: IntoIterator<Item = std::result::Result<Part, dicom_parser::Error>>,
{
    Collect {
        inner: parts.into_iter(),
        whitelist,
        max_buffer_size: options.max_buffer_size,
        buffered_bytes: 0,
        buffer: VecDeque::new(),
        sink: ElementSink::new(),
        path: TagPath::empty(),
        path_stack: Vec::new(),
        feeding: false,
        feed_stack: Vec::new(),
        current_seq_tag: Vec::new(),
        current_value_take: false,
        done: false,
    }
}

/// The iterator adapter produced by [`collect`].
pub struct Collect<I> {
    inner: I,
    whitelist: TagTree,
    max_buffer_size: usize,
    buffered_bytes: usize,
    buffer: VecDeque<Part>,
    sink: ElementSink,
    path: TagPath,
    path_stack: Vec<TagPath>,
    feeding: bool,
    feed_stack: Vec<bool>,
    current_seq_tag: Vec<Tag>,
    /// Whether the value chunks of the header currently in progress
    /// should be fed to the sink. Plain (non-sequence) headers don't push
    /// onto `feed_stack`, so this tracks the decision made when their
    /// `Part::Header` arrived, for the `Part::ValueChunk`s that follow.
    current_value_take: bool,
    done: bool,
}

fn part_tag(part: &Part) -> Option<Tag> {
    match part {
        Part::Header { tag, .. } | Part::Sequence { tag, .. } | Part::Fragments { tag, .. } => Some(*tag),
        _ => None,
    }
}

fn part_size(part: &Part) -> usize {
    let raw = part.raw_bytes().len();
    match part {
        Part::ValueChunk { bytes, .. } | Part::DeflatedChunk { bytes, .. } => bytes.len(),
        _ => raw,
    }
}

impl<I> Collect<I>
where
    I: Iterator<Item = std::result::Result<Part, dicom_parser::Error>>,
{
    /// Whether `part` is a top-level (depth-0) header/container past the
    /// whitelist's highest top-level tag -- the default stop condition
    /// of spec.md section 4.6.
    fn is_stop(&self, part: &Part) -> bool {
        if !self.path_stack.is_empty() {
            return false;
        }
        let tag = match part_tag(part) {
            Some(tag) => tag,
            None => return false,
        };
        match self.whitelist.max_head() {
            Some(max) => tag > max,
            None => true,
        }
    }

    /// Updates path/feeding bookkeeping for `part` and feeds it into the
    /// sink when the active subtree is whitelisted.
    fn route(&mut self, part: &Part) -> Result<()> {
        match part {
            Part::Header { tag, .. } => {
                let candidate = self.path.then_tag(*tag);
                // SpecificCharacterSet is always collected, whitelisted or
                // not, so the assembled Elements can decode multi-byte
                // text correctly (spec.md section 4.6, "Safety").
                let take = self.feeding
                    || self.whitelist.collects(&candidate)
                    || (self.path.is_root() && *tag == tags::SPECIFIC_CHARACTER_SET);
                self.current_value_take = take;
                if take {
                    self.feed(part.clone())?;
                }
            }

            Part::Sequence { tag, .. } => {
                let candidate = self.path.then_sequence(*tag);
                let take = self.feeding || self.whitelist.collects(&candidate);
                self.path_stack.push(self.path.clone());
                self.feed_stack.push(self.feeding);
                self.current_seq_tag.push(*tag);
                self.path = candidate;
                self.feeding = take;
                if self.feeding {
                    self.feed(part.clone())?;
                }
            }

            Part::Fragments { tag, .. } => {
                let candidate = self.path.then_tag(*tag);
                let take = self.feeding || self.whitelist.collects(&candidate);
                self.path_stack.push(self.path.clone());
                self.feed_stack.push(self.feeding);
                self.current_seq_tag.push(*tag);
                self.path = candidate;
                self.feeding = take;
                if self.feeding {
                    self.feed(part.clone())?;
                }
            }

            Part::Item { index, .. } => {
                if let Some(&seq_tag) = self.current_seq_tag.last() {
                    self.path_stack.push(self.path.clone());
                    self.path = self.path.then_item(seq_tag, *index);
                }
                if self.feeding {
                    self.feed(part.clone())?;
                }
            }

            Part::ItemDelimitation { .. } => {
                if self.feeding {
                    self.feed(part.clone())?;
                }
                if let Some(parent) = self.path_stack.pop() {
                    self.path = parent;
                }
            }

            Part::SequenceDelimitation { .. } => {
                if self.feeding {
                    self.feed(part.clone())?;
                }
                self.current_seq_tag.pop();
                if let Some(parent) = self.path_stack.pop() {
                    self.path = parent;
                }
                if let Some(parent_feeding) = self.feed_stack.pop() {
                    self.feeding = parent_feeding;
                }
            }

            Part::ValueChunk { .. } | Part::DeflatedChunk { .. } => {
                if self.feeding || self.current_value_take {
                    self.feed(part.clone())?;
                }
            }

            Part::Preamble { .. } | Part::Unknown { .. } => {}
        }
        Ok(())
    }

    fn feed(&mut self, part: Part) -> Result<()> {
        self.sink.push(part)
    }

    fn finalize(&mut self) -> Result<CollectItem> {
        let sink = std::mem::replace(&mut self.sink, ElementSink::new());
        self.done = true;
        sink.finish().map(CollectItem::Elements)
    }
}

impl<I> Iterator for Collect<I>
where
    I: Iterator<Item = std::result::Result<Part, dicom_parser::Error>>,
{
    type Item = Result<CollectItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            if let Some(part) = self.buffer.pop_front() {
                return Some(Ok(CollectItem::Part(part)));
            }
            return self.inner.next().map(|r| match r {
                Ok(part) => Ok(CollectItem::Part(part)),
                Err(source) => Err(error::ParseSnafu.into_error(source)),
            });
        }

        loop {
            let part = match self.inner.next() {
                Some(Ok(part)) => part,
                Some(Err(source)) => return Some(Err(error::ParseSnafu.into_error(source))),
                None => return Some(self.finalize()),
            };

            let size = part_size(&part);
            self.buffered_bytes += size;
            if self.max_buffer_size > 0 && self.buffered_bytes > self.max_buffer_size {
                return Some(
                    error::BufferOverflowSnafu {
                        max_buffer_size: self.max_buffer_size,
                        tag: part_tag(&part).unwrap_or(Tag(0, 0)),
                    }
                    .fail(),
                );
            }

            let stop = self.is_stop(&part);
            self.buffer.push_back(part.clone());

            if stop {
                return Some(self.finalize());
            }

            if let Err(e) = self.route(&part) {
                return Some(Err(e));
            }
        }
    }
}
