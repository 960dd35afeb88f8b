//! The element sink: aggregates a part stream into an [`Elements`] tree.
//!
//! Mirrors the teacher's `InMemDicomObject::build_object` /
//! `DataSetReader` consumption loop, adapted to this workspace's `Part`
//! stream instead of `DataToken`: a stack of in-progress `Elements`
//! frames for nested items, a stack of in-progress sequences, and a
//! single in-progress fragments accumulator, since only one fragments
//! element can be open at a time.

use dicom_core::{Length, Tag, VR};
use dicom_parser::Part;
use snafu::{OptionExt, ResultExt};

use crate::elements::{ElementSet, Elements, Fragments, Item, Sequence, ValueElement};
use crate::error::{self, Result};

struct PendingHeader {
    tag: Tag,
    vr: VR,
    big_endian: bool,
    explicit_vr: bool,
    bytes: Vec<u8>,
}

struct SeqFrame {
    tag: Tag,
    length: Length,
    big_endian: bool,
    explicit_vr: bool,
    items: Vec<Item>,
}

struct ItemFrame {
    length: Length,
    big_endian: bool,
}

/// Consumes a [`Part`] stream one part at a time, building an
/// [`Elements`] tree. Call [`push`](ElementSink::push) for every part in
/// order, then [`finish`](ElementSink::finish) once the stream is
/// exhausted (or once a caller-chosen subtree has been fully consumed,
/// as the collect flow does).
pub struct ElementSink {
    stack: Vec<Elements>,
    item_frames: Vec<ItemFrame>,
    seqs: Vec<SeqFrame>,
    fragments: Option<Fragments>,
    current_fragment: Option<Vec<u8>>,
    pending: Option<PendingHeader>,
}

impl ElementSink {
    pub fn new() -> Self {
        ElementSink {
            stack: vec![Elements::new()],
            item_frames: Vec::new(),
            seqs: Vec::new(),
            fragments: None,
            current_fragment: None,
            pending: None,
        }
    }

    fn top(&mut self) -> &mut Elements {
        self.stack.last_mut().expect("root frame is never popped")
    }

    /// Feeds one part into the builder.
    pub fn push(&mut self, part: Part) -> Result<()> {
        match part {
            Part::Preamble { .. } => {}

            Part::Header {
                tag,
                vr,
                big_endian,
                explicit_vr,
                ..
            } => {
                self.pending = Some(PendingHeader {
                    tag,
                    vr,
                    big_endian,
                    explicit_vr,
                    bytes: Vec::new(),
                });
            }

            Part::ValueChunk { bytes, last, .. } => {
                if let Some(buf) = self.current_fragment.as_mut() {
                    buf.extend_from_slice(&bytes);
                    if last {
                        let bytes = self.current_fragment.take().unwrap_or_default();
                        self.fragments_mut()?.push_item(bytes);
                    }
                } else {
                    let pending = self.pending.as_mut().context(error::MalformedStreamSnafu {
                        detail: "value chunk with no open header",
                    })?;
                    pending.bytes.extend_from_slice(&bytes);
                    if last {
                        let pending = self.pending.take().unwrap();
                        let element = ValueElement::new(
                            pending.tag,
                            pending.vr,
                            dicom_encoding::Value::from_bytes(pending.bytes),
                            pending.big_endian,
                            pending.explicit_vr,
                        );
                        self.top().set(ElementSet::Value(element));
                    }
                }
            }

            Part::Sequence {
                tag,
                length,
                big_endian,
                explicit_vr,
                ..
            } => {
                self.seqs.push(SeqFrame {
                    tag,
                    length,
                    big_endian,
                    explicit_vr,
                    items: Vec::new(),
                });
            }

            Part::Item { length, big_endian, .. } => {
                if self.fragments.is_some() {
                    match length.get() {
                        Some(0) | None => {
                            self.fragments_mut()?.push_item(Vec::new());
                        }
                        Some(_) => {
                            self.current_fragment = Some(Vec::new());
                        }
                    }
                } else {
                    let parent = self.stack.last().expect("root frame is never popped");
                    self.stack.push(Elements::new_inheriting(parent));
                    self.item_frames.push(ItemFrame { length, big_endian });
                }
            }

            Part::ItemDelimitation { .. } => {
                let elements = self.stack.pop().context(error::MalformedStreamSnafu {
                    detail: "item delimitation with no open item",
                })?;
                let frame = self.item_frames.pop().context(error::MalformedStreamSnafu {
                    detail: "item delimitation with no open item",
                })?;
                let item = if frame.length.is_undefined() {
                    Item::indeterminate(elements, frame.big_endian)
                } else {
                    Item::explicit(elements, frame.length, frame.big_endian)
                };
                let seq = self.seqs.last_mut().context(error::MalformedStreamSnafu {
                    detail: "item closed with no enclosing sequence",
                })?;
                seq.items.push(item);
            }

            Part::SequenceDelimitation { .. } => {
                if let Some(fragments) = self.fragments.take() {
                    self.top().set(ElementSet::Fragments(fragments));
                } else {
                    let frame = self.seqs.pop().context(error::MalformedStreamSnafu {
                        detail: "sequence delimitation with no open sequence",
                    })?;
                    let sequence = Sequence::new(frame.tag, frame.length, frame.items, frame.big_endian, frame.explicit_vr);
                    self.top().set(ElementSet::Sequence(sequence));
                }
            }

            Part::Fragments {
                tag,
                vr,
                big_endian,
                explicit_vr,
                ..
            } => {
                self.fragments = Some(Fragments::empty(tag, vr, big_endian, explicit_vr));
            }

            Part::DeflatedChunk { .. } => {
                return error::MalformedStreamSnafu {
                    detail: "compressed bytes reached the element builder undecoded",
                }
                .fail();
            }

            Part::Unknown { .. } => {
                tracing::warn!("dropping unrecognized part while building an Elements value");
            }
        }
        Ok(())
    }

    fn fragments_mut(&mut self) -> Result<&mut Fragments> {
        self.fragments.as_mut().context(error::MalformedStreamSnafu {
            detail: "fragment item with no open encapsulated pixel data element",
        })
    }

    /// Finalizes the builder, returning the root [`Elements`].
    ///
    /// Fails with [`Error::MalformedStream`](crate::Error::MalformedStream)
    /// if any item or sequence was left open -- a truncated part stream.
    pub fn finish(self) -> Result<Elements> {
        let ElementSink { mut stack, item_frames, seqs, fragments, .. } = self;
        if !item_frames.is_empty() || !seqs.is_empty() || fragments.is_some() {
            return error::MalformedStreamSnafu {
                detail: "part stream ended with an open item, sequence or fragments element",
            }
            .fail();
        }
        if stack.len() != 1 {
            return error::MalformedStreamSnafu {
                detail: "part stream ended with unbalanced item nesting",
            }
            .fail();
        }
        Ok(stack.pop().unwrap())
    }
}

/// Builds an [`Elements`] tree from a complete part stream in one call.
pub fn build_elements<I>(parts: I) -> Result<Elements>
where
    I: IntoIterator<Item = std::result::Result<Part, dicom_parser::Error>>,
{
    let mut sink = ElementSink::new();
    for part in parts {
        let part = part.context(error::ParseSnafu)?;
        sink.push(part)?;
    }
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::Tag;
    use dicom_parser::{Parser, ParserOptions, ReadByteSource};

    fn build_bytes(bytes: Vec<u8>) -> Result<Elements> {
        let parser = Parser::new(ReadByteSource::new(std::io::Cursor::new(bytes)), ParserOptions::default());
        build_elements(parser)
    }

    fn explicit_header(group: u16, element: u16, vr: &str, value: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&group.to_le_bytes());
        out.extend_from_slice(&element.to_le_bytes());
        out.extend_from_slice(vr.as_bytes());
        out.extend_from_slice(&(value.len() as u16).to_le_bytes());
        out.extend_from_slice(value);
        out
    }

    #[test]
    fn builds_flat_dataset_from_implicit_vr_bytes() {
        // (0010,0010) PN "Doe^John " as implicit VR LE: tag + 4-byte length + value.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x0010u16.to_le_bytes());
        bytes.extend_from_slice(&0x0010u16.to_le_bytes());
        let value = b"Doe^John\0";
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);

        let elements = build_bytes(bytes).unwrap();
        assert_eq!(elements.get_string(Tag(0x0010, 0x0010)), Some("Doe^John".to_string()));
    }

    #[test]
    fn builds_nested_sequence_with_one_item() {
        let mut bytes = Vec::new();
        // Explicit VR SQ, undefined length.
        bytes.extend_from_slice(&0x0008u16.to_le_bytes());
        bytes.extend_from_slice(&0x1110u16.to_le_bytes());
        bytes.extend_from_slice(b"SQ");
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        // Item, undefined length.
        bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
        bytes.extend_from_slice(&0xE000u16.to_le_bytes());
        bytes.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        // Nested (0020,000D) UI "1.2.3\0"
        bytes.extend(explicit_header(0x0020, 0x000D, "UI", b"1.2.3\0"));
        // Item delimitation.
        bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
        bytes.extend_from_slice(&0xE00Du16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        // Sequence delimitation.
        bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
        bytes.extend_from_slice(&0xE0DDu16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let elements = build_bytes(bytes).unwrap();
        let seq = elements.get_sequence(Tag(0x0008, 0x1110)).unwrap();
        assert_eq!(seq.items.len(), 1);
        let nested = &seq.item(1).unwrap().elements;
        assert_eq!(nested.get_string(Tag(0x0020, 0x000D)), Some("1.2.3".to_string()));
    }

    #[test]
    fn builds_encapsulated_fragments_with_offset_table() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x7FE0u16.to_le_bytes());
        bytes.extend_from_slice(&0x0010u16.to_le_bytes());
        bytes.extend_from_slice(b"OB");
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        // Offset table item (empty).
        bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
        bytes.extend_from_slice(&0xE000u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        // One fragment item with 2 bytes of data.
        bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
        bytes.extend_from_slice(&0xE000u16.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0xAB, 0xCD]);
        // Sequence delimitation closes the fragments.
        bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
        bytes.extend_from_slice(&0xE0DDu16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let elements = build_bytes(bytes).unwrap();
        let fragments = elements.get_fragments(Tag(0x7FE0, 0x0010)).unwrap();
        assert_eq!(fragments.frame_count(), 1);
        assert_eq!(fragments.fragments[0].bytes, vec![0xAB, 0xCD]);
    }
}
