//! The typed part stream emitted by the parser.

use dicom_core::{Length, Tag, VR};

/// One structural unit of a DICOM byte stream.
///
/// Concatenating every part's raw bytes (and every [`Part::ValueChunk`]'s
/// and [`Part::DeflatedChunk`]'s payload bytes, in emission order)
/// reproduces the original input exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// The 132-byte Part 10 preamble, ending in the `"DICM"` magic.
    Preamble { raw: Vec<u8> },

    /// An element header (File Meta Information or dataset).
    Header {
        tag: Tag,
        vr: VR,
        value_length: Length,
        is_fmi: bool,
        big_endian: bool,
        explicit_vr: bool,
        raw: Vec<u8>,
    },

    /// A chunk of a value's bytes, up to the parser's configured chunk
    /// size. `last` is set on the final chunk of the value (which may be
    /// shorter than the chunk size, including empty on truncation).
    ValueChunk {
        big_endian: bool,
        bytes: Vec<u8>,
        last: bool,
    },

    /// A sequence header (`VR == SQ`, or `UN` with indeterminate length).
    Sequence {
        tag: Tag,
        length: Length,
        big_endian: bool,
        explicit_vr: bool,
        raw: Vec<u8>,
    },

    /// An item delimiter tag (`0xFFFEE000`) opening a sequence item or a
    /// pixel data fragment.
    Item {
        index: u32,
        length: Length,
        big_endian: bool,
        raw: Vec<u8>,
    },

    /// An item delimitation tag (`0xFFFEE00D`) closing an indeterminate
    /// item.
    ItemDelimitation {
        index: u32,
        big_endian: bool,
        raw: Vec<u8>,
    },

    /// A sequence delimitation tag (`0xFFFEE0DD`) closing an
    /// indeterminate sequence or a fragments element.
    SequenceDelimitation { big_endian: bool, raw: Vec<u8> },

    /// An encapsulated-pixel-data header (non-SQ element with
    /// indeterminate length).
    Fragments {
        tag: Tag,
        length: Length,
        vr: VR,
        big_endian: bool,
        explicit_vr: bool,
        raw: Vec<u8>,
    },

    /// A chunk of inflated dataset bytes, re-fed to a nested parser.
    DeflatedChunk {
        big_endian: bool,
        bytes: Vec<u8>,
        nowrap: bool,
    },

    /// Bytes the parser could not interpret as a recognized construct
    /// (e.g. a stray element inside a fragments sequence). Recovered
    /// from with a warning; never a fatal condition.
    Unknown { big_endian: bool, raw: Vec<u8> },
}

impl Part {
    /// The raw wire bytes carried by this part, not including
    /// [`Part::ValueChunk`]/[`Part::DeflatedChunk`] payload bytes (which
    /// live in their own `bytes` field).
    pub fn raw_bytes(&self) -> &[u8] {
        match self {
            Part::Preamble { raw }
            | Part::Header { raw, .. }
            | Part::Sequence { raw, .. }
            | Part::Item { raw, .. }
            | Part::ItemDelimitation { raw, .. }
            | Part::SequenceDelimitation { raw, .. }
            | Part::Fragments { raw, .. }
            | Part::Unknown { raw, .. } => raw,
            Part::ValueChunk { bytes, .. } | Part::DeflatedChunk { bytes, .. } => bytes,
        }
    }

    /// The part's declared byte order, where applicable.
    pub fn is_big_endian(&self) -> bool {
        match self {
            Part::Preamble { .. } => false,
            Part::Header { big_endian, .. }
            | Part::ValueChunk { big_endian, .. }
            | Part::Sequence { big_endian, .. }
            | Part::Item { big_endian, .. }
            | Part::ItemDelimitation { big_endian, .. }
            | Part::SequenceDelimitation { big_endian, .. }
            | Part::Fragments { big_endian, .. }
            | Part::DeflatedChunk { big_endian, .. }
            | Part::Unknown { big_endian, .. } => *big_endian,
        }
    }
}
