//! The incremental part-stream state machine.

use std::collections::VecDeque;

use dicom_core::{Endianness, Length, Tag, VR};
use dicom_dictionary_std::tags;
use snafu::OptionExt;
use tracing::warn;

use crate::error::{ImplicitBigEndianNotSupportedSnafu, NotDicomSnafu, Result, TruncatedSnafu};
use crate::header::read_header;
use crate::part::Part;
use crate::source::ByteSource;

/// Options governing a single parse run.
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Maximum number of bytes emitted per [`Part::ValueChunk`] or
    /// [`Part::DeflatedChunk`].
    pub chunk_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions { chunk_size: 8192 }
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    AtBeginning,
    InFmiHeader,
    InDatasetHeader,
    InValue {
        remaining: u32,
        big_endian: bool,
        next: ValueNext,
    },
    InFragments {
        fragment_index: u32,
    },
    InDeflatedData,
    Finished,
}

#[derive(Debug, Clone, Copy)]
enum ValueNext {
    FmiHeader,
    DatasetHeader,
    Fragments(u32),
}

#[derive(Debug, Clone, Copy)]
enum SeqToken {
    Sequence { length: Length, base_offset: u64, next_item_index: u32 },
    Item { length: Length, base_offset: u64, index: u32 },
}

/// The incremental, pull-based DICOM part-stream parser.
///
/// Drives a [`ByteSource`] through the preamble/FMI/dataset/fragments
/// state machine, yielding [`Part`]s as an [`Iterator`]. Deflated
/// transfer syntaxes are surfaced as raw [`Part::DeflatedChunk`]s --
/// inflating them and re-entering a fresh parser over the plaintext is
/// the job of [`crate::parse`].
#[derive(Debug)]
pub struct Parser<S> {
    source: S,
    chunk_size: usize,
    pending: VecDeque<Part>,
    state: State,
    big_endian: bool,
    explicit_vr: bool,
    fmi_end_pos: Option<u64>,
    tsuid: Option<String>,
    seq_delimiters: Vec<SeqToken>,
    pub(crate) deflate_nowrap: bool,
}

impl<S: ByteSource> Parser<S> {
    pub fn new(source: S, options: ParserOptions) -> Self {
        Parser {
            source,
            chunk_size: options.chunk_size.max(1),
            pending: VecDeque::new(),
            state: State::AtBeginning,
            big_endian: false,
            explicit_vr: true,
            fmi_end_pos: None,
            tsuid: None,
            seq_delimiters: Vec::new(),
            deflate_nowrap: false,
        }
    }

    /// Builds a parser that starts directly in dataset mode, skipping
    /// preamble/FMI detection. Used to re-enter a fresh parser over
    /// inflated deflate-transfer-syntax bytes.
    pub fn new_dataset_only(source: S, options: ParserOptions, big_endian: bool, explicit_vr: bool) -> Self {
        Parser {
            source,
            chunk_size: options.chunk_size.max(1),
            pending: VecDeque::new(),
            state: State::InDatasetHeader,
            big_endian,
            explicit_vr,
            fmi_end_pos: None,
            tsuid: None,
            seq_delimiters: Vec::new(),
            deflate_nowrap: false,
        }
    }

    /// The transfer syntax UID captured from File Meta Information, if
    /// any has been read so far.
    pub fn transfer_syntax_uid(&self) -> Option<&str> {
        self.tsuid.as_deref()
    }

    /// The byte order currently in effect for the dataset.
    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    /// Whether the dataset is currently read with explicit VRs.
    pub fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    /// Whether the active deflated transfer syntax uses a raw deflate
    /// stream (`true`) rather than a zlib-wrapped one (`false`).
    pub fn is_deflate_nowrap(&self) -> bool {
        self.deflate_nowrap
    }

    fn step(&mut self) -> Result<()> {
        match self.state {
            State::AtBeginning => self.step_at_beginning(),
            State::InFmiHeader => self.step_fmi_header(),
            State::InDatasetHeader => self.step_dataset_header(),
            State::InValue { remaining, big_endian, next } => self.step_value(remaining, big_endian, next),
            State::InFragments { fragment_index } => self.step_fragments(fragment_index),
            State::InDeflatedData => self.step_deflated(),
            State::Finished => Ok(()),
        }
    }

    fn step_at_beginning(&mut self) -> Result<()> {
        if self.source.ensure(132)? {
            let peek = self.source.remaining_data();
            if &peek[128..132] == b"DICM" {
                let raw = self.source.take(132);
                self.pending.push_back(Part::Preamble { raw });
                return Ok(());
            }
        }

        if !self.source.ensure(8)? {
            self.state = State::Finished;
            return Ok(());
        }

        let peek = self.source.remaining_data();
        let mut detected: Option<(bool, bool, Tag)> = None;
        for &assume_big in &[false, true] {
            let endian = Endianness::from_big(assume_big);
            let tag = Tag(endian.read_u16(&peek[0..2]), endian.read_u16(&peek[2..4]));
            let vr_valid = VR::from_binary([peek[4], peek[5]]).is_some();
            if vr_valid && tag.group() == 2 {
                detected = Some((true, assume_big, tag));
                break;
            }
            let len = endian.read_i32(&peek[4..8]);
            if len >= 0 {
                if !assume_big {
                    detected = Some((false, false, tag));
                    break;
                }
                if tag.group() == 2 {
                    return ImplicitBigEndianNotSupportedSnafu.fail();
                }
            }
        }

        let (explicit_vr, big_endian, tag) = detected.context(NotDicomSnafu)?;
        self.explicit_vr = explicit_vr;
        self.big_endian = big_endian;
        self.state = if tag.group() == 2 {
            State::InFmiHeader
        } else {
            State::InDatasetHeader
        };
        Ok(())
    }

    fn step_fmi_header(&mut self) -> Result<()> {
        if !self.source.ensure(2)? {
            self.state = State::Finished;
            return Ok(());
        }

        let endian = Endianness::from_big(self.big_endian);
        let (b0, b1, group) = {
            let peek = self.source.remaining_data();
            (peek[0], peek[1], endian.read_u16(&peek[0..2]))
        };
        if group != 2 {
            warn!(group, "non-group-2 tag inside File Meta Information, treating it as the start of the dataset");
            self.state = self.enter_dataset_from_fmi(b0, b1)?;
            return Ok(());
        }

        let header = match read_header(&mut self.source, endian, self.explicit_vr, "File Meta Information header")? {
            Some(h) => h,
            None => {
                self.state = State::Finished;
                return Ok(());
            }
        };

        if header.tag == tags::FILE_META_INFORMATION_GROUP_LENGTH {
            let n = header.value_length.get().unwrap_or(0) as usize;
            if !self.source.ensure(n)? {
                return TruncatedSnafu {
                    context: "File Meta Information group length value",
                }
                .fail();
            }
            let value = self.source.take(n);
            if let Some(bytes) = value.get(0..4) {
                let group_len = u64::from(endian.read_u32(bytes));
                self.fmi_end_pos = Some(self.source.bytes_consumed() + group_len);
            } else {
                warn!("File Meta Information group length value is shorter than 4 bytes");
            }
            self.emit_fmi_header_and_value(header.tag, header.vr, header.value_length, header.raw, value);
            self.state = self.after_fmi_value()?;
            return Ok(());
        }

        if header.tag == tags::TRANSFER_SYNTAX_UID {
            if let Some(n) = header.value_length.get() {
                if n < 1024 {
                    if !self.source.ensure(n as usize)? {
                        return TruncatedSnafu {
                            context: "TransferSyntaxUID value",
                        }
                        .fail();
                    }
                    let value = self.source.take(n as usize);
                    let trimmed = String::from_utf8_lossy(&value)
                        .trim_end_matches(|c: char| c == ' ' || c == '\0')
                        .to_string();
                    self.tsuid = Some(trimmed);
                    self.emit_fmi_header_and_value(header.tag, header.vr, header.value_length, header.raw, value);
                    self.state = self.after_fmi_value()?;
                    return Ok(());
                }
                warn!(length = n, "TransferSyntaxUID value implausibly large, not captured");
            }
        }

        self.pending.push_back(Part::Header {
            tag: header.tag,
            vr: header.vr,
            value_length: header.value_length,
            is_fmi: true,
            big_endian: self.big_endian,
            explicit_vr: self.explicit_vr,
            raw: header.raw,
        });
        self.state = State::InValue {
            remaining: header.value_length.get().unwrap_or(0),
            big_endian: self.big_endian,
            next: ValueNext::FmiHeader,
        };
        Ok(())
    }

    fn emit_fmi_header_and_value(&mut self, tag: Tag, vr: VR, value_length: Length, raw: Vec<u8>, value: Vec<u8>) {
        self.pending.push_back(Part::Header {
            tag,
            vr,
            value_length,
            is_fmi: true,
            big_endian: self.big_endian,
            explicit_vr: self.explicit_vr,
            raw,
        });
        self.pending.push_back(Part::ValueChunk {
            big_endian: self.big_endian,
            bytes: value,
            last: true,
        });
    }

    fn after_fmi_value(&mut self) -> Result<State> {
        let pos = self.source.bytes_consumed();
        let end = match self.fmi_end_pos {
            Some(end) => end,
            None => return Ok(State::InFmiHeader),
        };
        if pos < end {
            return Ok(State::InFmiHeader);
        }
        if !self.source.ensure(2)? {
            return Ok(State::Finished);
        }
        let endian = Endianness::from_big(self.big_endian);
        let (b0, b1, group) = {
            let peek = self.source.remaining_data();
            (peek[0], peek[1], endian.read_u16(&peek[0..2]))
        };
        if group == 2 {
            warn!("File Meta Information group length undercounts its own elements, continuing to read it");
            return Ok(State::InFmiHeader);
        }
        self.enter_dataset_from_fmi(b0, b1)
    }

    fn enter_dataset_from_fmi(&mut self, b0: u8, b1: u8) -> Result<State> {
        let ts = self
            .tsuid
            .as_deref()
            .and_then(|uid| dicom_transfer_syntax_registry::TransferSyntaxRegistry.get(uid))
            .copied();
        let ts = match ts {
            Some(ts) => ts,
            None => {
                warn!(tsuid = ?self.tsuid, "missing or unrecognized transfer syntax UID, defaulting to Explicit VR Little Endian");
                dicom_transfer_syntax_registry::default()
            }
        };
        self.big_endian = ts.is_big_endian();
        self.explicit_vr = ts.is_explicit_vr();
        self.seq_delimiters.clear();
        if ts.is_deflated() {
            self.deflate_nowrap = !(b0 == 0x78 && b1 == 0x9C);
            Ok(State::InDeflatedData)
        } else {
            Ok(State::InDatasetHeader)
        }
    }

    fn close_definite_length(&mut self) {
        loop {
            let pos = self.source.bytes_consumed();
            let should_pop = match self.seq_delimiters.last() {
                Some(SeqToken::Sequence { length, base_offset, .. })
                | Some(SeqToken::Item { length, base_offset, .. }) => match length.get() {
                    Some(n) => pos >= base_offset + u64::from(n),
                    None => false,
                },
                None => false,
            };
            if !should_pop {
                break;
            }
            let big_endian = self.big_endian;
            match self.seq_delimiters.pop().unwrap() {
                SeqToken::Item { index, .. } => {
                    self.pending.push_back(Part::ItemDelimitation {
                        index,
                        big_endian,
                        raw: Vec::new(),
                    });
                }
                SeqToken::Sequence { .. } => {
                    self.pending.push_back(Part::SequenceDelimitation { big_endian, raw: Vec::new() });
                }
            }
        }
    }

    fn push_item_token(&mut self, length: Length) -> u32 {
        let index = match self.seq_delimiters.last_mut() {
            Some(SeqToken::Sequence { next_item_index, .. }) => {
                *next_item_index += 1;
                *next_item_index
            }
            _ => {
                warn!("item tag encountered without an enclosing sequence");
                1
            }
        };
        self.seq_delimiters.push(SeqToken::Item {
            length,
            base_offset: self.source.bytes_consumed(),
            index,
        });
        index
    }

    fn pop_item_token_explicit(&mut self) -> u32 {
        match self.seq_delimiters.last() {
            Some(SeqToken::Item { index, .. }) => {
                let index = *index;
                self.seq_delimiters.pop();
                index
            }
            _ => {
                warn!("item delimitation tag without a matching open item");
                0
            }
        }
    }

    fn pop_sequence_token_explicit(&mut self) {
        if matches!(self.seq_delimiters.last(), Some(SeqToken::Sequence { .. })) {
            self.seq_delimiters.pop();
        } else {
            warn!("sequence delimitation tag without a matching open sequence");
        }
    }

    fn step_dataset_header(&mut self) -> Result<()> {
        self.close_definite_length();
        if !self.pending.is_empty() {
            return Ok(());
        }

        let endian = Endianness::from_big(self.big_endian);
        let header = match read_header(&mut self.source, endian, self.explicit_vr, "dataset header")? {
            Some(h) => h,
            None => {
                self.state = State::Finished;
                return Ok(());
            }
        };
        let big_endian = self.big_endian;
        let explicit_vr = self.explicit_vr;

        match header.tag {
            Tag::ITEM => {
                let index = self.push_item_token(header.value_length);
                self.pending.push_back(Part::Item {
                    index,
                    length: header.value_length,
                    big_endian,
                    raw: header.raw,
                });
            }
            Tag::ITEM_DELIMITATION => {
                let index = self.pop_item_token_explicit();
                self.pending.push_back(Part::ItemDelimitation { index, big_endian, raw: header.raw });
            }
            Tag::SEQUENCE_DELIMITATION => {
                self.pop_sequence_token_explicit();
                self.pending.push_back(Part::SequenceDelimitation { big_endian, raw: header.raw });
            }
            tag => {
                let is_sequence = header.vr == VR::SQ || (header.vr == VR::UN && header.value_length.is_undefined());
                if is_sequence {
                    self.pending.push_back(Part::Sequence {
                        tag,
                        length: header.value_length,
                        big_endian,
                        explicit_vr,
                        raw: header.raw,
                    });
                    self.seq_delimiters.push(SeqToken::Sequence {
                        length: header.value_length,
                        base_offset: self.source.bytes_consumed(),
                        next_item_index: 0,
                    });
                } else if header.value_length.is_undefined() {
                    self.pending.push_back(Part::Fragments {
                        tag,
                        length: header.value_length,
                        vr: header.vr,
                        big_endian,
                        explicit_vr,
                        raw: header.raw,
                    });
                    self.state = State::InFragments { fragment_index: 0 };
                } else {
                    self.pending.push_back(Part::Header {
                        tag,
                        vr: header.vr,
                        value_length: header.value_length,
                        is_fmi: false,
                        big_endian,
                        explicit_vr,
                        raw: header.raw,
                    });
                    self.state = State::InValue {
                        remaining: header.value_length.0,
                        big_endian,
                        next: ValueNext::DatasetHeader,
                    };
                }
            }
        }
        Ok(())
    }

    fn step_value(&mut self, remaining: u32, big_endian: bool, next: ValueNext) -> Result<()> {
        if remaining == 0 {
            self.pending.push_back(Part::ValueChunk { big_endian, bytes: Vec::new(), last: true });
            self.state = self.after_value(next)?;
            return Ok(());
        }

        let want = (remaining as usize).min(self.chunk_size);
        if self.source.ensure(want)? {
            let bytes = self.source.take(want);
            let left = remaining - bytes.len() as u32;
            let last = left == 0;
            self.pending.push_back(Part::ValueChunk { big_endian, bytes, last });
            self.state = if last {
                self.after_value(next)?
            } else {
                State::InValue { remaining: left, big_endian, next }
            };
        } else if self.source.is_upstream_closed() {
            let avail = self.source.remaining_data().len();
            let bytes = self.source.take(avail);
            self.pending.push_back(Part::ValueChunk { big_endian, bytes, last: true });
            self.state = State::Finished;
        } else {
            return TruncatedSnafu { context: "value" }.fail();
        }
        Ok(())
    }

    fn after_value(&mut self, next: ValueNext) -> Result<State> {
        match next {
            ValueNext::DatasetHeader => Ok(State::InDatasetHeader),
            ValueNext::Fragments(idx) => Ok(State::InFragments { fragment_index: idx }),
            ValueNext::FmiHeader => self.after_fmi_value(),
        }
    }

    fn step_fragments(&mut self, fragment_index: u32) -> Result<()> {
        let endian = Endianness::from_big(self.big_endian);
        let header = match read_header(&mut self.source, endian, self.explicit_vr, "fragments")? {
            Some(h) => h,
            None => {
                self.state = State::Finished;
                return Ok(());
            }
        };
        let big_endian = self.big_endian;

        match header.tag {
            Tag::ITEM => {
                let index = fragment_index + 1;
                self.pending.push_back(Part::Item {
                    index,
                    length: header.value_length,
                    big_endian,
                    raw: header.raw,
                });
                match header.value_length.get() {
                    Some(n) if n > 0 => {
                        self.state = State::InValue {
                            remaining: n,
                            big_endian,
                            next: ValueNext::Fragments(index),
                        };
                    }
                    Some(_) => {
                        self.state = State::InFragments { fragment_index: index };
                    }
                    None => {
                        warn!("fragment item declared an indeterminate length, treating it as empty");
                        self.state = State::InFragments { fragment_index: index };
                    }
                }
            }
            Tag::SEQUENCE_DELIMITATION => {
                self.pending.push_back(Part::SequenceDelimitation { big_endian, raw: header.raw });
                self.state = State::InDatasetHeader;
            }
            tag => {
                warn!(?tag, "unexpected element inside encapsulated pixel data fragments");
                let value_len = header.value_length.get().unwrap_or(0) as usize;
                let mut raw = header.raw;
                if value_len > 0 {
                    if !self.source.ensure(value_len)? {
                        return TruncatedSnafu { context: "fragments" }.fail();
                    }
                    raw.extend(self.source.take(value_len));
                }
                self.pending.push_back(Part::Unknown { big_endian, raw });
                self.state = State::InFragments { fragment_index };
            }
        }
        Ok(())
    }

    fn step_deflated(&mut self) -> Result<()> {
        let want = self.chunk_size;
        if self.source.ensure(want)? {
            let bytes = self.source.take(want);
            self.pending.push_back(Part::DeflatedChunk {
                big_endian: self.big_endian,
                bytes,
                nowrap: self.deflate_nowrap,
            });
        } else {
            let avail = self.source.remaining_data().len();
            let bytes = self.source.take(avail);
            self.pending.push_back(Part::DeflatedChunk {
                big_endian: self.big_endian,
                bytes,
                nowrap: self.deflate_nowrap,
            });
            self.state = State::Finished;
        }
        Ok(())
    }
}

impl<S: ByteSource> Iterator for Parser<S> {
    type Item = Result<Part>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(part) = self.pending.pop_front() {
                return Some(Ok(part));
            }
            if matches!(self.state, State::Finished) {
                return None;
            }
            if let Err(e) = self.step() {
                self.state = State::Finished;
                return Some(Err(e));
            }
        }
    }
}
