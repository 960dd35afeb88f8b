//! Shared header-reading logic used by both FMI and dataset header states.

use dicom_core::{Endianness, Length, Tag, VR};
use snafu::ensure;
use tracing::warn;

use crate::error::{Result, TruncatedSnafu};
use crate::source::ByteSource;

/// The decoded form of an 8- or 12-byte element header, item marker, or
/// delimitation marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRead {
    pub tag: Tag,
    /// `VR::UN` for item/delimitation markers, which carry no VR on the
    /// wire; callers must check [`is_marker`](HeaderRead::is_marker)
    /// before trusting this field.
    pub vr: VR,
    pub value_length: Length,
    pub raw: Vec<u8>,
}

impl HeaderRead {
    pub fn is_marker(&self) -> bool {
        matches!(
            self.tag,
            Tag::ITEM | Tag::ITEM_DELIMITATION | Tag::SEQUENCE_DELIMITATION
        )
    }
}

/// Reads the next header from `source`, or returns `Ok(None)` if upstream
/// closed cleanly before any header bytes arrived.
///
/// `context` names the caller's state for the truncation error message
/// should upstream close mid-header.
pub fn read_header<S: ByteSource>(
    source: &mut S,
    endian: Endianness,
    explicit_vr: bool,
    context: &'static str,
) -> Result<Option<HeaderRead>> {
    if !source.ensure(8)? {
        if source.remaining_data().is_empty() {
            return Ok(None);
        }
        return TruncatedSnafu { context }.fail();
    }

    let peek = source.remaining_data();
    let tag = Tag(endian.read_u16(&peek[0..2]), endian.read_u16(&peek[2..4]));

    if matches!(
        tag,
        Tag::ITEM | Tag::ITEM_DELIMITATION | Tag::SEQUENCE_DELIMITATION
    ) {
        let value_length = Length(endian.read_u32(&peek[4..8]));
        let raw = source.take(8);
        return Ok(Some(HeaderRead {
            tag,
            vr: VR::UN,
            value_length,
            raw,
        }));
    }

    if explicit_vr {
        let vr_code = [peek[4], peek[5]];
        let vr = VR::from_binary(vr_code).unwrap_or_else(|| {
            warn!(?tag, "unrecognized explicit VR code, treating as UN");
            VR::UN
        });
        if vr.has_long_header() {
            ensure!(source.ensure(12)?, TruncatedSnafu { context });
            let peek = source.remaining_data();
            let value_length = Length(endian.read_u32(&peek[8..12]));
            let raw = source.take(12);
            warn_on_odd_length(tag, value_length);
            Ok(Some(HeaderRead {
                tag,
                vr,
                value_length,
                raw,
            }))
        } else {
            let value_length = Length(u32::from(endian.read_u16(&peek[6..8])));
            let raw = source.take(8);
            warn_on_odd_length(tag, value_length);
            Ok(Some(HeaderRead {
                tag,
                vr,
                value_length,
                raw,
            }))
        }
    } else {
        let value_length = Length(endian.read_u32(&peek[4..8]));
        let vr = dicom_dictionary_std::vr_of(tag);
        let raw = source.take(8);
        warn_on_odd_length(tag, value_length);
        Ok(Some(HeaderRead {
            tag,
            vr,
            value_length,
            raw,
        }))
    }
}

fn warn_on_odd_length(tag: Tag, length: Length) {
    if let Some(n) = length.get() {
        if n % 2 != 0 {
            warn!(?tag, length = n, "odd value length, DICOM requires even-length values");
        }
    }
}
