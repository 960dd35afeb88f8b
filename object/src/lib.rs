//! The in-memory DICOM dataset model.
//!
//! Builds on `dicom-parser`'s wire-level [`Part`](dicom_parser::Part)
//! stream with three things the parser itself knows nothing about
//! (spec.md section 2):
//!
//! * [`Elements`] — an immutable-by-convention, tag-ordered tree of value
//!   elements, sequences and encapsulated fragments, addressed through
//!   [`TagPath`](dicom_core::TagPath).
//! * [`collect`] — the look-ahead flow that buffers a part stream while
//!   selectively assembling a whitelisted subset into an `Elements` value.
//! * [`Elements::to_bytes`] — the serializer, the mirror image of the
//!   parser's grammar.

#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_import_braces)]

pub mod builder;
pub mod collect;
pub mod elements;
pub mod error;
pub mod serializer;

pub use builder::{build_elements, ElementSink};
pub use collect::{collect, CollectItem, CollectOptions};
pub use elements::{ElementSet, Elements, Fragment, Fragments, Item, Sequence, ValueElement};
pub use error::{Error, Result};

use dicom_parser::{ParseOptions, ParserOptions, ReadByteSource};

/// Parses `bytes` fully and aggregates the result into an [`Elements`]
/// value in one call, inflating a deflated transfer syntax transparently.
///
/// A thin convenience wrapper over [`dicom_parser::parse`] +
/// [`build_elements`]; streaming consumers should drive those two
/// directly instead, so the part stream can be observed (or collected
/// from) as it arrives.
pub fn build_elements_from_bytes(bytes: Vec<u8>) -> Result<Elements> {
    let parts = dicom_parser::parse(std::io::Cursor::new(bytes), ParseOptions::default());
    build_elements(parts)
}

/// As [`build_elements_from_bytes`], but reading from any [`std::io::Read`]
/// and without transparently inflating a deflated transfer syntax --
/// matching [`dicom_parser::Parser::new`]'s scope.
pub fn sink_elements<R: std::io::Read + 'static>(reader: R, options: ParserOptions) -> Result<Elements> {
    let parser = dicom_parser::Parser::new(ReadByteSource::new(reader), options);
    build_elements(parser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{Tag, TagPath, TagTree};
    use dicom_dictionary_std::tags;
    use dicom_parser::{ParseOptions, Part};

    /// Scenario S1 of spec.md section 8: preamble + FMI + a small dataset,
    /// reassembled end to end through `parse` -> `build_elements`.
    #[test]
    fn preamble_fmi_and_dataset_assemble_into_elements() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0u8; 128]);
        bytes.extend_from_slice(b"DICM");

        // FMI group length placeholder, patched below.
        let fmi_start = bytes.len();
        bytes.extend(explicit_header(0x0002, 0x0000, "UL", &0u32.to_le_bytes()));
        let tsuid = b"1.2.840.10008.1.2.1\0";
        bytes.extend(explicit_header(0x0002, 0x0010, "UI", tsuid));
        let fmi_group_len = (bytes.len() - fmi_start - 8 /* group length element itself */) as u32;
        let placeholder_value_pos = fmi_start + 8;
        bytes[placeholder_value_pos..placeholder_value_pos + 4].copy_from_slice(&fmi_group_len.to_le_bytes());

        bytes.extend(explicit_header(0x0008, 0x0020, "DA", b"20200101"));
        bytes.extend(explicit_header(0x0010, 0x0010, "PN", b"Doe^John  "));

        let parts: Vec<_> = dicom_parser::parse(std::io::Cursor::new(bytes), ParseOptions::default())
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert!(matches!(parts[0], Part::Preamble { .. }));

        let elements = build_elements(parts.into_iter().map(Ok)).unwrap();
        assert_eq!(elements.get_string(tags::STUDY_DATE), Some("20200101".to_string()));
        assert_eq!(elements.get_string(tags::PATIENT_NAME), Some("Doe^John".to_string()));
    }

    /// Scenario S6 of spec.md section 8: a whitelist collect run emits the
    /// synthetic `Elements` first, then every buffered part unchanged.
    #[test]
    fn collect_emits_elements_then_replays_buffered_parts_in_order() {
        let mut bytes = Vec::new();
        bytes.extend(explicit_header(0x0008, 0x0020, "DA", b"20200101"));
        bytes.extend(explicit_header(0x0010, 0x0010, "PN", b"Doe^John  "));
        let pixel_value = vec![0u8; 2000];
        bytes.extend(explicit_header(0x7FE0, 0x0010, "OB", &pixel_value));

        let whitelist = TagTree::from_paths([
            TagPath::empty().then_tag(tags::STUDY_DATE),
            TagPath::empty().then_tag(tags::PATIENT_NAME),
        ]);

        let input_parts: Vec<_> = dicom_parser::Parser::new_dataset_only(
            dicom_parser::ReadByteSource::new(std::io::Cursor::new(bytes)),
            Default::default(),
            false,
            true,
        )
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap();

        let results: Vec<_> = collect(input_parts.clone().into_iter().map(Ok), whitelist, CollectOptions::default())
            .collect::<Result<Vec<_>>>()
            .unwrap();

        let elements = match &results[0] {
            CollectItem::Elements(e) => e,
            other => panic!("expected ElementsPart first, got {other:?}"),
        };
        assert_eq!(elements.size(), 2);

        let replayed: Vec<Part> = results[1..]
            .iter()
            .map(|item| match item {
                CollectItem::Part(p) => p.clone(),
                CollectItem::Elements(_) => panic!("only one ElementsPart is ever emitted"),
            })
            .collect();
        assert_eq!(replayed, input_parts);
    }

    /// Scenario S7: the same input, but a buffer cap too small to reach
    /// the stop condition fails with `BufferOverflow`.
    #[test]
    fn collect_fails_with_buffer_overflow_when_cap_is_too_small() {
        let mut bytes = Vec::new();
        bytes.extend(explicit_header(0x0008, 0x0020, "DA", b"20200101"));
        bytes.extend(explicit_header(0x0010, 0x0010, "PN", b"Doe^John  "));
        bytes.extend(explicit_header(0x7FE0, 0x0010, "OB", &vec![0u8; 2000]));

        let whitelist = TagTree::from_paths([TagPath::empty().then_tag(Tag(0xFFFF, 0xFFFF))]);
        let parts = dicom_parser::Parser::new_dataset_only(
            dicom_parser::ReadByteSource::new(std::io::Cursor::new(bytes)),
            Default::default(),
            false,
            true,
        );

        let err = collect(parts, whitelist, CollectOptions { max_buffer_size: 1000 })
            .collect::<Result<Vec<_>>>()
            .unwrap_err();
        assert!(matches!(err, Error::BufferOverflow { .. }));
    }

    fn explicit_header(group: u16, element: u16, vr: &str, value: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&group.to_le_bytes());
        out.extend_from_slice(&element.to_le_bytes());
        out.extend_from_slice(vr.as_bytes());
        if matches!(vr, "OB" | "OW" | "OF" | "OD" | "OL" | "SQ" | "UC" | "UR" | "UT" | "UN") {
            out.extend_from_slice(&[0, 0]);
            out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        } else {
            out.extend_from_slice(&(value.len() as u16).to_le_bytes());
        }
        out.extend_from_slice(value);
        out
    }
}
