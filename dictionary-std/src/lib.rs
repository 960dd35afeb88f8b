//! The standard DICOM data dictionary.
//!
//! Exposes `vr_of`, `vm_of` and `keyword_of` as the pure, static functions
//! described by the specification: `dict(tag) -> (keyword, vr, vm)`,
//! including the group-length, private-tag, retired repeating-group and
//! `SourceImageIDs` special cases of PS3.5 / PS3.6.

#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_import_braces)]

pub mod entries;
pub mod tags;
pub mod uids;

use dicom_core::{Tag, VM, VR};
use entries::Entry;

/// Normalizes a tag to handle the repeating-group special cases of PS3.5
/// sect 7.6, returning the tag that should actually be used for dictionary
/// lookup.
fn normalize(tag: Tag) -> Tag {
    let raw = tag.as_u32();

    // Repeating groups 0x5000-0x501E (curves) and 0x6000-0x601E (overlays):
    // mask out the group's low 5 bits.
    if (raw & 0xFFE0_0000) == 0x5000_0000 || (raw & 0xFFE0_0000) == 0x6000_0000 {
        return Tag::from(raw & 0xFFE0_FFFF);
    }

    // Repeating group 0x7Fxx (e.g. variable pixel data groups), excluding
    // the Pixel Data group 0x7FE0 itself.
    if (raw & 0xFF00_0000) == 0x7F00_0000 && (raw & 0xFFFF_0000) != 0x7FE0_0000 {
        return Tag::from(raw & 0xFF00_FFFF);
    }

    tag
}

/// Resolves the value representation for `tag`, applying the special-case
/// rules of spec section 4.1 before falling back to table lookup, and
/// finally to `UN` when the tag is entirely unknown.
pub fn vr_of(tag: Tag) -> VR {
    if tag.is_group_length() {
        return VR::UL;
    }

    if tag.is_private_creator() {
        return VR::LO;
    }

    if tag.is_private() {
        return VR::UN;
    }

    if (tag.as_u32() & 0xFFFF_FF00) == tags::SOURCE_IMAGE_IDS.as_u32() {
        return VR::CS;
    }

    entries::lookup(normalize(tag)).map(|e| e.vr).unwrap_or(VR::UN)
}

/// Resolves the value multiplicity for `tag`, defaulting to `OneToMany`
/// when unknown (per spec section 4.1).
pub fn vm_of(tag: Tag) -> VM {
    entries::lookup(normalize(tag))
        .map(|e| e.vm)
        .unwrap_or(VM::OneToMany)
}

/// Resolves the canonical keyword for `tag`, or an empty string when
/// unknown.
pub fn keyword_of(tag: Tag) -> &'static str {
    entries::lookup(normalize(tag)).map(|e| e.keyword).unwrap_or("")
}

/// Resolves a keyword back to its tag. Used by name-based accessors.
pub fn tag_of_keyword(keyword: &str) -> Option<Tag> {
    entries::ENTRIES.iter().find(|e| e.keyword == keyword).map(|e| e.tag)
}

/// Resolves the full dictionary entry for `tag`, when the tag (after
/// special-case normalization) is present in the static table.
pub fn entry_of(tag: Tag) -> Option<&'static Entry> {
    entries::lookup(normalize(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_length_is_always_ul() {
        assert_eq!(vr_of(Tag(0x0010, 0x0000)), VR::UL);
    }

    #[test]
    fn private_creator_is_lo_other_private_is_un() {
        assert_eq!(vr_of(Tag(0x0009, 0x0010)), VR::LO);
        assert_eq!(vr_of(Tag(0x0009, 0x1001)), VR::UN);
    }

    #[test]
    fn unknown_public_tag_is_un_and_one_to_many() {
        assert_eq!(vr_of(Tag(0x0033, 0x1234)), VR::UN);
        assert_eq!(vm_of(Tag(0x0033, 0x1234)), VM::OneToMany);
    }

    #[test]
    fn source_image_ids_group_resolves_to_cs() {
        assert_eq!(vr_of(Tag(0x0020, 0x3105)), VR::CS);
    }

    #[test]
    fn repeating_overlay_group_normalizes_for_lookup() {
        // (6000,0010) Rows for overlay plane 0 normalizes to (0028,0010)-like
        // slot; here we just check it doesn't panic and resolves via mask.
        let tag = Tag(0x6002, 0x0010);
        assert_eq!(normalize(tag), Tag(0x6000, 0x0010));
    }

    #[test]
    fn keyword_lookup_round_trips() {
        assert_eq!(keyword_of(Tag(0x0010, 0x0010)), "PatientName");
        assert_eq!(tag_of_keyword("PatientName"), Some(Tag(0x0010, 0x0010)));
        assert_eq!(keyword_of(Tag(0x0033, 0x1234)), "");
    }
}
