//! The value envelope: a byte buffer with VR-aware conversions.

use crate::charset::CharacterSets;
use dicom_core::{DicomDate, DicomDateTime, DicomTime, Endianness, PersonName, VR};

/// A DICOM value: a buffer of bytes whose interpretation depends on the
/// value representation, endianness and (for text) character set supplied
/// at conversion time.
///
/// All decoders are total: malformed input yields `None` or an empty
/// collection, never a panic or an error (spec.md section 4.2 / 7).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    bytes: Vec<u8>,
}

impl Value {
    /// Wraps a byte buffer as-is, with no padding check.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Value { bytes }
    }

    /// An empty value.
    pub fn empty() -> Self {
        Value { bytes: Vec::new() }
    }

    /// The raw bytes of this value.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The number of bytes in this value. Always even once
    /// [`ensure_padding`](Value::ensure_padding) has been applied.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Pads the value to an even length in place, using `vr`'s padding
    /// byte. Invariant-preserving: called before storing a value in an
    /// element set (spec.md invariant 8).
    pub fn ensure_padding(&mut self, vr: VR) {
        if self.bytes.len() % 2 != 0 {
            self.bytes.push(vr.pad_byte());
        }
    }

    fn trim_padding(s: &str, vr: VR) -> &str {
        if vr == VR::UI {
            s.trim_end_matches('\0')
        } else {
            s.trim_matches(|c: char| c == ' ')
        }
    }

    /// Splits a text value on the `\` delimiter, decoding with `charsets`
    /// and trimming VR-specific padding. Non-text VRs yield an empty list.
    pub fn to_strings(&self, vr: VR, charsets: &CharacterSets) -> Vec<String> {
        if !vr.is_character_repertoire() {
            return Vec::new();
        }
        let raw = charsets.decode(&self.bytes);
        if vr.is_single_valued_text() {
            return vec![Self::trim_padding(&raw, vr).to_string()];
        }
        raw.split('\\')
            .map(|s| Self::trim_padding(s, vr).to_string())
            .collect()
    }

    /// A single string, decoding and trimming as [`to_strings`](Value::to_strings)
    /// but collapsing to the first value (or `None` if empty).
    pub fn to_string(&self, vr: VR, charsets: &CharacterSets) -> Option<String> {
        self.to_strings(vr, charsets).into_iter().next()
    }

    fn binary_len(&self, word_size: usize) -> usize {
        self.bytes.len() / word_size
    }

    /// Decodes 16-bit values (`US`/`SS`), honoring endianness.
    pub fn to_shorts(&self, endian: Endianness) -> Vec<i16> {
        let n = self.binary_len(2);
        (0..n).map(|i| endian.read_i16(&self.bytes[i * 2..])).collect()
    }

    pub fn to_short(&self, endian: Endianness) -> Option<i16> {
        self.to_shorts(endian).into_iter().next()
    }

    /// Decodes 32-bit integers (`SL`/`UL`), or text numbers (`IS`) when
    /// `vr` is a numeric-string VR -- per spec.md section 4.2, `toInts`'s
    /// length is `bytes/4` for binary VRs and `strings.len()` for `IS`/`DS`.
    pub fn to_ints(&self, vr: VR, endian: Endianness, charsets: &CharacterSets) -> Vec<i32> {
        if vr == VR::IS || vr == VR::DS {
            return self
                .to_strings(vr, charsets)
                .iter()
                .filter_map(|s| s.trim().parse::<f64>().ok().map(|f| f as i32))
                .collect();
        }
        let n = self.binary_len(4);
        (0..n).map(|i| endian.read_i32(&self.bytes[i * 4..])).collect()
    }

    pub fn to_int(&self, vr: VR, endian: Endianness, charsets: &CharacterSets) -> Option<i32> {
        self.to_ints(vr, endian, charsets).into_iter().next()
    }

    /// Decodes signed 64-bit integers (`SV`).
    pub fn to_longs(&self, endian: Endianness) -> Vec<i64> {
        let n = self.binary_len(8);
        (0..n).map(|i| endian.read_u64(&self.bytes[i * 8..]) as i64).collect()
    }

    pub fn to_long(&self, endian: Endianness) -> Option<i64> {
        self.to_longs(endian).into_iter().next()
    }

    /// Decodes unsigned 64-bit integers (`UV`), kept distinct from
    /// [`to_longs`](Value::to_longs) because the full `u64` range does not
    /// fit in an `i64`.
    pub fn to_very_longs(&self, endian: Endianness) -> Vec<u64> {
        let n = self.binary_len(8);
        (0..n).map(|i| endian.read_u64(&self.bytes[i * 8..])).collect()
    }

    pub fn to_very_long(&self, endian: Endianness) -> Option<u64> {
        self.to_very_longs(endian).into_iter().next()
    }

    /// Decodes single-precision floats (`FL`).
    pub fn to_floats(&self, endian: Endianness) -> Vec<f32> {
        let n = self.binary_len(4);
        (0..n).map(|i| endian.read_f32(&self.bytes[i * 4..])).collect()
    }

    pub fn to_float(&self, endian: Endianness) -> Option<f32> {
        self.to_floats(endian).into_iter().next()
    }

    /// Decodes double-precision floats (`FD`), or `DS` numeric strings.
    pub fn to_doubles(&self, vr: VR, endian: Endianness, charsets: &CharacterSets) -> Vec<f64> {
        if vr == VR::DS {
            return self
                .to_strings(vr, charsets)
                .iter()
                .filter_map(|s| s.trim().parse::<f64>().ok())
                .collect();
        }
        let n = self.binary_len(8);
        (0..n).map(|i| endian.read_f64(&self.bytes[i * 8..])).collect()
    }

    pub fn to_double(&self, vr: VR, endian: Endianness, charsets: &CharacterSets) -> Option<f64> {
        self.to_doubles(vr, endian, charsets).into_iter().next()
    }

    /// Decodes a `DA` value: `YYYYMMDD` or the legacy `YYYY.MM.DD` form.
    pub fn to_date(&self, charsets: &CharacterSets) -> Option<DicomDate> {
        self.to_string(VR::DA, charsets).and_then(|s| DicomDate::parse(&s))
    }

    /// Decodes a `TM` value: `HHMMSS[.FFFFFF]`.
    pub fn to_time(&self, charsets: &CharacterSets) -> Option<DicomTime> {
        self.to_string(VR::TM, charsets).and_then(|s| DicomTime::parse(&s))
    }

    /// Decodes a `DT` value: `YYYYMMDDHHMMSS[.FFFFFF][&ZZXX]`, falling back
    /// to `default_offset` when no zone is present in the text.
    pub fn to_date_time(
        &self,
        charsets: &CharacterSets,
        default_offset: Option<chrono::FixedOffset>,
    ) -> Option<DicomDateTime> {
        self.to_string(VR::DT, charsets)
            .and_then(|s| DicomDateTime::parse(&s, default_offset))
    }

    /// Decodes a `PN` value into its component groups.
    pub fn to_person_names<'a>(&'a self, charsets: &CharacterSets) -> Vec<PersonNameOwned> {
        self.to_strings(VR::PN, charsets)
            .into_iter()
            .map(|s| PersonNameOwned(s))
            .collect()
    }
}

/// An owned `PN` value, deferring component parsing until accessed so
/// that [`PersonName`] can continue to borrow from a `&str`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonNameOwned(String);

impl PersonNameOwned {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> PersonName<'_> {
        PersonName::from_slice(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_even_length() {
        let mut v = Value::from_bytes(b"ODD".to_vec());
        v.ensure_padding(VR::LO);
        assert_eq!(v.len(), 4);
        assert_eq!(v.bytes(), b"ODD ");

        let mut v = Value::from_bytes(b"ODD".to_vec());
        v.ensure_padding(VR::UI);
        assert_eq!(v.bytes(), b"ODD\0");
    }

    #[test]
    fn splits_multi_valued_text() {
        let v = Value::from_bytes(b"A\\B\\C".to_vec());
        let cs = CharacterSets::default();
        assert_eq!(v.to_strings(VR::CS, &cs), vec!["A", "B", "C"]);
    }

    #[test]
    fn ui_trims_trailing_nul() {
        let v = Value::from_bytes(b"1.2.3\0".to_vec());
        let cs = CharacterSets::default();
        assert_eq!(v.to_string(VR::UI, &cs), Some("1.2.3".to_string()));
    }

    #[test]
    fn decodes_binary_shorts() {
        let v = Value::from_bytes(vec![1, 0]);
        assert_eq!(v.to_shorts(Endianness::Little), vec![1]);
    }

    #[test]
    fn decodes_is_as_text_numbers() {
        let v = Value::from_bytes(b"1\\2\\3".to_vec());
        let cs = CharacterSets::default();
        assert_eq!(v.to_ints(VR::IS, Endianness::Little, &cs), vec![1, 2, 3]);
    }

    #[test]
    fn decodes_date_and_time() {
        let v = Value::from_bytes(b"20200101".to_vec());
        let cs = CharacterSets::default();
        assert_eq!(v.to_date(&cs), DicomDate::parse("20200101"));
    }
}
