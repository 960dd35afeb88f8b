//! Character set resolution and decoding for text-bearing value
//! representations (`PN`, `SH`, `LO`, `UT`, ...).
//!
//! Full ISO 2022 code-extension handling (escape-sequence driven G0/G1
//! switching for mixed-repertoire values) is treated as an external
//! collaborator per spec.md section 1; this module resolves the
//! `SpecificCharacterSet` defined terms that are in common use for
//! single-byte repertoires and UTF-8, which is what the codec's own test
//! scenarios exercise.

use encoding::all::{ISO_8859_1, ISO_8859_2, ISO_8859_3, ISO_8859_4, ISO_8859_5, UTF_8};
use encoding::{DecoderTrap, EncoderTrap, Encoding};

/// A single named character repertoire, as named by a `SpecificCharacterSet`
/// defined term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// ISO-IR 6, the default repertoire (basically ASCII).
    IsoIr6,
    IsoIr100,
    IsoIr101,
    IsoIr109,
    IsoIr110,
    IsoIr144,
    /// ISO-IR 192, i.e. UTF-8.
    IsoIr192,
}

impl Charset {
    /// Resolves a single `SpecificCharacterSet` defined term.
    pub fn from_code(code: &str) -> Option<Charset> {
        use Charset::*;
        match code.trim() {
            "" | "ISO_IR 6" | "ISO_IR_6" | "ISO 2022 IR 6" => Some(IsoIr6),
            "ISO_IR 100" | "ISO_IR_100" | "ISO 2022 IR 100" => Some(IsoIr100),
            "ISO_IR 101" | "ISO_IR_101" | "ISO 2022 IR 101" => Some(IsoIr101),
            "ISO_IR 109" | "ISO_IR_109" | "ISO 2022 IR 109" => Some(IsoIr109),
            "ISO_IR 110" | "ISO_IR_110" | "ISO 2022 IR 110" => Some(IsoIr110),
            "ISO_IR 144" | "ISO_IR_144" | "ISO 2022 IR 144" => Some(IsoIr144),
            "ISO_IR 192" | "ISO_IR_192" => Some(IsoIr192),
            _ => None,
        }
    }

    /// The defined term naming this charset, as it would appear as a
    /// `SpecificCharacterSet` value.
    pub fn code(self) -> &'static str {
        use Charset::*;
        match self {
            IsoIr6 => "ISO_IR 6",
            IsoIr100 => "ISO_IR 100",
            IsoIr101 => "ISO_IR 101",
            IsoIr109 => "ISO_IR 109",
            IsoIr110 => "ISO_IR 110",
            IsoIr144 => "ISO_IR 144",
            IsoIr192 => "ISO_IR 192",
        }
    }

    fn decode(self, bytes: &[u8]) -> String {
        use Charset::*;
        let result = match self {
            IsoIr6 | IsoIr192 => UTF_8.decode(bytes, DecoderTrap::Replace),
            IsoIr100 => ISO_8859_1.decode(bytes, DecoderTrap::Replace),
            IsoIr101 => ISO_8859_2.decode(bytes, DecoderTrap::Replace),
            IsoIr109 => ISO_8859_3.decode(bytes, DecoderTrap::Replace),
            IsoIr110 => ISO_8859_4.decode(bytes, DecoderTrap::Replace),
            IsoIr144 => ISO_8859_5.decode(bytes, DecoderTrap::Replace),
        };
        result.unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
    }

    fn encode(self, text: &str) -> Vec<u8> {
        use Charset::*;
        let result = match self {
            IsoIr6 | IsoIr192 => UTF_8.encode(text, EncoderTrap::Replace),
            IsoIr100 => ISO_8859_1.encode(text, EncoderTrap::Replace),
            IsoIr101 => ISO_8859_2.encode(text, EncoderTrap::Replace),
            IsoIr109 => ISO_8859_3.encode(text, EncoderTrap::Replace),
            IsoIr110 => ISO_8859_4.encode(text, EncoderTrap::Replace),
            IsoIr144 => ISO_8859_5.encode(text, EncoderTrap::Replace),
        };
        result.unwrap_or_else(|_| text.as_bytes().to_vec())
    }
}

/// The set of character repertoires active for a dataset, as declared by
/// its `SpecificCharacterSet` (0008,0005) element. Per PS3.5 sect 6.1.2.3,
/// this attribute may carry multiple values; the first applies to
/// single-byte text in general, and PN's per-group selection honors
/// whichever value corresponds to the group being decoded. Since
/// code-extension switching is out of this codec's scope, all groups
/// decode with the dataset's primary charset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSets {
    primary: Charset,
    declared: Vec<String>,
}

impl Default for CharacterSets {
    fn default() -> Self {
        CharacterSets {
            primary: Charset::IsoIr6,
            declared: Vec::new(),
        }
    }
}

impl CharacterSets {
    /// Builds a `CharacterSets` from the raw, backslash-delimited value of
    /// `SpecificCharacterSet`. Unknown defined terms are dropped with a
    /// warning, falling back to the default repertoire.
    pub fn from_terms<'a>(terms: impl IntoIterator<Item = &'a str>) -> CharacterSets {
        let declared: Vec<String> = terms
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let primary = declared
            .first()
            .and_then(|s| Charset::from_code(s))
            .unwrap_or_else(|| {
                if let Some(first) = declared.first() {
                    tracing::warn!(charset = %first, "unrecognized specific character set, falling back to ISO_IR 6");
                }
                Charset::IsoIr6
            });

        CharacterSets { primary, declared }
    }

    /// The declared terms of `SpecificCharacterSet`, verbatim.
    pub fn declared_terms(&self) -> &[String] {
        &self.declared
    }

    /// Decodes `bytes` into a `String` using the active primary charset.
    pub fn decode(&self, bytes: &[u8]) -> String {
        self.primary.decode(bytes)
    }

    /// Encodes `text` using the active primary charset.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        self.primary.encode(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_iso_ir_100_to_latin1() {
        let cs = CharacterSets::from_terms(["ISO_IR 100"]);
        // 0xE9 in Latin-1 is 'é'.
        assert_eq!(cs.decode(&[0xE9]), "é");
    }

    #[test]
    fn defaults_to_iso_ir_6() {
        let cs = CharacterSets::default();
        assert_eq!(cs.decode(b"Hello"), "Hello");
    }

    #[test]
    fn unknown_term_falls_back_to_default() {
        let cs = CharacterSets::from_terms(["NOT_A_REAL_CHARSET"]);
        assert_eq!(cs.decode(b"abc"), "abc");
    }
}
