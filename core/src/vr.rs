//! The DICOM Value Representation enumeration.

use std::fmt;
use std::str::FromStr;

/// A DICOM Value Representation: the two-letter code declaring how a data
/// element's value bytes are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum VR {
    AE,
    AS,
    AT,
    CS,
    DA,
    DS,
    DT,
    FL,
    FD,
    IS,
    LO,
    LT,
    OB,
    OD,
    OF,
    OL,
    OV,
    OW,
    PN,
    SH,
    SL,
    SQ,
    SS,
    ST,
    SV,
    TM,
    UC,
    UI,
    UL,
    UN,
    UR,
    US,
    UT,
    UV,
}

use VR::*;

/// VRs whose explicit-VR header is 12 bytes long (2-byte code, 2 reserved
/// bytes, 4-byte length) rather than the usual 8 (2-byte code, 2-byte length).
const LONG_HEADER_VRS: &[VR] = &[OB, OW, OF, OD, OL, OV, SQ, UC, UR, UT, UN, SV, UV];

impl VR {
    /// Parses a VR from its two-byte ASCII wire representation.
    pub fn from_binary(chars: [u8; 2]) -> Option<VR> {
        std::str::from_utf8(&chars).ok().and_then(|s| VR::from_str(s).ok())
    }

    /// The two-letter code of this VR, as it appears on the wire.
    pub fn to_str(self) -> &'static str {
        match self {
            AE => "AE",
            AS => "AS",
            AT => "AT",
            CS => "CS",
            DA => "DA",
            DS => "DS",
            DT => "DT",
            FL => "FL",
            FD => "FD",
            IS => "IS",
            LO => "LO",
            LT => "LT",
            OB => "OB",
            OD => "OD",
            OF => "OF",
            OL => "OL",
            OV => "OV",
            OW => "OW",
            PN => "PN",
            SH => "SH",
            SL => "SL",
            SQ => "SQ",
            SS => "SS",
            ST => "ST",
            SV => "SV",
            TM => "TM",
            UC => "UC",
            UI => "UI",
            UL => "UL",
            UN => "UN",
            UR => "UR",
            US => "US",
            UT => "UT",
            UV => "UV",
        }
    }

    /// The length in bytes of this VR's header when encoded in explicit VR:
    /// 8 for the majority, 12 for the "long" VRs.
    pub fn explicit_header_len(self) -> u8 {
        if LONG_HEADER_VRS.contains(&self) {
            12
        } else {
            8
        }
    }

    /// Whether this VR uses the 12-byte explicit-VR header form.
    pub fn has_long_header(self) -> bool {
        self.explicit_header_len() == 12
    }

    /// Whether this is a VR whose value is text, subject to padding,
    /// delimiter splitting and character-set decoding.
    pub fn is_character_repertoire(self) -> bool {
        matches!(
            self,
            AE | AS | CS | DA | DS | DT | IS | LO | LT | PN | SH | ST | TM | UC | UI | UR | UT
        )
    }

    /// Whether this VR's value is always exactly one value (not
    /// backslash-delimited).
    pub fn is_single_valued_text(self) -> bool {
        matches!(self, LT | ST | UT | UR)
    }

    /// The padding byte used to bring this VR's value to an even length.
    /// `UI` (and binary VRs) pad with NUL; other text VRs pad with space.
    pub fn pad_byte(self) -> u8 {
        match self {
            UI => 0,
            _ if self.is_character_repertoire() => b' ',
            _ => 0,
        }
    }
}

impl FromStr for VR {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "AE" => AE,
            "AS" => AS,
            "AT" => AT,
            "CS" => CS,
            "DA" => DA,
            "DS" => DS,
            "DT" => DT,
            "FL" => FL,
            "FD" => FD,
            "IS" => IS,
            "LO" => LO,
            "LT" => LT,
            "OB" => OB,
            "OD" => OD,
            "OF" => OF,
            "OL" => OL,
            "OV" => OV,
            "OW" => OW,
            "PN" => PN,
            "SH" => SH,
            "SL" => SL,
            "SQ" => SQ,
            "SS" => SS,
            "ST" => ST,
            "SV" => SV,
            "TM" => TM,
            "UC" => UC,
            "UI" => UI,
            "UL" => UL,
            "UN" => UN,
            "UR" => UR,
            "US" => US,
            "UT" => UT,
            "UV" => UV,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Multiplicity: the number of values a data element of a given VR may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VM {
    /// Exactly one value.
    Single,
    /// Exactly `n` values.
    Fixed(u32),
    /// Between `min` and `max` values, inclusive.
    Bounded(u32, u32),
    /// At least `min` values, no upper bound.
    Unbounded(u32),
    /// One or more values (shorthand for `Unbounded(1)`, kept distinct
    /// because the standard's tables spell it out separately).
    OneToMany,
}

impl VM {
    /// Whether a count of `n` values satisfies this multiplicity.
    pub fn accepts(self, n: u32) -> bool {
        match self {
            VM::Single => n == 1,
            VM::Fixed(k) => n == k,
            VM::Bounded(lo, hi) => n >= lo && n <= hi,
            VM::Unbounded(lo) => n >= lo,
            VM::OneToMany => n >= 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lengths() {
        assert_eq!(VR::US.explicit_header_len(), 8);
        assert_eq!(VR::SQ.explicit_header_len(), 12);
        assert_eq!(VR::OB.explicit_header_len(), 12);
        assert_eq!(VR::UN.explicit_header_len(), 12);
    }

    #[test]
    fn pad_bytes() {
        assert_eq!(VR::UI.pad_byte(), 0);
        assert_eq!(VR::LO.pad_byte(), b' ');
        assert_eq!(VR::OB.pad_byte(), 0);
    }

    #[test]
    fn from_binary_roundtrip() {
        assert_eq!(VR::from_binary(*b"SQ"), Some(VR::SQ));
        assert_eq!(VR::from_binary(*b"??"), None);
    }

    #[test]
    fn vm_accepts() {
        assert!(VM::Bounded(1, 3).accepts(2));
        assert!(!VM::Bounded(1, 3).accepts(4));
        assert!(VM::Unbounded(1).accepts(99));
        assert!(!VM::Fixed(2).accepts(3));
    }
}
