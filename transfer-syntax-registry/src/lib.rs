//! The DICOM transfer syntax registry.
//!
//! A transfer syntax UID declares how a dataset's bytes are to be read:
//! byte order, whether value representations are spelled out on the wire,
//! and whether the dataset is deflate-compressed. This crate resolves a
//! TSUID string into that information.
//!
//! Pixel data codecs (JPEG, JPEG 2000, RLE, ...) are an external
//! collaborator this crate does not attempt to cover -- every registered
//! transfer syntax here supports reading and writing its dataset, whether
//! or not an encapsulated Pixel Data fragment inside it could be decoded
//! into pixels.

#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_import_braces)]

pub mod entries;

use dicom_core::Endianness;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

/// A single transfer syntax specifier: byte order, VR explicitness, and
/// whether the dataset is deflate-compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSyntax {
    uid: &'static str,
    name: &'static str,
    endianness: Endianness,
    explicit_vr: bool,
    deflated: bool,
}

impl TransferSyntax {
    pub const fn new(
        uid: &'static str,
        name: &'static str,
        endianness: Endianness,
        explicit_vr: bool,
        deflated: bool,
    ) -> Self {
        TransferSyntax {
            uid,
            name,
            endianness,
            explicit_vr,
            deflated,
        }
    }

    pub fn uid(&self) -> &'static str {
        self.uid
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn is_big_endian(&self) -> bool {
        self.endianness.is_big()
    }

    pub fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    pub fn is_deflated(&self) -> bool {
        self.deflated
    }
}

impl fmt::Display for TransferSyntax {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uid)
    }
}

/// A lookup table from transfer syntax UID to [`TransferSyntax`].
pub struct TransferSyntaxRegistryImpl {
    m: HashMap<&'static str, TransferSyntax>,
}

impl fmt::Debug for TransferSyntaxRegistryImpl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entries: HashMap<&str, &str> = self.m.iter().map(|(uid, ts)| (*uid, ts.name())).collect();
        f.debug_struct("TransferSyntaxRegistryImpl").field("m", &entries).finish()
    }
}

impl TransferSyntaxRegistryImpl {
    fn get<U: AsRef<str>>(&self, uid: U) -> Option<&TransferSyntax> {
        let ts_uid = uid.as_ref().trim_end_matches(|c: char| c.is_whitespace() || c == '\0');
        self.m.get(ts_uid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransferSyntax> {
        self.m.values()
    }
}

/// Zero-sized handle to the global transfer syntax registry.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TransferSyntaxRegistry;

impl TransferSyntaxRegistry {
    /// Resolves a transfer syntax UID, tolerating a trailing space or NUL
    /// pad byte as found on the wire.
    pub fn get<U: AsRef<str>>(&self, uid: U) -> Option<&'static TransferSyntax> {
        get_registry().get(uid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static TransferSyntax> {
        get_registry().iter()
    }
}

lazy_static! {
    static ref REGISTRY: TransferSyntaxRegistryImpl = {
        let mut m = HashMap::with_capacity(entries::BUILT_IN.len());
        for ts in entries::BUILT_IN {
            m.insert(ts.uid(), *ts);
        }
        TransferSyntaxRegistryImpl { m }
    };
}

fn get_registry() -> &'static TransferSyntaxRegistryImpl {
    &REGISTRY
}

/// The transfer syntax assumed when none is declared (spec.md section 4,
/// "InFmiHeader": missing TSUID defaults to Explicit VR Little Endian).
pub fn default() -> TransferSyntax {
    entries::EXPLICIT_VR_LITTLE_ENDIAN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_mandatory_transfer_syntaxes() {
        let reg = TransferSyntaxRegistry;
        let implicit = reg.get("1.2.840.10008.1.2").expect("implicit VR LE must be registered");
        assert_eq!(implicit.endianness(), Endianness::Little);
        assert!(!implicit.is_explicit_vr());

        let explicit_be = reg
            .get("1.2.840.10008.1.2.2")
            .expect("explicit VR BE must be registered");
        assert!(explicit_be.is_big_endian());
        assert!(explicit_be.is_explicit_vr());
    }

    #[test]
    fn tolerates_padded_uid() {
        let reg = TransferSyntaxRegistry;
        let a = reg.get("1.2.840.10008.1.2.1").unwrap();
        let b = reg.get("1.2.840.10008.1.2.1\0").unwrap();
        assert_eq!(a.uid(), b.uid());
    }

    #[test]
    fn deflated_syntaxes_are_flagged() {
        let reg = TransferSyntaxRegistry;
        assert!(reg.get("1.2.840.10008.1.2.1.99").unwrap().is_deflated());
        assert!(reg.get("1.2.840.10008.1.2.4.95").unwrap().is_deflated());
        assert!(!reg.get("1.2.840.10008.1.2.1").unwrap().is_deflated());
    }

    #[test]
    fn iterates_all_built_ins() {
        assert_eq!(TransferSyntaxRegistry.iter().count(), entries::BUILT_IN.len());
    }
}
