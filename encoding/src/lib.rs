//! Value codecs and character set handling shared by the parser and the
//! object model.
//!
//! This crate knows how to turn a raw, VR-tagged byte buffer into typed
//! Rust values (and back), and how `SpecificCharacterSet` governs the
//! decoding of text-bearing VRs. It has no notion of the wire grammar
//! (headers, items, sequences) -- that's `dicom-parser`'s job.

#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_import_braces)]

pub mod charset;
pub mod value;

pub use charset::{Charset, CharacterSets};
pub use value::{PersonNameOwned, Value};
