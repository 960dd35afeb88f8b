//! Core primitives for a streaming DICOM codec.
//!
//! This crate defines the leaf-level vocabulary shared by every other crate
//! in the workspace: attribute tags and tag paths, value representations and
//! their multiplicities, the value-length sentinel, endian-aware scalar
//! codecs, and the partial-precision date/time and person-name value types.

#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_import_braces)]

pub mod endian;
pub mod error;
pub mod header;
pub mod length;
pub mod tag;
pub mod tagpath;
pub mod value;
pub mod vr;

pub use endian::Endianness;
pub use error::{Error, Result};
pub use header::{HasLength, Header};
pub use length::Length;
pub use tag::Tag;
pub use tagpath::{TagPath, TagTree};
pub use value::{DicomDate, DicomDateTime, DicomTime, PersonName, PersonNameGroup};
pub use vr::{VM, VR};
