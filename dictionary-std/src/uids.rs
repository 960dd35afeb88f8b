//! Normative DICOM unique identifiers used by this codec.
//!
//! Only the identifiers the parser and object model need to recognize
//! explicitly are listed here (the full PS3.6 UID registry is out of this
//! crate's scope, per the codec's data-dictionary boundary).

/// Implicit VR Little Endian.
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
/// Explicit VR Little Endian.
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
/// Explicit VR Big Endian (retired).
pub const EXPLICIT_VR_BIG_ENDIAN_RETIRED: &str = "1.2.840.10008.1.2.2";
/// Deflated Explicit VR Little Endian.
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
/// JPIP Referenced Deflate.
pub const JPIP_REFERENCED_DEFLATE: &str = "1.2.840.10008.1.2.4.95";

/// Verification SOP Class, used in tests and default FMI scaffolding.
pub const VERIFICATION: &str = "1.2.840.10008.1.1";
