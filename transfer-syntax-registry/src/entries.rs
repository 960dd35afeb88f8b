//! The built-in transfer syntax table.
//!
//! Exactly the five transfer syntaxes this codec understands without an
//! external pixel codec: the dataset can always be read (and, where not
//! deflated, written back) regardless of what an encapsulated Pixel Data
//! fragment actually contains.

use crate::TransferSyntax;
use dicom_core::Endianness;

pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2",
    "Implicit VR Little Endian",
    Endianness::Little,
    false,
    false,
);

pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1",
    "Explicit VR Little Endian",
    Endianness::Little,
    true,
    false,
);

pub const EXPLICIT_VR_BIG_ENDIAN_RETIRED: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.2",
    "Explicit VR Big Endian (Retired)",
    Endianness::Big,
    true,
    false,
);

pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1.99",
    "Deflated Explicit VR Little Endian",
    Endianness::Little,
    true,
    true,
);

pub const JPIP_REFERENCED_DEFLATE: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.95",
    "JPIP Referenced Deflate Transfer Syntax",
    Endianness::Little,
    true,
    true,
);

pub const BUILT_IN: &[TransferSyntax] = &[
    IMPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_BIG_ENDIAN_RETIRED,
    DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    JPIP_REFERENCED_DEFLATE,
];
