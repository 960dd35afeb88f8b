//! Constant tags for attributes referenced by name elsewhere in the
//! codec (file meta information, character set handling, and the
//! attributes exercised by the test scenarios in the specification).

use dicom_core::Tag;

// --- File Meta Information (group 0002) ---
pub const FILE_META_INFORMATION_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
pub const FILE_META_INFORMATION_VERSION: Tag = Tag(0x0002, 0x0001);
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
pub const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);
pub const IMPLEMENTATION_VERSION_NAME: Tag = Tag(0x0002, 0x0013);

// --- Identification / dataset-wide (group 0008) ---
pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const REFERENCED_STUDY_SEQUENCE: Tag = Tag(0x0008, 0x1110);

/// Base tag for the retired repeating group _Source Image IDs_,
/// masked as `tag & 0xFFFFFF00`.
pub const SOURCE_IMAGE_IDS: Tag = Tag(0x0020, 0x3100);

// --- Patient (group 0010) ---
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);

// --- Study / series / timezone (group 0020) ---
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
pub const TIMEZONE_OFFSET_FROM_UTC: Tag = Tag(0x0020, 0x0201);
pub const IMAGE_COMMENTS: Tag = Tag(0x0020, 0x4000);

// --- Image (group 0018, 0028) ---
pub const SEQUENCE_OF_ULTRASOUND_REGIONS: Tag = Tag(0x0018, 0x6011);
pub const REGION_SPATIAL_FORMAT: Tag = Tag(0x0018, 0x6012);
pub const REGION_DATA_TYPE: Tag = Tag(0x0018, 0x6014);
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);

// --- Pixel data (group 7FE0) ---
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);
