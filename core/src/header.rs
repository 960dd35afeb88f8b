//! Shared behaviour of header-shaped DICOM types (element headers, item and
//! delimitation markers).

use crate::length::Length;
use crate::tag::Tag;

/// A type carrying a DICOM tag and a value length, as every header-shaped
/// part of the wire format does.
#[allow(clippy::len_without_is_empty)]
pub trait Header {
    /// The element's tag.
    fn tag(&self) -> Tag;

    /// The value's length, which may be indeterminate.
    fn len(&self) -> Length;

    /// Whether this is the header of a sequence/fragments item.
    fn is_item(&self) -> bool {
        self.tag() == Tag::ITEM
    }

    /// Whether this is the header of an item delimiter.
    fn is_item_delimiter(&self) -> bool {
        self.tag() == Tag::ITEM_DELIMITATION
    }

    /// Whether this is the header of a sequence delimiter.
    fn is_sequence_delimiter(&self) -> bool {
        self.tag() == Tag::SEQUENCE_DELIMITATION
    }
}
