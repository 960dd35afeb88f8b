//! The dataset model: value elements, sequences, items and encapsulated
//! pixel data fragments, aggregated into an [`Elements`] set ordered
//! strictly ascending by tag.

use chrono::FixedOffset;

use dicom_core::{Endianness, Header, Length, Tag, TagPath, VR};
use dicom_dictionary_std::tags;
use dicom_encoding::{CharacterSets, PersonNameOwned, Value};

use crate::error::{self, Error, Result};

/// A single data element carrying a typed value (as opposed to a nested
/// sequence or encapsulated fragments).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueElement {
    pub tag: Tag,
    pub vr: VR,
    pub value: Value,
    pub big_endian: bool,
    pub explicit_vr: bool,
}

impl ValueElement {
    /// Builds a value element, padding `value` to an even length per `vr`.
    pub fn new(tag: Tag, vr: VR, mut value: Value, big_endian: bool, explicit_vr: bool) -> Self {
        value.ensure_padding(vr);
        ValueElement {
            tag,
            vr,
            value,
            big_endian,
            explicit_vr,
        }
    }

    fn endian(&self) -> Endianness {
        Endianness::from_big(self.big_endian)
    }
}

impl Header for ValueElement {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn len(&self) -> Length {
        Length(self.value.len() as u32)
    }
}

/// The contents of one sequence item: a nested [`Elements`] set, plus the
/// length it was declared with on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub elements: Elements,
    length: Length,
    pub big_endian: bool,
}

impl Item {
    /// An item with an indeterminate length, closed by an item
    /// delimitation marker.
    pub fn indeterminate(elements: Elements, big_endian: bool) -> Self {
        Item {
            elements,
            length: Length::UNDEFINED,
            big_endian,
        }
    }

    /// An item with an explicit length, computed from its serialized
    /// elements (spec.md section 4.3, `addItem` semantics).
    pub fn explicit(elements: Elements, length: Length, big_endian: bool) -> Self {
        Item {
            elements,
            length,
            big_endian,
        }
    }

    pub fn length(&self) -> Length {
        self.length
    }
}

/// A `SQ` element: an ordered list of [`Item`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub tag: Tag,
    length: Length,
    pub items: Vec<Item>,
    pub big_endian: bool,
    pub explicit_vr: bool,
}

impl Sequence {
    pub fn new(tag: Tag, length: Length, items: Vec<Item>, big_endian: bool, explicit_vr: bool) -> Self {
        Sequence {
            tag,
            length,
            items,
            big_endian,
            explicit_vr,
        }
    }

    pub fn length(&self) -> Length {
        self.length
    }

    /// Fetches the `index`-th item (1-based, as used throughout
    /// spec.md section 4.3).
    pub fn item(&self, index: usize) -> Option<&Item> {
        index.checked_sub(1).and_then(|i| self.items.get(i))
    }
}

impl Header for Sequence {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn len(&self) -> Length {
        self.length
    }
}

/// One fragment of encapsulated pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub bytes: Vec<u8>,
}

/// Encapsulated pixel data: a VR (`OB`/`OW`) element whose value is a
/// sequence of byte fragments, optionally preceded by a frame offset
/// table (spec.md section 3).
#[derive(Debug, Clone, PartialEq)]
pub struct Fragments {
    pub tag: Tag,
    pub vr: VR,
    offsets: Option<Vec<u64>>,
    pub fragments: Vec<Fragment>,
    pub big_endian: bool,
    pub explicit_vr: bool,
}

impl Fragments {
    pub fn empty(tag: Tag, vr: VR, big_endian: bool, explicit_vr: bool) -> Self {
        Fragments {
            tag,
            vr,
            offsets: None,
            fragments: Vec::new(),
            big_endian,
            explicit_vr,
        }
    }

    /// Appends a raw item's bytes. The first item seen defines the
    /// offsets table: if this is the first item, its bytes are split
    /// into 4-byte unsigned integers and stored as `offsets` (even when
    /// empty) instead of becoming a pixel fragment.
    pub fn push_item(&mut self, bytes: Vec<u8>) {
        if self.offsets.is_none() && self.fragments.is_empty() {
            let endian = Endianness::from_big(self.big_endian);
            let offsets = bytes.chunks_exact(4).map(|c| u64::from(endian.read_u32(c))).collect();
            self.offsets = Some(offsets);
        } else {
            self.fragments.push(Fragment { bytes });
        }
    }

    pub fn offsets(&self) -> Option<&[u64]> {
        self.offsets.as_deref()
    }

    /// The number of frames represented by this element (spec.md
    /// testable property 7): `0` if both the offsets table and the
    /// fragment list are empty, `1` if the offsets table is absent but
    /// fragments are present, else the number of declared offsets.
    pub fn frame_count(&self) -> usize {
        match &self.offsets {
            None if self.fragments.is_empty() => 0,
            None => 1,
            Some(offsets) => offsets.len(),
        }
    }

    /// Iterates over each frame's bytes, concatenating fragment data and
    /// splitting it at the declared offset boundaries. When no offsets
    /// table is present, every fragment is treated as one frame.
    pub fn frame_iterator(&self) -> Box<dyn Iterator<Item = Vec<u8>> + '_> {
        match &self.offsets {
            None => Box::new(self.fragments.iter().map(|f| f.bytes.clone())),
            Some(offsets) if offsets.len() <= 1 => {
                let all: Vec<u8> = self.fragments.iter().flat_map(|f| f.bytes.iter().copied()).collect();
                Box::new(std::iter::once(all))
            }
            Some(offsets) => {
                let all: Vec<u8> = self.fragments.iter().flat_map(|f| f.bytes.iter().copied()).collect();
                let mut bounds: Vec<u64> = offsets.clone();
                bounds.push(all.len() as u64);
                Box::new(
                    (0..offsets.len())
                        .map(move |i| {
                            let start = bounds[i] as usize;
                            let end = bounds[i + 1] as usize;
                            all.get(start..end).unwrap_or(&[]).to_vec()
                        })
                        .collect::<Vec<_>>()
                        .into_iter(),
                )
            }
        }
    }
}

impl Header for Fragments {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn len(&self) -> Length {
        Length::UNDEFINED
    }
}

/// A single entry of an [`Elements`] set: a plain value, a sequence, or
/// encapsulated fragments.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSet {
    Value(ValueElement),
    Sequence(Sequence),
    Fragments(Fragments),
}

impl ElementSet {
    pub fn tag(&self) -> Tag {
        match self {
            ElementSet::Value(v) => v.tag,
            ElementSet::Sequence(s) => s.tag,
            ElementSet::Fragments(f) => f.tag,
        }
    }

    pub fn as_value(&self) -> Option<&ValueElement> {
        match self {
            ElementSet::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            ElementSet::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_fragments(&self) -> Option<&Fragments> {
        match self {
            ElementSet::Fragments(f) => Some(f),
            _ => None,
        }
    }
}

/// An ordered-by-tag set of [`ElementSet`]s, plus the active specific
/// character set and timezone offset derived from its own elements.
///
/// Mutations (`set`, `remove`, ...) take `&mut self`, following this
/// workspace's teacher's `InMemDicomObject` idiom rather than returning a
/// new value on every call; the value-semantics contract of spec.md
/// section 3 is realized the ordinary Rust way, through `Clone` -- a
/// caller that needs to keep the pre-mutation version clones it first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Elements {
    data: Vec<ElementSet>,
    character_sets: CharacterSets,
    zone_offset: Option<FixedOffset>,
}

impl Elements {
    /// An empty dataset, with the default character set and no timezone.
    pub fn new() -> Elements {
        Elements::default()
    }

    /// An empty dataset inheriting the character set and timezone of an
    /// enclosing one -- used when a builder opens a new item's elements
    /// (spec.md section 4.7: "a fresh builder inherits parent's charsets
    /// and zoneOffset").
    pub fn new_inheriting(parent: &Elements) -> Elements {
        Elements {
            data: Vec::new(),
            character_sets: parent.character_sets.clone(),
            zone_offset: parent.zone_offset,
        }
    }

    pub fn character_sets(&self) -> &CharacterSets {
        &self.character_sets
    }

    pub fn zone_offset(&self) -> Option<FixedOffset> {
        self.zone_offset
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The elements in ascending tag order -- always true of `data`,
    /// per spec.md invariant 1.
    pub fn sorted(&self) -> &[ElementSet] {
        &self.data
    }

    pub fn head(&self) -> Option<&ElementSet> {
        self.data.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementSet> {
        self.data.iter()
    }

    pub fn get(&self, tag: Tag) -> Option<&ElementSet> {
        self.data.binary_search_by_key(&tag, ElementSet::tag).ok().map(|i| &self.data[i])
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.get(tag).is_some()
    }

    pub fn get_sequence(&self, tag: Tag) -> Option<&Sequence> {
        self.get(tag).and_then(ElementSet::as_sequence)
    }

    pub fn get_item(&self, tag: Tag, index: usize) -> Option<&Item> {
        self.get_sequence(tag).and_then(|s| s.item(index))
    }

    pub fn get_nested(&self, tag: Tag, index: usize) -> Option<&Elements> {
        self.get_item(tag, index).map(|i| &i.elements)
    }

    pub fn get_fragments(&self, tag: Tag) -> Option<&Fragments> {
        self.get(tag).and_then(ElementSet::as_fragments)
    }

    /// Inserts `element` at its sorted position, replacing any existing
    /// element with the same tag (spec.md section 4.3 `set`). Updates
    /// the active character sets and timezone offset when the element
    /// is `SpecificCharacterSet` or `TimezoneOffsetFromUTC`.
    pub fn set(&mut self, element: ElementSet) {
        let tag = element.tag();
        match self.data.binary_search_by_key(&tag, ElementSet::tag) {
            Ok(i) => self.data[i] = element,
            Err(i) => self.data.insert(i, element),
        }

        if tag == tags::SPECIFIC_CHARACTER_SET {
            if let Some(v) = self.get(tag).and_then(ElementSet::as_value) {
                let ascii = CharacterSets::default();
                let terms = v.value.to_strings(VR::CS, &ascii);
                self.character_sets = CharacterSets::from_terms(terms.iter().map(String::as_str));
            }
        } else if tag == tags::TIMEZONE_OFFSET_FROM_UTC {
            if let Some(v) = self.get(tag).and_then(ElementSet::as_value) {
                if let Some(s) = v.value.to_string(VR::SH, &self.character_sets) {
                    self.zone_offset = parse_zone_offset(&s);
                }
            }
        }
    }

    /// Removes the element at `tag`, if present. Returns whether an
    /// element was removed.
    pub fn remove(&mut self, tag: Tag) -> bool {
        match self.data.binary_search_by_key(&tag, ElementSet::tag) {
            Ok(i) => {
                self.data.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    /// A new `Elements` retaining only the elements matching `pred`.
    pub fn filter(&self, mut pred: impl FnMut(&ElementSet) -> bool) -> Elements {
        Elements {
            data: self.data.iter().filter(|e| pred(e)).cloned().collect(),
            character_sets: self.character_sets.clone(),
            zone_offset: self.zone_offset,
        }
    }

    // --- tag-path navigation -------------------------------------------------

    /// Resolves `path` to the element set it addresses, per spec.md
    /// section 4.3. A path ending on a bare sequence (with no item
    /// index) or on an item (with no trailing tag) does not address an
    /// `ElementSet` and fails with [`Error::InvalidPath`].
    pub fn apply(&self, path: &TagPath) -> Result<Option<&ElementSet>> {
        self.apply_steps(&path_steps(path))
    }

    fn apply_steps(&self, steps: &[Step]) -> Result<Option<&ElementSet>> {
        match steps {
            [] => Ok(None),
            [Step::Tag(tag)] => Ok(self.get(*tag)),
            [Step::Sequence(tag), Step::Item(_, index), rest @ ..] => {
                let seq = match self.get(*tag) {
                    Some(ElementSet::Sequence(s)) => s,
                    Some(_) => return error::InvalidPathSnafu { tag: *tag }.fail(),
                    None => return Ok(None),
                };
                let item = match seq.item(*index as usize) {
                    Some(item) => item,
                    None => return Ok(None),
                };
                if rest.is_empty() {
                    return error::InvalidPathSnafu { tag: *tag }.fail();
                }
                item.elements.apply_steps(rest)
            }
            [step, ..] => error::InvalidPathSnafu { tag: step.tag() }.fail(),
        }
    }

    /// Inserts `element` at a tag path ending on a bare tag, navigating
    /// through nested sequences/items to reach it. Mirrors [`set`] one
    /// level up the tree.
    pub fn set_at(&mut self, path: &TagPath, element: ElementSet) -> Result<()> {
        let steps = path_steps(path);
        self.set_at_steps(&steps, element)
    }

    fn set_at_steps(&mut self, steps: &[Step], element: ElementSet) -> Result<()> {
        match steps {
            [Step::Tag(_)] => {
                self.set(element);
                Ok(())
            }
            [Step::Sequence(tag), Step::Item(_, index), rest @ ..] if !rest.is_empty() => {
                let seq = match self.get_mut_sequence(*tag) {
                    Some(s) => s,
                    None => return error::InvalidPathSnafu { tag: *tag }.fail(),
                };
                let item = index
                    .checked_sub(1)
                    .and_then(|i| seq.items.get_mut(i as usize))
                    .context_invalid(*tag)?;
                item.elements.set_at_steps(rest, element)
            }
            [step, ..] => error::InvalidPathSnafu { tag: step.tag() }.fail(),
            [] => error::InvalidPathSnafu { tag: element.tag() }.fail(),
        }
    }

    fn get_mut_sequence(&mut self, tag: Tag) -> Option<&mut Sequence> {
        let i = self.data.binary_search_by_key(&tag, ElementSet::tag).ok()?;
        match &mut self.data[i] {
            ElementSet::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Replaces the nested elements of the item at `item_path` (a path
    /// ending on an `Item` step).
    pub fn set_nested(&mut self, item_path: &TagPath, elements: Elements) -> Result<()> {
        let steps = path_steps(item_path);
        match steps.last() {
            Some(Step::Item(tag, index)) => {
                let seq = self.get_mut_sequence_at(&steps[..steps.len() - 1], *tag)?;
                let item = index
                    .checked_sub(1)
                    .and_then(|i| seq.items.get_mut(i as usize))
                    .context_invalid(*tag)?;
                item.elements = elements;
                Ok(())
            }
            _ => error::InvalidPathSnafu {
                tag: steps.last().map(Step::tag).unwrap_or(Tag(0, 0)),
            }
            .fail(),
        }
    }

    fn get_mut_sequence_at(&mut self, prefix: &[Step], tag: Tag) -> Result<&mut Sequence> {
        if prefix.is_empty() {
            return self.get_mut_sequence(tag).context_invalid(tag);
        }
        match prefix {
            [Step::Sequence(ptag), Step::Item(_, index), rest @ ..] => {
                let seq = self.get_mut_sequence(*ptag).context_invalid(*ptag)?;
                let item = index
                    .checked_sub(1)
                    .and_then(|i| seq.items.get_mut(i as usize))
                    .context_invalid(*ptag)?;
                item.elements.get_mut_sequence_at(rest, tag)
            }
            _ => error::InvalidPathSnafu { tag }.fail(),
        }
    }

    /// Appends a new item to the sequence at `sequence_path`. For an
    /// indeterminate-length parent, the new item is indeterminate too;
    /// for an explicit-length parent, the new item's length is its
    /// serialized byte length, and the parent sequence's own length
    /// grows by that amount (spec.md section 4.3, `addItem` semantics).
    pub fn add_item(&mut self, sequence_path: &TagPath, elements: Elements) -> Result<()> {
        let steps = path_steps(sequence_path);
        let tag = match steps.last() {
            Some(Step::Sequence(tag)) => *tag,
            other => {
                return error::InvalidPathSnafu {
                    tag: other.map(Step::tag).unwrap_or(Tag(0, 0)),
                }
                .fail()
            }
        };
        let seq = self.get_mut_sequence_at(&steps[..steps.len() - 1], tag)?;
        let big_endian = seq.big_endian;
        if seq.length.is_undefined() {
            seq.items.push(Item::indeterminate(elements, big_endian));
        } else {
            let item_bytes = crate::serializer::item_byte_length(&elements, seq.explicit_vr, big_endian);
            seq.items.push(Item::explicit(elements, Length(item_bytes), big_endian));
            let total: u32 = seq.items.iter().map(|i| crate::serializer::item_total_length(i)).sum();
            seq.length = Length(total);
        }
        Ok(())
    }

    /// Removes the element addressed by `path`. Only bare-tag paths (at
    /// any depth) are supported; removing a whole item or sequence is
    /// expressed by removing its tag at the appropriate level instead.
    pub fn remove_at(&mut self, path: &TagPath) -> Result<bool> {
        let steps = path_steps(path);
        match steps.last() {
            Some(Step::Tag(tag)) if steps.len() == 1 => Ok(self.remove(*tag)),
            Some(Step::Tag(tag)) => {
                let seq_tag = match steps[steps.len() - 3] {
                    Step::Sequence(t) => t,
                    _ => return error::InvalidPathSnafu { tag: *tag }.fail(),
                };
                let index = match steps[steps.len() - 2] {
                    Step::Item(_, idx) => idx,
                    _ => return error::InvalidPathSnafu { tag: *tag }.fail(),
                };
                let seq = self.get_mut_sequence_at(&steps[..steps.len() - 3], seq_tag)?;
                let item = index
                    .checked_sub(1)
                    .and_then(|i| seq.items.get_mut(i as usize))
                    .context_invalid(seq_tag)?;
                Ok(item.elements.remove(*tag))
            }
            _ => error::InvalidPathSnafu { tag: Tag(0, 0) }.fail(),
        }
    }

    // --- typed accessors -----------------------------------------------------

    fn value_at(&self, tag: Tag) -> Option<&ValueElement> {
        self.get(tag).and_then(ElementSet::as_value)
    }

    pub fn get_strings(&self, tag: Tag) -> Vec<String> {
        self.value_at(tag).map(|v| v.value.to_strings(v.vr, &self.character_sets)).unwrap_or_default()
    }

    pub fn get_string(&self, tag: Tag) -> Option<String> {
        self.get_strings(tag).into_iter().next()
    }

    pub fn get_shorts(&self, tag: Tag) -> Vec<i16> {
        self.value_at(tag).map(|v| v.value.to_shorts(v.endian())).unwrap_or_default()
    }

    pub fn get_short(&self, tag: Tag) -> Option<i16> {
        self.get_shorts(tag).into_iter().next()
    }

    pub fn get_ints(&self, tag: Tag) -> Vec<i32> {
        self.value_at(tag)
            .map(|v| v.value.to_ints(v.vr, v.endian(), &self.character_sets))
            .unwrap_or_default()
    }

    pub fn get_int(&self, tag: Tag) -> Option<i32> {
        self.get_ints(tag).into_iter().next()
    }

    pub fn get_longs(&self, tag: Tag) -> Vec<i64> {
        self.value_at(tag).map(|v| v.value.to_longs(v.endian())).unwrap_or_default()
    }

    pub fn get_long(&self, tag: Tag) -> Option<i64> {
        self.get_longs(tag).into_iter().next()
    }

    pub fn get_very_longs(&self, tag: Tag) -> Vec<u64> {
        self.value_at(tag).map(|v| v.value.to_very_longs(v.endian())).unwrap_or_default()
    }

    pub fn get_very_long(&self, tag: Tag) -> Option<u64> {
        self.get_very_longs(tag).into_iter().next()
    }

    pub fn get_floats(&self, tag: Tag) -> Vec<f32> {
        self.value_at(tag).map(|v| v.value.to_floats(v.endian())).unwrap_or_default()
    }

    pub fn get_float(&self, tag: Tag) -> Option<f32> {
        self.get_floats(tag).into_iter().next()
    }

    pub fn get_doubles(&self, tag: Tag) -> Vec<f64> {
        self.value_at(tag)
            .map(|v| v.value.to_doubles(v.vr, v.endian(), &self.character_sets))
            .unwrap_or_default()
    }

    pub fn get_double(&self, tag: Tag) -> Option<f64> {
        self.get_doubles(tag).into_iter().next()
    }

    pub fn get_date(&self, tag: Tag) -> Option<dicom_core::DicomDate> {
        self.value_at(tag).and_then(|v| v.value.to_date(&self.character_sets))
    }

    pub fn get_time(&self, tag: Tag) -> Option<dicom_core::DicomTime> {
        self.value_at(tag).and_then(|v| v.value.to_time(&self.character_sets))
    }

    pub fn get_date_time(&self, tag: Tag) -> Option<dicom_core::DicomDateTime> {
        self.value_at(tag).and_then(|v| v.value.to_date_time(&self.character_sets, self.zone_offset))
    }

    pub fn get_person_names(&self, tag: Tag) -> Vec<PersonNameOwned> {
        self.value_at(tag).map(|v| v.value.to_person_names(&self.character_sets)).unwrap_or_default()
    }

    pub fn get_person_name(&self, tag: Tag) -> Option<PersonNameOwned> {
        self.get_person_names(tag).into_iter().next()
    }

    /// `UR`/`UT`/single-valued-text accessor; an alias of
    /// [`get_string`](Elements::get_string) kept distinct for the `URI`
    /// typed-getter named in spec.md section 4.3.
    pub fn get_uri(&self, tag: Tag) -> Option<String> {
        self.get_string(tag)
    }

    pub fn get_bytes(&self, tag: Tag) -> Option<&[u8]> {
        self.value_at(tag).map(|v| v.value.bytes())
    }

    // --- typed setters ---------------------------------------------------

    /// Inserts a text value, looking up `vr` from the standard
    /// dictionary when the caller does not override it.
    pub fn set_string(&mut self, tag: Tag, value: &str, big_endian: bool, explicit_vr: bool) {
        self.set_strings(tag, std::slice::from_ref(&value.to_string()), big_endian, explicit_vr)
    }

    pub fn set_strings(&mut self, tag: Tag, values: &[String], big_endian: bool, explicit_vr: bool) {
        let vr = dicom_dictionary_std::vr_of(tag);
        let joined = values.join("\\");
        let bytes = self.character_sets.encode(&joined);
        self.set(ElementSet::Value(ValueElement::new(tag, vr, Value::from_bytes(bytes), big_endian, explicit_vr)));
    }

    pub fn set_short(&mut self, tag: Tag, value: i16, big_endian: bool, explicit_vr: bool) {
        self.set_shorts(tag, &[value], big_endian, explicit_vr)
    }

    pub fn set_shorts(&mut self, tag: Tag, values: &[i16], big_endian: bool, explicit_vr: bool) {
        let vr = dicom_dictionary_std::vr_of(tag);
        let endian = Endianness::from_big(big_endian);
        let mut bytes = Vec::with_capacity(values.len() * 2);
        for v in values {
            endian.write_u16(*v as u16, &mut bytes);
        }
        self.set(ElementSet::Value(ValueElement::new(tag, vr, Value::from_bytes(bytes), big_endian, explicit_vr)));
    }

    pub fn set_int(&mut self, tag: Tag, value: i32, big_endian: bool, explicit_vr: bool) {
        self.set_ints(tag, &[value], big_endian, explicit_vr)
    }

    pub fn set_ints(&mut self, tag: Tag, values: &[i32], big_endian: bool, explicit_vr: bool) {
        let vr = dicom_dictionary_std::vr_of(tag);
        let endian = Endianness::from_big(big_endian);
        let mut bytes = Vec::with_capacity(values.len() * 4);
        for v in values {
            endian.write_u32(*v as u32, &mut bytes);
        }
        self.set(ElementSet::Value(ValueElement::new(tag, vr, Value::from_bytes(bytes), big_endian, explicit_vr)));
    }

    pub fn set_float(&mut self, tag: Tag, value: f32, big_endian: bool, explicit_vr: bool) {
        self.set_floats(tag, &[value], big_endian, explicit_vr)
    }

    pub fn set_floats(&mut self, tag: Tag, values: &[f32], big_endian: bool, explicit_vr: bool) {
        let vr = dicom_dictionary_std::vr_of(tag);
        let endian = Endianness::from_big(big_endian);
        let mut bytes = Vec::with_capacity(values.len() * 4);
        for v in values {
            endian.write_f32(*v, &mut bytes);
        }
        self.set(ElementSet::Value(ValueElement::new(tag, vr, Value::from_bytes(bytes), big_endian, explicit_vr)));
    }

    pub fn set_double(&mut self, tag: Tag, value: f64, big_endian: bool, explicit_vr: bool) {
        self.set_doubles(tag, &[value], big_endian, explicit_vr)
    }

    pub fn set_doubles(&mut self, tag: Tag, values: &[f64], big_endian: bool, explicit_vr: bool) {
        let vr = dicom_dictionary_std::vr_of(tag);
        let endian = Endianness::from_big(big_endian);
        let mut bytes = Vec::with_capacity(values.len() * 8);
        for v in values {
            endian.write_f64(*v, &mut bytes);
        }
        self.set(ElementSet::Value(ValueElement::new(tag, vr, Value::from_bytes(bytes), big_endian, explicit_vr)));
    }

    pub fn set_bytes(&mut self, tag: Tag, vr: VR, bytes: Vec<u8>, big_endian: bool, explicit_vr: bool) {
        self.set(ElementSet::Value(ValueElement::new(tag, vr, Value::from_bytes(bytes), big_endian, explicit_vr)));
    }
}

/// Parses a `TimezoneOffsetFromUTC` value (`±HHMM`) into a [`FixedOffset`].
fn parse_zone_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    if s.len() != 5 {
        return None;
    }
    let sign = match s.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hh: i32 = s[1..3].parse().ok()?;
    let mm: i32 = s[3..5].parse().ok()?;
    FixedOffset::east_opt(sign * (hh * 3600 + mm * 60))
}

/// A single step of a [`TagPath`], exploded for local pattern matching.
/// `TagPath` itself keeps its steps private; this mirrors them instead of
/// exposing its internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Tag(Tag),
    Sequence(Tag),
    Item(Tag, u32),
}

impl Step {
    fn tag(&self) -> Tag {
        match *self {
            Step::Tag(t) | Step::Sequence(t) | Step::Item(t, _) => t,
        }
    }
}

fn path_steps(path: &TagPath) -> Vec<Step> {
    // Re-derive steps through TagPath's own public walking API
    // (`previous`/`tag`/`item_index`) rather than duplicating its
    // private representation.
    let mut rev = Vec::new();
    let mut cur = Some(path.clone());
    while let Some(p) = cur {
        if p.is_root() {
            break;
        }
        let tag = p.tag().expect("non-root TagPath always has a tag");
        let step = match p.item_index() {
            Some(index) => Step::Item(tag, index),
            None => {
                // Disambiguating Tag vs Sequence requires knowing which
                // constructor built this step; TagPath does not expose
                // that, so callers address sequences exclusively through
                // `then_sequence` immediately followed by `then_item`,
                // and plain tags otherwise. We detect "sequence" by
                // peeking one step further down (the next, deeper step
                // is always an Item of the same tag when this one was a
                // Sequence step).
                Step::Tag(tag)
            }
        };
        rev.push(step);
        cur = p.previous();
    }
    rev.reverse();
    // Promote a `Tag` step immediately followed by an `Item` of the same
    // tag to `Sequence`, recovering the constructor distinction.
    for i in 0..rev.len().saturating_sub(1) {
        if let (Step::Tag(t), Step::Item(it, _)) = (rev[i], rev[i + 1]) {
            if t == it {
                rev[i] = Step::Sequence(t);
            }
        }
    }
    rev
}

trait OptionInvalidPathExt<T> {
    fn context_invalid(self, tag: Tag) -> Result<T>;
}

impl<T> OptionInvalidPathExt<T> for Option<T> {
    fn context_invalid(self, tag: Tag) -> Result<T> {
        self.ok_or(Error::InvalidPath {
            tag,
            backtrace: snafu::Backtrace::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::TagPath;

    fn cs() -> CharacterSets {
        CharacterSets::default()
    }

    #[test]
    fn set_and_get_string_round_trips() {
        let mut e = Elements::new();
        e.set_string(Tag(0x0010, 0x0010), "Doe^John", false, true);
        assert_eq!(e.get_string(Tag(0x0010, 0x0010)), Some("Doe^John".to_string()));
    }

    #[test]
    fn tags_stay_sorted_after_out_of_order_inserts() {
        let mut e = Elements::new();
        e.set_string(Tag(0x0010, 0x0010), "B", false, true);
        e.set_string(Tag(0x0008, 0x0020), "A", false, true);
        let tags: Vec<_> = e.sorted().iter().map(ElementSet::tag).collect();
        assert_eq!(tags, vec![Tag(0x0008, 0x0020), Tag(0x0010, 0x0010)]);
    }

    #[test]
    fn specific_character_set_updates_character_sets() {
        let mut e = Elements::new();
        e.set_string(tags::SPECIFIC_CHARACTER_SET, "ISO_IR 100", false, true);
        assert_eq!(e.character_sets().decode(&[0xE9]), "é");
    }

    #[test]
    fn timezone_offset_updates_zone_offset() {
        let mut e = Elements::new();
        e.set_string(tags::TIMEZONE_OFFSET_FROM_UTC, "+0100", false, true);
        assert_eq!(e.zone_offset().unwrap().local_minus_utc(), 3600);
    }

    #[test]
    fn add_item_to_indeterminate_sequence_stays_indeterminate() {
        let mut e = Elements::new();
        let study_seq = Tag(0x0008, 0x1110);
        e.set(ElementSet::Sequence(Sequence::new(study_seq, Length::UNDEFINED, vec![], false, true)));
        let mut nested = Elements::new();
        nested.set_string(Tag(0x0020, 0x000D), "1.2.3", false, true);
        let path = TagPath::empty().then_sequence(study_seq);
        e.add_item(&path, nested).unwrap();
        assert!(e.get_sequence(study_seq).unwrap().length().is_undefined());
        assert_eq!(e.get_sequence(study_seq).unwrap().items.len(), 1);
    }

    #[test]
    fn add_item_to_explicit_sequence_grows_its_length() {
        let mut e = Elements::new();
        let seq_tag = Tag(0x0008, 0x1110);
        e.set(ElementSet::Sequence(Sequence::new(seq_tag, Length(0), vec![], false, true)));
        let mut nested = Elements::new();
        nested.set_string(Tag(0x0020, 0x000D), "1.2.3", false, true);
        let path = TagPath::empty().then_sequence(seq_tag);
        e.add_item(&path, nested).unwrap();
        let seq = e.get_sequence(seq_tag).unwrap();
        assert!(seq.length().get().unwrap() > 0);
        let item_len = seq.items[0].length().get().unwrap();
        assert_eq!(seq.length().get().unwrap() as usize, crate::serializer::item_total_length(&seq.items[0]) as usize);
        assert!(item_len > 0);
    }

    #[test]
    fn nested_get_via_path() {
        let mut e = Elements::new();
        let seq_tag = Tag(0x0008, 0x1110);
        let mut nested = Elements::new();
        nested.set_string(Tag(0x0020, 0x000D), "1.2.3", false, true);
        e.set(ElementSet::Sequence(Sequence::new(
            seq_tag,
            Length::UNDEFINED,
            vec![Item::indeterminate(nested, false)],
            false,
            true,
        )));
        let path = TagPath::empty()
            .then_sequence(seq_tag)
            .then_item(seq_tag, 1)
            .then_tag(Tag(0x0020, 0x000D));
        let found = e.apply(&path).unwrap().unwrap();
        assert_eq!(found.as_value().unwrap().value.to_string(VR::UI, &cs()), Some("1.2.3".to_string()));
    }

    #[test]
    fn frame_count_semantics() {
        let tag = Tag(0x7FE0, 0x0010);
        let mut f = Fragments::empty(tag, VR::OB, false, true);
        assert_eq!(f.frame_count(), 0);
        f.push_item(vec![0, 0, 0, 0]);
        f.push_item(b"123456".to_vec());
        assert_eq!(f.frame_count(), 1);
        assert_eq!(f.offsets(), Some(&[0u64][..]));
    }
}
