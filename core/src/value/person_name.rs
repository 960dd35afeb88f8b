//! Handling of DICOM values with the `PN` (person name) value
//! representation, as per PS3.5 sect 6.2.
//!
//! A full `PN` value may carry up to three representations of the same
//! name -- alphabetic, ideographic and phonetic -- separated by `=`. Each
//! representation is itself split by `^` into five components: family,
//! given, middle, prefix, suffix.

use std::fmt::{self, Display, Formatter};

/// One `^`-delimited group of name components (a single representation of
/// a `PN` value: alphabetic, ideographic or phonetic).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PersonNameGroup<'a> {
    family: Option<&'a str>,
    given: Option<&'a str>,
    middle: Option<&'a str>,
    prefix: Option<&'a str>,
    suffix: Option<&'a str>,
}

/// A full DICOM `PN` value, with up to three component groups.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PersonName<'a> {
    pub alphabetic: Option<PersonNameGroup<'a>>,
    pub ideographic: Option<PersonNameGroup<'a>>,
    pub phonetic: Option<PersonNameGroup<'a>>,
}

impl<'a> PersonNameGroup<'a> {
    pub fn family(&self) -> Option<&'a str> {
        self.family
    }
    pub fn given(&self) -> Option<&'a str> {
        self.given
    }
    pub fn middle(&self) -> Option<&'a str> {
        self.middle
    }
    pub fn prefix(&self) -> Option<&'a str> {
        self.prefix
    }
    pub fn suffix(&self) -> Option<&'a str> {
        self.suffix
    }

    /// Parses a single `^`-delimited component group.
    pub fn from_slice(slice: &'a str) -> PersonNameGroup<'a> {
        let mut parts = slice.split('^');
        macro_rules! get_component {
            () => {
                parts
                    .next()
                    .and_then(|s| if s.is_empty() { None } else { Some(s) })
            };
        }
        PersonNameGroup {
            family: get_component!(),
            given: get_component!(),
            middle: get_component!(),
            prefix: get_component!(),
            suffix: get_component!(),
        }
    }

    /// Renders this group back into its DICOM `^`-delimited textual form,
    /// dropping trailing empty components.
    pub fn to_dicom_string(&self) -> String {
        let components: &[Option<&str>] = &[
            self.family,
            self.given,
            self.middle,
            self.prefix,
            self.suffix,
        ];

        let mut it = components.iter().rev().peekable();
        while it.next_if(|component| component.is_none()).is_some() {}

        let mut it = it.rev().peekable();
        let mut name = String::new();
        while let Some(option) = it.next() {
            if let Some(component) = option {
                name.push_str(component);
            }
            if it.peek().is_some() {
                name.push('^');
            }
        }
        name
    }
}

impl Display for PersonNameGroup<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let components: &[Option<&str>] = &[
            self.prefix,
            self.given,
            self.middle,
            self.family,
            self.suffix,
        ];
        let mut it = components.iter().flatten().peekable();
        while let Some(component) = it.next() {
            if it.peek().is_some() {
                write!(f, "{} ", component)?
            } else {
                write!(f, "{}", component)?
            }
        }
        Ok(())
    }
}

impl<'a> PersonName<'a> {
    /// Parses a full `PN` value, splitting on `=` into up to three groups.
    pub fn from_slice(slice: &'a str) -> PersonName<'a> {
        let mut groups = slice.splitn(3, '=');
        let alphabetic = groups.next().filter(|s| !s.is_empty()).map(PersonNameGroup::from_slice);
        let ideographic = groups.next().filter(|s| !s.is_empty()).map(PersonNameGroup::from_slice);
        let phonetic = groups.next().filter(|s| !s.is_empty()).map(PersonNameGroup::from_slice);
        PersonName {
            alphabetic,
            ideographic,
            phonetic,
        }
    }

    /// Renders this value back into its DICOM `=`-delimited textual form.
    pub fn to_dicom_string(&self) -> String {
        let groups = [&self.alphabetic, &self.ideographic, &self.phonetic];
        let present: Vec<String> = groups
            .iter()
            .rev()
            .skip_while(|g| g.is_none())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(|g| g.map(|g| g.to_dicom_string()).unwrap_or_default())
            .collect();
        present.join("=")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_group() {
        let pn = PersonName::from_slice("Doe^John^^Dr.^Jr.");
        let g = pn.alphabetic.unwrap();
        assert_eq!(g.family(), Some("Doe"));
        assert_eq!(g.given(), Some("John"));
        assert_eq!(g.middle(), None);
        assert_eq!(g.prefix(), Some("Dr."));
        assert_eq!(g.suffix(), Some("Jr."));
        assert!(pn.ideographic.is_none());
    }

    #[test]
    fn parses_multi_group() {
        let pn = PersonName::from_slice("Yamada^Tarou=山田^太郎=やまだ^たろう");
        assert_eq!(pn.alphabetic.unwrap().family(), Some("Yamada"));
        assert_eq!(pn.ideographic.unwrap().family(), Some("山田"));
        assert_eq!(pn.phonetic.unwrap().family(), Some("やまだ"));
    }

    #[test]
    fn round_trips_dicom_string() {
        let group = PersonNameGroup::from_slice("Doe^John^^^");
        assert_eq!(group.to_dicom_string(), "Doe^John");
    }
}
