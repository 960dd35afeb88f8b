//! Partial-precision Date, Time and DateTime values.
//!
//! DICOM permits `DA`/`TM`/`DT` values to omit trailing components (a `TM`
//! of just `"14"` means "hour 14, minute/second unspecified"). These types
//! keep track of how much precision was actually present on the wire.

use chrono::{FixedOffset, NaiveDate, NaiveTime};
use std::fmt;

/// A DICOM date with partial precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DicomDate {
    Year(u16),
    Month(u16, u8),
    Day(u16, u8, u8),
}

/// A DICOM time with partial precision. The fraction, when present, is
/// stored as a number of microseconds plus the number of significant digits
/// originally encoded (1-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DicomTime {
    Hour(u8),
    Minute(u8, u8),
    Second(u8, u8, u8),
    Fraction(u8, u8, u8, u32, u8),
}

/// A DICOM date-time with partial precision and an optional UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DicomDateTime {
    pub date: DicomDate,
    pub time: Option<DicomTime>,
    pub offset: Option<FixedOffset>,
}

impl DicomDate {
    /// The earliest calendar date consistent with this partial value.
    pub fn to_naive_date(self) -> Option<NaiveDate> {
        match self {
            DicomDate::Year(y) => NaiveDate::from_ymd_opt(y as i32, 1, 1),
            DicomDate::Month(y, m) => NaiveDate::from_ymd_opt(y as i32, m as u32, 1),
            DicomDate::Day(y, m, d) => NaiveDate::from_ymd_opt(y as i32, m as u32, d as u32),
        }
    }

    /// Parses a `DA` value: `YYYYMMDD`, or the legacy `YYYY.MM.DD` form.
    pub fn parse(text: &str) -> Option<DicomDate> {
        let text = text.trim();
        if let Some((y, m, d)) = parse_legacy_dotted(text) {
            return validate_date(y, m, d);
        }
        let digits = text.as_bytes();
        match digits.len() {
            4 => {
                let y = parse_u16(&text[0..4])?;
                Some(DicomDate::Year(y))
            }
            6 => {
                let y = parse_u16(&text[0..4])?;
                let m = parse_u8(&text[4..6])?;
                validate_date_ym(y, m)
            }
            8 => {
                let y = parse_u16(&text[0..4])?;
                let m = parse_u8(&text[4..6])?;
                let d = parse_u8(&text[6..8])?;
                validate_date(y, m, d)
            }
            _ => None,
        }
    }
}

fn parse_legacy_dotted(text: &str) -> Option<(u16, u8, u8)> {
    let mut parts = text.split('.');
    let y = parts.next()?;
    let m = parts.next()?;
    let d = parts.next()?;
    if parts.next().is_some() || y.len() != 4 {
        return None;
    }
    Some((parse_u16(y)?, parse_u8(m)?, parse_u8(d)?))
}

fn validate_date_ym(y: u16, m: u8) -> Option<DicomDate> {
    if (1..=12).contains(&m) {
        Some(DicomDate::Month(y, m))
    } else {
        None
    }
}

fn validate_date(y: u16, m: u8, d: u8) -> Option<DicomDate> {
    if (1..=12).contains(&m) && (1..=31).contains(&d) {
        Some(DicomDate::Day(y, m, d))
    } else {
        None
    }
}

impl DicomTime {
    /// The latest naive time consistent with this partial value (missing
    /// components default to their maximum, per DICOM range-query semantics
    /// being out of scope here -- this codec simply needs *a* concrete time).
    pub fn to_naive_time(self) -> Option<NaiveTime> {
        match self {
            DicomTime::Hour(h) => NaiveTime::from_hms_opt(h as u32, 0, 0),
            DicomTime::Minute(h, m) => NaiveTime::from_hms_opt(h as u32, m as u32, 0),
            DicomTime::Second(h, m, s) => NaiveTime::from_hms_opt(h as u32, m as u32, s as u32),
            DicomTime::Fraction(h, m, s, frac, _precision) => {
                NaiveTime::from_hms_micro_opt(h as u32, m as u32, s as u32, frac)
            }
        }
    }

    /// Parses a `TM` value: `HHMMSS[.FFFFFF]` with any trailing component
    /// (including the fraction) optional.
    pub fn parse(text: &str) -> Option<DicomTime> {
        let text = text.trim();
        let (main, frac) = match text.split_once('.') {
            Some((m, f)) => (m, Some(f)),
            None => (text, None),
        };
        let time = match main.len() {
            2 => DicomTime::Hour(parse_u8(main)?),
            4 => DicomTime::Minute(parse_u8(&main[0..2])?, parse_u8(&main[2..4])?),
            6 => DicomTime::Second(
                parse_u8(&main[0..2])?,
                parse_u8(&main[2..4])?,
                parse_u8(&main[4..6])?,
            ),
            _ => return None,
        };
        match frac {
            None => Some(time),
            Some(f) if !f.is_empty() && f.len() <= 6 && f.bytes().all(|b| b.is_ascii_digit()) => {
                let (h, m, s) = match time {
                    DicomTime::Second(h, m, s) => (h, m, s),
                    _ => return None,
                };
                let precision = f.len() as u8;
                let mut micros: u32 = f.parse().ok()?;
                for _ in 0..(6 - precision) {
                    micros *= 10;
                }
                Some(DicomTime::Fraction(h, m, s, micros, precision))
            }
            Some(_) => None,
        }
    }
}

impl DicomDateTime {
    /// Parses a `DT` value: `YYYYMMDDHHMMSS[.FFFFFF][&ZZXX]`.
    pub fn parse(text: &str, default_offset: Option<FixedOffset>) -> Option<DicomDateTime> {
        let text = text.trim();
        let (body, offset_str) = match text.find(['+', '-']) {
            Some(idx) if idx >= 4 => (&text[..idx], Some(&text[idx..])),
            _ => (text, None),
        };

        let offset = match offset_str {
            Some(s) => Some(parse_offset(s)?),
            None => default_offset,
        };

        let (date_part, time_part) = split_date_time(body);
        let date = DicomDate::parse(date_part)?;
        let time = match time_part {
            Some(t) if !t.is_empty() => Some(DicomTime::parse(t)?),
            _ => None,
        };

        Some(DicomDateTime { date, time, offset })
    }
}

fn split_date_time(body: &str) -> (&str, Option<&str>) {
    if body.len() <= 8 {
        (body, None)
    } else {
        (&body[..8], Some(&body[8..]))
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
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
    let seconds = sign * (hh * 3600 + mm * 60);
    FixedOffset::east_opt(seconds)
}

fn parse_u8(s: &str) -> Option<u8> {
    if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_u16(s: &str) -> Option<u16> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for DicomDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DicomDate::Year(y) => write!(f, "{:04}", y),
            DicomDate::Month(y, m) => write!(f, "{:04}{:02}", y, m),
            DicomDate::Day(y, m, d) => write!(f, "{:04}{:02}{:02}", y, m, d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_date() {
        assert_eq!(DicomDate::parse("20200101"), Some(DicomDate::Day(2020, 1, 1)));
    }

    #[test]
    fn parses_legacy_dotted_date() {
        assert_eq!(
            DicomDate::parse("2020.01.01"),
            Some(DicomDate::Day(2020, 1, 1))
        );
    }

    #[test]
    fn rejects_invalid_month() {
        assert_eq!(DicomDate::parse("20201301"), None);
    }

    #[test]
    fn parses_partial_time_with_fraction() {
        assert_eq!(
            DicomTime::parse("140000.5"),
            Some(DicomTime::Fraction(14, 0, 0, 500_000, 1))
        );
        assert_eq!(DicomTime::parse("14"), Some(DicomTime::Hour(14)));
    }

    #[test]
    fn parses_date_time_with_offset() {
        let dt = DicomDateTime::parse("20200101120000+0100", None).unwrap();
        assert_eq!(dt.date, DicomDate::Day(2020, 1, 1));
        assert_eq!(dt.offset.unwrap().local_minus_utc(), 3600);
    }

    #[test]
    fn date_time_falls_back_to_default_offset() {
        let default = FixedOffset::east_opt(3600).unwrap();
        let dt = DicomDateTime::parse("20200101", Some(default)).unwrap();
        assert_eq!(dt.offset, Some(default));
    }
}
