//! Positional rules for the custom date codes.
//!
//! Codes read right to left: the year is always the trailing 4 (or 2)
//! characters, and the remaining prefix is split into month and day fields.
//! Variable-width fields are left-padded with zeros to width 2. An empty day
//! field defaults to the 28th, which is valid in every month.

use chrono::NaiveDate;

use crate::error::DateError;

const DEFAULT_DAY: &str = "28";

/// `XMYYYY`: month prefix, 4-digit year. The day is always the 28th.
pub fn xmyyyy(value: &str) -> Result<NaiveDate, DateError> {
    let chars = Chars::new(value);
    let year = chars.slice(Some(-4), None);
    let month = zfill(&chars.slice(None, Some(-4)));
    assemble("XMYYYY", value, &year, &month, DEFAULT_DAY)
}

/// `XDXMYYYY`: day prefix, single month character, 4-digit year.
pub fn xdxmyyyy(value: &str) -> Result<NaiveDate, DateError> {
    let chars = Chars::new(value);
    let year = chars.slice(Some(-4), None);
    let month = zfill(&chars.slice(Some(-5), Some(-4)));
    let day = day_field(&chars.slice(None, Some(-5)));
    assemble("XDXMYYYY", value, &year, &month, &day)
}

/// `XMXDYYYY`: month prefix, single day character, 4-digit year.
pub fn xmxdyyyy(value: &str) -> Result<NaiveDate, DateError> {
    let chars = Chars::new(value);
    let year = chars.slice(Some(-4), None);
    let month = zfill(&chars.slice(None, Some(-5)));
    let day = day_field(&chars.slice(Some(-5), Some(-4)));
    assemble("XMXDYYYY", value, &year, &month, &day)
}

/// `DDMMYY`: fixed-width day and month, 2-digit year in the 2000s.
pub fn ddmmyy(value: &str) -> Result<NaiveDate, DateError> {
    let chars = Chars::new(value);
    let year = format!("20{}", chars.slice(Some(-2), None));
    let month = chars.slice(Some(2), Some(4));
    let day = or_default_day(chars.slice(None, Some(2)));
    assemble("DDMMYY", value, &year, &month, &day)
}

/// `MMDDYY`: fixed-width month and day, 2-digit year in the 2000s.
pub fn mmddyy(value: &str) -> Result<NaiveDate, DateError> {
    let chars = Chars::new(value);
    let year = format!("20{}", chars.slice(Some(-2), None));
    let month = chars.slice(None, Some(2));
    let day = or_default_day(chars.slice(Some(2), Some(4)));
    assemble("MMDDYY", value, &year, &month, &day)
}

/// `XDXMYY`: day prefix, single month character, 2-digit year.
pub fn xdxmyy(value: &str) -> Result<NaiveDate, DateError> {
    let chars = Chars::new(value);
    let year = format!("20{}", chars.slice(Some(-2), None));
    let month = zfill(&chars.slice(Some(-3), Some(-2)));
    let day = day_field(&chars.slice(None, Some(-3)));
    assemble("XDXMYY", value, &year, &month, &day)
}

/// `XMXDYY`: month prefix, single day character, 2-digit year.
pub fn xmxdyy(value: &str) -> Result<NaiveDate, DateError> {
    let chars = Chars::new(value);
    let year = format!("20{}", chars.slice(Some(-2), None));
    let month = zfill(&chars.slice(None, Some(-3)));
    let day = day_field(&chars.slice(Some(-3), Some(-2)));
    assemble("XMXDYY", value, &year, &month, &day)
}

/// Character view supporting negative, clamped slice bounds.
struct Chars(Vec<char>);

impl Chars {
    fn new(value: &str) -> Self {
        Chars(value.chars().collect())
    }

    fn bound(&self, index: isize) -> usize {
        let len = self.0.len() as isize;
        let resolved = if index < 0 { index + len } else { index };
        resolved.clamp(0, len) as usize
    }

    fn slice(&self, start: Option<isize>, end: Option<isize>) -> String {
        let start = start.map_or(0, |index| self.bound(index));
        let end = end.map_or(self.0.len(), |index| self.bound(index));
        if start >= end {
            return String::new();
        }
        self.0[start..end].iter().collect()
    }
}

fn zfill(field: &str) -> String {
    format!("{field:0>2}")
}

fn or_default_day(field: String) -> String {
    if field.is_empty() {
        DEFAULT_DAY.to_string()
    } else {
        field
    }
}

fn day_field(field: &str) -> String {
    if field.is_empty() {
        DEFAULT_DAY.to_string()
    } else {
        zfill(field)
    }
}

fn assemble(
    format: &str,
    value: &str,
    year: &str,
    month: &str,
    day: &str,
) -> Result<NaiveDate, DateError> {
    let assembled = format!("{year}-{month}-{day}");
    let invalid = || DateError::InvalidDate {
        value: value.to_string(),
        format: format.to_string(),
        assembled: assembled.clone(),
    };

    let digits = |field: &str, min: usize, max: usize| {
        (min..=max).contains(&field.len()) && field.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(year, 4, 4) || !digits(month, 1, 2) || !digits(day, 1, 2) {
        return Err(invalid());
    }

    let (Ok(year), Ok(month), Ok(day)) = (
        year.parse::<i32>(),
        month.parse::<u32>(),
        day.parse::<u32>(),
    ) else {
        return Err(invalid());
    };
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_xmyyyy() {
        assert_eq!(xmyyyy("122023"), Ok(ymd(2023, 12, 28)));
        assert_eq!(xmyyyy("32023"), Ok(ymd(2023, 3, 28)));
        assert!(xmyyyy("2023").is_err());
        assert!(xmyyyy("132023").is_err());
    }

    #[test]
    fn test_xdxmyyyy() {
        assert_eq!(xdxmyyyy("3112023"), Ok(ymd(2023, 1, 31)));
        assert_eq!(xdxmyyyy("512023"), Ok(ymd(2023, 1, 5)));
        assert_eq!(xdxmyyyy("22023"), Ok(ymd(2023, 2, 28)));
    }

    #[test]
    fn test_xmxdyyyy() {
        assert_eq!(xmxdyyyy("1232023"), Ok(ymd(2023, 12, 3)));
        assert!(xmxdyyyy("32023").is_err());
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(ddmmyy("311223"), Ok(ymd(2023, 12, 31)));
        assert_eq!(mmddyy("123123"), Ok(ymd(2023, 12, 31)));
        assert_eq!(xdxmyy("31123"), Ok(ymd(2023, 1, 31)));
        assert_eq!(xmxdyy("12323"), Ok(ymd(2023, 12, 3)));
        assert_eq!(xdxmyy("324"), Ok(ymd(2024, 3, 28)));
    }

    #[test]
    fn test_invalid_reports_assembled_text() {
        let err = xdxmyyyy("3022023").unwrap_err();
        assert_eq!(
            err,
            DateError::InvalidDate {
                value: "3022023".to_string(),
                format: "XDXMYYYY".to_string(),
                assembled: "2023-02-30".to_string(),
            }
        );
    }

    #[test]
    fn test_slice_bounds() {
        let chars = Chars::new("abc");
        assert_eq!(chars.slice(Some(-4), None), "abc");
        assert_eq!(chars.slice(None, Some(-4)), "");
        assert_eq!(chars.slice(Some(-2), Some(-1)), "b");
    }
}
