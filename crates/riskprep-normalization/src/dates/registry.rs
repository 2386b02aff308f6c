//! Catalog of recognized date encodings.
//!
//! Stock formats are strftime patterns (plus the `ISO8601` auto-detect
//! sentinel) handed to chrono. Custom formats are positional codes for
//! separator-free encodings such as `122023`, each bound to a rule in
//! [`super::custom`].

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::custom;
use crate::error::DateError;

/// Sentinel code selecting ISO 8601 auto-detection.
pub const ISO8601: &str = "ISO8601";

/// How a stock format is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockPattern {
    /// ISO 8601 dates and datetimes, with or without offset.
    Iso8601,
    /// A date-only chrono pattern.
    Date(&'static str),
    /// A chrono pattern carrying a time of day; the date part is kept.
    DateTime(&'static str),
}

/// A stock format entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockFormat {
    /// The code as written in configuration (strftime syntax).
    pub code: &'static str,
    pub pattern: StockPattern,
    pub example: &'static str,
}

impl StockFormat {
    /// Parses one trimmed value.
    pub fn parse(&self, value: &str) -> Result<NaiveDate, DateError> {
        let parsed = match self.pattern {
            StockPattern::Iso8601 => parse_iso8601(value),
            StockPattern::Date(pattern) => NaiveDate::parse_from_str(value, pattern).ok(),
            StockPattern::DateTime(pattern) => NaiveDateTime::parse_from_str(value, pattern)
                .ok()
                .map(|dt| dt.date()),
        };
        parsed.ok_or_else(|| DateError::Unparseable {
            value: value.to_string(),
            format: self.code.to_string(),
        })
    }
}

/// Rule signature for custom codes: separator-stripped value in, date out.
pub type CustomRule = fn(&str) -> Result<NaiveDate, DateError>;

/// A custom format entry.
#[derive(Debug, Clone, Copy)]
pub struct CustomFormat {
    pub code: &'static str,
    pub rule: CustomRule,
    pub example: &'static str,
    pub description: &'static str,
}

impl CustomFormat {
    pub fn parse(&self, value: &str) -> Result<NaiveDate, DateError> {
        (self.rule)(value)
    }
}

/// A resolved format code.
#[derive(Debug, Clone, Copy)]
pub enum DateFormat {
    Stock(&'static StockFormat),
    Custom(&'static CustomFormat),
}

impl DateFormat {
    pub fn code(&self) -> &'static str {
        match self {
            DateFormat::Stock(format) => format.code,
            DateFormat::Custom(format) => format.code,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DateFormat::Stock(_) => "stock",
            DateFormat::Custom(_) => "custom",
        }
    }

    pub fn example(&self) -> &'static str {
        match self {
            DateFormat::Stock(format) => format.example,
            DateFormat::Custom(format) => format.example,
        }
    }
}

const STOCK_FORMATS: &[StockFormat] = &[
    stock(ISO8601, StockPattern::Iso8601, "2023-12-31T23:59:59"),
    stock("%Y-%m-%d", StockPattern::Date("%Y-%m-%d"), "2023-12-31"),
    stock("%Y%m%d", StockPattern::Date("%Y%m%d"), "20231231"),
    stock("%m/%d/%Y", StockPattern::Date("%m/%d/%Y"), "12/31/2023"),
    stock("%m-%d-%Y", StockPattern::Date("%m-%d-%Y"), "12-31-2023"),
    stock("%m.%d.%Y", StockPattern::Date("%m.%d.%Y"), "12.31.2023"),
    stock("%b %d, %Y", StockPattern::Date("%b %d, %Y"), "Dec 31, 2023"),
    stock("%B %d, %Y", StockPattern::Date("%B %d, %Y"), "December 31, 2023"),
    stock("%d/%m/%Y", StockPattern::Date("%d/%m/%Y"), "31/12/2023"),
    stock("%d-%m-%Y", StockPattern::Date("%d-%m-%Y"), "31-12-2023"),
    stock("%d.%m.%Y", StockPattern::Date("%d.%m.%Y"), "31.12.2023"),
    stock("%d %b %Y", StockPattern::Date("%d %b %Y"), "31 Dec 2023"),
    stock("%d %B %Y", StockPattern::Date("%d %B %Y"), "31 December 2023"),
    stock("%Y/%m/%d", StockPattern::Date("%Y/%m/%d"), "2023/12/31"),
    stock("%Y.%m.%d", StockPattern::Date("%Y.%m.%d"), "2023.12.31"),
    stock(
        "%Y-%m-%d %H:%M:%S",
        StockPattern::DateTime("%Y-%m-%d %H:%M:%S"),
        "2023-12-31 23:59:59",
    ),
    stock(
        "%Y-%m-%d %H:%M:%S.%f",
        StockPattern::DateTime("%Y-%m-%d %H:%M:%S%.f"),
        "2023-12-31 23:59:59.999999",
    ),
    stock(
        "%Y-%m-%dT%H:%M:%S",
        StockPattern::DateTime("%Y-%m-%dT%H:%M:%S"),
        "2023-12-31T23:59:59",
    ),
    stock(
        "%Y-%m-%dT%H:%M:%S.%f",
        StockPattern::DateTime("%Y-%m-%dT%H:%M:%S%.f"),
        "2023-12-31T23:59:59.999999",
    ),
    stock("%y-%m-%d", StockPattern::Date("%y-%m-%d"), "23-12-31"),
    stock("%d/%m/%y", StockPattern::Date("%d/%m/%y"), "31/12/23"),
    stock("%m/%d/%y", StockPattern::Date("%m/%d/%y"), "12/31/23"),
    stock("%b-%d-%Y", StockPattern::Date("%b-%d-%Y"), "Dec-31-2023"),
    stock("%B-%d-%Y", StockPattern::Date("%B-%d-%Y"), "December-31-2023"),
];

const fn stock(code: &'static str, pattern: StockPattern, example: &'static str) -> StockFormat {
    StockFormat {
        code,
        pattern,
        example,
    }
}

const CUSTOM_FORMATS: &[CustomFormat] = &[
    CustomFormat {
        code: "XMYYYY",
        rule: custom::xmyyyy,
        example: "122023",
        description: "month then 4-digit year, day fixed to 28",
    },
    CustomFormat {
        code: "XDXMYYYY",
        rule: custom::xdxmyyyy,
        example: "3112023",
        description: "day, single-digit month, 4-digit year",
    },
    CustomFormat {
        code: "XMXDYYYY",
        rule: custom::xmxdyyyy,
        example: "1232023",
        description: "month, single-digit day, 4-digit year",
    },
    CustomFormat {
        code: "DDMMYY",
        rule: custom::ddmmyy,
        example: "311223",
        description: "2-digit day, 2-digit month, 2-digit year in the 2000s",
    },
    CustomFormat {
        code: "MMDDYY",
        rule: custom::mmddyy,
        example: "123123",
        description: "2-digit month, 2-digit day, 2-digit year in the 2000s",
    },
    CustomFormat {
        code: "XDXMYY",
        rule: custom::xdxmyy,
        example: "31123",
        description: "day, single-digit month, 2-digit year in the 2000s",
    },
    CustomFormat {
        code: "XMXDYY",
        rule: custom::xmxdyy,
        example: "12323",
        description: "month, single-digit day, 2-digit year in the 2000s",
    },
];

static REGISTRY: LazyLock<FormatRegistry> = LazyLock::new(|| FormatRegistry {
    stock: STOCK_FORMATS,
    custom: CUSTOM_FORMATS,
});

/// Immutable catalog of stock and custom date formats.
#[derive(Debug)]
pub struct FormatRegistry {
    stock: &'static [StockFormat],
    custom: &'static [CustomFormat],
}

impl FormatRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static FormatRegistry {
        &REGISTRY
    }

    /// Looks up a format code. Stock codes take precedence over custom ones.
    pub fn resolve(&self, code: &str) -> Option<DateFormat> {
        let (stock, custom) = (self.stock, self.custom);
        if let Some(format) = stock.iter().find(|format| format.code == code) {
            return Some(DateFormat::Stock(format));
        }
        custom
            .iter()
            .find(|format| format.code == code)
            .map(DateFormat::Custom)
    }

    pub fn is_known(&self, code: &str) -> bool {
        self.resolve(code).is_some()
    }

    pub fn stock_formats(&self) -> &'static [StockFormat] {
        self.stock
    }

    pub fn custom_formats(&self) -> &'static [CustomFormat] {
        self.custom
    }

    /// Every format, stock first, in catalog order.
    pub fn all(&self) -> impl Iterator<Item = DateFormat> + use<> {
        let (stock, custom) = (self.stock, self.custom);
        stock
            .iter()
            .map(DateFormat::Stock)
            .chain(custom.iter().map(DateFormat::Custom))
    }
}

/// Returns true when `code` names a registered format.
pub fn is_known_date_format(code: &str) -> bool {
    FormatRegistry::global().is_known(code)
}

/// ISO 8601 in the forms commonly found in uploads: full timestamps with an
/// offset, naive timestamps with `T` or a space, calendar dates, and the
/// reduced-precision `YYYY-MM` and `YYYY` forms (first day of the period).
fn parse_iso8601(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    let datetime_formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    let is_year = |s: &str| s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit());
    match value.split_once('-') {
        Some((year, month))
            if is_year(year) && (1..=2).contains(&month.len())
                && month.bytes().all(|b| b.is_ascii_digit()) =>
        {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
        }
        None if is_year(value) => NaiveDate::from_ymd_opt(value.parse().ok()?, 1, 1),
        _ => None,
    }
}
