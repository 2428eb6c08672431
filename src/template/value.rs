use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Semantic primitive type of a template field. Drives how a raw cell is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "date/time",
        };
        f.write_str(name)
    }
}

/// A coerced cell value, ready to be assigned to a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Date(_) => ValueKind::Date,
            Self::DateTime(_) => ValueKind::DateTime,
        }
    }

    /// Parse raw cell text as `kind`. Text is passed through untouched, every
    /// other kind ignores surrounding whitespace. `None` means the text is not
    /// a valid value of that kind.
    pub fn parse(kind: ValueKind, raw: &str) -> Option<Value> {
        let s = raw.trim();
        match kind {
            ValueKind::Text => Some(Value::Text(raw.to_string())),
            ValueKind::Integer => s.parse().ok().map(Value::Integer),
            ValueKind::Float => s.parse().ok().map(Value::Float),
            ValueKind::Boolean => parse_bool(s).map(Value::Boolean),
            ValueKind::Date => parse_date(s).map(Value::Date),
            ValueKind::DateTime => parse_datetime(s).map(Value::DateTime),
        }
    }
}

// ---------------------------------------------------------------------------
// Text parse rules
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
    {
        return Some(date);
    }
    // Spreadsheet exports often render dates with a midnight time attached.
    parse_datetime(s)
        .filter(|dt| dt.time() == NaiveTime::MIN)
        .map(|dt| dt.date())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}
