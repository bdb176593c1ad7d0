use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use std::fmt;

/// ISO date layout used for every date the warehouse stores or returns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A dynamically typed cell, either bound into a statement or read back
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Date(NaiveDate),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Real(f) => stmt.raw_bind_parameter(idx, f)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
            SqlValue::Date(d) => {
                stmt.raw_bind_parameter(idx, d.format(DATE_FORMAT).to_string())?
            }
        }
        Ok(())
    }

    /// Numeric view of the value; numeric text is parsed
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Integer(i) => Some(*i as f64),
            SqlValue::Real(f) => Some(*f),
            SqlValue::Text(s) => s.trim().parse().ok(),
            SqlValue::Null | SqlValue::Date(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Date view of the value; ISO text (optionally with a time part) is parsed
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(d) => Some(*d),
            SqlValue::Text(s) => parse_date(s),
            _ => None,
        }
    }
}

/// Parse `YYYY-MM-DD`, ignoring any trailing time component
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) | ValueRef::Blob(t) => {
                SqlValue::Text(String::from_utf8_lossy(t).into_owned())
            }
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Real(v) => write!(f, "{:.2}", v),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_ignores_time() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(parse_date("2025-03-01"), Some(expected));
        assert_eq!(parse_date("2025-03-01 00:00:00"), Some(expected));
        assert_eq!(parse_date("03/01/2025"), None);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(SqlValue::Integer(4).as_f64(), Some(4.0));
        assert_eq!(SqlValue::Text(" 2.5 ".into()).as_f64(), Some(2.5));
        assert_eq!(SqlValue::Text("n/a".into()).as_f64(), None);
        assert_eq!(SqlValue::Null.as_f64(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(SqlValue::Real(1234.5).to_string(), "1234.50");
        assert_eq!(SqlValue::Null.to_string(), "NULL");
        let d = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(SqlValue::Date(d).to_string(), "2025-01-06");
    }
}
