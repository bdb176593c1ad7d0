//! Warehouse SQL dialect functions registered on every session
//!
//! SQLite has no `DATE_TRUNC`, `DAYNAME` or session context functions, so they
//! are provided as user-defined scalar functions. Dates travel as ISO text.

use chrono::{Datelike, Duration, NaiveDate};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use super::value::{parse_date, DATE_FORMAT};

/// Session context exposed through `CURRENT_*()` functions
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub database: String,
    pub schema: String,
    pub warehouse: String,
    pub user: String,
}

/// Truncation units accepted by `DATE_TRUNC`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateUnit {
    Year,
    Quarter,
    Month,
    Week,
    Day,
}

impl DateUnit {
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.trim().to_ascii_uppercase().as_str() {
            "YEAR" | "Y" | "YY" | "YYYY" => Some(DateUnit::Year),
            "QUARTER" | "Q" => Some(DateUnit::Quarter),
            "MONTH" | "MM" | "MON" => Some(DateUnit::Month),
            "WEEK" | "W" | "WK" => Some(DateUnit::Week),
            "DAY" | "D" | "DD" => Some(DateUnit::Day),
            _ => None,
        }
    }
}

/// Truncate a date to the start of its year, quarter, month or (Monday based) week
pub fn truncate_date(date: NaiveDate, unit: DateUnit) -> NaiveDate {
    let first_of = |month: u32| NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date);
    match unit {
        DateUnit::Year => first_of(1),
        DateUnit::Quarter => first_of((date.month0() / 3) * 3 + 1),
        DateUnit::Month => first_of(date.month()),
        DateUnit::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        DateUnit::Day => date,
    }
}

/// Three letter English weekday name (`Mon`, `Tue`, ...)
pub fn day_name(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

fn user_error(message: String) -> rusqlite::Error {
    rusqlite::Error::UserFunctionError(message.into())
}

fn register_constant(conn: &Connection, name: &str, value: String) -> rusqlite::Result<()> {
    conn.create_scalar_function(name, 0, FunctionFlags::SQLITE_UTF8, move |_ctx| {
        Ok(value.clone())
    })
}

/// Install the dialect functions on a connection
pub fn register(conn: &Connection, info: &SessionInfo) -> rusqlite::Result<()> {
    register_constant(conn, "CURRENT_DATABASE", info.database.clone())?;
    register_constant(conn, "CURRENT_SCHEMA", info.schema.clone())?;
    register_constant(conn, "CURRENT_WAREHOUSE", info.warehouse.clone())?;
    register_constant(conn, "CURRENT_USER", info.user.clone())?;

    let deterministic = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("DATE_TRUNC", 2, deterministic, |ctx| {
        let unit: String = ctx.get(0)?;
        let value: Option<String> = ctx.get(1)?;

        let unit = DateUnit::parse(&unit)
            .ok_or_else(|| user_error(format!("Unsupported DATE_TRUNC unit '{}'", unit)))?;

        match value {
            None => Ok(None),
            Some(text) => {
                let date = parse_date(&text)
                    .ok_or_else(|| user_error(format!("Date '{}' is not recognized", text)))?;
                Ok(Some(truncate_date(date, unit).format(DATE_FORMAT).to_string()))
            }
        }
    })?;

    conn.create_scalar_function("DAYNAME", 1, deterministic, |ctx| {
        let value: Option<String> = ctx.get(0)?;
        match value {
            None => Ok(None),
            Some(text) => {
                let date = parse_date(&text)
                    .ok_or_else(|| user_error(format!("Date '{}' is not recognized", text)))?;
                Ok(Some(day_name(date)))
            }
        }
    })?;

    Ok(())
}
