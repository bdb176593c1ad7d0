use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::StringRecord;

use crate::schema::{Column, ColumnType, TableSchema};
use crate::warehouse::value::{parse_date, SqlValue};

/// A parsed row ready for insertion, one value per target column
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub values: Vec<SqlValue>,
}

/// Date layouts accepted besides ISO
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%m/%d/%Y"];

/// Pick the mapped source fields out of a CSV record and coerce them to the
/// table's column types. `source_columns` are 1-based and parallel to
/// `schema.columns`.
pub fn parse_record(
    record: &StringRecord,
    schema: &TableSchema,
    source_columns: &[usize],
) -> Result<ParsedRow> {
    let mut values = Vec::with_capacity(schema.columns.len());

    for (col, &source) in schema.columns.iter().zip(source_columns) {
        let field = source.checked_sub(1).and_then(|idx| record.get(idx));
        let Some(field) = field else {
            bail!(
                "Number of columns in file ({}) does not match that of the corresponding table, column ${} is missing",
                record.len(),
                source
            );
        };

        let value = extract_value(field, col)
            .with_context(|| format!("Column \"{}\" (${})", col.name, source))?;
        values.push(value);
    }

    Ok(ParsedRow { values })
}

fn extract_value(field: &str, col: &Column) -> Result<SqlValue> {
    let trimmed = field.trim();

    if trimmed.is_empty() {
        if col.nullable {
            return Ok(SqlValue::Null);
        }
        bail!("NULL result in a non-nullable column");
    }

    let value = match col.col_type {
        ColumnType::Text => SqlValue::Text(field.to_string()),
        ColumnType::Integer => SqlValue::Integer(parse_integer(trimmed)?),
        ColumnType::Float => {
            let f: f64 = trimmed
                .parse()
                .ok()
                .filter(|f: &f64| f.is_finite())
                .with_context(|| format!("Numeric value '{}' is not recognized", field))?;
            SqlValue::Real(f)
        }
        ColumnType::Date => SqlValue::Date(
            parse_any_date(trimmed)
                .with_context(|| format!("Date '{}' is not recognized", field))?,
        ),
    };

    Ok(value)
}

/// Integers may be written with a zero fraction (`3.0`)
fn parse_integer(text: &str) -> Result<i64> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(i);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => bail!("Numeric value '{}' is not recognized as an integer", text),
    }
}

fn parse_any_date(text: &str) -> Option<NaiveDate> {
    parse_date(text).or_else(|| {
        FALLBACK_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{HAPPINESS, SALES_DATA};

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_parse_happiness_mapping() {
        let rec = record(&["Finland", "Western Europe", "7.842", "0.032", "7.904", "7.780", "10.775"]);
        let row = parse_record(&rec, &HAPPINESS, &[1, 3, 7]).unwrap();
        assert_eq!(
            row.values,
            vec![
                SqlValue::Text("Finland".into()),
                SqlValue::Real(7.842),
                SqlValue::Real(10.775),
            ]
        );
    }

    #[test]
    fn test_parse_sales_row() {
        let rec = record(&["Laptop", "3.0", "999.99", "01/15/2025"]);
        let row = parse_record(&rec, &SALES_DATA, &[1, 2, 3, 4]).unwrap();
        assert_eq!(row.values[1], SqlValue::Integer(3));
        assert_eq!(
            row.values[3],
            SqlValue::Date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
        );
    }

    #[test]
    fn test_nullable_empty_field_is_null() {
        let rec = record(&["Chad", "", "", "", "", "", ""]);
        let row = parse_record(&rec, &HAPPINESS, &[1, 3, 7]).unwrap();
        assert_eq!(row.values[1], SqlValue::Null);
    }

    #[test]
    fn test_malformed_rows_are_errors() {
        // Missing source column
        assert!(parse_record(&record(&["Finland", "x"]), &HAPPINESS, &[1, 3, 7]).is_err());
        // Bad number
        let rec = record(&["Laptop", "two", "999.99", "2025-01-15"]);
        assert!(parse_record(&rec, &SALES_DATA, &[1, 2, 3, 4]).is_err());
        // Required column empty
        let rec = record(&["", "2", "999.99", "2025-01-15"]);
        assert!(parse_record(&rec, &SALES_DATA, &[1, 2, 3, 4]).is_err());
        // Bad date
        let rec = record(&["Laptop", "2", "999.99", "someday"]);
        let err = parse_record(&rec, &SALES_DATA, &[1, 2, 3, 4]).unwrap_err();
        assert!(format!("{:#}", err).contains("Date 'someday' is not recognized"));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("42").unwrap(), 42);
        assert_eq!(parse_integer("42.0").unwrap(), 42);
        assert!(parse_integer("42.5").is_err());
    }
}
