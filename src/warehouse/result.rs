//! In-memory result sets

use chrono::NaiveDate;

use super::value::SqlValue;

/// Rows returned by a query, with column names folded to lower case
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

/// Borrowed view of one row, addressed by column name
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    cells: &'a [SqlValue],
}

impl<'a> RowRef<'a> {
    pub fn get(&self, column: &str) -> Option<&'a SqlValue> {
        let column = column.to_lowercase();
        self.columns
            .iter()
            .position(|c| *c == column)
            .and_then(|idx| self.cells.get(idx))
    }

    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(|v| v.as_str())
    }

    pub fn float(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(|v| v.as_f64())
    }

    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        self.get(column).and_then(|v| v.as_date())
    }

    pub fn cells(&self) -> &'a [SqlValue] {
        self.cells
    }
}

impl ResultTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        let columns = columns.into_iter().map(|c| c.to_lowercase()).collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        let column = column.to_lowercase();
        self.columns.iter().position(|c| *c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn row(&self, idx: usize) -> Option<RowRef<'_>> {
        self.rows.get(idx).map(|cells| RowRef {
            columns: &self.columns,
            cells,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(|cells| RowRef {
            columns: &self.columns,
            cells,
        })
    }

    /// Replace every value in `column` with its float value (or NULL).
    /// Absent columns are left alone.
    pub fn coerce_float(&mut self, column: &str) {
        self.map_column(column, |v| match v.as_f64() {
            Some(f) => SqlValue::Real(f),
            None => SqlValue::Null,
        });
    }

    /// Replace every value in `column` with its date value (or NULL)
    pub fn coerce_date(&mut self, column: &str) {
        self.map_column(column, |v| match v.as_date() {
            Some(d) => SqlValue::Date(d),
            None => SqlValue::Null,
        });
    }

    fn map_column(&mut self, column: &str, f: impl Fn(&SqlValue) -> SqlValue) {
        if let Some(idx) = self.column_index(column) {
            for row in &mut self.rows {
                if let Some(cell) = row.get_mut(idx) {
                    *cell = f(cell);
                }
            }
        }
    }

    /// Copy of the table keeping only rows matching the predicate
    pub fn filter(&self, pred: impl Fn(&RowRef<'_>) -> bool) -> ResultTable {
        let rows = self
            .rows
            .iter()
            .filter(|cells| {
                pred(&RowRef {
                    columns: &self.columns,
                    cells,
                })
            })
            .cloned()
            .collect();
        ResultTable {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Sorted distinct text values of a column
    pub fn distinct_text(&self, column: &str) -> Vec<String> {
        let mut values: Vec<String> = self
            .iter()
            .filter_map(|row| row.text(column).map(str::to_string))
            .collect();
        values.sort();
        values.dedup();
        values
    }

    /// Earliest and latest date in a column
    pub fn date_bounds(&self, column: &str) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.iter().filter_map(|row| row.date(column));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResultTable {
        ResultTable::new(
            vec!["PRODUCT_NAME".into(), "Total_Revenue".into(), "MONTH".into()],
            vec![
                vec![
                    SqlValue::Text("Laptop".into()),
                    SqlValue::Integer(1200),
                    SqlValue::Text("2025-01-01".into()),
                ],
                vec![
                    SqlValue::Text("Mouse".into()),
                    SqlValue::Text("35.5".into()),
                    SqlValue::Text("2025-03-01".into()),
                ],
                vec![
                    SqlValue::Text("Laptop".into()),
                    SqlValue::Null,
                    SqlValue::Text("2025-02-01".into()),
                ],
            ],
        )
    }

    #[test]
    fn test_columns_are_lowercased() {
        let t = table();
        assert_eq!(t.columns(), &["product_name", "total_revenue", "month"]);
        assert!(t.has_column("TOTAL_REVENUE"));
        assert_eq!(t.row(0).unwrap().text("Product_Name"), Some("Laptop"));
    }

    #[test]
    fn test_coerce_float_and_date() {
        let mut t = table();
        t.coerce_float("total_revenue");
        t.coerce_date("month");
        t.coerce_float("not_there");

        let row = t.row(1).unwrap();
        assert_eq!(row.get("total_revenue"), Some(&SqlValue::Real(35.5)));
        assert_eq!(
            row.get("month"),
            Some(&SqlValue::Date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()))
        );
        assert_eq!(t.row(2).unwrap().get("total_revenue"), Some(&SqlValue::Null));
    }

    #[test]
    fn test_filter_distinct_and_bounds() {
        let t = table();
        let laptops = t.filter(|r| r.text("product_name") == Some("Laptop"));
        assert_eq!(laptops.len(), 2);
        assert_eq!(t.distinct_text("product_name"), vec!["Laptop", "Mouse"]);

        let (lo, hi) = t.date_bounds("month").unwrap();
        assert_eq!(lo, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(hi, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert!(ResultTable::default().date_bounds("month").is_none());
    }
}
