//! Plain-text rendering of every dashboard view

use std::io::{self, Write};

use crate::dashboard::{DashboardData, Forecast, View};
use crate::filter::Filters;
use crate::ui::format_money;
use crate::warehouse::ResultTable;

/// Sections in dashboard order
const SECTIONS: &[(&str, Option<View>)] = &[
    ("Revenue by Product", Some(View::RevenueByProduct)),
    ("Sales Trends Over Time", Some(View::SalesOverTime)),
    ("Quantity Sold by Product", Some(View::QuantityByProduct)),
    ("Sales by Day of the Week", Some(View::SalesByDay)),
    ("Slow-Moving Inventory (Bottom 5)", Some(View::SlowMoving)),
    ("Predicted Sales for Next Month", None),
    ("Price vs. Quantity Analysis", Some(View::PriceVsQuantity)),
    ("Product Performance by Month", Some(View::ProductByMonth)),
    ("Sample Data", Some(View::SampleData)),
];

/// Write each view, filtered, as an aligned text table
pub fn write_report(out: &mut impl Write, data: &DashboardData, filters: &Filters) -> io::Result<()> {
    writeln!(out, "Product: {}", filters.product)?;
    if let Some(range) = &filters.date_range {
        writeln!(out, "Months:  {}", range)?;
    }

    for (title, view) in SECTIONS {
        writeln!(out)?;
        writeln!(out, "## {}", title)?;
        match view {
            Some(view) => write_table(out, &data.filtered(*view, filters))?,
            None => write_forecasts(out, &filters.apply_forecasts(data.forecasts()))?,
        }
    }
    Ok(())
}

fn write_grid(out: &mut impl Write, header: &[String], rows: &[Vec<String>]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "(no rows)");
    }

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(header))?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("-+-"))?;
    for row in rows {
        writeln!(out, "{}", line(row))?;
    }
    Ok(())
}

/// Write any result table
pub fn write_table(out: &mut impl Write, table: &ResultTable) -> io::Result<()> {
    let rows: Vec<Vec<String>> = table
        .iter()
        .map(|row| row.cells().iter().map(|v| v.to_string()).collect())
        .collect();
    write_grid(out, table.columns(), &rows)
}

fn write_forecasts(out: &mut impl Write, forecasts: &[Forecast]) -> io::Result<()> {
    let header = vec!["product_name".to_string(), "predicted_revenue".to_string()];
    let rows: Vec<Vec<String>> = forecasts
        .iter()
        .map(|f| vec![f.product_name.clone(), format_money(f.predicted_revenue)])
        .collect();
    write_grid(out, &header, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::SqlValue;

    #[test]
    fn test_write_table_aligns_columns() {
        let table = ResultTable::new(
            vec!["PRODUCT_NAME".into(), "TOTAL_QUANTITY".into()],
            vec![
                vec![SqlValue::Text("Laptop".into()), SqlValue::Real(3.0)],
                vec![SqlValue::Text("USB Cable".into()), SqlValue::Real(12.0)],
            ],
        );
        let mut out = Vec::new();
        write_table(&mut out, &table).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "product_name | total_quantity");
        assert_eq!(lines[1], "-------------+---------------");
        assert_eq!(lines[2], "Laptop       | 3.00");
        assert_eq!(lines[3], "USB Cable    | 12.00");
    }

    #[test]
    fn test_empty_table() {
        let mut out = Vec::new();
        write_table(&mut out, &ResultTable::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "(no rows)\n");
    }
}
