use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::fmt;

use crate::dashboard::{DashboardData, Forecast, View};
use crate::warehouse::ResultTable;

/// Product selector value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProductFilter {
    #[default]
    All,
    Product(String),
}

impl ProductFilter {
    pub fn matches(&self, product: &str) -> bool {
        match self {
            ProductFilter::All => true,
            ProductFilter::Product(p) => p == product,
        }
    }
}

impl fmt::Display for ProductFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductFilter::All => write!(f, "All"),
            ProductFilter::Product(p) => write!(f, "{}", p),
        }
    }
}

/// Inclusive date bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("Date range start {} is after end {}", start, end);
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Client-side filters applied after fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub product: ProductFilter,
    /// None keeps every month
    pub date_range: Option<DateRange>,
}

impl Filters {
    /// Apply whichever filters the view is keyed on
    pub fn apply(&self, view: View, table: &ResultTable) -> ResultTable {
        let mut out = if view.is_product_keyed() {
            filter_product(table, &self.product)
        } else {
            table.clone()
        };
        if view.is_time_indexed() {
            if let Some(range) = &self.date_range {
                out = filter_date_range(&out, "month", range);
            }
        }
        out
    }

    pub fn apply_forecasts(&self, forecasts: &[Forecast]) -> Vec<Forecast> {
        forecasts
            .iter()
            .filter(|f| self.product.matches(&f.product_name))
            .cloned()
            .collect()
    }
}

/// Keep rows for the selected product; `All` (or a table without a
/// `product_name` column) is returned unchanged
pub fn filter_product(table: &ResultTable, product: &ProductFilter) -> ResultTable {
    match product {
        ProductFilter::All => table.clone(),
        ProductFilter::Product(_) if !table.has_column("product_name") => table.clone(),
        ProductFilter::Product(p) => table.filter(|row| row.text("product_name") == Some(p.as_str())),
    }
}

/// Keep rows whose date column falls inside the inclusive range
pub fn filter_date_range(table: &ResultTable, column: &str, range: &DateRange) -> ResultTable {
    table.filter(|row| row.date(column).map_or(false, |d| range.contains(d)))
}

/// Build filters from command-line choices, validating them against the data
pub fn resolve_filters(
    product: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    data: &DashboardData,
) -> Result<Filters> {
    let product = match product {
        None => ProductFilter::All,
        Some(p) if p.eq_ignore_ascii_case("all") => ProductFilter::All,
        Some(p) => {
            let products = data.products();
            if !products.contains(&p) {
                bail!("Unknown product '{}'. Available: {}", p, products.join(", "));
            }
            ProductFilter::Product(p)
        }
    };

    // A missing bound comes from the data, or from the other bound when
    // there are no months at all
    let bounds = data.month_bounds();
    let date_range = match (from, to, bounds) {
        (Some(start), Some(end), _) => Some(DateRange::new(start, end)?),
        (Some(start), None, Some((_, hi))) => Some(DateRange::new(start, hi.max(start))?),
        (Some(start), None, None) => Some(DateRange::new(start, start)?),
        (None, Some(end), Some((lo, _))) => Some(DateRange::new(lo.min(end), end)?),
        (None, Some(end), None) => Some(DateRange::new(end, end)?),
        (None, None, Some((lo, hi))) => Some(DateRange::new(lo, hi)?),
        (None, None, None) => None,
    };

    Ok(Filters {
        product,
        date_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::SqlValue;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn by_month() -> ResultTable {
        let rows = [
            ("2025-01-01", "Laptop", 100.0),
            ("2025-02-01", "Laptop", 200.0),
            ("2025-02-01", "Mouse", 20.0),
            ("2025-03-01", "Mouse", 30.0),
            ("2025-04-01", "Laptop", 250.0),
        ];
        let mut t = ResultTable::new(
            vec!["month".into(), "product_name".into(), "total_revenue".into()],
            rows.iter()
                .map(|(m, p, r)| {
                    vec![
                        SqlValue::Text(m.to_string()),
                        SqlValue::Text(p.to_string()),
                        SqlValue::Real(*r),
                    ]
                })
                .collect(),
        );
        t.coerce_date("month");
        t
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let range = DateRange::new(date(2025, 2, 1), date(2025, 3, 1)).unwrap();
        let filtered = filter_date_range(&by_month(), "month", &range);
        assert_eq!(filtered.len(), 3);
        assert!(filtered
            .iter()
            .all(|r| range.contains(r.date("month").unwrap())));
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        assert!(DateRange::new(date(2025, 3, 1), date(2025, 1, 1)).is_err());
    }

    #[test]
    fn test_product_filter() {
        let t = by_month();
        let laptop = filter_product(&t, &ProductFilter::Product("Laptop".into()));
        assert_eq!(laptop.len(), 3);
        assert!(laptop.iter().all(|r| r.text("product_name") == Some("Laptop")));
        assert_eq!(filter_product(&t, &ProductFilter::All), t);
    }

    #[test]
    fn test_apply_respects_view_keys() {
        let filters = Filters {
            product: ProductFilter::Product("Mouse".into()),
            date_range: Some(DateRange::new(date(2025, 3, 1), date(2025, 12, 1)).unwrap()),
        };
        let t = by_month();

        // Product and time keyed
        assert_eq!(filters.apply(View::ProductByMonth, &t).len(), 1);
        // Product keyed only
        assert_eq!(filters.apply(View::HistoricalSales, &t).len(), 2);
        // Neither
        assert_eq!(filters.apply(View::SampleData, &t).len(), 5);
    }

    #[test]
    fn test_explicit_bounds_kept_without_months() {
        let empty = DashboardData::from_tables(std::collections::HashMap::new());
        assert_eq!(empty.month_bounds(), None);

        let filters = resolve_filters(None, Some(date(2025, 2, 1)), None, &empty).unwrap();
        assert_eq!(
            filters.date_range,
            Some(DateRange::new(date(2025, 2, 1), date(2025, 2, 1)).unwrap())
        );

        let filters =
            resolve_filters(None, Some(date(2025, 1, 1)), Some(date(2025, 3, 1)), &empty).unwrap();
        assert_eq!(filters.date_range.map(|r| r.end), Some(date(2025, 3, 1)));

        assert_eq!(resolve_filters(None, None, None, &empty).unwrap().date_range, None);
    }

    #[test]
    fn test_apply_forecasts() {
        let forecasts = vec![
            Forecast {
                product_name: "Laptop".into(),
                predicted_revenue: 1.0,
            },
            Forecast {
                product_name: "Mouse".into(),
                predicted_revenue: 2.0,
            },
        ];
        let filters = Filters {
            product: ProductFilter::Product("Mouse".into()),
            date_range: None,
        };
        assert_eq!(filters.apply_forecasts(&forecasts).len(), 1);
        assert_eq!(Filters::default().apply_forecasts(&forecasts).len(), 2);
    }
}
