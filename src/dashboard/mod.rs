//! Fetching and shaping the dashboard's aggregations
//!
//! Every view is fetched through the [`QueryCache`], its column names come
//! back lower-cased, and numeric and month columns are coerced once before
//! the result is cached.

pub mod cache;
pub mod forecast;
pub mod queries;

pub use cache::{QueryCache, DEFAULT_TTL};
pub use forecast::{predict_next_month, Forecast, LinearFit};
pub use queries::View;

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::filter::Filters;
use crate::ui::Ui;
use crate::warehouse::{ResultTable, Warehouse};

/// Result of one fetch, for the activity log
#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub view: View,
    pub rows: usize,
    pub cached: bool,
}

impl std::fmt::Display for FetchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} rows{}",
            self.view.key(),
            self.rows,
            if self.cached { " (cached)" } else { "" }
        )
    }
}

/// Every view, as fetched and coerced
#[derive(Debug, Clone)]
pub struct DashboardData {
    tables: HashMap<View, Arc<ResultTable>>,
    forecasts: Vec<Forecast>,
}

/// Canonicalize column types after a fetch
pub fn coerce(table: &mut ResultTable) {
    for column in queries::NUMERIC_COLUMNS {
        table.coerce_float(column);
    }
    for column in queries::DATE_COLUMNS {
        table.coerce_date(column);
    }
}

/// Run one view through the cache
pub fn fetch_view(
    warehouse: &Warehouse,
    cache: &QueryCache,
    view: View,
) -> Result<(Arc<ResultTable>, FetchEvent)> {
    let sql = view.sql();
    let (table, cached) = cache.get_or_fetch(sql, || -> Result<ResultTable> {
        let mut table = warehouse.query(sql)?;
        coerce(&mut table);
        Ok(table)
    })?;

    let event = FetchEvent {
        view,
        rows: table.len(),
        cached,
    };
    Ok((table, event))
}

impl DashboardData {
    /// Fetch every view. The first failure stops the fetch.
    pub fn fetch(warehouse: &Warehouse, cache: &QueryCache, ui: &mut impl Ui) -> Result<Self> {
        let mut tables = HashMap::new();
        for view in View::ALL {
            let (table, event) = fetch_view(warehouse, cache, view)?;
            ui.log(event.to_string());
            tables.insert(view, table);
        }
        Ok(Self::from_tables(tables))
    }

    /// Build from already fetched tables; missing views are empty
    pub fn from_tables(tables: HashMap<View, Arc<ResultTable>>) -> Self {
        let forecasts = tables
            .get(&View::HistoricalSales)
            .map(|h| predict_next_month(h))
            .unwrap_or_default();
        Self { tables, forecasts }
    }

    pub fn get(&self, view: View) -> Arc<ResultTable> {
        self.tables.get(&view).cloned().unwrap_or_default()
    }

    /// Forecasts over the full, unfiltered history
    pub fn forecasts(&self) -> &[Forecast] {
        &self.forecasts
    }

    /// Sorted distinct products, the choices of the product selector
    pub fn products(&self) -> Vec<String> {
        self.get(View::RevenueByProduct).distinct_text("product_name")
    }

    /// Earliest and latest month with sales
    pub fn month_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.get(View::SalesOverTime).date_bounds("month")
    }

    /// A view with the filters applied
    pub fn filtered(&self, view: View, filters: &Filters) -> ResultTable {
        filters.apply(view, &self.get(view))
    }
}
