//! Create-or-replace a table, bulk load it from a stage and summarize it

pub mod copy;
pub mod schema_gen;

pub use copy::*;
pub use schema_gen::*;

use anyhow::{Context, Result};

use crate::schema::{TableSchema, HAPPINESS, SALES_DATA};
use crate::stage::StageStore;
use crate::ui::{Phase, Ui};
use crate::warehouse::Warehouse;

/// What a table load produced
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub copy: CopyResult,
    /// Rows in the table after the load
    pub row_count: i64,
}

impl LoadReport {
    /// Zero rows is a soft failure: nothing downstream should run
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

/// Create `table` (replacing any previous one) in the session's schema
pub fn create_table(warehouse: &Warehouse, table: &TableSchema) -> Result<()> {
    let sql = generate_create_table(table, &warehouse.qualify(table.name));
    warehouse
        .execute(&sql)
        .with_context(|| format!("Failed to create table: {}", table.name))?;
    Ok(())
}

/// Create the target table, copy the staged file into it and count the rows
pub fn load_table(
    warehouse: &mut Warehouse,
    stages: &StageStore,
    copy: &CopyInto,
    ui: &mut impl Ui,
) -> Result<LoadReport> {
    ui.set_phase(Phase::Creating);
    create_table(warehouse, copy.table)?;
    ui.log("Table created.");

    ui.set_phase(Phase::Loading);
    ui.log(copy.to_sql());
    let result = copy_into(warehouse, stages, copy, ui)
        .with_context(|| format!("Failed to load table: {}", copy.table.name))?;
    ui.log("Data loaded into table.");

    let row_count: i64 = warehouse
        .query_scalar(&format!("SELECT COUNT(*) FROM {}", warehouse.qualify(copy.table.name)))?;

    Ok(LoadReport {
        copy: result,
        row_count,
    })
}

/// Happiness headline numbers
#[derive(Debug, Clone, PartialEq)]
pub struct HappinessSummary {
    /// Top five countries by ladder score
    pub top: Vec<(String, f64)>,
    pub average_gdp: Option<f64>,
}

pub fn summarize_happiness(warehouse: &Warehouse) -> Result<HappinessSummary> {
    let table = warehouse.qualify(HAPPINESS.name);

    let top = warehouse.query(&format!(
        "SELECT \"Country name\", \"Ladder score\"\n\
         FROM {}\n\
         ORDER BY \"Ladder score\" DESC\n\
         LIMIT 5",
        table
    ))?;
    let top = top
        .iter()
        .filter_map(|row| {
            let name = row.text("country name")?.to_string();
            Some((name, row.float("ladder score")?))
        })
        .collect();

    let average_gdp: Option<f64> = warehouse.query_scalar(&format!(
        "SELECT AVG(\"Logged GDP per capita\") FROM {}",
        table
    ))?;

    Ok(HappinessSummary { top, average_gdp })
}

/// Sales table headline numbers
#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    pub products: i64,
    pub first_sale: Option<String>,
    pub last_sale: Option<String>,
}

pub fn summarize_sales(warehouse: &Warehouse) -> Result<SalesSummary> {
    let summary = warehouse.query(&format!(
        "SELECT COUNT(DISTINCT product_name) AS products, MIN(sale_date) AS first_sale, MAX(sale_date) AS last_sale FROM {}",
        warehouse.qualify(SALES_DATA.name)
    ))?;

    let row = summary.row(0);
    Ok(SalesSummary {
        products: row
            .and_then(|r| r.float("products"))
            .map(|p| p as i64)
            .unwrap_or(0),
        first_sale: row.and_then(|r| r.text("first_sale")).map(str::to_string),
        last_sale: row.and_then(|r| r.text("last_sale")).map(str::to_string),
    })
}
