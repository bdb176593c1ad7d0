//! Tables the loader knows how to create and fill

use super::types::*;

/// World happiness report, one row per country
pub static HAPPINESS: TableSchema = TableSchema {
    name: "happiness",
    columns: &[
        Column::required("Country name", ColumnType::Text),
        Column::new("Ladder score", ColumnType::Float),
        Column::new("Logged GDP per capita", ColumnType::Float),
    ],
    source: StagedSource {
        location: "@DEMO_DB.PUBLIC.HAPPINESS_STAGE/world_happiness_2021.csv",
        source_columns: &[1, 3, 7],
    },
};

/// Individual sales, the source of every dashboard aggregate
pub static SALES_DATA: TableSchema = TableSchema {
    name: "sales_data",
    columns: &[
        Column::required("product_name", ColumnType::Text),
        Column::required("quantity", ColumnType::Integer),
        Column::required("price", ColumnType::Float),
        Column::required("sale_date", ColumnType::Date),
    ],
    source: StagedSource {
        location: "@RETAIL_DB.SALES.SALES_STAGE/sales_data.csv",
        source_columns: &[1, 2, 3, 4],
    },
};

pub static ALL_TABLES: &[&TableSchema] = &[&HAPPINESS, &SALES_DATA];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_mapping_covers_every_column() {
        for table in ALL_TABLES {
            assert_eq!(table.columns.len(), table.source.source_columns.len(), "{}", table.name);
            assert!(table.source.source_columns.iter().all(|&c| c >= 1));
        }
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        assert!(SALES_DATA.column("SALE_DATE").is_some());
        assert!(SALES_DATA.column("orders").is_none());
        assert_eq!(HAPPINESS.column("ladder score").unwrap().quoted(), "\"Ladder score\"");
    }
}
