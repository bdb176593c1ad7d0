use crate::schema::TableSchema;

/// Generate create-or-replace SQL for a table schema
pub fn generate_create_table(schema: &TableSchema, qualified_name: &str) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|col| {
            let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
            format!("    {} {}{}", col.quoted(), col.col_type.sql_type(), null_constraint)
        })
        .collect();

    format!(
        "DROP TABLE IF EXISTS {0};\nCREATE TABLE {0} (\n{1}\n);",
        qualified_name,
        columns.join(",\n")
    )
}

/// Generate the parameterized INSERT used by bulk loads
pub fn generate_insert(schema: &TableSchema, qualified_name: &str) -> String {
    let columns: Vec<String> = schema.columns.iter().map(|c| c.quoted()).collect();
    let placeholders: Vec<&str> = schema.columns.iter().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified_name,
        columns.join(", "),
        placeholders.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{HAPPINESS, SALES_DATA};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&HAPPINESS, "public.happiness");
        assert!(sql.starts_with("DROP TABLE IF EXISTS public.happiness;"));
        assert!(sql.contains("CREATE TABLE public.happiness"));
        assert!(sql.contains("\"Country name\" TEXT NOT NULL"));
        assert!(sql.contains("\"Ladder score\" REAL,"));
    }

    #[test]
    fn test_generate_insert() {
        let sql = generate_insert(&SALES_DATA, "sales.sales_data");
        assert_eq!(
            sql,
            "INSERT INTO sales.sales_data (\"product_name\", \"quantity\", \"price\", \"sale_date\") VALUES (?, ?, ?, ?)"
        );
    }
}
