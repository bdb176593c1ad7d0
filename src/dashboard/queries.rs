//! The fixed aggregations behind every dashboard panel

/// One named aggregation over `sales_data`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    RevenueByProduct,
    SalesOverTime,
    QuantityByProduct,
    SalesByDay,
    SlowMoving,
    HistoricalSales,
    PriceVsQuantity,
    ProductByMonth,
    SampleData,
}

impl View {
    pub const ALL: [View; 9] = [
        View::RevenueByProduct,
        View::SalesOverTime,
        View::QuantityByProduct,
        View::SalesByDay,
        View::SlowMoving,
        View::HistoricalSales,
        View::PriceVsQuantity,
        View::ProductByMonth,
        View::SampleData,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            View::RevenueByProduct => "revenue_by_product",
            View::SalesOverTime => "sales_over_time",
            View::QuantityByProduct => "quantity_by_product",
            View::SalesByDay => "sales_by_day",
            View::SlowMoving => "slow_moving",
            View::HistoricalSales => "historical_sales",
            View::PriceVsQuantity => "price_vs_quantity",
            View::ProductByMonth => "product_by_month",
            View::SampleData => "sample_data",
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            View::RevenueByProduct => {
                "SELECT product_name, SUM(quantity * price) AS total_revenue
                 FROM sales_data
                 GROUP BY product_name"
            }
            View::SalesOverTime => {
                "SELECT DATE_TRUNC('MONTH', sale_date) AS month, SUM(quantity * price) AS total_revenue
                 FROM sales_data
                 GROUP BY month
                 ORDER BY month"
            }
            View::QuantityByProduct => {
                "SELECT product_name, SUM(quantity) AS total_quantity
                 FROM sales_data
                 GROUP BY product_name
                 ORDER BY total_quantity DESC"
            }
            View::SalesByDay => {
                "SELECT DAYNAME(sale_date) AS day_of_week, SUM(quantity * price) AS total_revenue
                 FROM sales_data
                 GROUP BY day_of_week
                 ORDER BY total_revenue DESC"
            }
            View::SlowMoving => {
                "SELECT product_name, SUM(quantity) AS total_quantity
                 FROM sales_data
                 GROUP BY product_name
                 ORDER BY total_quantity ASC
                 LIMIT 5"
            }
            View::HistoricalSales | View::ProductByMonth => {
                "SELECT DATE_TRUNC('MONTH', sale_date) AS month, product_name, SUM(quantity * price) AS total_revenue
                 FROM sales_data
                 GROUP BY month, product_name
                 ORDER BY month, product_name"
            }
            View::PriceVsQuantity => {
                "SELECT product_name, AVG(price) AS avg_price, SUM(quantity) AS total_quantity
                 FROM sales_data
                 GROUP BY product_name"
            }
            View::SampleData => "SELECT * FROM sales_data LIMIT 5",
        }
    }

    /// Views whose rows are keyed by product and follow the product selector
    pub fn is_product_keyed(&self) -> bool {
        matches!(
            self,
            View::RevenueByProduct
                | View::QuantityByProduct
                | View::SlowMoving
                | View::HistoricalSales
                | View::PriceVsQuantity
                | View::ProductByMonth
        )
    }

    /// Views indexed by month that follow the date range
    pub fn is_time_indexed(&self) -> bool {
        matches!(self, View::SalesOverTime | View::ProductByMonth)
    }
}

/// Columns coerced to float after every fetch
pub const NUMERIC_COLUMNS: &[&str] = &["total_revenue", "avg_price", "total_quantity"];

/// Columns coerced to dates after every fetch
pub const DATE_COLUMNS: &[&str] = &["month"];
