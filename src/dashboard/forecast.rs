//! Naive next-month revenue forecast per product

use crate::warehouse::ResultTable;

/// Predicted revenue for the month after a product's history
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub product_name: String,
    pub predicted_revenue: f64,
}

/// Ordinary least squares line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Fit a line through the points. Needs at least two distinct x values.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return None;
        }

        let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
        let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (x, y) in xs[..n].iter().zip(&ys[..n]) {
            sxy += (x - mean_x) * (y - mean_y);
            sxx += (x - mean_x) * (x - mean_x);
        }

        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// For every product with at least two rows of (month, product_name,
/// total_revenue) history, regress revenue on the zero-based row index and
/// predict the next index. Products come out in order of first appearance.
pub fn predict_next_month(history: &ResultTable) -> Vec<Forecast> {
    let mut series: Vec<(String, Vec<f64>)> = Vec::new();

    for row in history.iter() {
        let (Some(product), Some(revenue)) = (row.text("product_name"), row.float("total_revenue"))
        else {
            continue;
        };
        match series.iter_mut().find(|(name, _)| name == product) {
            Some((_, values)) => values.push(revenue),
            None => series.push((product.to_string(), vec![revenue])),
        }
    }

    series
        .into_iter()
        .filter_map(|(product_name, revenues)| {
            let xs: Vec<f64> = (0..revenues.len()).map(|i| i as f64).collect();
            let fit = LinearFit::fit(&xs, &revenues)?;
            Some(Forecast {
                product_name,
                predicted_revenue: fit.predict(revenues.len() as f64),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::SqlValue;

    fn history(rows: &[(&str, &str, f64)]) -> ResultTable {
        ResultTable::new(
            vec!["MONTH".into(), "PRODUCT_NAME".into(), "TOTAL_REVENUE".into()],
            rows.iter()
                .map(|(m, p, r)| {
                    vec![
                        SqlValue::Text(m.to_string()),
                        SqlValue::Text(p.to_string()),
                        SqlValue::Real(*r),
                    ]
                })
                .collect(),
        )
    }

    #[test]
    fn test_two_points_extrapolate() {
        let h = history(&[("2025-01-01", "Laptop", 100.0), ("2025-02-01", "Laptop", 200.0)]);
        let forecasts = predict_next_month(&h);
        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].product_name, "Laptop");
        assert!((forecasts[0].predicted_revenue - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_month_is_skipped() {
        let h = history(&[
            ("2025-01-01", "Laptop", 100.0),
            ("2025-01-01", "Mouse", 20.0),
            ("2025-02-01", "Laptop", 150.0),
        ]);
        let forecasts = predict_next_month(&h);
        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].product_name, "Laptop");
    }

    #[test]
    fn test_least_squares_fit() {
        // y = 2x + 1 with symmetric noise
        let fit = LinearFit::fit(&[0.0, 1.0, 2.0, 3.0], &[1.5, 2.5, 5.5, 6.5]).unwrap();
        assert!((fit.slope - 1.8).abs() < 1e-9);
        assert!((fit.intercept - 1.3).abs() < 1e-9);
        assert!((fit.predict(4.0) - 8.5).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_fit() {
        assert!(LinearFit::fit(&[1.0], &[2.0]).is_none());
        assert!(LinearFit::fit(&[1.0, 1.0], &[2.0, 3.0]).is_none());
    }

    #[test]
    fn test_first_appearance_order() {
        let h = history(&[
            ("2025-01-01", "Mouse", 10.0),
            ("2025-01-01", "Desk", 50.0),
            ("2025-02-01", "Desk", 40.0),
            ("2025-02-01", "Mouse", 12.0),
        ]);
        let names: Vec<_> = predict_next_month(&h)
            .into_iter()
            .map(|f| f.product_name)
            .collect();
        assert_eq!(names, vec!["Mouse", "Desk"]);
    }
}
