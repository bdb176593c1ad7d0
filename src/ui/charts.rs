//! Chart panels drawn from result tables

use ratatui::layout::{Constraint, Direction, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Line;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph,
    Row, Table,
};
use ratatui::Frame;

use crate::dashboard::Forecast;
use crate::warehouse::ResultTable;

const PALETTE: &[Color] = &[
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
    Color::LightGreen,
    Color::LightMagenta,
];

/// Format as whole dollars with thousands separators (`$12,345`)
pub fn format_money(value: f64) -> String {
    let rounded = value.abs().round() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0.0 && rounded > 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Stable color for a product, by its position among all products
pub fn product_color(products: &[String], product: &str) -> Color {
    let idx = products.iter().position(|p| p == product).unwrap_or(0);
    PALETTE[idx % PALETTE.len()]
}

fn block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .border_style(Style::default().fg(Color::Blue))
}

fn empty(frame: &mut Frame, area: Rect, title: &str) {
    let paragraph = Paragraph::new(" No rows match the current filters")
        .style(Style::default().fg(Color::DarkGray))
        .block(block(title));
    frame.render_widget(paragraph, area);
}

/// Horizontal bars of `value_col` per `label_col`, largest first
pub fn horizontal_bars(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    table: &ResultTable,
    label_col: &str,
    value_col: &str,
    money: bool,
) {
    let mut points: Vec<(String, f64)> = table
        .iter()
        .filter_map(|row| Some((row.text(label_col)?.to_string(), row.float(value_col)?)))
        .collect();
    if points.is_empty() {
        return empty(frame, area, title);
    }
    points.sort_by(|a, b| b.1.total_cmp(&a.1));

    let bars: Vec<Bar> = points
        .into_iter()
        .map(|(label, value)| {
            let text = if money {
                format_money(value)
            } else {
                format!("{:.0}", value)
            };
            Bar::default()
                .value(value.max(0.0).round() as u64)
                .label(Line::from(label))
                .text_value(text)
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();

    let chart = BarChart::default()
        .block(block(title))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

/// Revenue per month as a line
pub fn revenue_line(frame: &mut Frame, area: Rect, title: &str, table: &ResultTable) {
    let months: Vec<(String, f64)> = table
        .iter()
        .filter_map(|row| Some((row.date("month")?.format("%Y-%m").to_string(), row.float("total_revenue")?)))
        .collect();
    if months.is_empty() {
        return empty(frame, area, title);
    }

    let points: Vec<(f64, f64)> = months
        .iter()
        .enumerate()
        .map(|(i, (_, v))| (i as f64, *v))
        .collect();
    let max_y = months.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let last = (months.len() - 1).max(1) as f64;

    let dataset = Dataset::default()
        .name("Total Revenue ($)")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    let first_label = months[0].0.clone();
    let last_label = months[months.len() - 1].0.clone();

    let chart = Chart::new(vec![dataset])
        .block(block(title))
        .x_axis(
            Axis::default()
                .title("Month")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, last])
                .labels(vec![first_label, last_label]),
        )
        .y_axis(
            Axis::default()
                .title("Total Revenue ($)")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_y * 1.1 + 1.0])
                .labels(vec![format_money(0.0), format_money(max_y)]),
        );
    frame.render_widget(chart, area);
}

/// Average price against total quantity, one series per product
pub fn price_quantity_scatter(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    table: &ResultTable,
    products: &[String],
) {
    let mut series: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    for row in table.iter() {
        let (Some(product), Some(price), Some(qty)) = (
            row.text("product_name"),
            row.float("avg_price"),
            row.float("total_quantity"),
        ) else {
            continue;
        };
        series.push((product.to_string(), vec![(price, qty)]));
    }
    if series.is_empty() {
        return empty(frame, area, title);
    }

    let max_x = series.iter().map(|(_, p)| p[0].0).fold(0.0_f64, f64::max) * 1.1 + 1.0;
    let max_y = series.iter().map(|(_, p)| p[0].1).fold(0.0_f64, f64::max) * 1.1 + 1.0;

    let datasets: Vec<Dataset> = series
        .iter()
        .map(|(product, points)| {
            Dataset::default()
                .name(product.clone())
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(product_color(products, product)))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block(title))
        .x_axis(
            Axis::default()
                .title("Average Price ($)")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_x])
                .labels(vec![format_money(0.0), format_money(max_x)]),
        )
        .y_axis(
            Axis::default()
                .title("Total Quantity Sold")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_y])
                .labels(vec!["0".to_string(), format!("{:.0}", max_y)]),
        );
    frame.render_widget(chart, area);
}

/// Revenue per month, one bar per product inside each month's group
pub fn monthly_product_bars(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    table: &ResultTable,
    products: &[String],
) {
    let mut groups: Vec<(String, Vec<(String, f64)>)> = Vec::new();
    for row in table.iter() {
        let (Some(month), Some(product), Some(revenue)) = (
            row.date("month"),
            row.text("product_name"),
            row.float("total_revenue"),
        ) else {
            continue;
        };
        let month = month.format("%Y-%m").to_string();
        match groups.iter_mut().find(|(m, _)| *m == month) {
            Some((_, bars)) => bars.push((product.to_string(), revenue)),
            None => groups.push((month, vec![(product.to_string(), revenue)])),
        }
    }
    if groups.is_empty() {
        return empty(frame, area, title);
    }

    let bar_groups: Vec<(String, Vec<Bar>)> = groups
        .into_iter()
        .map(|(month, bars)| {
            let bars = bars
                .into_iter()
                .map(|(product, revenue)| {
                    Bar::default()
                        .value(revenue.max(0.0).round() as u64)
                        .text_value(String::new())
                        .style(Style::default().fg(product_color(products, &product)))
                })
                .collect();
            (month, bars)
        })
        .collect();

    let mut chart = BarChart::default()
        .block(block(title))
        .bar_width(2)
        .bar_gap(0)
        .group_gap(2);
    for (month, bars) in &bar_groups {
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(month.clone()))
                .bars(bars),
        );
    }
    frame.render_widget(chart, area);
}

/// Any result table as a plain grid
pub fn data_table(frame: &mut Frame, area: Rect, title: &str, table: &ResultTable) {
    if table.is_empty() {
        return empty(frame, area, title);
    }

    let header = Row::new(table.columns().iter().map(|c| Cell::from(c.clone()))).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = table
        .iter()
        .map(|row| Row::new(row.cells().iter().map(|v| Cell::from(v.to_string()))))
        .collect();
    let widths = vec![Constraint::Fill(1); table.columns().len()];

    let grid = Table::new(rows, widths).header(header).block(block(title));
    frame.render_widget(grid, area);
}

/// Forecast rows as a grid
pub fn forecast_table(frame: &mut Frame, area: Rect, title: &str, forecasts: &[Forecast]) {
    if forecasts.is_empty() {
        return empty(frame, area, title);
    }

    let header = Row::new(vec!["product_name", "predicted_revenue"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = forecasts
        .iter()
        .map(|f| Row::new(vec![f.product_name.clone(), format_money(f.predicted_revenue)]))
        .collect();

    let grid = Table::new(rows, [Constraint::Fill(1), Constraint::Fill(1)])
        .header(header)
        .block(block(title));
    frame.render_widget(grid, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "$0");
        assert_eq!(format_money(999.4), "$999");
        assert_eq!(format_money(1234.5), "$1,235");
        assert_eq!(format_money(1_234_567.0), "$1,234,567");
        assert_eq!(format_money(-1500.0), "-$1,500");
    }

    #[test]
    fn test_product_color_is_stable() {
        let products = vec!["A".to_string(), "B".to_string()];
        assert_eq!(product_color(&products, "B"), PALETTE[1]);
        assert_eq!(product_color(&products, "missing"), PALETTE[0]);
    }
}
