//! Interactive sales dashboard

use anyhow::Result;
use chrono::{Months, NaiveDate};
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Tabs};
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;

use super::charts;
use super::components::{ErrorPanel, FilterPanel, LogPanel};
use crate::dashboard::{DashboardData, QueryCache, View};
use crate::error::WarehouseError;
use crate::filter::{DateRange, Filters, ProductFilter};
use crate::warehouse::Warehouse;

pub const TITLE: &str = "Decoding Digital Age: E-Commerce Sales Insights Pipeline";

/// Dashboard panels in display order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Panel {
    RevenueByProduct,
    SalesOverTime,
    QuantityByProduct,
    SalesByDay,
    SlowMoving,
    PredictedSales,
    PriceVsQuantity,
    ProductByMonth,
    SampleData,
}

impl Panel {
    pub const ALL: [Panel; 9] = [
        Panel::RevenueByProduct,
        Panel::SalesOverTime,
        Panel::QuantityByProduct,
        Panel::SalesByDay,
        Panel::SlowMoving,
        Panel::PredictedSales,
        Panel::PriceVsQuantity,
        Panel::ProductByMonth,
        Panel::SampleData,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Panel::RevenueByProduct => "Revenue by Product",
            Panel::SalesOverTime => "Sales Trends Over Time",
            Panel::QuantityByProduct => "Quantity Sold by Product",
            Panel::SalesByDay => "Sales by Day of the Week",
            Panel::SlowMoving => "Slow-Moving Inventory (Bottom 5)",
            Panel::PredictedSales => "Predicted Sales for Next Month",
            Panel::PriceVsQuantity => "Price vs. Quantity Analysis",
            Panel::ProductByMonth => "Product Performance by Month",
            Panel::SampleData => "Sample Data",
        }
    }

    fn tab(&self) -> &'static str {
        match self {
            Panel::RevenueByProduct => "Revenue",
            Panel::SalesOverTime => "Trend",
            Panel::QuantityByProduct => "Quantity",
            Panel::SalesByDay => "Weekday",
            Panel::SlowMoving => "Slow",
            Panel::PredictedSales => "Forecast",
            Panel::PriceVsQuantity => "Price/Qty",
            Panel::ProductByMonth => "Monthly",
            Panel::SampleData => "Sample",
        }
    }
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    None,
    Refresh,
    ClearCache,
    Quit,
}

/// Everything the dashboard shows, independent of the terminal
pub struct DashboardState {
    data: Option<DashboardData>,
    error: Option<String>,
    filters: Filters,
    products: Vec<String>,
    panel: usize,
    cache_ttl_secs: u64,
    log: LogPanel,
}

impl DashboardState {
    pub fn new(data: DashboardData, filters: Filters, cache_ttl: Duration) -> Self {
        let products = data.products();
        Self {
            data: Some(data),
            error: None,
            filters,
            products,
            panel: 0,
            cache_ttl_secs: cache_ttl.as_secs(),
            log: LogPanel::new(),
        }
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn panel(&self) -> Panel {
        Panel::ALL[self.panel]
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn log_mut(&mut self) -> &mut LogPanel {
        &mut self.log
    }

    /// Replace the data after a refetch; the product list follows the new data
    pub fn set_data(&mut self, data: DashboardData) {
        self.products = data.products();
        if let ProductFilter::Product(p) = &self.filters.product {
            if !self.products.contains(p) {
                self.filters.product = ProductFilter::All;
            }
        }
        self.data = Some(data);
        self.error = None;
    }

    /// A failed fetch halts rendering of every panel
    pub fn set_error(&mut self, err: &WarehouseError) {
        self.log.add(format!("fetch failed: {}", err));
        self.error = Some(format!("{}\n\n{}", err, err.hint()));
        self.data = None;
    }

    pub fn next_panel(&mut self) {
        self.panel = (self.panel + 1) % Panel::ALL.len();
    }

    pub fn prev_panel(&mut self) {
        self.panel = (self.panel + Panel::ALL.len() - 1) % Panel::ALL.len();
    }

    /// Step through `All` followed by each product, wrapping around
    pub fn cycle_product(&mut self, forward: bool) {
        let choices = self.products.len() + 1;
        let current = match &self.filters.product {
            ProductFilter::All => 0,
            ProductFilter::Product(p) => self
                .products
                .iter()
                .position(|x| x == p)
                .map_or(0, |i| i + 1),
        };
        let next = if forward {
            (current + 1) % choices
        } else {
            (current + choices - 1) % choices
        };
        self.filters.product = match next {
            0 => ProductFilter::All,
            i => ProductFilter::Product(self.products[i - 1].clone()),
        };
    }

    /// Move the start month, never past the end
    pub fn shift_start(&mut self, months: i32) {
        if let Some(range) = self.filters.date_range {
            let start = shift_months(range.start, months).min(range.end);
            if let Ok(r) = DateRange::new(start, range.end) {
                self.filters.date_range = Some(r);
            }
        }
    }

    /// Move the end month, never before the start
    pub fn shift_end(&mut self, months: i32) {
        if let Some(range) = self.filters.date_range {
            let end = shift_months(range.end, months).max(range.start);
            if let Ok(r) = DateRange::new(range.start, end) {
                self.filters.date_range = Some(r);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('r') => return Action::Refresh,
            KeyCode::Char('R') => return Action::ClearCache,
            KeyCode::Tab | KeyCode::Right => self.next_panel(),
            KeyCode::BackTab | KeyCode::Left => self.prev_panel(),
            KeyCode::Down => self.cycle_product(true),
            KeyCode::Up => self.cycle_product(false),
            KeyCode::Char('s') => self.shift_start(-1),
            KeyCode::Char('S') => self.shift_start(1),
            KeyCode::Char('e') => self.shift_end(-1),
            KeyCode::Char('E') => self.shift_end(1),
            _ => {}
        }
        Action::None
    }
}

fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let step = Months::new(months.unsigned_abs());
    let shifted = if months >= 0 {
        date.checked_add_months(step)
    } else {
        date.checked_sub_months(step)
    };
    shifted.unwrap_or(date)
}

/// Draw the whole dashboard
pub fn render(frame: &mut Frame, state: &DashboardState) {
    let area = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title and tabs
            Constraint::Min(10),   // Body
            Constraint::Length(6), // Activity log
        ])
        .split(area);

    let titles: Vec<&str> = Panel::ALL.iter().map(|p| p.tab()).collect();
    let tabs = Tabs::new(titles)
        .select(state.panel)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", TITLE))
                .border_style(Style::default().fg(Color::Blue)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(20)])
        .split(rows[1]);

    FilterPanel {
        filters: &state.filters,
        products: state.products.len(),
        cache_ttl_secs: state.cache_ttl_secs,
    }
    .render(frame, body[0]);

    match (&state.data, &state.error) {
        (_, Some(message)) => ErrorPanel { message }.render(frame, body[1]),
        (Some(data), None) => render_panel(frame, body[1], state, data),
        (None, None) => {}
    }

    state.log.render(frame, rows[2]);
}

fn render_panel(frame: &mut Frame, area: Rect, state: &DashboardState, data: &DashboardData) {
    let panel = state.panel();
    let title = panel.title();
    let filters = &state.filters;
    let products = &state.products;

    match panel {
        Panel::RevenueByProduct => charts::horizontal_bars(
            frame,
            area,
            title,
            &data.filtered(View::RevenueByProduct, filters),
            "product_name",
            "total_revenue",
            true,
        ),
        Panel::SalesOverTime => {
            charts::revenue_line(frame, area, title, &data.filtered(View::SalesOverTime, filters))
        }
        Panel::QuantityByProduct => charts::horizontal_bars(
            frame,
            area,
            title,
            &data.filtered(View::QuantityByProduct, filters),
            "product_name",
            "total_quantity",
            false,
        ),
        Panel::SalesByDay => charts::horizontal_bars(
            frame,
            area,
            title,
            &data.filtered(View::SalesByDay, filters),
            "day_of_week",
            "total_revenue",
            true,
        ),
        Panel::SlowMoving => {
            charts::data_table(frame, area, title, &data.filtered(View::SlowMoving, filters))
        }
        Panel::PredictedSales => charts::forecast_table(
            frame,
            area,
            title,
            &filters.apply_forecasts(data.forecasts()),
        ),
        Panel::PriceVsQuantity => charts::price_quantity_scatter(
            frame,
            area,
            title,
            &data.filtered(View::PriceVsQuantity, filters),
            products,
        ),
        Panel::ProductByMonth => charts::monthly_product_bars(
            frame,
            area,
            title,
            &data.filtered(View::ProductByMonth, filters),
            products,
        ),
        Panel::SampleData => {
            charts::data_table(frame, area, title, &data.filtered(View::SampleData, filters))
        }
    }
}

/// Run `setup`; if it fails, run `undo` before returning the error
fn undo_on_error<T>(setup: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    let result = setup();
    if result.is_err() {
        undo();
    }
    result
}

/// Full-screen dashboard bound to a terminal
pub struct DashboardApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: DashboardState,
}

impl DashboardApp {
    /// Enter the alternate screen
    pub fn new(state: DashboardState) -> Result<Self> {
        terminal::enable_raw_mode()?;
        let terminal = undo_on_error(
            || {
                let mut stdout = io::stdout();
                stdout.execute(EnterAlternateScreen)?;
                Ok(Terminal::new(CrosstermBackend::new(stdout))?)
            },
            || {
                io::stdout().execute(LeaveAlternateScreen).ok();
                terminal::disable_raw_mode().ok();
            },
        )?;

        Ok(Self { terminal, state })
    }

    fn draw(&mut self) -> Result<()> {
        let state = &self.state;
        self.terminal.draw(|frame| render(frame, state))?;
        Ok(())
    }

    fn refetch(&mut self, warehouse: &Warehouse, cache: &QueryCache) {
        match DashboardData::fetch(warehouse, cache, self.state.log_mut()) {
            Ok(data) => self.state.set_data(data),
            Err(err) => self.state.set_error(&err),
        }
    }

    /// Run until the user quits
    pub fn run(mut self, warehouse: &Warehouse, cache: &QueryCache) -> Result<()> {
        loop {
            self.draw()?;

            if !event::poll(Duration::from_millis(250))? {
                continue;
            }
            let CrosstermEvent::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match self.state.handle_key(key) {
                Action::Quit => break,
                Action::Refresh => self.refetch(warehouse, cache),
                Action::ClearCache => {
                    cache.invalidate_all();
                    self.state.log_mut().add("cache cleared");
                    self.refetch(warehouse, cache);
                }
                Action::None => {}
            }
        }

        self.restore()
    }

    /// Restore terminal
    pub fn restore(mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for DashboardApp {
    fn drop(&mut self) {
        // Best effort cleanup
        terminal::disable_raw_mode().ok();
        self.terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .ok();
        self.terminal.show_cursor().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::{ResultTable, SqlValue};
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_failed_terminal_setup_is_undone() {
        let mut undone = false;
        let result: Result<()> = undo_on_error(|| anyhow::bail!("no tty"), || undone = true);
        assert!(result.is_err());
        assert!(undone);

        let mut undone = false;
        let value = undo_on_error(|| Ok(7), || undone = true).unwrap();
        assert_eq!(value, 7);
        assert!(!undone);
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn data() -> DashboardData {
        let revenue = ResultTable::new(
            vec!["product_name".into(), "total_revenue".into()],
            vec![
                vec![SqlValue::Text("Mouse".into()), SqlValue::Real(50.0)],
                vec![SqlValue::Text("Laptop".into()), SqlValue::Real(3000.0)],
            ],
        );
        let mut tables = HashMap::new();
        tables.insert(View::RevenueByProduct, Arc::new(revenue));
        DashboardData::from_tables(tables)
    }

    fn state() -> DashboardState {
        let filters = Filters {
            product: ProductFilter::All,
            date_range: Some(DateRange::new(date(2025, 1, 1), date(2025, 3, 1)).unwrap()),
        };
        DashboardState::new(data(), filters, Duration::from_secs(3600))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_product_cycle_wraps_through_all() {
        let mut s = state();
        s.handle_key(key(KeyCode::Down));
        assert_eq!(s.filters().product, ProductFilter::Product("Laptop".into()));
        s.handle_key(key(KeyCode::Down));
        assert_eq!(s.filters().product, ProductFilter::Product("Mouse".into()));
        s.handle_key(key(KeyCode::Down));
        assert_eq!(s.filters().product, ProductFilter::All);
        s.handle_key(key(KeyCode::Up));
        assert_eq!(s.filters().product, ProductFilter::Product("Mouse".into()));
    }

    #[test]
    fn test_date_shifts_keep_start_before_end() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('S')));
        s.handle_key(key(KeyCode::Char('S')));
        s.handle_key(key(KeyCode::Char('S')));
        let range = s.filters().date_range.unwrap();
        assert_eq!(range.start, date(2025, 3, 1));
        assert_eq!(range.end, date(2025, 3, 1));

        s.handle_key(key(KeyCode::Char('e')));
        assert_eq!(s.filters().date_range.unwrap().end, date(2025, 3, 1));
        s.handle_key(key(KeyCode::Char('E')));
        assert_eq!(s.filters().date_range.unwrap().end, date(2025, 4, 1));
    }

    #[test]
    fn test_panel_navigation_and_actions() {
        let mut s = state();
        assert_eq!(s.handle_key(key(KeyCode::BackTab)), Action::None);
        assert_eq!(s.panel(), Panel::SampleData);
        s.handle_key(key(KeyCode::Tab));
        assert_eq!(s.panel(), Panel::RevenueByProduct);
        assert_eq!(s.handle_key(key(KeyCode::Char('r'))), Action::Refresh);
        assert_eq!(s.handle_key(key(KeyCode::Char('R'))), Action::ClearCache);
        assert_eq!(s.handle_key(key(KeyCode::Char('q'))), Action::Quit);
    }

    #[test]
    fn test_set_data_drops_vanished_product() {
        let mut s = state();
        s.cycle_product(true);
        s.set_data(DashboardData::from_tables(HashMap::new()));
        assert_eq!(s.filters().product, ProductFilter::All);
    }

    fn screen(state: &DashboardState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| render(f, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_render_revenue_panel() {
        let text = screen(&state());
        assert!(text.contains("Revenue by Product"));
        assert!(text.contains("Laptop"));
        assert!(text.contains("Filters"));
    }

    #[test]
    fn test_error_halts_panels() {
        let mut s = state();
        s.set_error(&WarehouseError::Interface("account unreachable".into()));
        let text = screen(&s);
        assert!(text.contains("account unreachable"));
        assert!(!text.contains("Laptop"));
    }
}
