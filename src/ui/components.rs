//! UI Components for the dashboard

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use super::{Phase, Ui};
use crate::filter::Filters;

/// Sidebar showing the active filters and key bindings
pub struct FilterPanel<'a> {
    pub filters: &'a Filters,
    pub products: usize,
    pub cache_ttl_secs: u64,
}

impl FilterPanel<'_> {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let label = Style::default().fg(Color::Gray);
        let value = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let key = Style::default().fg(Color::Yellow);

        let range = match &self.filters.date_range {
            Some(r) => vec![
                Line::from(vec![Span::styled(" from ", label), Span::styled(r.start.to_string(), value)]),
                Line::from(vec![Span::styled(" to   ", label), Span::styled(r.end.to_string(), value)]),
            ],
            None => vec![Line::from(Span::styled(" (no months)", label))],
        };

        let mut lines = vec![
            Line::from(Span::styled(" Select Product", label)),
            Line::from(vec![
                Span::styled(" ◀ ", key),
                Span::styled(self.filters.product.to_string(), value),
                Span::styled(" ▶", key),
            ]),
            Line::from(Span::styled(format!(" {} products", self.products), label)),
            Line::from(""),
            Line::from(Span::styled(" Select Date Range", label)),
        ];
        lines.extend(range);
        lines.extend([
            Line::from(""),
            Line::from(Span::styled(
                format!(" cache ttl {}s", self.cache_ttl_secs),
                label,
            )),
            Line::from(""),
            Line::from(vec![Span::styled(" ↑/↓ ", key), Span::raw("product")]),
            Line::from(vec![Span::styled(" s/S ", key), Span::raw("start month")]),
            Line::from(vec![Span::styled(" e/E ", key), Span::raw("end month")]),
            Line::from(vec![Span::styled(" ←/→ ", key), Span::raw("panel")]),
            Line::from(vec![Span::styled(" r/R ", key), Span::raw("refresh/clear cache")]),
            Line::from(vec![Span::styled(" q   ", key), Span::raw("quit")]),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Filters ")
            .border_style(Style::default().fg(Color::Blue));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Shown instead of the panels once a fetch has failed
pub struct ErrorPanel<'a> {
    pub message: &'a str,
}

impl ErrorPanel<'_> {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Error ")
            .border_style(Style::default().fg(Color::Red));

        let paragraph = Paragraph::new(self.message)
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(paragraph, area);
    }
}

/// Log panel showing scrollable history
#[derive(Debug, Default)]
pub struct LogPanel {
    entries: Vec<String>,
    max_entries: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 100,
        }
    }

    pub fn add(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(Style::default().fg(Color::Blue));

        // Calculate how many items we can show
        let visible_height = area.height.saturating_sub(2) as usize; // -2 for borders
        let start = self.entries.len().saturating_sub(visible_height);

        let items: Vec<ListItem> = self.entries[start..]
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if i == self.entries.len() - start - 1 {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(Span::styled(format!(" {}", entry), style))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_widget(list, area);
    }
}

impl Ui for LogPanel {
    fn set_phase(&mut self, phase: Phase) {
        self.add(format!("{}", phase));
    }

    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}

    fn clear_progress(&mut self) {}

    fn log(&mut self, message: impl Into<String>) {
        self.add(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_panel_caps_history() {
        let mut log = LogPanel::new();
        for i in 0..150 {
            log.log(format!("entry {}", i));
        }
        assert_eq!(log.entries().len(), 100);
        assert_eq!(log.entries()[0], "entry 50");
    }
}
