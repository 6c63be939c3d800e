use colored::Colorize;
use comfy_table::{Cell, Table};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use crate::analytics::{
    share, unique_categories, unique_modes, AmountRange, AnalyticsFilter, ChartSlice,
    TransactionType, ViewMode,
};
use crate::api::LedgerBackend;
use crate::error::Result;
use crate::fmt::{money, money_whole, truncate};
use crate::models::Transaction;
use crate::tui::{
    render_footer, render_header, tick_toast, Toast, View, ViewAction, FOOTER_STYLE, TITLE_STYLE,
};

use super::cycle_option;

const BAR_COLORS: [Color; 6] = [
    Color::Rgb(80, 220, 100),
    Color::Rgb(90, 160, 255),
    Color::Rgb(255, 180, 60),
    Color::Rgb(220, 90, 200),
    Color::Rgb(90, 220, 220),
    Color::Rgb(240, 100, 100),
];

pub struct AnalyticsScreen {
    transactions: Vec<Transaction>,
    filter: AnalyticsFilter,
    loading: bool,
    list_scroll: usize,
    toast: Option<Toast>,
    greeting: String,
}

/// Column widths for the transaction list: date, amount, category, mode.
const LIST_WIDTHS: [usize; 4] = [10, 12, 16, 8];

impl AnalyticsScreen {
    pub fn new(greeting: &str) -> Self {
        Self {
            transactions: Vec::new(),
            filter: AnalyticsFilter::default(),
            loading: true,
            list_scroll: 0,
            toast: None,
            greeting: greeting.to_string(),
        }
    }

    fn filter_line(&self) -> String {
        let mut parts = vec![
            format!("{} \u{00b7} {}", self.filter.transaction_type, self.filter.view_mode),
        ];
        if self.filter.view_mode == ViewMode::Category {
            parts.push(format!("Category: {}", self.filter.category().unwrap_or("All")));
        }
        parts.push(format!("Mode: {}", self.filter.mode().unwrap_or("All")));
        parts.push(format!("Amount: {}", self.filter.range()));
        format!(" {}", parts.join("   "))
    }

    fn draw_chart(&self, frame: &mut Frame, area: ratatui::layout::Rect, slices: &[ChartSlice]) {
        let label_width = (area.width as usize / 3).max(8);
        let bars: Vec<Bar> = slices
            .iter()
            .take(area.height.saturating_sub(1) as usize)
            .enumerate()
            .map(|(i, s)| {
                Bar::default()
                    .value(s.value.round() as u64)
                    .label(Line::from(truncate(&s.name, label_width)))
                    .text_value(money_whole(s.value))
                    .style(Style::default().fg(BAR_COLORS[i % BAR_COLORS.len()]))
            })
            .collect();

        let chart = BarChart::default()
            .block(
                Block::default()
                    .title(Span::styled(" Totals", TITLE_STYLE))
                    .borders(Borders::NONE),
            )
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    /// Header plus one line per filtered row, starting at `list_scroll`.
    fn list_lines(&self, rows: &[&Transaction], width: usize, height: usize) -> Vec<Line<'static>> {
        let [date_w, amount_w, cat_w, mode_w] = LIST_WIDTHS;
        let sub_w = 14;
        let fixed = date_w + amount_w + cat_w + mode_w + sub_w + 7;
        let desc_w = width.saturating_sub(fixed).max(10);

        let mut lines = vec![Line::from(Span::styled(
            format!(
                " {:<date_w$} {:<desc_w$} {:>amount_w$} {:<cat_w$} {:<mode_w$} {:<sub_w$}",
                "Date", "Description", "Amount", "Category", "Mode", "Subcategory"
            ),
            TITLE_STYLE,
        ))];
        let dash = |v: Option<&str>| v.filter(|s| !s.is_empty()).unwrap_or("-").to_string();
        for txn in rows.iter().skip(self.list_scroll).take(height.saturating_sub(1)) {
            let amount = self.filter.transaction_type.amount(txn);
            lines.push(Line::from(format!(
                " {:<date_w$} {:<desc_w$} {:>amount_w$} {:<cat_w$} {:<mode_w$} {:<sub_w$}",
                truncate(&txn.date, date_w),
                truncate(&txn.description, desc_w),
                money(amount),
                truncate(&dash(txn.category.as_deref()), cat_w),
                truncate(&dash(Some(txn.mode.as_str())), mode_w),
                truncate(&dash(txn.subcategory.as_deref()), sub_w),
            )));
        }
        lines
    }

    fn scroll_list(&mut self, down: bool) {
        if down {
            let len = self.filter.filtered(&self.transactions).len();
            self.list_scroll = (self.list_scroll + 1).min(len.saturating_sub(1));
        } else {
            self.list_scroll = self.list_scroll.saturating_sub(1);
        }
    }

    fn legend(&self, slices: &[ChartSlice], width: usize) -> Vec<Line<'static>> {
        let name_width = width.saturating_sub(22).max(8);
        let mut lines = vec![Line::from(Span::styled(" Share", TITLE_STYLE))];
        for (i, (slice, pct)) in slices.iter().zip(share(slices)).enumerate() {
            lines.push(Line::from(vec![
                Span::styled(" \u{25a0} ", Style::default().fg(BAR_COLORS[i % BAR_COLORS.len()])),
                Span::raw(format!(
                    "{:<name_width$} {:>10} {:>5.1}%",
                    truncate(&slice.name, name_width),
                    money_whole(slice.value),
                    pct
                )),
            ]));
        }
        lines
    }
}

impl View for AnalyticsScreen {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep, filter_area, summary_area, body_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .areas(area);

        render_header(frame, header_area, sep, &self.greeting);

        if self.loading {
            frame.render_widget(Paragraph::new(" Loading transactions\u{2026}"), filter_area);
            render_footer(frame, hints_area, None, "Please wait");
            return;
        }

        frame.render_widget(Paragraph::new(self.filter_line()).style(FOOTER_STYLE), filter_area);

        let filtered = self.filter.filtered(&self.transactions);
        let total: f64 = filtered
            .iter()
            .map(|t| self.filter.transaction_type.amount(t))
            .sum();
        frame.render_widget(
            Paragraph::new(format!(
                " {} transactions   Total {}",
                filtered.len(),
                money(total)
            ))
            .style(TITLE_STYLE),
            summary_area,
        );

        let slices = self.filter.chart_data(&self.transactions);
        if slices.is_empty() {
            frame.render_widget(Paragraph::new(" No matching transactions."), body_area);
        } else {
            let [top_area, list_area] =
                Layout::vertical([Constraint::Percentage(50), Constraint::Fill(1)])
                    .areas(body_area);
            let [chart_area, legend_area] =
                Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .areas(top_area);
            self.draw_chart(frame, chart_area, &slices);
            frame.render_widget(
                Paragraph::new(self.legend(&slices, legend_area.width as usize)),
                legend_area,
            );
            let lines = self.list_lines(
                &filtered,
                list_area.width as usize,
                list_area.height as usize,
            );
            frame.render_widget(Paragraph::new(lines), list_area);
        }

        render_footer(
            frame,
            hints_area,
            self.toast.as_ref(),
            "t=debit/credit  v=view  c=category  m=mode  a=amount  Up/Down=scroll  r=reload  Esc=back",
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        tick_toast(&mut self.toast);
        match code {
            KeyCode::Up | KeyCode::Down => {
                self.scroll_list(code == KeyCode::Down);
                return ViewAction::Continue;
            }
            KeyCode::Char('t') => {
                let t = self.filter.transaction_type.toggled();
                self.filter.set_transaction_type(t);
            }
            KeyCode::Char('v') => {
                let view = match self.filter.view_mode {
                    ViewMode::Category => ViewMode::Mode,
                    ViewMode::Mode => ViewMode::Category,
                };
                self.filter.set_view_mode(view);
            }
            KeyCode::Char('c') if self.filter.view_mode == ViewMode::Category => {
                let current = self.filter.category().map(str::to_string);
                let next = cycle_option(&current, &unique_categories(&self.transactions));
                self.filter.set_category(next);
            }
            KeyCode::Char('m') => {
                let current = self.filter.mode().map(str::to_string);
                let next = cycle_option(&current, &unique_modes(&self.transactions));
                self.filter.set_mode(next);
            }
            KeyCode::Char('a') => {
                let next = self.filter.range().next();
                self.filter.set_range(next);
            }
            KeyCode::Char('r') => self.loading = true,
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            _ => return ViewAction::Continue,
        }
        // Any filter change starts the list from the top.
        self.list_scroll = 0;
        ViewAction::Continue
    }

    fn busy(&self) -> Option<&'static str> {
        self.loading.then_some("Loading transactions\u{2026}")
    }

    fn run_pending(&mut self, backend: &dyn LedgerBackend) {
        if !self.loading {
            return;
        }
        self.loading = false;
        match backend.fetch_all() {
            Ok(txns) => self.transactions = txns,
            Err(e) => self.toast = Some(Toast::error("Could not load transactions", &e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

pub fn run(
    backend: &dyn LedgerBackend,
    transaction_type: &str,
    by: &str,
    category: Option<String>,
    mode: Option<String>,
    range: &str,
    list: bool,
) -> Result<()> {
    let mut filter = AnalyticsFilter::default();
    filter.set_view_mode(by.parse()?);
    filter.set_transaction_type(transaction_type.parse::<TransactionType>()?);
    filter.set_category(category);
    filter.set_mode(mode);
    // Last: the other setters reset the range.
    filter.set_range(range.parse::<AmountRange>()?);

    let txns = backend.fetch_all()?;
    println!(
        "{}",
        format!("{} \u{00b7} {}", filter.transaction_type, filter.view_mode).bold()
    );
    match summary_table(&filter, &txns) {
        Some(table) => println!("{table}"),
        None => println!("No matching transactions."),
    }
    if list {
        let rows = filter.filtered(&txns);
        if !rows.is_empty() {
            println!("\n{}\n{}", "Transactions".bold(), transactions_table(&filter, &rows));
        }
    }
    Ok(())
}

/// The filtered rows behind the totals.
pub(crate) fn transactions_table(filter: &AnalyticsFilter, rows: &[&Transaction]) -> Table {
    let dash = |v: Option<&str>| v.filter(|s| !s.is_empty()).unwrap_or("-").to_string();
    let mut table = Table::new();
    table.set_header(vec![
        "Date",
        "Description",
        "Amount",
        "Category",
        "Mode",
        "Subcategory",
    ]);
    for txn in rows {
        table.add_row(vec![
            Cell::new(&txn.date),
            Cell::new(&txn.description),
            Cell::new(money(filter.transaction_type.amount(txn))),
            Cell::new(dash(txn.category.as_deref())),
            Cell::new(dash(Some(txn.mode.as_str()))),
            Cell::new(dash(txn.subcategory.as_deref())),
        ]);
    }
    table
}

pub(crate) fn summary_table(filter: &AnalyticsFilter, txns: &[Transaction]) -> Option<Table> {
    let slices = filter.chart_data(txns);
    if slices.is_empty() {
        return None;
    }
    let name_header = match filter.view_mode {
        ViewMode::Category => "Category",
        ViewMode::Mode => "Mode",
    };
    let mut table = Table::new();
    table.set_header(vec![name_header, "Amount", "%"]);
    for (slice, pct) in slices.iter().zip(share(&slices)) {
        table.add_row(vec![
            Cell::new(&slice.name),
            Cell::new(money(slice.value)),
            Cell::new(format!("{pct:.1}%")),
        ]);
    }
    let total: f64 = slices.iter().map(|s| s.value).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(total).bold()),
        Cell::new(""),
    ]);
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::models::sample_transaction;

    fn txn(row: u64, category: &str, mode: &str, debit: f64) -> Transaction {
        let mut t = sample_transaction(row, "test", debit);
        t.mode = mode.to_string();
        t.category = Some(category.to_string());
        t
    }

    fn backend() -> FakeBackend {
        let backend = FakeBackend::default();
        *backend.all.borrow_mut() = vec![
            txn(1, "Dining Out", "UPI", 300.0),
            txn(2, "Transport", "CARD", 700.0),
            txn(3, "Income", "NEFT", 0.0),
        ];
        backend
    }

    #[test]
    fn test_summary_table_totals() {
        colored::control::set_override(false);
        let backend = backend();
        let table = summary_table(&AnalyticsFilter::default(), &backend.all.borrow())
            .unwrap()
            .to_string();
        assert!(table.contains("70.0%"));
        assert!(table.contains("\u{20b9}1,000.00"));
    }

    #[test]
    fn test_summary_table_empty() {
        let mut filter = AnalyticsFilter::default();
        filter.set_range(AmountRange::Over5000);
        assert!(summary_table(&filter, &backend().all.borrow()).is_none());
    }

    #[test]
    fn test_screen_loads_and_filters() {
        let backend = backend();
        let mut screen = AnalyticsScreen::new("test");
        screen.run_pending(&backend);
        assert!(screen.busy().is_none());
        assert_eq!(screen.transactions.len(), 3);

        screen.handle_key(KeyCode::Char('c'));
        assert_eq!(screen.filter.category(), Some("Dining Out"));
        screen.handle_key(KeyCode::Char('v'));
        assert_eq!(screen.filter.view_mode, ViewMode::Mode);
        screen.handle_key(KeyCode::Char('t'));
        assert_eq!(screen.filter.transaction_type, TransactionType::Credit);
        assert_eq!(screen.filter.chart_data(&screen.transactions)[0].name, "NEFT");
    }

    #[test]
    fn test_transactions_table_lists_filtered_rows() {
        let backend = backend();
        let txns = backend.all.borrow();
        let mut filter = AnalyticsFilter::default();
        filter.set_category(Some("Transport".into()));
        let rows = filter.filtered(&txns);
        let table = transactions_table(&filter, &rows);
        assert_eq!(table.row_iter().count(), 1);
        let text = table.to_string();
        assert!(text.contains("Transport"));
        assert!(text.contains("\u{20b9}700.00"));
        assert!(!text.contains("Dining Out"));
    }

    #[test]
    fn test_screen_list_scrolls_and_resets() {
        let backend = backend();
        let mut screen = AnalyticsScreen::new("test");
        screen.run_pending(&backend);

        let rows = screen.filter.filtered(&screen.transactions);
        let lines = screen.list_lines(&rows, 100, 10);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].to_string().contains("Subcategory"));
        assert!(lines[1].to_string().contains("Dining Out"));

        screen.handle_key(KeyCode::Down);
        screen.handle_key(KeyCode::Down);
        assert_eq!(screen.list_scroll, 1);
        let rows = screen.filter.filtered(&screen.transactions);
        assert!(screen.list_lines(&rows, 100, 10)[1].to_string().contains("Transport"));

        screen.handle_key(KeyCode::Char('t'));
        assert_eq!(screen.list_scroll, 0);
    }

    #[test]
    fn test_screen_load_failure_toasts() {
        let backend = backend();
        *backend.fail.borrow_mut() = true;
        let mut screen = AnalyticsScreen::new("test");
        screen.run_pending(&backend);
        assert!(screen.toast.is_some());
        assert!(matches!(screen.handle_key(KeyCode::Esc), ViewAction::Close));
    }
}
