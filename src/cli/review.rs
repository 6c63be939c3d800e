use colored::{ColoredString, Colorize};
use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph},
    Frame,
};
use tracing::info;

use crate::api::{LedgerBackend, WebhookClient};
use crate::categories::{Category, Label};
use crate::error::Result;
use crate::session::ReviewSession;
use crate::settings::Settings;
use crate::swipe::{Swipe, SwipeTracker};
use crate::tui::{
    money_span, render_footer, render_header, run_view, tick_toast, wrap_text, Toast, View,
    ViewAction, FOOTER_STYLE, TITLE_STYLE,
};

const CARD_WIDTH: u16 = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditField {
    Category,
    Subcategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewState {
    Card,
    Edit(EditField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Refresh,
    Submit,
    Process,
}

impl Pending {
    fn label(self) -> &'static str {
        match self {
            Pending::Refresh => "Loading transactions\u{2026}",
            Pending::Submit => "Submitting\u{2026}",
            Pending::Process => "Processing new statement\u{2026}",
        }
    }

    fn failure_title(self) -> &'static str {
        match self {
            Pending::Refresh => "Could not load transactions",
            Pending::Submit => "Submit failed",
            Pending::Process => "Processing failed",
        }
    }
}

pub struct ReviewScreen {
    session: ReviewSession,
    state: ReviewState,
    swipe: SwipeTracker,
    cat_query: String,
    cat_selection: usize,
    picked: Option<Category>,
    sub_selection: usize,
    pending: Option<Pending>,
    toast: Option<Toast>,
    greeting: String,
    card_area: Rect,
    loaded: bool,
}

impl ReviewScreen {
    /// A fresh screen; the first frame triggers the initial fetch.
    pub fn new(greeting: &str) -> Self {
        Self {
            session: ReviewSession::default(),
            state: ReviewState::Card,
            swipe: SwipeTracker::default(),
            cat_query: String::new(),
            cat_selection: 0,
            picked: None,
            sub_selection: 0,
            pending: Some(Pending::Refresh),
            toast: None,
            greeting: greeting.to_string(),
            card_area: Rect::default(),
            loaded: false,
        }
    }

    /// Fetch again when the screen is reopened.
    pub fn reload(&mut self) {
        self.queue(Pending::Refresh);
    }

    pub fn unsubmitted(&self) -> usize {
        self.session.categorized_len()
    }

    fn filtered_categories(&self) -> Vec<Category> {
        let q = self.cat_query.to_lowercase();
        Category::ALL
            .into_iter()
            .filter(|c| q.is_empty() || c.name().to_lowercase().contains(&q))
            .collect()
    }

    /// "(none)" followed by the picked category's subcategories.
    fn sub_options(&self) -> Vec<&'static str> {
        let mut options = vec!["(none)"];
        if let Some(cat) = self.picked {
            options.extend_from_slice(cat.subcategories());
        }
        options
    }

    fn queue(&mut self, op: Pending) {
        self.pending = Some(op);
        self.swipe.disabled = true;
        self.swipe.reset();
    }

    fn reset_edit(&mut self) {
        self.state = ReviewState::Card;
        self.cat_query.clear();
        self.cat_selection = 0;
        self.picked = None;
        self.sub_selection = 0;
    }

    fn accept(&mut self) {
        self.toast = Some(match self.session.accept_suggestion() {
            Ok(label) => Toast::success("Categorized", describe(label)),
            Err(e) => Toast::error("Can't accept suggestion", &e),
        });
    }

    fn begin_edit(&mut self) {
        if self.session.current().is_some() {
            self.reset_edit();
            self.state = ReviewState::Edit(EditField::Category);
        }
    }

    fn save_edit(&mut self) {
        let Some(category) = self.picked else {
            return;
        };
        let sub = match self.sub_selection {
            0 => "",
            i => category.subcategories().get(i - 1).copied().unwrap_or(""),
        };
        self.toast = Some(match Label::new(category, sub) {
            Ok(label) => {
                self.session.categorize(label);
                Toast::success("Categorized", describe(label))
            }
            Err(e) => Toast::error("Invalid category", &e),
        });
        self.reset_edit();
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_card(&mut self, frame: &mut Frame, area: Rect) {
        let Some(txn) = self.session.current() else {
            self.card_area = Rect::default();
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(" All caught up.", TITLE_STYLE)),
                Line::from(""),
                Line::from(" Press r to refresh, p to process a new statement,"),
                Line::from(" or d to submit what you've categorized."),
            ];
            frame.render_widget(Paragraph::new(lines), area);
            return;
        };

        let width = area.width.min(CARD_WIDTH);
        let inner_width = width.saturating_sub(4) as usize;
        let (description, _) = wrap_text(&txn.description, inner_width);

        let mut lines: Vec<Line> = description
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), TITLE_STYLE)))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(txn.counterparty_line()));
        lines.push(Line::from(vec![Span::raw("Amount       "), money_span(txn.amount())]));
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "Suggested    {}",
            txn.ai_category.as_deref().unwrap_or("(none)")
        )));
        lines.push(Line::from(format!(
            "Subcategory  {}",
            txn.subcategory.as_deref().unwrap_or("-")
        )));
        if !txn.remarks.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("Remarks      {}", txn.remarks),
                FOOTER_STYLE,
            )));
        }

        let mut border = Style::default().fg(Color::DarkGray);
        if let Some(dir) = self.swipe.direction() {
            let level = (90.0 + 165.0 * self.swipe.feedback_intensity()) as u8;
            let (text, color) = match dir {
                Swipe::Right => ("  \u{2192} ACCEPT", Color::Rgb(0, level, 60)),
                Swipe::Left => ("  \u{2190} EDIT", Color::Rgb(level, level, 0)),
            };
            border = Style::default().fg(color);
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(text, border.add_modifier(Modifier::BOLD))));
        }

        let room = area.width.saturating_sub(width) / 2;
        let base_x = area.x + room;
        let shift = self.swipe.offset().clamp(-(room as i32), room as i32);
        let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(1));
        let top = area.y + 1.min(area.height);

        self.card_area = Rect::new(base_x, top, width, height);
        let shifted = Rect::new((base_x as i32 + shift) as u16, top, width, height);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!(" Row {} ", txn.row_number));
        frame.render_widget(Paragraph::new(lines).block(block), shifted);
    }

    fn draw_picker(&self, frame: &mut Frame, area: Rect, field: EditField) {
        let mut lines = Vec::new();
        match field {
            EditField::Category => {
                lines.push(Line::from(format!(" Category: {}\u{2588}", self.cat_query)));
                let matches = self.filtered_categories();
                if matches.is_empty() {
                    lines.push(Line::from(Span::styled("    (no matches)", FOOTER_STYLE)));
                }
                for (i, cat) in matches.iter().enumerate() {
                    let marker = if i == self.cat_selection { ">" } else { " " };
                    lines.push(picker_line(marker, cat.name(), i == self.cat_selection));
                }
            }
            EditField::Subcategory => {
                let name = self.picked.map(Category::name).unwrap_or("");
                lines.push(Line::from(vec![
                    Span::raw(" Category: "),
                    Span::styled(name, TITLE_STYLE),
                ]));
                lines.push(Line::from(" Subcategory:"));
                for (i, sub) in self.sub_options().iter().enumerate() {
                    let marker = if i == self.sub_selection { ">" } else { " " };
                    lines.push(picker_line(marker, sub, i == self.sub_selection));
                }
            }
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn hints(&self) -> &'static str {
        match self.state {
            ReviewState::Card => {
                "Enter/\u{2192}=accept  e/\u{2190}=edit  s=skip  u=undo  r=refresh  p=process  d=submit  q=back"
            }
            ReviewState::Edit(EditField::Category) => {
                "Type to filter  Up/Down=select  Enter=choose  Esc=cancel"
            }
            ReviewState::Edit(EditField::Subcategory) => {
                "Up/Down=select  Enter=save  Esc=change category"
            }
        }
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    fn handle_card_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Enter | KeyCode::Right => self.accept(),
            KeyCode::Char('e') | KeyCode::Left => self.begin_edit(),
            KeyCode::Char('s') => self.session.skip(),
            KeyCode::Char('u') => {
                if self.session.undo_last().is_none() {
                    self.toast = Some(Toast::info("Nothing to undo", ""));
                }
            }
            KeyCode::Char('r') => self.queue(Pending::Refresh),
            KeyCode::Char('p') => self.queue(Pending::Process),
            KeyCode::Char('d') => match self.session.submission() {
                Ok(_) => self.queue(Pending::Submit),
                Err(e) => self.toast = Some(Toast::error("Nothing to submit", &e)),
            },
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            _ => {}
        }
        ViewAction::Continue
    }

    fn handle_category_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => {
                self.cat_query.push(c);
                self.cat_selection = 0;
            }
            KeyCode::Backspace => {
                self.cat_query.pop();
                self.cat_selection = 0;
            }
            KeyCode::Up => self.cat_selection = self.cat_selection.saturating_sub(1),
            KeyCode::Down => {
                let count = self.filtered_categories().len();
                if count > 0 {
                    self.cat_selection = (self.cat_selection + 1).min(count - 1);
                }
            }
            KeyCode::Enter => {
                if let Some(cat) = self.filtered_categories().get(self.cat_selection) {
                    self.picked = Some(*cat);
                    self.sub_selection = 0;
                    self.state = ReviewState::Edit(EditField::Subcategory);
                }
            }
            KeyCode::Esc => self.reset_edit(),
            _ => {}
        }
    }

    fn handle_subcategory_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.sub_selection = self.sub_selection.saturating_sub(1),
            KeyCode::Down => {
                self.sub_selection = (self.sub_selection + 1).min(self.sub_options().len() - 1);
            }
            KeyCode::Enter => self.save_edit(),
            KeyCode::Esc | KeyCode::Backspace => {
                self.picked = None;
                self.sub_selection = 0;
                self.state = ReviewState::Edit(EditField::Category);
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Backend calls
    // -----------------------------------------------------------------------

    fn refresh(&mut self, backend: &dyn LedgerBackend) -> Result<()> {
        let txns = backend.fetch_uncategorized()?;
        self.session.load(txns);
        if self.loaded {
            self.toast = Some(Toast::success(
                "Refreshed",
                format!("{} transactions to categorize", self.session.pending_len()),
            ));
        }
        self.loaded = true;
        Ok(())
    }

    fn submit(&mut self, backend: &dyn LedgerBackend) -> Result<()> {
        let count = {
            let batch = self.session.submission()?;
            backend.submit_categorized(batch)?;
            batch.len()
        };
        self.session.mark_submitted();
        info!(count, "submitted categorized transactions");
        self.toast = Some(Toast::success(
            "Submitted",
            format!("{count} categorized transactions saved"),
        ));
        Ok(())
    }

    fn process(&mut self, backend: &dyn LedgerBackend) -> Result<()> {
        backend.process_statement(None)?;
        let txns = backend.fetch_uncategorized()?;
        self.session.load(txns);
        self.loaded = true;
        self.toast = Some(Toast::success(
            "Statement processed",
            format!("{} transactions to categorize", self.session.pending_len()),
        ));
        Ok(())
    }
}

impl View for ReviewScreen {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep, progress_area, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        render_header(frame, header_area, sep, &self.greeting);

        let done = self.session.categorized_len();
        let pending = self.session.pending_len();
        let ratio = if done + pending > 0 {
            done as f64 / (done + pending) as f64
        } else {
            0.0
        };
        let gauge = LineGauge::default()
            .label(format!("{done} categorized, {pending} pending "))
            .ratio(ratio)
            .filled_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .unfilled_style(Style::default().fg(Color::DarkGray))
            .line_set(ratatui::symbols::line::THICK);
        frame.render_widget(gauge, progress_area);

        if let Some(label) = self.busy() {
            frame.render_widget(
                Paragraph::new(vec![Line::from(""), Line::from(format!(" {label}"))]),
                body_area,
            );
            render_footer(frame, hints_area, None, "Please wait");
            return;
        }

        match self.state {
            ReviewState::Card => self.draw_card(frame, body_area),
            ReviewState::Edit(field) => {
                let [card_area, picker_area] =
                    Layout::vertical([Constraint::Length(12), Constraint::Fill(1)])
                        .areas(body_area);
                self.draw_card(frame, card_area);
                self.draw_picker(frame, picker_area, field);
            }
        }

        render_footer(frame, hints_area, self.toast.as_ref(), self.hints());
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        tick_toast(&mut self.toast);
        match self.state {
            ReviewState::Card => return self.handle_card_key(code),
            ReviewState::Edit(EditField::Category) => self.handle_category_key(code),
            ReviewState::Edit(EditField::Subcategory) => self.handle_subcategory_key(code),
        }
        ViewAction::Continue
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> ViewAction {
        if self.state != ReviewState::Card || self.session.current().is_none() {
            return ViewAction::Continue;
        }
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.card_area.contains(Position::new(event.column, event.row)) {
                    self.swipe.press(event.column);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => self.swipe.drag(event.column),
            MouseEventKind::Up(MouseButton::Left) => match self.swipe.release() {
                Some(Swipe::Right) => self.accept(),
                Some(Swipe::Left) => self.begin_edit(),
                None => {}
            },
            _ => {}
        }
        ViewAction::Continue
    }

    fn busy(&self) -> Option<&'static str> {
        self.pending.map(Pending::label)
    }

    fn run_pending(&mut self, backend: &dyn LedgerBackend) {
        let Some(op) = self.pending.take() else {
            return;
        };
        let result = match op {
            Pending::Refresh => self.refresh(backend),
            Pending::Submit => self.submit(backend),
            Pending::Process => self.process(backend),
        };
        if let Err(e) = result {
            self.toast = Some(Toast::error(op.failure_title(), &e));
        }
        self.swipe.disabled = false;
    }
}

fn describe(label: Label) -> String {
    match label.subcategory {
        Some(sub) => format!("{} / {sub}", label.category),
        None => label.category.to_string(),
    }
}

fn picker_line(marker: &str, text: &str, selected: bool) -> Line<'static> {
    let style = if selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(Span::styled(format!("   {marker} {text}"), style))
}

pub fn run(settings: &Settings) -> Result<()> {
    let client = WebhookClient::new(settings)?;
    let mut screen = ReviewScreen::new("LedgerLens: Review transactions");
    run_view(&mut screen, &client)?;

    match unsubmitted_warning(screen.unsubmitted()) {
        Some(warning) => println!("{warning}"),
        None => println!("Review complete!"),
    }
    Ok(())
}

/// Exit notice for labels that never reached the backend.
pub(crate) fn unsubmitted_warning(left: usize) -> Option<ColoredString> {
    (left > 0).then(|| {
        format!("{left} categorized transactions were not submitted.")
            .as_str()
            .yellow()
    })
}
