use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tracing::info;

use crate::api::{LedgerBackend, WebhookClient};
use crate::categories::Category;
use crate::error::Result;
use crate::fmt::truncate;
use crate::rules::{CategoryRule, RuleBook, RuleField, RuleFilter, RuleSort, SortDirection};
use crate::settings::Settings;
use crate::tui::{
    render_footer, render_header, run_view, tick_toast, Toast, View, ViewAction, FOOTER_STYLE,
    SELECTED_STYLE, TITLE_STYLE,
};

use super::cycle_option;

/// Display width per column, in `RuleField::ALL` order.
const COLUMN_WIDTHS: [usize; 7] = [8, 10, 22, 11, 11, 18, 18];

enum Screen {
    List,
    Edit {
        rule_id: u64,
        field: RuleField,
        input: String,
    },
    ConfirmClear(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Load,
    Save,
}

pub struct RulesManager {
    book: RuleBook,
    filter: RuleFilter,
    sort: RuleSort,
    selection: usize,
    column: usize,
    scroll_offset: usize,
    last_visible_rows: usize,
    screen: Screen,
    pending: Option<Pending>,
    toast: Option<Toast>,
    greeting: String,
    dirty: bool,
    quit_warned: bool,
}

impl RulesManager {
    pub fn new(greeting: &str) -> Self {
        Self {
            book: RuleBook::default(),
            filter: RuleFilter::default(),
            sort: RuleSort::default(),
            selection: 0,
            column: 1,
            scroll_offset: 0,
            last_visible_rows: 20,
            screen: Screen::List,
            pending: Some(Pending::Load),
            toast: None,
            greeting: greeting.to_string(),
            dirty: false,
            quit_warned: false,
        }
    }

    fn visible(&self) -> Vec<&CategoryRule> {
        self.book.view(&self.filter, self.sort)
    }

    fn selected_rule_id(&self) -> Option<u64> {
        self.visible().get(self.selection).map(|r| r.rule_id)
    }

    fn field(&self) -> RuleField {
        RuleField::ALL[self.column]
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        self.selection = self.selection.min(len.saturating_sub(1));
        self.ensure_visible(self.last_visible_rows);
    }

    fn ensure_visible(&mut self, visible_rows: usize) {
        if self.selection < self.scroll_offset {
            self.scroll_offset = self.selection;
        } else if visible_rows > 0 && self.selection >= self.scroll_offset + visible_rows {
            self.scroll_offset = self.selection - visible_rows + 1;
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.quit_warned = false;
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn sort_label(&self) -> String {
        let arrow = match self.sort.direction {
            SortDirection::Asc => "\u{2191}",
            SortDirection::Desc => "\u{2193}",
        };
        format!("{} {arrow}", self.sort.field.label())
    }

    fn row_spans(&self, rule: &CategoryRule, selected: bool) -> Line<'static> {
        let marker = if selected { " > " } else { "   " };
        let mut spans = vec![Span::raw(marker)];
        for (i, field) in RuleField::ALL.iter().enumerate() {
            let width = COLUMN_WIDTHS[i];
            let value = rule.get(*field).unwrap_or_default();
            let cell = format!("{:<width$} ", truncate(&value, width));
            let style = if selected && i == self.column {
                SELECTED_STYLE
            } else if selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(cell, style));
        }
        Line::from(spans)
    }

    fn edit_hint(&self, rule_id: u64, field: RuleField) -> Option<String> {
        match field {
            RuleField::Category => Some(
                Category::ALL
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            RuleField::Subcategory => {
                let category = self.book.find(rule_id)?.category.as_deref()?;
                let category: Category = category.parse().ok()?;
                Some(category.subcategories().join(", "))
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    fn handle_list_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Up => {
                self.selection = self.selection.saturating_sub(1);
                self.ensure_visible(self.last_visible_rows);
            }
            KeyCode::Down => {
                let len = self.visible().len();
                if len > 0 {
                    self.selection = (self.selection + 1).min(len - 1);
                    self.ensure_visible(self.last_visible_rows);
                }
            }
            KeyCode::Left => self.column = self.column.saturating_sub(1),
            KeyCode::Right => self.column = (self.column + 1).min(RuleField::ALL.len() - 1),
            KeyCode::Enter => {
                if let Some(rule_id) = self.selected_rule_id() {
                    let field = self.field();
                    if field == RuleField::RuleId {
                        self.toast = Some(Toast::info("Rule ID is fixed", "Pick another column"));
                    } else {
                        let input = self
                            .book
                            .find(rule_id)
                            .and_then(|r| r.get(field))
                            .unwrap_or_default();
                        self.screen = Screen::Edit {
                            rule_id,
                            field,
                            input,
                        };
                    }
                }
            }
            KeyCode::Char('o') => {
                self.sort.toggle(self.field());
                self.clamp_selection();
            }
            KeyCode::Char('c') => {
                let options = self.book.unique_categories();
                self.filter.category = cycle_option(&self.filter.category, &options);
                self.selection = 0;
                self.scroll_offset = 0;
            }
            KeyCode::Char('m') => {
                let options = self.book.unique_modes();
                self.filter.mode = cycle_option(&self.filter.mode, &options);
                self.selection = 0;
                self.scroll_offset = 0;
            }
            KeyCode::Char('a') => {
                let rule_id = self.book.add_rule();
                self.filter = RuleFilter::default();
                self.selection = self
                    .visible()
                    .iter()
                    .position(|r| r.rule_id == rule_id)
                    .unwrap_or(0);
                self.ensure_visible(self.last_visible_rows);
                self.mark_dirty();
                self.toast = Some(Toast::success("Added", format!("Rule {rule_id}")));
            }
            KeyCode::Char('x') => {
                if let Some(rule_id) = self.selected_rule_id() {
                    self.screen = Screen::ConfirmClear(rule_id);
                }
            }
            KeyCode::Char('s') => self.pending = Some(Pending::Save),
            KeyCode::Char('r') => self.pending = Some(Pending::Load),
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.dirty && !self.quit_warned {
                    self.quit_warned = true;
                    self.toast = Some(Toast::info(
                        "Unsaved changes",
                        "s=save, or q again to discard",
                    ));
                } else {
                    return ViewAction::Close;
                }
            }
            _ => {}
        }
        ViewAction::Continue
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Screen::Edit {
            rule_id,
            field,
            input,
        } = &mut self.screen
        else {
            return;
        };
        match code {
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => {
                let (rule_id, field) = (*rule_id, *field);
                match self.book.update(rule_id, field, input) {
                    Ok(()) => {
                        self.screen = Screen::List;
                        self.mark_dirty();
                        self.clamp_selection();
                    }
                    Err(e) => self.toast = Some(Toast::error("Invalid value", &e)),
                }
            }
            KeyCode::Esc => self.screen = Screen::List,
            _ => {}
        }
    }

    fn handle_clear_key(&mut self, code: KeyCode, rule_id: u64) {
        match code {
            KeyCode::Char('y') => {
                self.screen = Screen::List;
                match self.book.clear(rule_id) {
                    Ok(()) => {
                        self.mark_dirty();
                        self.clamp_selection();
                        self.toast = Some(Toast::success("Cleared", format!("Rule {rule_id}")));
                    }
                    Err(e) => self.toast = Some(Toast::error("Clear failed", &e)),
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => self.screen = Screen::List,
            _ => {}
        }
    }
}

impl View for RulesManager {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep, content_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        render_header(frame, header_area, sep, &self.greeting);

        if let Some(label) = self.busy() {
            frame.render_widget(
                Paragraph::new(vec![Line::from(""), Line::from(format!(" {label}"))]),
                content_area,
            );
            render_footer(frame, hints_area, None, "Please wait");
            return;
        }

        // 4 lines of title/filter/header overhead, 3 for the edit prompt
        let data_rows = (content_area.height as usize).saturating_sub(7);
        self.last_visible_rows = data_rows;

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!(" Category Rules ({})", self.book.len()),
                TITLE_STYLE,
            )),
            Line::from(Span::styled(
                format!(
                    " Category: {}   Mode: {}   Sort: {}{}",
                    self.filter.category.as_deref().unwrap_or("All"),
                    self.filter.mode.as_deref().unwrap_or("All"),
                    self.sort_label(),
                    if self.dirty { "   (unsaved)" } else { "" },
                ),
                FOOTER_STYLE,
            )),
        ];

        let mut header = vec![Span::raw("   ")];
        for (i, field) in RuleField::ALL.iter().enumerate() {
            let style = if i == self.column {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)
            };
            let width = COLUMN_WIDTHS[i];
            header.push(Span::styled(format!("{:<width$} ", field.label()), style));
        }
        lines.push(Line::from(header));

        let rows = self.visible();
        if self.book.is_empty() {
            lines.push(Line::from("   No rules yet. Press a to add one."));
        } else if rows.is_empty() {
            lines.push(Line::from("   No rules match the filters. Press c or m to widen them."));
        }
        let end = (self.scroll_offset + data_rows).min(rows.len());
        for (i, rule) in rows.iter().enumerate().take(end).skip(self.scroll_offset) {
            lines.push(self.row_spans(rule, i == self.selection));
        }

        match &self.screen {
            Screen::Edit {
                rule_id,
                field,
                input,
            } => {
                lines.push(Line::from(""));
                lines.push(Line::from(format!(
                    "   Rule {rule_id} {}: {input}\u{2588}",
                    field.label()
                )));
                if let Some(hint) = self.edit_hint(*rule_id, *field) {
                    lines.push(Line::from(Span::styled(
                        format!("   {}", truncate(&hint, area.width.saturating_sub(4) as usize)),
                        FOOTER_STYLE,
                    )));
                }
            }
            Screen::ConfirmClear(rule_id) => {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("   Clear every field of rule {rule_id}? (y/n)"),
                    Style::default().fg(Color::Yellow),
                )));
            }
            Screen::List => {}
        }

        frame.render_widget(Paragraph::new(lines), content_area);

        let hints = match self.screen {
            Screen::List => {
                "Arrows=move  Enter=edit  o=sort  c=category  m=mode  a=add  x=clear  s=save  r=reload  Esc=back"
            }
            Screen::Edit { .. } => "Enter=apply  Esc=cancel  (empty clears the field)",
            Screen::ConfirmClear(_) => "y=confirm  n=cancel",
        };
        render_footer(frame, hints_area, self.toast.as_ref(), hints);
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        tick_toast(&mut self.toast);
        match self.screen {
            Screen::List => return self.handle_list_key(code),
            Screen::Edit { .. } => self.handle_edit_key(code),
            Screen::ConfirmClear(rule_id) => self.handle_clear_key(code, rule_id),
        }
        ViewAction::Continue
    }

    fn busy(&self) -> Option<&'static str> {
        self.pending.map(|p| match p {
            Pending::Load => "Loading rules\u{2026}",
            Pending::Save => "Saving rules\u{2026}",
        })
    }

    fn run_pending(&mut self, backend: &dyn LedgerBackend) {
        match self.pending.take() {
            Some(Pending::Load) => match backend.fetch_rules() {
                Ok(rules) => {
                    self.book = RuleBook::new(rules);
                    self.dirty = false;
                    self.clamp_selection();
                }
                Err(e) => self.toast = Some(Toast::error("Could not load rules", &e)),
            },
            Some(Pending::Save) => match backend.save_rules(self.book.rules()) {
                Ok(()) => {
                    self.dirty = false;
                    info!(count = self.book.len(), "saved category rules");
                    self.toast = Some(Toast::success(
                        "Rules saved",
                        format!("{} rules", self.book.len()),
                    ));
                }
                Err(e) => self.toast = Some(Toast::error("Save failed", &e)),
            },
            None => {}
        }
    }
}

pub fn run(settings: &Settings) -> Result<()> {
    let client = WebhookClient::new(settings)?;
    let mut manager = RulesManager::new("LedgerLens: Category rules");
    run_view(&mut manager, &client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;

    fn rule(rule_id: u64, mode: &str, category: &str) -> CategoryRule {
        CategoryRule {
            rule_id,
            row_number: rule_id,
            mode: Some(mode.to_string()),
            name: Some(format!("Payee {rule_id}")),
            category: Some(category.to_string()),
            ..CategoryRule::default()
        }
    }

    fn backend() -> FakeBackend {
        let backend = FakeBackend::default();
        *backend.rules.borrow_mut() = vec![
            rule(1, "UPI", "Dining Out"),
            rule(2, "CARD", "Transport"),
            rule(3, "UPI", "Transport"),
        ];
        backend
    }

    fn loaded(backend: &FakeBackend) -> RulesManager {
        let mut m = RulesManager::new("test");
        m.run_pending(backend);
        m
    }

    fn type_text(m: &mut RulesManager, text: &str) {
        for c in text.chars() {
            m.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_loads_rules() {
        let backend = backend();
        let m = loaded(&backend);
        assert_eq!(m.visible().len(), 3);
        assert_eq!(m.selected_rule_id(), Some(1));
        assert!(!m.dirty);
    }

    #[test]
    fn test_add_and_edit_mode() {
        let backend = backend();
        let mut m = loaded(&backend);
        m.handle_key(KeyCode::Char('a'));
        assert_eq!(m.selected_rule_id(), Some(4));
        m.handle_key(KeyCode::Enter);
        type_text(&mut m, "NEFT");
        m.handle_key(KeyCode::Enter);
        assert!(matches!(m.screen, Screen::List));
        assert_eq!(m.book.find(4).unwrap().mode.as_deref(), Some("NEFT"));
        assert_eq!(m.book.find(4).unwrap().row_number, 4);
        assert!(m.dirty);
    }

    #[test]
    fn test_invalid_category_stays_in_editor() {
        let backend = backend();
        let mut m = loaded(&backend);
        m.column = 5;
        m.handle_key(KeyCode::Enter);
        for _ in 0.."Dining Out".len() {
            m.handle_key(KeyCode::Backspace);
        }
        type_text(&mut m, "Crypto");
        m.handle_key(KeyCode::Enter);
        assert!(matches!(m.screen, Screen::Edit { .. }));
        assert_eq!(m.toast.as_ref().unwrap().title, "Invalid value");
        m.handle_key(KeyCode::Esc);
        assert_eq!(m.book.find(1).unwrap().category.as_deref(), Some("Dining Out"));
    }

    #[test]
    fn test_rule_id_not_editable() {
        let backend = backend();
        let mut m = loaded(&backend);
        m.column = 0;
        m.handle_key(KeyCode::Enter);
        assert!(matches!(m.screen, Screen::List));
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let backend = backend();
        let mut m = loaded(&backend);
        m.handle_key(KeyCode::Char('x'));
        m.handle_key(KeyCode::Char('n'));
        assert!(!m.book.find(1).unwrap().is_blank());
        m.handle_key(KeyCode::Char('x'));
        m.handle_key(KeyCode::Char('y'));
        assert!(m.book.find(1).unwrap().is_blank());
        assert_eq!(m.book.len(), 3);
    }

    #[test]
    fn test_filters_cycle() {
        let backend = backend();
        let mut m = loaded(&backend);
        m.handle_key(KeyCode::Char('c'));
        assert_eq!(m.filter.category.as_deref(), Some("Dining Out"));
        m.handle_key(KeyCode::Char('c'));
        assert_eq!(m.visible().len(), 2);
        m.handle_key(KeyCode::Char('m'));
        assert_eq!(m.filter.mode.as_deref(), Some("CARD"));
        assert_eq!(m.selected_rule_id(), Some(2));
        m.handle_key(KeyCode::Char('c'));
        assert_eq!(m.filter.category, None);
    }

    #[test]
    fn test_sort_toggles_direction() {
        let backend = backend();
        let mut m = loaded(&backend);
        m.column = 0;
        m.handle_key(KeyCode::Char('o'));
        assert_eq!(m.sort.direction, SortDirection::Desc);
        assert_eq!(m.selected_rule_id(), Some(3));
    }

    #[test]
    fn test_save_writes_backend() {
        let backend = backend();
        let mut m = loaded(&backend);
        m.handle_key(KeyCode::Char('a'));
        m.handle_key(KeyCode::Char('s'));
        m.run_pending(&backend);
        assert_eq!(backend.rules.borrow().len(), 4);
        assert!(!m.dirty);
    }

    #[test]
    fn test_quit_warns_on_unsaved() {
        let backend = backend();
        let mut m = loaded(&backend);
        m.handle_key(KeyCode::Char('a'));
        assert!(matches!(m.handle_key(KeyCode::Char('q')), ViewAction::Continue));
        assert!(matches!(m.handle_key(KeyCode::Char('q')), ViewAction::Close));
    }
}
