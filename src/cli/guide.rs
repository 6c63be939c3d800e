use colored::Colorize;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::error::Result;
use crate::tui::{render_footer, render_header, wrap_text, View, ViewAction, TITLE_STYLE};

pub const GUIDE_STEPS: [(&str, &str); 7] = [
    (
        "Process new statements",
        "Upload a bank statement where your workflow watches for them, then choose \
         \"Process new statement\" (or press p in the review screen, or run \
         `ledgerlens process`). The workflow extracts the lines and suggests a category for each.",
    ),
    (
        "View transactions",
        "Uncategorized transactions appear one card at a time: the description, who the \
         money went to or came from, the amount (red for money out, green for money in) \
         and the suggested category.",
    ),
    (
        "Categorize",
        "Swipe the card right with the mouse, or press Enter or the right arrow, to accept \
         the suggestion. Swipe left, press e or the left arrow to pick a category yourself. \
         s skips a card for later and u undoes the last one.",
    ),
    (
        "Customize categories",
        "In the editor, type to filter the fifteen categories, choose one, then choose a \
         subcategory from that category's list or leave it empty. Esc goes back a step.",
    ),
    (
        "Review and save",
        "Categorized cards stay on this machine until you press d. Submitting sends them all \
         to the workflow in one batch; if it fails nothing is lost and you can try again.",
    ),
    (
        "Load uncategorized",
        "Press r to fetch the latest uncategorized transactions. Cards you have already \
         labeled but not submitted are kept.",
    ),
    (
        "View all",
        "Transaction analytics charts every transaction by category or payment mode, for \
         debits or credits, with category, mode and amount filters. Category rules lets you \
         edit the table the workflow uses to pre-categorize.",
    ),
];

pub fn run() -> Result<()> {
    println!("{}\n", "Welcome to LedgerLens".bold());
    for (i, (title, body)) in GUIDE_STEPS.iter().enumerate() {
        println!("{}", format!("{}. {title}", i + 1).yellow().bold());
        let (wrapped, _) = wrap_text(body, 76);
        for line in wrapped.lines() {
            println!("   {line}");
        }
        println!();
    }
    Ok(())
}

pub struct GuideScreen {
    greeting: String,
    scroll: u16,
}

impl GuideScreen {
    pub fn new(greeting: &str) -> Self {
        Self {
            greeting: greeting.to_string(),
            scroll: 0,
        }
    }
}

impl View for GuideScreen {
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

        let width = (content_area.width as usize).saturating_sub(4).min(90);
        let mut lines = vec![Line::from("")];
        for (i, (title, body)) in GUIDE_STEPS.iter().enumerate() {
            lines.push(Line::from(Span::styled(format!(" {}. {title}", i + 1), TITLE_STYLE)));
            let (wrapped, _) = wrap_text(body, width);
            lines.extend(wrapped.lines().map(|l| Line::from(format!("    {l}"))));
            lines.push(Line::from(""));
        }
        let max_scroll = (lines.len() as u16).saturating_sub(content_area.height);
        self.scroll = self.scroll.min(max_scroll);
        frame.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), content_area);

        render_footer(frame, hints_area, None, "Up/Down=scroll  Esc=back");
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => return ViewAction::Close,
            _ => {}
        }
        ViewAction::Continue
    }
}
