use crossterm::event::{KeyCode, MouseEvent};
use rand::seq::SliceRandom;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::api::{LedgerBackend, WebhookClient};
use crate::error::Result;
use crate::settings::Settings;
use crate::tui::{
    render_footer, render_header, run_view, tick_toast, Toast, View, ViewAction, FOOTER_STYLE,
    TITLE_STYLE,
};

use super::analytics::AnalyticsScreen;
use super::guide::GuideScreen;
use super::review::{unsubmitted_warning, ReviewScreen};
use super::rules_manager::RulesManager;

const GREETINGS: &[&str] = &[
    "Let's see where the money went.",
    "Fresh statement? Let's sort it.",
    "A few swipes and the books are tidy.",
    "The spreadsheet misses you.",
    "Ready when you are.",
    "Nothing uncategorized stays that way for long.",
    "Every rupee in its place.",
    "Back again? Brilliant.",
    "Let's put some labels on things.",
];

const MENU_ITEMS: &[&str] = &[
    "Review transactions",
    "Process new statement",
    "Transaction analytics",
    "Category rules",
    "User guide",
    "Quit",
];

enum DashboardScreen {
    Home,
    Review(ReviewScreen),
    Analytics(AnalyticsScreen),
    Rules(RulesManager),
    Guide(GuideScreen),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HomePending {
    Count,
    Process,
}

struct Dashboard {
    screen: DashboardScreen,
    greeting: String,
    location: String,
    menu_selection: usize,
    pending_count: Option<usize>,
    pending: Option<HomePending>,
    parked_review: Option<ReviewScreen>,
    toast: Option<Toast>,
}

impl Dashboard {
    fn new(user_name: &str, location: String) -> Self {
        let mut rng = rand::thread_rng();
        let random_greeting = GREETINGS
            .choose(&mut rng)
            .unwrap_or(&"Hello.")
            .to_string();
        let first_name = user_name.split_whitespace().next().unwrap_or("");
        let greeting = if first_name.is_empty() {
            format!("LedgerLens: {random_greeting}")
        } else {
            format!("Hello, {first_name}. {random_greeting}")
        };
        Self {
            screen: DashboardScreen::Home,
            greeting,
            location,
            menu_selection: 0,
            pending_count: None,
            pending: Some(HomePending::Count),
            parked_review: None,
            toast: None,
        }
    }

    fn draw_home(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep, stats_area, menu_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        render_header(frame, header_area, sep, &self.greeting);

        let waiting = match (self.pending, self.pending_count) {
            (Some(_), _) => "\u{2026}".to_string(),
            (None, Some(n)) => n.to_string(),
            (None, None) => "unknown".to_string(),
        };
        let parked = self
            .parked_review
            .as_ref()
            .map(ReviewScreen::unsubmitted)
            .unwrap_or(0);
        let mut stats = vec![
            Line::from(""),
            Line::from(vec![
                Span::raw(" Backend        "),
                Span::styled(self.location.clone(), FOOTER_STYLE),
            ]),
            Line::from(format!(" Uncategorized  {waiting}")),
        ];
        if parked > 0 {
            stats.push(Line::from(format!(" Not submitted  {parked}")));
        }
        frame.render_widget(Paragraph::new(stats), stats_area);

        let mut lines = vec![Line::from(Span::styled(
            " What would you like to do?",
            TITLE_STYLE,
        ))];
        for (i, item) in MENU_ITEMS.iter().enumerate() {
            let marker = if i == self.menu_selection { ">" } else { " " };
            let label = match (i, self.pending_count) {
                (0, Some(n)) => format!(" {marker} {item} ({n})"),
                _ => format!(" {marker} {item}"),
            };
            let style = if i == self.menu_selection {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(label, style)));
        }
        frame.render_widget(Paragraph::new(lines), menu_area);

        let hints = match self.pending {
            Some(HomePending::Process) => "Processing new statement\u{2026}",
            Some(HomePending::Count) => "Loading\u{2026}",
            None => "Up/Down=navigate  Enter=select  r=refresh  q=quit",
        };
        render_footer(frame, hints_area, self.toast.as_ref(), hints);
    }

    fn handle_home_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Up => self.menu_selection = self.menu_selection.saturating_sub(1),
            KeyCode::Down => {
                self.menu_selection = (self.menu_selection + 1).min(MENU_ITEMS.len() - 1);
            }
            KeyCode::Char('r') => self.pending = Some(HomePending::Count),
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Enter => match self.menu_selection {
                0 => self.screen = DashboardScreen::Review(self.enter_review()),
                1 => self.pending = Some(HomePending::Process),
                2 => self.screen = DashboardScreen::Analytics(AnalyticsScreen::new(&self.greeting)),
                3 => self.screen = DashboardScreen::Rules(RulesManager::new(&self.greeting)),
                4 => self.screen = DashboardScreen::Guide(GuideScreen::new(&self.greeting)),
                _ => return ViewAction::Close,
            },
            _ => {}
        }
        ViewAction::Continue
    }

    /// Reuse the previous review so unsubmitted labels survive a trip home.
    fn enter_review(&mut self) -> ReviewScreen {
        match self.parked_review.take() {
            Some(mut review) => {
                review.reload();
                review
            }
            None => ReviewScreen::new(&self.greeting),
        }
    }

    fn return_home(&mut self) {
        let previous = std::mem::replace(&mut self.screen, DashboardScreen::Home);
        if let DashboardScreen::Review(review) = previous {
            let left = review.unsubmitted();
            if left > 0 {
                self.toast = Some(Toast::info(
                    "Not submitted yet",
                    format!("{left} categorized transactions are waiting in Review"),
                ));
            }
            self.parked_review = Some(review);
        }
        self.pending = Some(HomePending::Count);
    }

    /// Labels waiting in the open or parked review screen.
    fn unsubmitted(&self) -> usize {
        match &self.screen {
            DashboardScreen::Review(review) => review.unsubmitted(),
            _ => self
                .parked_review
                .as_ref()
                .map(ReviewScreen::unsubmitted)
                .unwrap_or(0),
        }
    }

    fn run_home_pending(&mut self, op: HomePending, backend: &dyn LedgerBackend) {
        if op == HomePending::Process {
            match backend.process_statement(None) {
                Ok(()) => self.toast = Some(Toast::success("Statement processed", "")),
                Err(e) => {
                    self.toast = Some(Toast::error("Processing failed", &e));
                    return;
                }
            }
        }
        match backend.fetch_uncategorized() {
            Ok(txns) => self.pending_count = Some(txns.len()),
            Err(e) => {
                self.pending_count = None;
                self.toast = Some(Toast::error("Backend unavailable", &e));
            }
        }
    }
}

impl View for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        match &mut self.screen {
            DashboardScreen::Home => self.draw_home(frame),
            DashboardScreen::Review(view) => view.draw(frame),
            DashboardScreen::Analytics(view) => view.draw(frame),
            DashboardScreen::Rules(view) => view.draw(frame),
            DashboardScreen::Guide(view) => view.draw(frame),
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        let action = match &mut self.screen {
            DashboardScreen::Home => {
                tick_toast(&mut self.toast);
                return self.handle_home_key(code);
            }
            DashboardScreen::Review(view) => view.handle_key(code),
            DashboardScreen::Analytics(view) => view.handle_key(code),
            DashboardScreen::Rules(view) => view.handle_key(code),
            DashboardScreen::Guide(view) => view.handle_key(code),
        };
        if let ViewAction::Close = action {
            self.return_home();
        }
        ViewAction::Continue
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> ViewAction {
        if let DashboardScreen::Review(view) = &mut self.screen {
            if let ViewAction::Close = view.handle_mouse(event) {
                self.return_home();
            }
        }
        ViewAction::Continue
    }

    fn busy(&self) -> Option<&'static str> {
        match &self.screen {
            DashboardScreen::Home => self.pending.map(|p| match p {
                HomePending::Count => "Loading\u{2026}",
                HomePending::Process => "Processing new statement\u{2026}",
            }),
            DashboardScreen::Review(view) => view.busy(),
            DashboardScreen::Analytics(view) => view.busy(),
            DashboardScreen::Rules(view) => view.busy(),
            DashboardScreen::Guide(view) => view.busy(),
        }
    }

    fn run_pending(&mut self, backend: &dyn LedgerBackend) {
        match &mut self.screen {
            DashboardScreen::Home => {
                if let Some(op) = self.pending.take() {
                    self.run_home_pending(op, backend);
                }
            }
            DashboardScreen::Review(view) => view.run_pending(backend),
            DashboardScreen::Analytics(view) => view.run_pending(backend),
            DashboardScreen::Rules(view) => view.run_pending(backend),
            DashboardScreen::Guide(view) => view.run_pending(backend),
        }
    }
}

pub fn run(settings: &Settings) -> Result<()> {
    let client = WebhookClient::new(settings)?;
    let mut dashboard = Dashboard::new(&settings.user_name, client.location());
    run_view(&mut dashboard, &client)?;
    if let Some(warning) = unsubmitted_warning(dashboard.unsubmitted()) {
        println!("{warning}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::models::sample_transaction;

    fn backend() -> FakeBackend {
        FakeBackend::with_uncategorized(vec![
            sample_transaction(1, "Swiggy order", 320.0),
            sample_transaction(2, "Salary", 0.0),
        ])
    }

    fn loaded(backend: &FakeBackend) -> Dashboard {
        let mut d = Dashboard::new("Asha Rao", backend.location());
        d.run_pending(backend);
        d
    }

    #[test]
    fn test_greeting_uses_first_name() {
        let d = Dashboard::new("Asha Rao", "memory".into());
        assert!(d.greeting.starts_with("Hello, Asha."));
        let d = Dashboard::new("", "memory".into());
        assert!(d.greeting.starts_with("LedgerLens: "));
    }

    #[test]
    fn test_home_counts_pending() {
        let backend = backend();
        let d = loaded(&backend);
        assert_eq!(d.pending_count, Some(2));
        assert!(d.busy().is_none());
    }

    #[test]
    fn test_review_keeps_labels_between_visits() {
        let backend = backend();
        let mut d = loaded(&backend);
        d.handle_key(KeyCode::Enter);
        assert!(matches!(d.screen, DashboardScreen::Review(_)));
        d.run_pending(&backend);
        d.handle_key(KeyCode::Enter);
        d.handle_key(KeyCode::Char('q'));

        assert!(matches!(d.screen, DashboardScreen::Home));
        assert_eq!(d.parked_review.as_ref().map(ReviewScreen::unsubmitted), Some(1));
        assert!(d.toast.is_some());

        d.run_pending(&backend);
        d.handle_key(KeyCode::Enter);
        d.run_pending(&backend);
        match &d.screen {
            DashboardScreen::Review(review) => assert_eq!(review.unsubmitted(), 1),
            _ => panic!("expected review screen"),
        }
    }

    #[test]
    fn test_unsubmitted_counts_open_and_parked_review() {
        let backend = backend();
        let mut d = loaded(&backend);
        assert_eq!(d.unsubmitted(), 0);
        d.handle_key(KeyCode::Enter);
        d.run_pending(&backend);
        d.handle_key(KeyCode::Enter);
        assert_eq!(d.unsubmitted(), 1);

        d.handle_key(KeyCode::Esc);
        assert!(matches!(d.screen, DashboardScreen::Home));
        assert_eq!(d.unsubmitted(), 1);
        assert!(unsubmitted_warning(d.unsubmitted()).is_some());
    }

    #[test]
    fn test_process_from_menu() {
        let backend = backend();
        let mut d = loaded(&backend);
        d.handle_key(KeyCode::Down);
        d.handle_key(KeyCode::Enter);
        assert_eq!(d.busy(), Some("Processing new statement\u{2026}"));
        d.run_pending(&backend);
        assert_eq!(backend.processed.borrow().len(), 1);
        assert_eq!(d.pending_count, Some(2));
    }

    #[test]
    fn test_backend_failure_is_a_toast() {
        let backend = backend();
        *backend.fail.borrow_mut() = true;
        let d = loaded(&backend);
        assert_eq!(d.pending_count, None);
        assert!(d.toast.is_some());
    }

    #[test]
    fn test_quit_item_closes() {
        let backend = backend();
        let mut d = loaded(&backend);
        for _ in 0..MENU_ITEMS.len() {
            d.handle_key(KeyCode::Down);
        }
        assert!(matches!(d.handle_key(KeyCode::Enter), ViewAction::Close));
    }
}
