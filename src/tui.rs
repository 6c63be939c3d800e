use std::io::stdout;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseEvent,
};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::api::LedgerBackend;
use crate::error::{LedgerError, Result};
use crate::fmt::signed_money;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const BORDER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

/// Signed amount as a colored Span: red for money out, green for money in.
pub fn money_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(signed_money(amount), style)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Greeting on the left, today's date on the right, thick rule below.
pub fn render_header(frame: &mut Frame, header: Rect, sep: Rect, title: &str) {
    let date = chrono::Local::now().format("%a %d %b %Y").to_string();
    let pad = (header.width as usize).saturating_sub(title.chars().count() + date.len() + 2);
    let line = Line::from(vec![
        Span::styled(format!(" {title}"), HEADER_STYLE),
        Span::raw(" ".repeat(pad)),
        Span::styled(date, FOOTER_STYLE),
    ]);
    frame.render_widget(Paragraph::new(line), header);

    let sep_line = "\u{2501}".repeat(sep.width as usize);
    frame.render_widget(Paragraph::new(sep_line).style(BORDER_STYLE), sep);
}

// ---------------------------------------------------------------------------
// Toasts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Error,
}

/// A title + description notice that fades after a few key presses.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub kind: ToastKind,
    ttl: u8,
}

impl Toast {
    const TTL: u8 = 3;

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind: ToastKind::Success,
            ttl: Self::TTL,
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind: ToastKind::Info,
            ttl: Self::TTL,
        }
    }

    pub fn error(title: impl Into<String>, err: &LedgerError) -> Self {
        Self {
            title: title.into(),
            description: err.to_string(),
            kind: ToastKind::Error,
            ttl: Self::TTL,
        }
    }

    pub fn line(&self) -> Line<'static> {
        let style = match self.kind {
            ToastKind::Success => AMOUNT_POS_STYLE,
            ToastKind::Info => Style::new().fg(Color::Yellow),
            ToastKind::Error => AMOUNT_NEG_STYLE,
        };
        Line::from(vec![
            Span::styled(format!(" {}", self.title), style.add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", self.description), style),
        ])
    }
}

/// Count down a toast on each key press, dropping it when expired.
pub fn tick_toast(toast: &mut Option<Toast>) {
    if let Some(t) = toast {
        t.ttl = t.ttl.saturating_sub(1);
        if t.ttl == 0 {
            *toast = None;
        }
    }
}

/// Footer line: toast when there is one, key hints otherwise.
pub fn render_footer(frame: &mut Frame, area: Rect, toast: Option<&Toast>, hints: &str) {
    match toast {
        Some(t) => frame.render_widget(Paragraph::new(t.line()), area),
        None => frame.render_widget(Paragraph::new(format!(" {hints}")).style(FOOTER_STYLE), area),
    }
}

// ---------------------------------------------------------------------------
// View infrastructure
// ---------------------------------------------------------------------------

pub enum ViewAction {
    Continue,
    Close,
}

/// An interactive screen. Network work is queued by `handle_key` and run by
/// the event loop via `run_pending` after a "busy" frame has been drawn.
pub trait View {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ViewAction;
    fn handle_mouse(&mut self, _event: MouseEvent) -> ViewAction {
        ViewAction::Continue
    }
    /// Label for the in-flight request, if one is queued.
    fn busy(&self) -> Option<&'static str> {
        None
    }
    fn run_pending(&mut self, _backend: &dyn LedgerBackend) {}
}

/// Run an interactive ratatui view. Sets up the terminal, mouse capture,
/// event loop and panic hook, then restores the terminal on exit.
pub fn run_view(view: &mut dyn View, backend: &dyn LedgerBackend) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| view.draw(frame)) {
            break Err(e.into());
        }

        if view.busy().is_some() {
            view.run_pending(backend);
            continue;
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                if let ViewAction::Close = view.handle_key(key.code) {
                    break Ok(());
                }
            }
            Ok(Event::Mouse(mouse)) => {
                if let ViewAction::Close = view.handle_mouse(mouse) {
                    break Ok(());
                }
            }
            _ => {}
        }
    };

    let _ = execute!(stdout(), DisableMouseCapture);
    drop(terminal);
    ratatui::restore();
    result
}
