use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::session::{Session, SessionEvent, Step};
use crate::store::CommandStore;
use crate::theme::Theme;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Runs the picker until Commit or Cancel and returns the committed command
/// text, if any. The terminal is restored on every exit path.
pub fn run_tui<S: CommandStore>(session: &mut Session<S>, theme: &Theme) -> Result<Option<String>> {
    let mut terminal = init_terminal()?;
    match run_loop(&mut terminal, session, theme) {
        Ok(output) => {
            restore_terminal(&mut terminal)?;
            Ok(output)
        }
        Err(err) => {
            let _ = restore_terminal(&mut terminal);
            Err(err)
        }
    }
}

fn init_terminal() -> Result<TuiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("failed to create terminal")
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")
}

fn run_loop<S: CommandStore>(
    terminal: &mut TuiTerminal,
    session: &mut Session<S>,
    theme: &Theme,
) -> Result<Option<String>> {
    loop {
        terminal.draw(|frame| draw_ui(frame, session, theme))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let Some(session_event) = translate_key(key) else {
            continue;
        };

        match session.apply(session_event) {
            Step::Active => {}
            Step::Committed { output, warning } => {
                if let Some(warning) = warning {
                    log::warn!("{warning}");
                }
                return Ok(output);
            }
            Step::Cancelled => return Ok(None),
        }
    }
}

fn translate_key(key: KeyEvent) -> Option<SessionEvent> {
    match key.code {
        KeyCode::Esc => Some(SessionEvent::Cancel),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(SessionEvent::Cancel)
        }
        KeyCode::Enter => Some(SessionEvent::Commit),
        KeyCode::Tab => Some(SessionEvent::Autocomplete),
        KeyCode::Up => Some(SessionEvent::SelectUp),
        KeyCode::Down => Some(SessionEvent::SelectDown),
        KeyCode::Left => Some(SessionEvent::CursorLeft),
        KeyCode::Right => Some(SessionEvent::CursorRight),
        KeyCode::Home => Some(SessionEvent::CursorHome),
        KeyCode::End => Some(SessionEvent::CursorEnd),
        KeyCode::Backspace => Some(SessionEvent::Backspace),
        KeyCode::Delete => Some(SessionEvent::DeleteForward),
        KeyCode::Char(ch) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(SessionEvent::Insert(ch.to_string()))
        }
        _ => None,
    }
}

fn draw_ui<S: CommandStore>(frame: &mut Frame, session: &Session<S>, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_query_line(frame, session, theme, chunks[0]);
    draw_suggestions(frame, session, theme, chunks[1]);
    draw_hint_bar(frame, session, theme, chunks[2]);

    let x = chunks[0].x.saturating_add(2 + session.cursor() as u16);
    frame.set_cursor_position((x, chunks[0].y));
}

fn draw_query_line<S: CommandStore>(
    frame: &mut Frame,
    session: &Session<S>,
    theme: &Theme,
    area: Rect,
) {
    let line = Line::from(vec![
        Span::styled(format!("> {}", session.query()), theme.input),
        Span::styled(session.ghost().to_string(), theme.ghost),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_suggestions<S: CommandStore>(
    frame: &mut Frame,
    session: &Session<S>,
    theme: &Theme,
    area: Rect,
) {
    let visible = session.visible_candidates();
    if visible.is_empty() {
        let hint = if session.query().is_empty() {
            "No commands stored yet"
        } else {
            "No matches (Enter runs what you typed)"
        };
        frame.render_widget(Paragraph::new(hint).style(theme.hint), area);
        return;
    }

    let items: Vec<ListItem<'_>> = visible
        .iter()
        .map(|candidate| {
            let mut spans = vec![Span::styled(candidate.record.text.clone(), theme.item)];
            if !candidate.record.tags.is_empty() {
                spans.push(Span::styled(
                    format!(" [{}]", candidate.record.tags.join(", ")),
                    theme.tag,
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(session.selected()));

    let list = List::new(items)
        .highlight_style(theme.selected)
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_hint_bar<S: CommandStore>(
    frame: &mut Frame,
    session: &Session<S>,
    theme: &Theme,
    area: Rect,
) {
    let text = format!(
        "{} matches · enter select · tab complete · esc cancel",
        session.candidates().len()
    );
    frame.render_widget(Paragraph::new(text).style(theme.hint), area);
}
