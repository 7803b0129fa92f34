use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use decathlon_terminal::api::{HttpStandingsApi, StandingsService};
use decathlon_terminal::binder::RenderPhase;
use decathlon_terminal::config::{AppConfig, ServiceSource};
use decathlon_terminal::demo_service::DemoService;
use decathlon_terminal::provider::spawn_provider;
use decathlon_terminal::selector::ModeSelector;
use decathlon_terminal::standings::{PresentationOrdering, format_points};
use decathlon_terminal::state::{
    AppState, Delta, InputMode, ProviderCommand, ScoreField, StatusKind, apply_delta,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(state: AppState, cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx: Some(cmd_tx),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.input_mode != InputMode::Normal {
            self.on_input_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('m') | KeyCode::Char('M') => {
                let cmd = self.state.toggle_mode();
                self.send(cmd);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let cmd = self.state.request_refresh();
                self.send(cmd);
            }
            KeyCode::Char('a') | KeyCode::Char('A') => self.state.begin_add_competitor(),
            KeyCode::Char('s') | KeyCode::Char('S') => self.state.begin_score(),
            KeyCode::Char('e') | KeyCode::Char('E') => {
                let cmd = self.state.request_export();
                self.send(cmd);
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.cancel_input(),
            KeyCode::Enter => {
                if let Some(cmd) = self.state.submit_input() {
                    self.send(cmd);
                }
            }
            KeyCode::Tab => self.state.cycle_score_field(),
            KeyCode::Left if self.state.score_field == ScoreField::Event => {
                self.state.cycle_event(false)
            }
            KeyCode::Right if self.state.score_field == ScoreField::Event => {
                self.state.cycle_event(true)
            }
            KeyCode::Backspace => self.state.input_backspace(),
            KeyCode::Char(c) => self.state.input_char(c),
            _ => {}
        }
    }

    fn send(&mut self, cmd: ProviderCommand) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Service unavailable");
            return;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Service worker stopped");
            self.state.set_error("Network error");
            self.cmd_tx = None;
        }
    }

    fn shutdown(&mut self) {
        self.state.shutdown();
        self.cmd_tx = None;
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env().context("invalid configuration")?;
    let service: Box<dyn StandingsService + Send> = match config.source {
        ServiceSource::Http => Box::new(HttpStandingsApi::new(&config.base_url, config.timeout)?),
        ServiceSource::Demo => Box::new(DemoService::seeded()),
    };

    let selector = ModeSelector::new(config.initial_mode)
        .with_degrade_on_export(config.export_degrades_ordering);
    let mut state = AppState::new(selector);
    state.export_dir = config.export_dir.clone();
    state.push_log(match config.source {
        ServiceSource::Http => format!("[INFO] Service: {}", config.base_url),
        ServiceSource::Demo => "[INFO] Service: offline demo".to_string(),
    });

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let _worker = spawn_provider(service, tx, cmd_rx);

    let mut app = App::new(state, cmd_tx);
    let initial = app.state.request_refresh();
    app.send(initial);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Closing the command channel ends the worker once any in-flight request returns.
    app.shutdown();

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        if app.state.take_refresh_request() {
            let cmd = app.state.request_refresh();
            app.send(cmd);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let form_height = if state.input_mode == InputMode::Normal { 0 } else { 3 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(form_height),
            Constraint::Length(1),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_standings(frame, chunks[1], state);
    if form_height > 0 {
        render_form(frame, chunks[2], state);
    }
    render_status(frame, chunks[3], state);
    render_console(frame, chunks[4], state);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[5]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size(), state);
    }
}

fn header_text(state: &AppState) -> String {
    let mut text = format!(
        "STANDINGS | {} | Order: {} | {}",
        state.mode().label(),
        state.selector.ordering().label(),
        phase_label(state.phase())
    );
    if let Some(last) = &state.last_score {
        text.push_str(&format!(
            " | Last: {} {} {} pts",
            last.competitor_name,
            last.event_id,
            format_points(last.points)
        ));
    }
    text
}

fn phase_label(phase: RenderPhase) -> &'static str {
    match phase {
        RenderPhase::Idle => "Idle",
        RenderPhase::Fetching => "Loading...",
        RenderPhase::Rendered => "Up to date",
        RenderPhase::Error => "Fetch failed",
    }
}

fn footer_text(state: &AppState) -> &'static str {
    match (state.input_mode, state.score_field) {
        (InputMode::Normal, _) => {
            "a Add | s Score | m Mode | r Refresh | e Export | ? Help | q Quit"
        }
        (InputMode::AddCompetitor, _) => "Type name | Enter Add | Esc Cancel",
        (InputMode::Score, ScoreField::Event) => {
            "←/→ Event | Tab Next field | Enter Save | Esc Cancel"
        }
        (InputMode::Score, _) => "Type | Tab Next field | Enter Save | Esc Cancel",
    }
}

fn standings_columns(events: usize) -> Vec<Constraint> {
    let mut widths = Vec::with_capacity(events + 2);
    widths.push(Constraint::Length(24));
    widths.extend(std::iter::repeat(Constraint::Fill(1)).take(events));
    widths.push(Constraint::Length(8));
    widths
}

fn render_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let header = state.table.header();
    let widths = standings_columns(header.len().saturating_sub(2));
    let bold = Style::default().add_modifier(Modifier::BOLD);
    render_row(frame, sections[0], &widths, &header.columns, bold);

    let body = state.table.body();
    let list_area = sections[1];
    if body.is_empty() {
        let text = match state.phase() {
            RenderPhase::Fetching | RenderPhase::Idle => "Loading standings...",
            _ => "No competitors yet",
        };
        let empty = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let visible = (list_area.height as usize).min(body.len());
    for (i, row) in body.rows.iter().take(visible).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let style = if i == 0 && state.selector.ordering() == PresentationOrdering::Ranked {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        render_row(frame, row_area, &widths, row, style);
    }
}

fn render_row(frame: &mut Frame, area: Rect, widths: &[Constraint], cells: &[String], style: Style) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.to_vec())
        .split(area);
    let last = cells.len().saturating_sub(1);
    for (idx, (col, text)) in cols.iter().zip(cells).enumerate() {
        // Event cells with no score show a dash; names and totals are never blank.
        let shown = if text.is_empty() && idx != 0 && idx != last {
            "-"
        } else {
            text.as_str()
        };
        frame.render_widget(Paragraph::new(shown).style(style), *col);
    }
}

fn render_form(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = Style::default().fg(Color::Black).bg(Color::Cyan);
    let plain = Style::default();
    let line = match state.input_mode {
        InputMode::AddCompetitor => Line::from(vec![
            Span::raw("Name: "),
            Span::styled(format!("{}_", state.form.name), focused),
        ]),
        InputMode::Score => {
            let pick = |field: ScoreField| {
                if state.score_field == field { focused } else { plain }
            };
            let event = state
                .selected_event()
                .map(|(_, label)| label)
                .unwrap_or("-");
            Line::from(vec![
                Span::raw("Competitor: "),
                Span::styled(format!("{} ", state.form.score_name), pick(ScoreField::Competitor)),
                Span::raw("  Event: "),
                Span::styled(format!("< {event} >"), pick(ScoreField::Event)),
                Span::raw("  Result: "),
                Span::styled(format!("{} ", state.form.raw), pick(ScoreField::Raw)),
            ])
        }
        InputMode::Normal => Line::default(),
    };
    let title = match state.input_mode {
        InputMode::AddCompetitor => "Add competitor",
        _ => "Save score",
    };
    let form = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(form, area);
}

fn render_status(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(status) = &state.status else {
        return;
    };
    let style = match status.kind {
        StatusKind::Info => Style::default().fg(Color::Green),
        StatusKind::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    };
    frame.render_widget(Paragraph::new(status.text.as_str()).style(style), area);
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let inner_height = area.height.saturating_sub(1) as usize;
    let skip = state.logs.len().saturating_sub(inner_height);
    let text = state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let console = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP).title("Console"));
    frame.render_widget(console, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup = centered_rect(60, 60, area);
    let export_note = if state.selector.degrades_on_export() {
        "After an export the table keeps the service's order\ninstead of ranking by total."
    } else {
        "Exports leave the ranking unchanged."
    };
    let text = format!(
        "\
a      add a competitor to the current mode
s      save a score (Tab moves between fields)
m      switch decathlon / heptathlon
r      reload standings
e      export results.csv
?      toggle this help
q      quit

{export_note}"
    );
    frame.render_widget(Clear, popup);
    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help"));
    frame.render_widget(help, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
