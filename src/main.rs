use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};

use dsmatch_terminal::api::HttpGateway;
use dsmatch_terminal::config::Settings;
use dsmatch_terminal::presenter::{
    self, EXAMPLE_HINTS, LandingView, Link, MatchCard, ProfileView, RenderTree, ResultsView,
    SkillRow,
};
use dsmatch_terminal::state::{AppState, Delta, ProviderCommand, Screen, apply_delta};
use dsmatch_terminal::{logging, worker};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    links: Vec<Link>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>, settings: &Settings) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
            links: presenter::landing_links(settings),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::F(1) => {
                self.state.help_overlay = !self.state.help_overlay;
                return;
            }
            KeyCode::F(2) => {
                self.state.diagnostics_overlay = !self.state.diagnostics_overlay;
                return;
            }
            KeyCode::Esc if self.state.help_overlay || self.state.diagnostics_overlay => {
                self.state.help_overlay = false;
                self.state.diagnostics_overlay = false;
                return;
            }
            _ => {}
        }

        match self.state.screen() {
            Screen::Landing => self.on_landing_key(key, ctrl),
            Screen::Results => self.on_results_key(key),
        }
    }

    fn on_landing_key(&mut self, key: KeyEvent, ctrl: bool) {
        match key.code {
            KeyCode::Enter => {
                let cmd = self.state.submit();
                self.dispatch(cmd);
            }
            KeyCode::Char('e') if ctrl => {
                let cmd = self.state.load_example();
                self.dispatch(cmd);
            }
            KeyCode::Char('u') if ctrl => self.state.clear_input(),
            KeyCode::Backspace => self.state.pop_char(),
            KeyCode::Char(c) if !ctrl => self.state.push_char(c),
            _ => {}
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc if self.state.profile_overlay => self.state.profile_overlay = false,
            KeyCode::Char('b') | KeyCode::Esc => self.state.reset(),
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Right => self.state.select_next_match(),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::Left => self.state.select_prev_match(),
            KeyCode::Char('v') | KeyCode::Enter => self.state.toggle_profile(),
            _ => {}
        }
    }

    fn dispatch(&mut self, cmd: Option<ProviderCommand>) {
        let Some(cmd) = cmd else {
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Provider unavailable");
            self.state.reset();
            return;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider request failed");
            self.state.reset();
        }
    }
}

fn main() -> Result<()> {
    let settings = Settings::load();
    if let Err(err) = logging::init(&settings) {
        eprintln!("warning: {err:#}");
    }
    let gateway = HttpGateway::new(&settings).context("failed to set up matchmaker gateway")?;
    tracing::info!(base_url = gateway.base_url(), "starting");

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let _stats = worker::spawn_stats_fetch(Box::new(gateway.clone()), tx.clone());
    let _provider = worker::spawn_provider(Box::new(gateway), tx, cmd_rx);

    let mut app = App::new(Some(cmd_tx), &settings);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

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
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
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
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match presenter::render_tree(&app.state) {
        RenderTree::Landing(view) => render_landing(frame, chunks[1], &view, &app.links),
        RenderTree::Results(view) => render_results(frame, chunks[1], &view),
    }

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    let full = frame.size();
    if app.state.diagnostics_overlay {
        render_diagnostics_overlay(frame, full, &app.state);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, full);
    }
}

fn header_text(state: &AppState) -> String {
    let title = match state.screen() {
        Screen::Landing => "AI/DS MATCHMAKER | Find your perfect AI/DS partner".to_string(),
        Screen::Results => "AI/DS MATCHMAKER | Analysis complete".to_string(),
    };
    let line1 = format!(" [AI] {title}");
    let line2 = "      Intelligent Collaboration Platform".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen() {
        Screen::Landing => {
            "Type to edit | Enter Analyze | Ctrl+E Try Example | Ctrl+U Clear | F1 Help | Ctrl+C Quit"
                .to_string()
        }
        Screen::Results => {
            "b/Esc Back to Home | j/k/↑/↓ Select match | Enter/v View Profile | F1 Help | q Quit"
                .to_string()
        }
    }
}

fn render_landing(frame: &mut Frame, area: Rect, view: &LandingView, links: &[Link]) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_stats(frame, sections[0], view);
    render_input(frame, sections[1], view);
    render_actions(frame, sections[2], view);

    let links_text = links
        .iter()
        .map(|link| format!("{}: {}", link.label, link.url))
        .collect::<Vec<_>>()
        .join("   ");
    let links = Paragraph::new(links_text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(links, sections[3]);
}

fn render_stats(frame: &mut Frame, area: Rect, view: &LandingView) {
    if view.stats.is_empty() {
        return;
    }
    let constraints = vec![Constraint::Ratio(1, view.stats.len() as u32); view.stats.len()];
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);
    for (card, col) in view.stats.iter().zip(cols.iter()) {
        let text = vec![
            Line::from(Span::styled(
                card.value.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(card.label, Style::default().fg(Color::Gray))),
        ];
        let widget = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(widget, *col);
    }
}

fn render_input(frame: &mut Frame, area: Rect, view: &LandingView) {
    let block = Block::default()
        .title("Try the AI Analysis Demo")
        .borders(Borders::ALL);

    let paragraph = if view.show_examples {
        let mut lines = vec![
            Line::from(Span::styled(
                "Describe your AI/DS experience and goals...",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Example:",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        for hint in EXAMPLE_HINTS {
            lines.push(Line::from(Span::styled(
                format!("  • {hint}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
        Paragraph::new(lines)
    } else {
        let cursor = if view.analyzing { "" } else { "▏" };
        Paragraph::new(format!("{}{cursor}", view.input))
    };

    frame.render_widget(paragraph.wrap(Wrap { trim: false }).block(block), area);
}

fn render_actions(frame: &mut Frame, area: Rect, view: &LandingView) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(20)])
        .split(area);

    let submit_style = if view.submit_enabled {
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray).bg(Color::DarkGray)
    };
    let submit = Paragraph::new(format!("{} (Enter)", view.submit_label))
        .alignment(Alignment::Center)
        .style(submit_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(submit, cols[0]);

    let example = Paragraph::new("Try Example (^E)")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(example, cols[1]);
}

fn render_results(frame: &mut Frame, area: Rect, view: &ResultsView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(7),
            Constraint::Min(6),
        ])
        .split(area);

    render_skills(frame, rows[0], &view.skills);
    render_scorecards(frame, rows[1], view);
    render_matches(frame, rows[2], view);

    if let Some(profile) = &view.profile {
        render_profile_overlay(frame, area, profile);
    }
}

fn render_skills(frame: &mut Frame, area: Rect, skills: &[SkillRow]) {
    let block = Block::default()
        .title("Extracted Skills & Confidence")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if skills.is_empty() {
        let empty = Paragraph::new("No skills extracted").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    const ROW_HEIGHT: u16 = 3;
    if inner.height < ROW_HEIGHT {
        return;
    }
    let visible = (inner.height / ROW_HEIGHT) as usize;
    for (i, skill) in skills.iter().take(visible).enumerate() {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + (i as u16) * ROW_HEIGHT,
            width: inner.width,
            height: ROW_HEIGHT,
        };
        let lines = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(row_area);

        let title = Line::from(vec![
            Span::styled(
                skill.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{} Confidence", skill.confidence),
                Style::default().fg(Color::Magenta),
            ),
        ]);
        frame.render_widget(Paragraph::new(title), lines[0]);
        frame.render_widget(
            Paragraph::new(format!("Evidence found: {}", skill.evidence))
                .style(Style::default().fg(Color::Gray)),
            lines[1],
        );
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Blue).bg(Color::Black))
            .ratio(skill.ratio)
            .label("");
        frame.render_widget(gauge, lines[2]);
    }
}

fn render_scorecards(frame: &mut Frame, area: Rect, view: &ResultsView) {
    let cards = &view.scorecards;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let mut experience = vec![Line::from(Span::styled(
        cards.experience_level.clone(),
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
    ))];
    if let Some(approach) = &cards.problem_solving {
        experience.push(Line::from(format!("Approach: {approach}")));
    }
    frame.render_widget(
        Paragraph::new(experience)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Experience Level").borders(Borders::ALL)),
        cols[0],
    );

    let mut collab = vec![Line::from(Span::styled(
        cards.collaboration_style.clone(),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ))];
    if !cards.learning_goals.is_empty() {
        collab.push(Line::from(format!(
            "Learning: {}",
            cards.learning_goals.join(", ")
        )));
    }
    frame.render_widget(
        Paragraph::new(collab)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Collaboration Style").borders(Borders::ALL)),
        cols[1],
    );

    let readiness = Gauge::default()
        .block(Block::default().title("Portfolio Readiness").borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Magenta).bg(Color::Black))
        .ratio(cards.readiness_ratio)
        .label(cards.readiness.clone());
    frame.render_widget(readiness, cols[2]);
}

fn render_matches(frame: &mut Frame, area: Rect, view: &ResultsView) {
    let block = Block::default()
        .title("Perfect Matches Found")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(cards) = &view.matches else {
        let pending = Paragraph::new("Finding collaboration partners...")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(pending, inner);
        return;
    };
    if cards.is_empty() {
        let empty = Paragraph::new("No matches returned").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let grid_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);
    let mut cells = Vec::with_capacity(4);
    for row in grid_rows.iter() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(*row);
        cells.extend(cols.iter().copied());
    }

    for (idx, (card, cell)) in cards.iter().zip(cells.into_iter()).enumerate() {
        render_match_card(frame, cell, card, idx == view.selected);
    }
}

fn render_match_card(frame: &mut Frame, area: Rect, card: &MatchCard, selected: bool) {
    let border_style = if selected {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let title = format!(" {} | {} Match ", card.initials, card.compatibility);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines = vec![
        Line::from(Span::styled(
            card.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(card.title.clone(), Style::default().fg(Color::Cyan))),
        Line::from(Span::styled(
            card.location.clone(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(format!(
            "Skill Fit {}  Learning {}  Collab {}",
            card.skill_fit, card.learning, card.collab
        )),
        Line::from(card.skills.join("  ")),
    ];
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_profile_overlay(frame: &mut Frame, area: Rect, profile: &ProfileView) {
    let popup_area = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup_area);

    let mut lines = vec![
        format!("{} - {}", profile.name, profile.title),
        profile.location.clone(),
    ];
    if let Some(bio) = &profile.bio {
        lines.push(String::new());
        lines.push(bio.clone());
    }
    push_section(&mut lines, "Learning goals", &profile.learning_goals);
    push_section(&mut lines, "Why this match", &profile.reasoning);
    push_section(&mut lines, "Suggested projects", &profile.suggested_projects);
    push_section(&mut lines, "You gain", &profile.you_gain);
    push_section(&mut lines, "They gain", &profile.they_gain);

    let profile = Paragraph::new(lines.join("\n"))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Profile").borders(Borders::ALL));
    frame.render_widget(profile, popup_area);
}

fn push_section(lines: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("{heading}:"));
    for item in items {
        lines.push(format!("  - {item}"));
    }
}

fn render_diagnostics_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(80, 50, area);
    frame.render_widget(Clear, popup_area);

    let visible = popup_area.height.saturating_sub(2) as usize;
    let text = if state.logs.is_empty() {
        "No diagnostics yet".to_string()
    } else {
        let start = state.logs.len().saturating_sub(visible);
        state
            .logs
            .iter()
            .skip(start)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    };
    let title = format!("Diagnostics | state {} | round {}", state.view, state.generation);
    let diagnostics = Paragraph::new(text).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(diagnostics, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "AI/DS Matchmaker - Help",
        "",
        "Global:",
        "  F1           Toggle help",
        "  F2           Toggle diagnostics",
        "  Ctrl+C       Quit",
        "",
        "Landing:",
        "  Enter        Analyze with AI",
        "  Ctrl+E       Try example",
        "  Ctrl+U       Clear text",
        "",
        "Results:",
        "  b / Esc      Back to Home",
        "  j/k or ↑/↓   Select match",
        "  Enter / v    View profile",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
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

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
