use std::io;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Rectangle};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use tracing::{info, warn};

use wc22_analytics::analytics::{AnalyticsPayload, AnalyticsTab};
use wc22_analytics::api::{AnalyticsApi, Backend as HttpBackend};
use wc22_analytics::config::Settings;
use wc22_analytics::data_manager::{DataManagerVariant, PendingConfirmation};
use wc22_analytics::http_client::init_http_client;
use wc22_analytics::pitch::{
    self, DEFAULT_TEAL, PITCH_LENGTH, PITCH_WIDTH, PitchInput, PitchScene, Point, Primitive, Rgb,
};
use wc22_analytics::player_analysis::MatchesPhase;
use wc22_analytics::state::{
    AppState, Delta, FetchOptions, Impact, ProviderCommand, Screen, apply_delta, screen_label,
    value_label,
};
use wc22_analytics::theme::{Palette, rgb_color};
use wc22_analytics::{logging, persist, provider};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(state: AppState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn dispatch(&mut self, cmds: Vec<ProviderCommand>) {
        let Some(tx) = &self.cmd_tx else {
            return;
        };
        for cmd in cmds {
            if tx.send(cmd).is_err() {
                self.state.push_log("[WARN] Provider offline");
                self.cmd_tx = None;
                return;
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.state.help_overlay = false;
            }
            return;
        }
        if self.state.data_manager.pending.is_some() {
            self.on_confirm_key(key);
            return;
        }
        let modal_open = self.state.data_manager.open
            && self.state.data_manager.variant == DataManagerVariant::Modal;
        if modal_open {
            self.on_data_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char('1') => self.state.screen = Screen::Analysis,
            KeyCode::Char('2') => {
                self.state.screen = Screen::Analytics;
                let tab = self.state.analytics.active();
                let cmds = self.state.activate_tab(tab);
                self.dispatch(cmds);
            }
            KeyCode::Char('3') => self.state.screen = Screen::Compare,
            KeyCode::Char('4') => {
                self.state.screen = Screen::Data;
                let cmds = self.state.open_data_manager(DataManagerVariant::Panel);
                self.dispatch(cmds);
            }
            KeyCode::Char('m') => {
                let cmds = self.state.open_data_manager(DataManagerVariant::Modal);
                self.dispatch(cmds);
            }
            KeyCode::Char('T') => self.state.toggle_theme(),
            KeyCode::Char('r') => {
                let cmd = self.state.analysis.load_matches();
                self.dispatch(vec![cmd]);
            }
            _ => match self.state.screen {
                Screen::Analysis => self.on_analysis_key(key),
                Screen::Analytics => self.on_analytics_key(key),
                Screen::Compare => self.on_compare_key(key),
                Screen::Data => self.on_data_key(key),
            },
        }
    }

    fn on_analysis_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') | KeyCode::Right => self.step_moment(true),
            KeyCode::Char('p') | KeyCode::Left => self.step_moment(false),
            KeyCode::Char('h') => {
                self.state.analysis.show_heat_map = !self.state.analysis.show_heat_map;
            }
            KeyCode::Char('f') => {
                self.state.analysis.show_formation = !self.state.analysis.show_formation;
            }
            _ => self.on_selection_key(key),
        }
    }

    fn on_analytics_key(&mut self, key: KeyEvent) {
        let tab = match key.code {
            KeyCode::Tab | KeyCode::Char('l') => Some(self.state.analytics.active().next()),
            KeyCode::BackTab | KeyCode::Char('h') => Some(self.state.analytics.active().prev()),
            _ => None,
        };
        match tab {
            Some(tab) => {
                let cmds = self.state.activate_tab(tab);
                self.dispatch(cmds);
            }
            None => self.on_selection_key(key),
        }
    }

    fn on_compare_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') => self.cycle_compare_player(),
            _ => self.on_selection_key(key),
        }
    }

    /// Match/team/player navigation shared by the selection-driven screens.
    fn on_selection_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(']') => self.step_match(true),
            KeyCode::Char('[') => self.step_match(false),
            KeyCode::Char('t') => self.cycle_team(),
            KeyCode::Char('j') | KeyCode::Down => self.step_player(true),
            KeyCode::Char('k') | KeyCode::Up => self.step_player(false),
            _ => {}
        }
    }

    fn on_data_key(&mut self, key: KeyEvent) {
        let dm = &mut self.state.data_manager;
        match key.code {
            KeyCode::Esc if dm.variant == DataManagerVariant::Modal => dm.close(),
            KeyCode::Char('q') if dm.variant == DataManagerVariant::Modal => dm.close(),
            KeyCode::Char('j') | KeyCode::Down => dm.select_next(),
            KeyCode::Char('k') | KeyCode::Up => dm.select_prev(),
            KeyCode::Char('t') => dm.cycle_team_filter(),
            KeyCode::Char(']') => {
                let cmds = dm.cycle_competition(true).into_iter().collect();
                self.dispatch(cmds);
            }
            KeyCode::Char('[') => {
                let cmds = dm.cycle_competition(false).into_iter().collect();
                self.dispatch(cmds);
            }
            KeyCode::Char('R') => {
                let cmd = dm.refresh();
                self.dispatch(vec![cmd]);
            }
            KeyCode::Char('F') | KeyCode::Enter => {
                let Some(match_id) = dm.selected_status().map(|s| s.match_id) else {
                    return;
                };
                let cmds = dm.request_fetch(match_id).into_iter().collect();
                self.dispatch(cmds);
            }
            KeyCode::Char('d') => {
                if let Some(match_id) = dm.selected_status().map(|s| s.match_id) {
                    dm.request_delete(match_id);
                }
            }
            KeyCode::Char('A') => {
                dm.request_fetch_all();
            }
            _ => {}
        }
    }

    fn on_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let cmds = self.state.data_manager.confirm().into_iter().collect();
                self.dispatch(cmds);
            }
            KeyCode::Char('n') | KeyCode::Esc => self.state.data_manager.cancel(),
            _ => {}
        }
    }

    fn step_match(&mut self, forward: bool) {
        let Some(matches) = self.state.analysis.matches.data() else {
            return;
        };
        if matches.is_empty() {
            return;
        }
        let current = self
            .state
            .selection
            .match_id
            .and_then(|id| matches.iter().position(|m| m.match_id == id));
        let next = step_index(current, matches.len(), forward);
        let match_id = matches[next].match_id;
        let cmds = self.state.select_match(match_id);
        self.dispatch(cmds);
    }

    fn cycle_team(&mut self) {
        let teams = self.state.analysis.teams();
        if teams.is_empty() {
            return;
        }
        let current = self
            .state
            .selection
            .team
            .as_ref()
            .and_then(|t| teams.iter().position(|x| x == t));
        let next = step_index(current, teams.len(), true);
        let cmds = self.state.select_team(&teams[next]);
        self.dispatch(cmds);
    }

    fn step_player(&mut self, forward: bool) {
        let players = self
            .state
            .analysis
            .players_for_team(self.state.selection.team.as_deref());
        if players.is_empty() {
            return;
        }
        let current = self.state.selection.player.as_ref().and_then(|sel| {
            players
                .iter()
                .position(|p| p.id == sel.id && p.name == sel.name)
        });
        let next = step_index(current, players.len(), forward);
        let player = players[next].to_ref();
        let cmds = self.state.select_player(player);
        self.dispatch(cmds);
    }

    fn cycle_compare_player(&mut self) {
        let selected = self.state.selection.player.as_ref().and_then(|p| p.id);
        let candidates: Vec<u64> = self
            .state
            .analysis
            .players_for_team(None)
            .iter()
            .filter_map(|p| p.id)
            .filter(|id| Some(*id) != selected)
            .collect();
        if candidates.is_empty() {
            return;
        }
        let current = self
            .state
            .selection
            .compare_player
            .and_then(|id| candidates.iter().position(|c| *c == id));
        let next = step_index(current, candidates.len(), true);
        let cmds = self.state.set_compare_player(candidates[next]);
        self.dispatch(cmds);
    }

    fn step_moment(&mut self, forward: bool) {
        let total = self.state.analysis.critical_moments().len();
        if total == 0 {
            return;
        }
        let next = step_index(self.state.analysis.active_moment, total, forward);
        self.state.select_moment(next);
    }
}

fn step_index(current: Option<usize>, len: usize, forward: bool) -> usize {
    match (current, forward) {
        (None, _) => 0,
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let settings = Settings::from_env();
    logging::init(settings.log_file.as_deref())?;
    init_http_client(settings.http_timeout)?;
    info!(api = %settings.api_base, "starting");

    let mut state = AppState::with_options(
        FetchOptions::from(&settings),
        &settings.default_competition,
    );
    persist::load_into_state(&mut state);
    state.push_log(format!("[INFO] Backend: {}", settings.api_base));

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let api: Arc<dyn AnalyticsApi> = Arc::new(HttpBackend::new(settings.api_base.clone()));
    let _provider = provider::spawn_provider(api, settings.fetch_parallelism, tx, cmd_rx);

    let mut app = App::new(state, Some(cmd_tx));
    let initial = app.state.start();
    app.dispatch(initial);

    enable_raw_mode().context("enable raw mode")?;
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

    if let Err(err) = persist::save_from_state(&app.state) {
        warn!(error = %format!("{err:#}"), "failed to save preferences");
    }
    res.context("ui loop")
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            let cmds = apply_delta(&mut app.state, delta);
            app.dispatch(cmds);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
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
    let palette = state.theme.palette();
    frame.render_widget(
        Block::default().style(Style::default().fg(palette.fg).bg(palette.bg)),
        frame.size(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .style(Style::default().fg(palette.accent))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match state.screen {
        Screen::Analysis => render_analysis(frame, chunks[1], state, &palette),
        Screen::Analytics => render_analytics(frame, chunks[1], state, &palette),
        Screen::Compare => render_compare(frame, chunks[1], state),
        Screen::Data => render_data_manager(frame, chunks[1], state, &palette),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(palette.muted));
    frame.render_widget(footer, chunks[3]);

    let dm = &state.data_manager;
    if dm.open && dm.variant == DataManagerVariant::Modal {
        let area = centered_rect(80, 80, frame.size());
        frame.render_widget(Clear, area);
        render_data_manager(frame, area, state, &palette);
    }
    if let Some(pending) = &dm.pending {
        render_confirm(frame, pending);
    }
    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let selected = state.selection.match_id.and_then(|id| {
        state
            .analysis
            .matches
            .data()?
            .iter()
            .find(|m| m.match_id == id)
            .map(|m| m.display_label())
    });
    let loading = match state.analysis.phase {
        MatchesPhase::Loading => " | loading matches…",
        _ => "",
    };
    format!(
        "WC22 ANALYTICS | {} | {}{} | {}",
        screen_label(state.screen),
        selected.unwrap_or_else(|| "No match".to_string()),
        loading,
        state.theme.label()
    )
}

fn footer_text(state: &AppState) -> &'static str {
    match state.screen {
        Screen::Analysis => {
            "1-4 Screens | [/] Match | t Team | j/k Player | n/p Moment | h Heat | f Formation | m Data | T Theme | ? Help | q Quit"
        }
        Screen::Analytics => {
            "1-4 Screens | Tab/h/l Tab | [/] Match | t Team | m Data | T Theme | ? Help | q Quit"
        }
        Screen::Compare => {
            "1-4 Screens | c Compare with | j/k Player | [/] Match | t Team | ? Help | q Quit"
        }
        Screen::Data => {
            "1-4 Screens | j/k Move | F Fetch | d Delete | A Fetch all | t Team filter | R Reload | ? Help | q Quit"
        }
    }
}

fn render_analysis(frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30),
            Constraint::Min(40),
            Constraint::Length(34),
        ])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(columns[0]);
    let middle = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(12), Constraint::Length(9)])
        .split(columns[1]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11),
            Constraint::Length(8),
            Constraint::Min(1),
        ])
        .split(columns[2]);

    frame.render_widget(
        Paragraph::new(match_list_text(state))
            .block(Block::default().title("Matches").borders(Borders::ALL)),
        left[0],
    );
    frame.render_widget(
        Paragraph::new(player_list_text(state)).block(
            Block::default()
                .title(format!(
                    "Players | {}",
                    state.selection.team.as_deref().unwrap_or("-")
                ))
                .borders(Borders::ALL),
        ),
        left[1],
    );

    let analysis = &state.analysis;
    let team_color = analysis
        .active_viz
        .as_ref()
        .and_then(|v| v.team_color.as_deref())
        .and_then(Rgb::from_hex)
        .unwrap_or(DEFAULT_TEAL);
    let formation = analysis
        .formation
        .data()
        .map(|f| f.players.as_slice())
        .unwrap_or_default();
    let scene = pitch::render_pitch(&PitchInput {
        active: analysis.active_viz.as_ref(),
        positions: analysis.positions(),
        formation,
        show_heat_map: analysis.show_heat_map,
        show_formation: analysis.show_formation,
        team_color,
    });
    let pitch_title = format!(
        "Pitch | heat {} | formation {}",
        on_off(analysis.show_heat_map),
        on_off(analysis.show_formation)
    );
    render_pitch_canvas(frame, middle[0], &scene, pitch_title, palette);

    frame.render_widget(
        Paragraph::new(moments_text(state))
            .block(Block::default().title("Critical Moments").borders(Borders::ALL)),
        middle[1],
    );

    frame.render_widget(
        Paragraph::new(player_stats_text(state))
            .block(Block::default().title("Player").borders(Borders::ALL)),
        right[0],
    );
    frame.render_widget(
        Paragraph::new(breakdown_text(state))
            .block(Block::default().title("Breakdown").borders(Borders::ALL)),
        right[1],
    );
    frame.render_widget(
        Paragraph::new(match_context_text(state))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Match").borders(Borders::ALL)),
        right[2],
    );
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn match_list_text(state: &AppState) -> String {
    let analysis = &state.analysis;
    if analysis.matches.is_loading() {
        return "Loading matches…".to_string();
    }
    let Some(matches) = analysis.matches.data() else {
        return "No matches".to_string();
    };
    if matches.is_empty() {
        return "No matches".to_string();
    }
    matches
        .iter()
        .map(|m| {
            let prefix = if state.selection.match_id == Some(m.match_id) {
                "> "
            } else {
                "  "
            };
            format!("{prefix}{}", m.display_label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn player_list_text(state: &AppState) -> String {
    let analysis = &state.analysis;
    if analysis.players.is_loading() {
        return "Loading players…".to_string();
    }
    let players = analysis.players_for_team(state.selection.team.as_deref());
    if players.is_empty() {
        return "No players".to_string();
    }
    players
        .iter()
        .map(|p| {
            let selected = state
                .selection
                .player
                .as_ref()
                .is_some_and(|sel| sel.id == p.id && sel.name == p.name);
            let prefix = if selected { "> " } else { "  " };
            let jersey = p
                .jersey_number
                .map(|n| format!("{n:>2} "))
                .unwrap_or_else(|| "   ".to_string());
            format!("{prefix}{jersey}{}", p.display_name())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn moments_text(state: &AppState) -> String {
    let analysis = &state.analysis;
    if analysis.analysis.is_loading() {
        return "Loading analysis…".to_string();
    }
    if let Some(err) = &analysis.analysis_error {
        return err.clone();
    }
    let moments = analysis.critical_moments();
    if moments.is_empty() {
        return "No critical moments".to_string();
    }
    moments
        .iter()
        .enumerate()
        .map(|(idx, cm)| {
            let prefix = if analysis.active_moment == Some(idx) {
                "> "
            } else {
                "  "
            };
            let sign = match cm.impact {
                Impact::Positive => "+",
                Impact::Negative => "-",
            };
            format!(
                "{prefix}{sign} {:>5} {:<10} {:+.2} {}",
                cm.moment.time_display,
                cm.moment.event_type,
                cm.moment.highlight_score,
                cm.moment.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn player_stats_text(state: &AppState) -> String {
    let Some(analysis) = state.analysis.analysis.data() else {
        return "Select a player".to_string();
    };
    let stats = &analysis.stats;
    let mut lines = vec![
        stats.name.clone(),
        format!("Highlight score: {:.2}", stats.total_highlight_score),
        format!("Value added: {:.3}", stats.total_value_added),
        format!("xT: {:.3}", stats.total_xt),
        format!("Actions: {}", stats.total_actions),
        format!("Pass accuracy: {}", stats.pass_accuracy),
        format!(
            "Contributions: +{} / -{}",
            stats.positive_contributions, stats.negative_contributions
        ),
    ];
    let active: Vec<&str> = stats
        .ml_models_active
        .iter()
        .filter(|(_, on)| **on)
        .map(|(name, _)| name.as_str())
        .collect();
    if !active.is_empty() {
        lines.push(format!("Models: {}", active.join(", ")));
    }
    lines.join("\n")
}

fn breakdown_text(state: &AppState) -> String {
    let Some(b) = state.analysis.performance_breakdown() else {
        return "-".to_string();
    };
    let fmt = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}"));
    [
        format!("Positive impact  {:.1}", b.positive_impact_rate),
        format!("Pass reliability {}", fmt(b.pass_reliability)),
        format!("Threat creation  {:.1}", b.threat_creation),
        format!("Decision quality {}", fmt(b.decision_quality)),
        format!("Involvement      {:.1}", b.involvement),
    ]
    .join("\n")
}

fn match_context_text(state: &AppState) -> String {
    let analysis = &state.analysis;
    let mut lines = Vec::new();
    if let Some(summary) = analysis.summary.data() {
        let score = match (summary.home_score, summary.away_score) {
            (Some(h), Some(a)) => format!("{h}-{a}"),
            _ => "vs".to_string(),
        };
        lines.push(format!(
            "{} {score} {}",
            summary.home_team, summary.away_team
        ));
        if let Some(stage) = &summary.competition_stage {
            lines.push(stage.clone());
        }
    }
    if let Some(formation) = analysis.formation.data()
        && let Some(shape) = &formation.formation
    {
        lines.push(format!("{} {shape}", formation.team));
    }
    if let Some(team) = analysis.team_stats.data() {
        for (key, value) in team.stats.iter().take(8) {
            lines.push(format!("{key}: {}", value_label(value)));
        }
    }
    if lines.is_empty() {
        return "-".to_string();
    }
    lines.join("\n")
}

/// Draws a scene on a canvas. Scene y grows downwards, canvas y upwards.
fn render_pitch_canvas(
    frame: &mut Frame,
    area: Rect,
    scene: &PitchScene,
    title: String,
    palette: &Palette,
) {
    let lines = palette.pitch_lines;
    let canvas = Canvas::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .background_color(palette.pitch_bg)
        .marker(Marker::Braille)
        .x_bounds([0.0, PITCH_LENGTH])
        .y_bounds([0.0, PITCH_WIDTH])
        .paint(move |ctx| {
            draw_markings(ctx, lines);
            ctx.layer();
            for primitive in &scene.primitives {
                draw_primitive(ctx, primitive);
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_markings(ctx: &mut Context, color: Color) {
    ctx.draw(&Rectangle {
        x: 0.0,
        y: 0.0,
        width: PITCH_LENGTH,
        height: PITCH_WIDTH,
        color,
    });
    ctx.draw(&CanvasLine {
        x1: 60.0,
        y1: 0.0,
        x2: 60.0,
        y2: PITCH_WIDTH,
        color,
    });
    ctx.draw(&Circle {
        x: 60.0,
        y: 40.0,
        radius: 10.0,
        color,
    });
    for x in [0.0, 102.0] {
        ctx.draw(&Rectangle {
            x,
            y: 18.0,
            width: 18.0,
            height: 44.0,
            color,
        });
    }
    for x in [0.0, 114.0] {
        ctx.draw(&Rectangle {
            x,
            y: 30.0,
            width: 6.0,
            height: 20.0,
            color,
        });
    }
}

fn flip(p: Point) -> (f64, f64) {
    (p.x, PITCH_WIDTH - p.y)
}

fn draw_primitive(ctx: &mut Context, primitive: &Primitive) {
    match primitive {
        Primitive::Line {
            from,
            to,
            color,
            dashed,
            arrow_head,
            ..
        } => {
            let color = rgb_color(*color);
            let (x1, y1) = flip(*from);
            let (x2, y2) = flip(*to);
            if *dashed {
                draw_dashed(ctx, (x1, y1), (x2, y2), color);
            } else {
                ctx.draw(&CanvasLine {
                    x1,
                    y1,
                    x2,
                    y2,
                    color,
                });
            }
            if *arrow_head {
                draw_arrow_head(ctx, (x1, y1), (x2, y2), color);
            }
        }
        Primitive::Circle {
            center,
            radius,
            color,
            filled,
            ..
        } => {
            let (x, y) = flip(*center);
            let color = rgb_color(*color);
            let mut r = *radius;
            loop {
                ctx.draw(&Circle {
                    x,
                    y,
                    radius: r,
                    color,
                });
                if !*filled || r <= 0.6 {
                    break;
                }
                r -= 0.6;
            }
        }
        Primitive::Text {
            at, text, color, ..
        } => {
            let (x, y) = flip(*at);
            ctx.print(
                x,
                y,
                Span::styled(text.clone(), Style::default().fg(rgb_color(*color))),
            );
        }
    }
}

fn draw_dashed(ctx: &mut Context, from: (f64, f64), to: (f64, f64), color: Color) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = dx.hypot(dy);
    if len <= f64::EPSILON {
        return;
    }
    let dash = 2.0;
    let steps = (len / dash).ceil() as usize;
    for i in (0..steps).step_by(2) {
        let t1 = i as f64 * dash / len;
        let t2 = ((i + 1) as f64 * dash / len).min(1.0);
        ctx.draw(&CanvasLine {
            x1: from.0 + dx * t1,
            y1: from.1 + dy * t1,
            x2: from.0 + dx * t2,
            y2: from.1 + dy * t2,
            color,
        });
    }
}

fn draw_arrow_head(ctx: &mut Context, from: (f64, f64), to: (f64, f64), color: Color) {
    let angle = (to.1 - from.1).atan2(to.0 - from.0);
    let size = 2.5;
    for spread in [0.5_f64, -0.5] {
        let a = angle + std::f64::consts::PI + spread;
        ctx.draw(&CanvasLine {
            x1: to.0,
            y1: to.1,
            x2: a.cos().mul_add(size, to.0),
            y2: a.sin().mul_add(size, to.1),
            color,
        });
    }
}

fn render_analytics(frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let active = state.analytics.active();
    let titles: Vec<String> = AnalyticsTab::ALL.iter().map(|t| t.label().to_string()).collect();
    let tabs = Tabs::new(titles)
        .select(active.index())
        .block(Block::default().borders(Borders::ALL).title("Analytics"))
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, rows[0]);

    let body = rows[1];
    let title = active.label();
    if state.analytics.is_loading(active) {
        frame.render_widget(
            Paragraph::new("Loading…").block(Block::default().title(title).borders(Borders::ALL)),
            body,
        );
        return;
    }
    let Some(payload) = state.analytics.payload(active) else {
        let msg = if state.selection.match_id.is_none() {
            "Select a match"
        } else {
            "No data"
        };
        frame.render_widget(
            Paragraph::new(msg).block(Block::default().title(title).borders(Borders::ALL)),
            body,
        );
        return;
    };

    match payload {
        AnalyticsPayload::Momentum(data) => {
            let width = body.width.saturating_sub(16) / 2;
            let max = data.max_dominance();
            let mut lines = vec![Line::from(format!(
                "{:>7}  {:<w$}| {}",
                "",
                data.home_team,
                data.away_team,
                w = width as usize
            ))];
            for interval in &data.intervals {
                let home = pitch::dominance_bar_width(interval.home_dominance, max, width);
                let away = pitch::dominance_bar_width(interval.away_dominance, max, width);
                lines.push(Line::from(vec![
                    Span::raw(format!(
                        "{:>3}-{:<3}  ",
                        interval.start_minute, interval.end_minute
                    )),
                    Span::raw(" ".repeat(width.saturating_sub(home) as usize)),
                    Span::styled(
                        "█".repeat(home as usize),
                        Style::default().fg(rgb_color(pitch::NEUTRAL_BLUE)),
                    ),
                    Span::raw("|"),
                    Span::styled(
                        "█".repeat(away as usize),
                        Style::default().fg(rgb_color(pitch::FAILURE_RED)),
                    ),
                ]));
            }
            frame.render_widget(
                Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
                body,
            );
        }
        AnalyticsPayload::PassingNetwork(data) => {
            let scene = pitch::passing_network_scene(data, DEFAULT_TEAL);
            let title = format!(
                "{title} | {}",
                state.selection.team.as_deref().unwrap_or(&data.team)
            );
            render_pitch_canvas(frame, body, &scene, title, palette);
        }
        other => {
            frame.render_widget(
                Paragraph::new(analytics_text(other))
                    .block(Block::default().title(title).borders(Borders::ALL)),
                body,
            );
        }
    }
}

fn analytics_text(payload: &AnalyticsPayload) -> String {
    let pct = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.0}%", v * 100.0));
    let lines: Vec<String> = match payload {
        AnalyticsPayload::ScoreImpact(data) => data
            .events
            .iter()
            .map(|e| {
                format!(
                    "{:>3}' {:<14} {:<10} {:<20} {} -> {} ({:+.2})",
                    e.minute,
                    e.team,
                    e.event_type,
                    e.player.as_deref().unwrap_or("-"),
                    pct(e.win_prob_before),
                    pct(e.win_prob_after),
                    e.impact
                )
            })
            .collect(),
        AnalyticsPayload::SetPieces(data) => data
            .teams
            .iter()
            .map(|t| {
                format!(
                    "{:<16} corners {:>2} | free kicks {:>2} | pens {} | shots {:>2} | goals {} | xG {:.2}",
                    t.team, t.corners, t.free_kicks, t.penalties, t.shots, t.goals, t.xg
                )
            })
            .collect(),
        AnalyticsPayload::Pressing(data) => data
            .teams
            .iter()
            .map(|t| {
                format!(
                    "{:<16} pressures {:>3} | success {} | PPDA {} | high regains {}",
                    t.team,
                    t.pressures,
                    t.success_rate()
                        .map_or_else(|| "-".to_string(), |r| format!("{r:.0}%")),
                    t.ppda.map_or_else(|| "-".to_string(), |p| format!("{p:.1}")),
                    t.high_press_regains
                )
            })
            .collect(),
        AnalyticsPayload::Substitutions(data) => data
            .substitutions
            .iter()
            .map(|s| {
                format!(
                    "{:>3}' {:<14} {} -> {} {}",
                    s.minute,
                    s.team,
                    s.player_off,
                    s.player_on,
                    s.impact_change()
                        .map_or_else(String::new, |d| format!("({d:+.2})"))
                )
            })
            .collect(),
        AnalyticsPayload::Momentum(_) | AnalyticsPayload::PassingNetwork(_) => Vec::new(),
    };
    if lines.is_empty() {
        return "No data".to_string();
    }
    lines.join("\n")
}

fn render_compare(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Compare").borders(Borders::ALL);
    let analysis = &state.analysis;
    let text = if state.selection.compare_player.is_none() {
        "Press c to pick a player to compare with".to_string()
    } else if analysis.comparison.is_loading() {
        "Loading comparison…".to_string()
    } else if let Some(cmp) = analysis.comparison.data() {
        let (a, b) = (&cmp.player1, &cmp.player2);
        let row = |label: &str, x: String, y: String| format!("{label:<18}{x:>14}{y:>14}");
        [
            row("", a.name.clone(), b.name.clone()),
            row(
                "Team",
                a.team.clone().unwrap_or_default(),
                b.team.clone().unwrap_or_default(),
            ),
            row(
                "Highlight score",
                format!("{:.2}", a.stats.total_highlight_score),
                format!("{:.2}", b.stats.total_highlight_score),
            ),
            row(
                "Value added",
                format!("{:.3}", a.stats.total_value_added),
                format!("{:.3}", b.stats.total_value_added),
            ),
            row(
                "xT",
                format!("{:.3}", a.stats.total_xt),
                format!("{:.3}", b.stats.total_xt),
            ),
            row(
                "Actions",
                a.stats.total_actions.to_string(),
                b.stats.total_actions.to_string(),
            ),
            row(
                "Pass accuracy",
                a.stats.pass_accuracy.clone(),
                b.stats.pass_accuracy.clone(),
            ),
        ]
        .join("\n")
    } else {
        "No comparison available".to_string()
    };
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_data_manager(frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let dm = &state.data_manager;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(1)])
        .split(area);

    let summary = dm
        .status
        .data()
        .map(|s| s.summary_or_computed())
        .unwrap_or_default();
    let mut head = vec![
        format!(
            "Competition: {} | Team: {}{}",
            dm.competition(),
            dm.team_filter().unwrap_or("All"),
            if dm.is_fetch_all_running() {
                " | fetching all…"
            } else {
                ""
            }
        ),
        format!(
            "{} matches | {} complete | {} missing",
            summary.total, summary.complete, summary.missing
        ),
    ];
    if let Some(err) = &dm.error {
        head.push(format!("Error: {err}"));
    } else if let Some(msg) = &dm.message {
        head.push(msg.clone());
    }
    let title = match dm.variant {
        DataManagerVariant::Modal => "Data Manager (Esc to close)",
        DataManagerVariant::Panel => "Data Manager",
    };
    frame.render_widget(
        Paragraph::new(head.join("\n"))
            .block(Block::default().title(title).borders(Borders::ALL)),
        rows[0],
    );

    if dm.status.is_loading() {
        frame.render_widget(
            Paragraph::new("Loading…").block(Block::default().borders(Borders::ALL)),
            rows[1],
        );
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    let mut cursor = 0usize;
    for (stage, matches) in dm.grouped() {
        lines.push(Line::styled(
            stage,
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ));
        for status in matches {
            let marker = if dm.is_busy(status.match_id) {
                "…"
            } else if status.is_complete {
                "✓"
            } else if status.statsbomb_available {
                "○"
            } else {
                "✗"
            };
            let text = format!(
                "  {marker} {:<40} events {} lineups {}",
                status.display_label(),
                on_off(status.has_events),
                on_off(status.has_lineups)
            );
            let style = if cursor == dm.selected {
                Style::default().bg(palette.selected_bg)
            } else {
                Style::default()
            };
            lines.push(Line::styled(text, style));
            cursor += 1;
        }
    }
    if lines.is_empty() {
        lines.push(Line::from("No matches"));
    }
    let visible = rows[1].height.saturating_sub(2) as usize;
    let scroll = visible_offset(dm.selected, lines.len(), visible);
    frame.render_widget(
        Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .block(Block::default().borders(Borders::ALL)),
        rows[1],
    );
}

/// Rough scroll offset keeping the cursor on screen; stage headings make it
/// approximate.
fn visible_offset(selected: usize, total: usize, visible: usize) -> usize {
    if visible == 0 || total <= visible {
        return 0;
    }
    selected.saturating_sub(visible / 2).min(total - visible)
}

fn render_confirm(frame: &mut Frame, pending: &PendingConfirmation) {
    let area = centered_rect(50, 20, frame.size());
    frame.render_widget(Clear, area);
    let text = match pending {
        PendingConfirmation::Delete { label, .. } => {
            format!("Delete cached data for {label}?\n\ny Confirm | n Cancel")
        }
        PendingConfirmation::FetchAll { missing } => {
            format!("Fetch {missing} missing matches?\n\ny Confirm | n Cancel")
        }
    };
    frame.render_widget(
        Paragraph::new(text).block(Block::default().title("Confirm").borders(Borders::ALL)),
        area,
    );
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "WC22 Analytics - Help",
        "",
        "Global:",
        "  1-4          Analysis / Analytics / Compare / Data",
        "  m            Data manager (modal)",
        "  T            Toggle theme",
        "  r            Reload matches",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Selection:",
        "  [ / ]        Previous / next match",
        "  t            Next team",
        "  j/k or ↑/↓   Next / previous player",
        "",
        "Analysis:",
        "  n/p or ←/→   Step critical moments",
        "  h / f        Heat map / formation",
        "",
        "Analytics:",
        "  Tab / l / h  Switch tab",
        "",
        "Data manager:",
        "  F / Enter    Fetch selected match",
        "  d            Delete selected match",
        "  A            Fetch all missing",
        "  t            Cycle team filter",
        "  [ / ]        Competition (modal)",
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
