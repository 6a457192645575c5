use std::collections::{BTreeMap, VecDeque};

use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::analytics::{AnalyticsCache, AnalyticsPayload, AnalyticsRequest, AnalyticsTab};
use crate::config::Settings;
use crate::data_manager::{DataAction, DataManager, DataManagerVariant, DataStatus};
use crate::player_analysis::PlayerAnalysisState;
use crate::theme::Theme;

const MAX_LOG_LINES: usize = 200;

pub type MatchId = u64;
pub type PlayerId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    #[serde(alias = "id")]
    pub match_id: MatchId,
    #[serde(default)]
    pub label: String,
    #[serde(default, alias = "stage")]
    pub competition_stage: Option<String>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub match_date: Option<String>,
}

impl MatchInfo {
    pub fn display_label(&self) -> String {
        if !self.label.trim().is_empty() {
            return self.label.clone();
        }
        match (&self.home_team, &self.away_team) {
            (Some(home), Some(away)) => format!("{home} vs {away}"),
            _ => format!("Match {}", self.match_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default, alias = "player_id")]
    pub id: Option<PlayerId>,
    pub name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default, alias = "jersey")]
    pub jersey_number: Option<u32>,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub position: Option<String>,
}

impl Player {
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.name)
    }

    pub fn to_ref(&self) -> PlayerRef {
        PlayerRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// What the analysis endpoint needs to identify a player. The numeric id is
/// preferred; the name is only used when the backend gave us no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub id: Option<PlayerId>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total_highlight_score: f64,
    #[serde(default)]
    pub total_value_added: f64,
    #[serde(default)]
    pub total_actions: u32,
    #[serde(default)]
    pub moments_analyzed: u32,
    #[serde(default = "not_available", deserialize_with = "string_or_number")]
    pub pass_accuracy: String,
    #[serde(default, alias = "xt", alias = "total_xt_added")]
    pub total_xt: f64,
    #[serde(default)]
    pub positive_contributions: u32,
    #[serde(default)]
    pub negative_contributions: u32,
    #[serde(default)]
    pub highlight_count: Option<u32>,
    #[serde(default)]
    pub lowlight_count: Option<u32>,
    #[serde(default)]
    pub ml_models_active: BTreeMap<String, bool>,
}

fn not_available() -> String {
    "N/A".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Negative,
}

impl Impact {
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            Impact::Positive
        } else {
            Impact::Negative
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Moment {
    #[serde(default)]
    pub time_display: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlight_score: f64,
    #[serde(default)]
    pub value_added: Option<f64>,
    #[serde(default)]
    pub xt_delta: Option<f64>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub period: Option<u8>,
    #[serde(default)]
    pub minute: Option<u32>,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub pitch_viz_data: Option<PitchVizData>,
}

impl Moment {
    /// Match minute, falling back to the `MM:SS` display string.
    pub fn minute(&self) -> u32 {
        if let Some(minute) = self.minute {
            return minute;
        }
        self.time_display
            .split(':')
            .next()
            .and_then(|m| m.trim().parse::<u32>().ok())
            .unwrap_or(0)
    }
}

/// A pitch coordinate pair as sent by the backend. Either half may be missing;
/// renderers resolve missing halves to the pitch centre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCoords")]
pub struct Coords {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Coords {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoords {
    Pair(Vec<Option<f64>>),
    Object {
        #[serde(default)]
        x: Option<f64>,
        #[serde(default)]
        y: Option<f64>,
    },
}

impl From<RawCoords> for Coords {
    fn from(raw: RawCoords) -> Self {
        match raw {
            RawCoords::Pair(values) => Coords {
                x: values.first().copied().flatten(),
                y: values.get(1).copied().flatten(),
            },
            RawCoords::Object { x, y } => Coords { x, y },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchVizData {
    #[serde(default, alias = "type")]
    pub action_type: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub outcome: String,
    #[serde(default)]
    pub start_coords: Option<Coords>,
    #[serde(default)]
    pub end_coords: Option<Coords>,
    #[serde(default)]
    pub coords: Option<Coords>,
    #[serde(default)]
    pub team_color: Option<String>,
    #[serde(default)]
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub x: f64,
    pub y: f64,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerAnalysis {
    #[serde(default)]
    pub stats: PlayerStats,
    #[serde(default)]
    pub top_highlights: Vec<Moment>,
    #[serde(default, alias = "lowlights")]
    pub areas_for_improvement: Vec<Moment>,
    #[serde(default, alias = "all_positions")]
    pub positions: Vec<PositionSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationPlayer {
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default, alias = "player")]
    pub name: String,
    #[serde(default, alias = "jersey")]
    pub jersey_number: Option<u32>,
    #[serde(default)]
    pub position: Option<String>,
    pub x: f64,
    pub y: f64,
}

impl FormationPlayer {
    /// Surname-ish chip label, the last whitespace separated word.
    pub fn short_name(&self) -> &str {
        self.name.split_whitespace().last().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    #[serde(default)]
    pub team: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub formation: Option<String>,
    #[serde(default, alias = "lineup")]
    pub players: Vec<FormationPlayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub stats: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(default)]
    pub match_id: Option<MatchId>,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
    #[serde(default, alias = "stage")]
    pub competition_stage: Option<String>,
    #[serde(default)]
    pub stats: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparedPlayer {
    #[serde(default, alias = "id")]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub stats: PlayerStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerComparison {
    pub player1: ComparedPlayer,
    pub player2: ComparedPlayer,
}

pub fn value_label(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() != 0.0 => format!("{f:.2}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string_or_number(deserializer)?.unwrap_or_default())
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Analysis,
    Analytics,
    Compare,
    Data,
}

/// The user's current picks. Passed by reference to every controller; only
/// the orchestrator moves `team`/`player` on its own (auto-selection).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub match_id: Option<MatchId>,
    pub team: Option<String>,
    pub player: Option<PlayerRef>,
    pub compare_player: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub momentum_interval_minutes: u32,
    pub passing_min_passes: u32,
    pub top_n: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            momentum_interval_minutes: 5,
            passing_min_passes: 3,
            top_n: 5,
        }
    }
}

impl From<&Settings> for FetchOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            momentum_interval_minutes: settings.momentum_interval_minutes,
            passing_min_passes: settings.passing_min_passes,
            top_n: settings.analysis_top_n,
        }
    }
}

/// Identifies the slot a failed request belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKey {
    Matches,
    Players,
    PlayerAnalysis,
    MatchSummary,
    TeamStats,
    Formation,
    Comparison,
    Analytics(AnalyticsTab),
    Competitions,
    DataStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    FetchMatches {
        seq: u64,
    },
    FetchPlayers {
        match_id: MatchId,
        seq: u64,
    },
    FetchPlayerAnalysis {
        player: PlayerRef,
        match_id: MatchId,
        top_n: u32,
        seq: u64,
    },
    FetchMatchSummary {
        match_id: MatchId,
        seq: u64,
    },
    FetchTeamStats {
        match_id: MatchId,
        team: Option<String>,
        seq: u64,
    },
    FetchFormation {
        match_id: MatchId,
        team: Option<String>,
        seq: u64,
    },
    FetchComparison {
        match_id: MatchId,
        player1_id: PlayerId,
        player2_id: PlayerId,
        seq: u64,
    },
    FetchAnalytics {
        request: AnalyticsRequest,
        seq: u64,
    },
    FetchCompetitions {
        seq: u64,
    },
    FetchDataStatus {
        competition: Option<String>,
        seq: u64,
    },
    FetchMatchData {
        match_id: MatchId,
        competition: Option<String>,
    },
    DeleteMatchData {
        match_id: MatchId,
        competition: Option<String>,
    },
    FetchAllMissing,
}

#[derive(Debug, Clone)]
pub enum Delta {
    Matches {
        seq: u64,
        matches: Vec<MatchInfo>,
    },
    Players {
        seq: u64,
        players: Vec<Player>,
    },
    PlayerAnalysis {
        seq: u64,
        analysis: PlayerAnalysis,
    },
    MatchSummary {
        seq: u64,
        summary: MatchSummary,
    },
    TeamStats {
        seq: u64,
        stats: TeamStats,
    },
    Formation {
        seq: u64,
        formation: Formation,
    },
    Comparison {
        seq: u64,
        comparison: PlayerComparison,
    },
    Analytics {
        seq: u64,
        payload: AnalyticsPayload,
    },
    Competitions {
        seq: u64,
        competitions: Vec<String>,
    },
    DataStatus {
        seq: u64,
        status: DataStatus,
    },
    DataMutation {
        action: DataAction,
        outcome: Result<String, String>,
    },
    FetchFailed {
        slot: SlotKey,
        seq: u64,
        error: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub theme: Theme,
    pub selection: Selection,
    pub options: FetchOptions,
    pub analysis: PlayerAnalysisState,
    pub analytics: AnalyticsCache,
    pub data_manager: DataManager,
    /// Bumped whenever the data manager changes what the backend has cached;
    /// see [`AppState::on_data_changed`].
    pub data_revision: u64,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_options(FetchOptions::default(), crate::config::DEFAULT_COMPETITION)
    }

    pub fn with_options(options: FetchOptions, default_competition: &str) -> Self {
        Self {
            screen: Screen::Analysis,
            theme: Theme::default(),
            selection: Selection::default(),
            options,
            analysis: PlayerAnalysisState::new(),
            analytics: AnalyticsCache::new(),
            data_manager: DataManager::new(DataManagerVariant::Panel, default_competition),
            data_revision: 0,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let stamp = Local::now().format("%H:%M:%S");
        self.logs.push_back(format!("{stamp} {}", msg.into()));
        while self.logs.len() > MAX_LOG_LINES {
            self.logs.pop_front();
        }
    }

    /// Initial load: the match list drives everything else.
    pub fn start(&mut self) -> Vec<ProviderCommand> {
        vec![self.analysis.load_matches()]
    }

    pub fn select_match(&mut self, match_id: MatchId) -> Vec<ProviderCommand> {
        if self.selection.match_id == Some(match_id) {
            return Vec::new();
        }
        self.selection.match_id = Some(match_id);
        self.selection.team = None;
        self.selection.player = None;
        self.selection.compare_player = None;

        let mut cmds = self.analysis.on_match_selected(&self.selection);
        cmds.extend(
            self.analytics
                .on_match_changed(&self.selection, &self.options),
        );
        cmds
    }

    pub fn select_team(&mut self, team: &str) -> Vec<ProviderCommand> {
        if self.selection.team.as_deref() == Some(team) {
            return Vec::new();
        }
        let mut cmds =
            self.analysis
                .on_team_changed(&mut self.selection, team, &self.options);
        cmds.extend(self.analytics.on_team_changed(&self.selection, &self.options));
        cmds
    }

    pub fn select_player(&mut self, player: PlayerRef) -> Vec<ProviderCommand> {
        self.analysis
            .on_player_selected(&mut self.selection, player, &self.options)
    }

    pub fn activate_tab(&mut self, tab: AnalyticsTab) -> Vec<ProviderCommand> {
        self.analytics
            .activate_tab(tab, &self.selection, &self.options)
            .into_iter()
            .collect()
    }

    pub fn select_moment(&mut self, index: usize) {
        self.analysis.select_moment(index);
    }

    pub fn set_compare_player(&mut self, player_id: PlayerId) -> Vec<ProviderCommand> {
        self.selection.compare_player = Some(player_id);
        self.analysis
            .request_comparison(&self.selection)
            .into_iter()
            .collect()
    }

    pub fn open_data_manager(&mut self, variant: DataManagerVariant) -> Vec<ProviderCommand> {
        self.data_manager.open(variant)
    }

    /// Backend data changed: reload the match list and, when the selected
    /// match was touched, refetch its analytics.
    pub fn on_data_changed(&mut self, action: DataAction) -> Vec<ProviderCommand> {
        self.data_revision += 1;
        let mut cmds = vec![self.analysis.load_matches()];
        let touched = match action {
            DataAction::Fetch(id) | DataAction::Delete(id) => self.selection.match_id == Some(id),
            DataAction::FetchAll => self.selection.match_id.is_some(),
        };
        if touched {
            let active = self.analytics.active();
            cmds.extend(self.analytics.on_match_changed(&self.selection, &self.options));
            cmds.extend(
                self.analytics
                    .activate_tab(active, &self.selection, &self.options),
            );
        }
        cmds
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }
}

/// Applies a provider result and returns the fetches it triggers.
pub fn apply_delta(state: &mut AppState, delta: Delta) -> Vec<ProviderCommand> {
    match delta {
        Delta::Matches { seq, matches } => {
            let Some(auto_select) = state.analysis.on_matches_loaded(seq, matches, &state.selection)
            else {
                return Vec::new();
            };
            state.select_match(auto_select)
        }
        Delta::Players { seq, players } => {
            let prev_team = state.selection.team.clone();
            let mut cmds =
                state
                    .analysis
                    .on_players_loaded(seq, players, &mut state.selection, &state.options);
            if state.selection.team != prev_team {
                cmds.extend(
                    state
                        .analytics
                        .on_team_changed(&state.selection, &state.options),
                );
            }
            cmds
        }
        Delta::PlayerAnalysis { seq, analysis } => {
            state.analysis.on_analysis_loaded(seq, analysis);
            Vec::new()
        }
        Delta::MatchSummary { seq, summary } => {
            state.analysis.summary.resolve(seq, summary);
            Vec::new()
        }
        Delta::TeamStats { seq, stats } => {
            state.analysis.team_stats.resolve(seq, stats);
            Vec::new()
        }
        Delta::Formation { seq, formation } => {
            state.analysis.formation.resolve(seq, formation);
            Vec::new()
        }
        Delta::Comparison { seq, comparison } => {
            state.analysis.comparison.resolve(seq, comparison);
            Vec::new()
        }
        Delta::Analytics { seq, payload } => {
            state.analytics.apply(seq, payload);
            Vec::new()
        }
        Delta::Competitions { seq, competitions } => {
            state.data_manager.on_competitions(seq, competitions);
            Vec::new()
        }
        Delta::DataStatus { seq, status } => {
            state.data_manager.on_status(seq, status);
            Vec::new()
        }
        Delta::DataMutation { action, outcome } => {
            match &outcome {
                Ok(msg) => state.push_log(format!("[INFO] {}: {msg}", action.label())),
                Err(err) => state.push_log(format!("[WARN] {} failed: {err}", action.label())),
            }
            let (mut cmds, data_changed) = state.data_manager.on_mutation_finished(action, outcome);
            if data_changed {
                cmds.extend(state.on_data_changed(action));
            }
            cmds
        }
        Delta::FetchFailed { slot, seq, error } => {
            if apply_failure(state, slot, seq, &error) {
                state.push_log(format!("[WARN] {} fetch failed: {error}", slot_label(slot)));
            }
            Vec::new()
        }
        Delta::Log(msg) => {
            state.push_log(msg);
            Vec::new()
        }
    }
}

/// Returns false for failures of superseded requests; those are not worth a
/// console line.
fn apply_failure(state: &mut AppState, slot: SlotKey, seq: u64, error: &str) -> bool {
    let analysis = &mut state.analysis;
    match slot {
        SlotKey::Matches => analysis.on_matches_failed(seq),
        SlotKey::Players => analysis.on_players_failed(seq, error),
        SlotKey::PlayerAnalysis => analysis.on_analysis_failed(seq, error),
        SlotKey::MatchSummary => analysis.summary.fail(seq),
        SlotKey::TeamStats => analysis.team_stats.fail(seq),
        SlotKey::Formation => analysis.formation.fail(seq),
        SlotKey::Comparison => analysis.comparison.fail(seq),
        SlotKey::Analytics(tab) => state.analytics.fail(tab, seq),
        SlotKey::Competitions => state.data_manager.competitions.fail(seq),
        SlotKey::DataStatus => state.data_manager.on_status_failed(seq, error),
    }
}

pub fn slot_label(slot: SlotKey) -> &'static str {
    match slot {
        SlotKey::Matches => "Matches",
        SlotKey::Players => "Players",
        SlotKey::PlayerAnalysis => "Player analysis",
        SlotKey::MatchSummary => "Match summary",
        SlotKey::TeamStats => "Team stats",
        SlotKey::Formation => "Formation",
        SlotKey::Comparison => "Comparison",
        SlotKey::Analytics(tab) => tab.label(),
        SlotKey::Competitions => "Competitions",
        SlotKey::DataStatus => "Data status",
    }
}

pub fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Analysis => "PLAYER ANALYSIS",
        Screen::Analytics => "MATCH ANALYTICS",
        Screen::Compare => "COMPARE",
        Screen::Data => "DATA",
    }
}
