use serde::{Deserialize, Serialize};

use crate::slot::Slot;
use crate::state::{FetchOptions, MatchId, ProviderCommand, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsTab {
    Momentum,
    ScoreImpact,
    SetPieces,
    PassingNetwork,
    Pressing,
    Substitutions,
}

impl AnalyticsTab {
    pub const ALL: [AnalyticsTab; 6] = [
        AnalyticsTab::Momentum,
        AnalyticsTab::ScoreImpact,
        AnalyticsTab::SetPieces,
        AnalyticsTab::PassingNetwork,
        AnalyticsTab::Pressing,
        AnalyticsTab::Substitutions,
    ];

    pub fn index(self) -> usize {
        match self {
            AnalyticsTab::Momentum => 0,
            AnalyticsTab::ScoreImpact => 1,
            AnalyticsTab::SetPieces => 2,
            AnalyticsTab::PassingNetwork => 3,
            AnalyticsTab::Pressing => 4,
            AnalyticsTab::Substitutions => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnalyticsTab::Momentum => "Momentum",
            AnalyticsTab::ScoreImpact => "Score Impact",
            AnalyticsTab::SetPieces => "Set Pieces",
            AnalyticsTab::PassingNetwork => "Passing Network",
            AnalyticsTab::Pressing => "Pressing",
            AnalyticsTab::Substitutions => "Substitutions",
        }
    }

    /// Short identifier used by the dashboard's tab bar (`momentum`, `score`, ...).
    pub fn key(self) -> &'static str {
        match self {
            AnalyticsTab::Momentum => "momentum",
            AnalyticsTab::ScoreImpact => "score",
            AnalyticsTab::SetPieces => "setpieces",
            AnalyticsTab::PassingNetwork => "passing",
            AnalyticsTab::Pressing => "pressing",
            AnalyticsTab::Substitutions => "subs",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        AnalyticsTab::ALL
            .into_iter()
            .find(|tab| tab.key().eq_ignore_ascii_case(key.trim()))
    }

    pub fn next(self) -> Self {
        AnalyticsTab::ALL[(self.index() + 1) % AnalyticsTab::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let len = AnalyticsTab::ALL.len();
        AnalyticsTab::ALL[(self.index() + len - 1) % len]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsRequest {
    pub tab: AnalyticsTab,
    pub match_id: MatchId,
    /// Only sent for the passing network.
    pub team: Option<String>,
    pub interval_minutes: u32,
    pub min_passes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentumInterval {
    #[serde(default)]
    pub start_minute: u32,
    #[serde(default)]
    pub end_minute: u32,
    #[serde(default)]
    pub home_dominance: f64,
    #[serde(default)]
    pub away_dominance: f64,
    #[serde(default)]
    pub dominant_team: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentumData {
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub interval_minutes: Option<u32>,
    #[serde(default, alias = "momentum")]
    pub intervals: Vec<MomentumInterval>,
}

impl MomentumData {
    pub fn max_dominance(&self) -> f64 {
        self.intervals
            .iter()
            .map(|i| i.home_dominance.abs().max(i.away_dominance.abs()))
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreImpactEvent {
    #[serde(default)]
    pub minute: u32,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub win_prob_before: Option<f64>,
    #[serde(default)]
    pub win_prob_after: Option<f64>,
    #[serde(default)]
    pub impact: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreImpactData {
    #[serde(default, alias = "impacts")]
    pub events: Vec<ScoreImpactEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetPieceSummary {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub corners: u32,
    #[serde(default)]
    pub free_kicks: u32,
    #[serde(default)]
    pub penalties: u32,
    #[serde(default)]
    pub throw_ins: u32,
    #[serde(default)]
    pub shots: u32,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub xg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetPiecesData {
    #[serde(default, alias = "set_pieces")]
    pub teams: Vec<SetPieceSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassingNode {
    #[serde(alias = "name")]
    pub player: String,
    #[serde(default)]
    pub player_id: Option<u64>,
    #[serde(default)]
    pub jersey_number: Option<u32>,
    pub x: f64,
    pub y: f64,
    #[serde(default, alias = "pass_count")]
    pub passes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassingEdge {
    #[serde(alias = "source")]
    pub from: String,
    #[serde(alias = "target")]
    pub to: String,
    #[serde(default, alias = "passes")]
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassingNetworkData {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub min_passes: Option<u32>,
    #[serde(default)]
    pub nodes: Vec<PassingNode>,
    #[serde(default, alias = "links")]
    pub edges: Vec<PassingEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PressingSummary {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub pressures: u32,
    #[serde(default)]
    pub successful_pressures: u32,
    #[serde(default)]
    pub ppda: Option<f64>,
    #[serde(default)]
    pub high_press_regains: u32,
}

impl PressingSummary {
    pub fn success_rate(&self) -> Option<f64> {
        (self.pressures > 0)
            .then(|| self.successful_pressures as f64 / self.pressures as f64 * 100.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PressingData {
    #[serde(default, alias = "pressing")]
    pub teams: Vec<PressingSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    #[serde(default)]
    pub minute: u32,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub player_off: String,
    #[serde(default)]
    pub player_on: String,
    #[serde(default)]
    pub impact_before: Option<f64>,
    #[serde(default)]
    pub impact_after: Option<f64>,
}

impl Substitution {
    pub fn impact_change(&self) -> Option<f64> {
        Some(self.impact_after? - self.impact_before?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionsData {
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

/// One typed response per analytics endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsPayload {
    Momentum(MomentumData),
    ScoreImpact(ScoreImpactData),
    SetPieces(SetPiecesData),
    PassingNetwork(PassingNetworkData),
    Pressing(PressingData),
    Substitutions(SubstitutionsData),
}

impl AnalyticsPayload {
    pub fn tab(&self) -> AnalyticsTab {
        match self {
            AnalyticsPayload::Momentum(_) => AnalyticsTab::Momentum,
            AnalyticsPayload::ScoreImpact(_) => AnalyticsTab::ScoreImpact,
            AnalyticsPayload::SetPieces(_) => AnalyticsTab::SetPieces,
            AnalyticsPayload::PassingNetwork(_) => AnalyticsTab::PassingNetwork,
            AnalyticsPayload::Pressing(_) => AnalyticsTab::Pressing,
            AnalyticsPayload::Substitutions(_) => AnalyticsTab::Substitutions,
        }
    }
}

/// Fetch-on-demand cache for the six analytics tabs.
///
/// A tab's slot is fetched the first time the tab is shown for the current
/// match (and, for the passing network, the current team). Changing match
/// clears every slot and eagerly reloads momentum; changing team while the
/// passing network is showing reloads just that slot.
#[derive(Debug, Clone)]
pub struct AnalyticsCache {
    active: AnalyticsTab,
    slots: [Slot<AnalyticsPayload>; 6],
    /// Team the passing-network slot was requested for.
    passing_team: Option<String>,
}

impl Default for AnalyticsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsCache {
    pub fn new() -> Self {
        Self {
            active: AnalyticsTab::Momentum,
            slots: Default::default(),
            passing_team: None,
        }
    }

    pub fn active(&self) -> AnalyticsTab {
        self.active
    }

    pub fn slot(&self, tab: AnalyticsTab) -> &Slot<AnalyticsPayload> {
        &self.slots[tab.index()]
    }

    pub fn payload(&self, tab: AnalyticsTab) -> Option<&AnalyticsPayload> {
        self.slot(tab).data()
    }

    pub fn is_populated(&self, tab: AnalyticsTab) -> bool {
        self.slot(tab).is_populated()
    }

    pub fn is_loading(&self, tab: AnalyticsTab) -> bool {
        self.slot(tab).is_loading()
    }

    pub fn momentum(&self) -> Option<&MomentumData> {
        match self.payload(AnalyticsTab::Momentum) {
            Some(AnalyticsPayload::Momentum(data)) => Some(data),
            _ => None,
        }
    }

    pub fn passing_network(&self) -> Option<&PassingNetworkData> {
        match self.payload(AnalyticsTab::PassingNetwork) {
            Some(AnalyticsPayload::PassingNetwork(data)) => Some(data),
            _ => None,
        }
    }

    /// Shows `tab`, fetching it only when its slot is empty, not already in
    /// flight, and (for the passing network) still keyed to the selected team.
    pub fn activate_tab(
        &mut self,
        tab: AnalyticsTab,
        selection: &Selection,
        options: &FetchOptions,
    ) -> Option<ProviderCommand> {
        self.active = tab;
        let match_id = selection.match_id?;

        if tab == AnalyticsTab::PassingNetwork && self.passing_team != selection.team {
            self.slots[tab.index()].clear();
        }
        let slot = self.slot(tab);
        if slot.is_populated() || slot.is_loading() {
            return None;
        }
        Some(self.fetch(tab, match_id, selection, options))
    }

    pub fn on_match_changed(
        &mut self,
        selection: &Selection,
        options: &FetchOptions,
    ) -> Vec<ProviderCommand> {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.passing_team = None;
        let Some(match_id) = selection.match_id else {
            return Vec::new();
        };
        vec![self.fetch(AnalyticsTab::Momentum, match_id, selection, options)]
    }

    pub fn on_team_changed(
        &mut self,
        selection: &Selection,
        options: &FetchOptions,
    ) -> Option<ProviderCommand> {
        let slot = &mut self.slots[AnalyticsTab::PassingNetwork.index()];
        if self.active != AnalyticsTab::PassingNetwork {
            if self.passing_team != selection.team {
                slot.clear();
            }
            return None;
        }
        let match_id = selection.match_id?;
        slot.clear();
        Some(self.fetch(AnalyticsTab::PassingNetwork, match_id, selection, options))
    }

    /// Returns false when the payload belongs to a superseded request.
    pub fn apply(&mut self, seq: u64, payload: AnalyticsPayload) -> bool {
        let tab = payload.tab();
        self.slots[tab.index()].resolve(seq, payload)
    }

    pub fn fail(&mut self, tab: AnalyticsTab, seq: u64) -> bool {
        self.slots[tab.index()].fail(seq)
    }

    fn fetch(
        &mut self,
        tab: AnalyticsTab,
        match_id: MatchId,
        selection: &Selection,
        options: &FetchOptions,
    ) -> ProviderCommand {
        let team = if tab == AnalyticsTab::PassingNetwork {
            self.passing_team = selection.team.clone();
            selection.team.clone()
        } else {
            None
        };
        let seq = self.slots[tab.index()].begin();
        ProviderCommand::FetchAnalytics {
            request: AnalyticsRequest {
                tab,
                match_id,
                team,
                interval_minutes: options.momentum_interval_minutes,
                min_passes: options.passing_min_passes,
            },
            seq,
        }
    }
}
