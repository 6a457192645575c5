use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::slot::Slot;
use crate::state::{MatchId, ProviderCommand};

/// Display order of competition stages. Stages outside this list are left out
/// of the grouped view but stay in the flat list.
pub const STAGE_ORDER: [&str; 6] = [
    "Group Stage",
    "Round of 16",
    "Quarter-finals",
    "Semi-finals",
    "3rd Place",
    "Final",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchDataStatus {
    #[serde(alias = "id")]
    pub match_id: MatchId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub competition: Option<String>,
    #[serde(default, alias = "stage")]
    pub competition_stage: Option<String>,
    #[serde(default)]
    pub has_events: bool,
    #[serde(default)]
    pub has_lineups: bool,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub statsbomb_available: bool,
    #[serde(default)]
    pub last_fetched: Option<String>,
}

impl MatchDataStatus {
    pub fn display_label(&self) -> String {
        if !self.label.trim().is_empty() {
            self.label.clone()
        } else {
            format!("{} vs {}", self.home_team, self.away_team)
        }
    }

    /// The fetch control is only offered for incomplete matches the upstream
    /// provider actually has.
    pub fn can_fetch(&self) -> bool {
        !self.is_complete && self.statsbomb_available
    }

    pub fn can_delete(&self) -> bool {
        self.is_complete
    }

    pub fn involves_team(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataStatusSummary {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub complete: u32,
    #[serde(default)]
    pub missing: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataStatus {
    #[serde(default)]
    pub matches: Vec<MatchDataStatus>,
    #[serde(default)]
    pub summary: Option<DataStatusSummary>,
}

impl DataStatus {
    pub fn summary_or_computed(&self) -> DataStatusSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }
        let complete = self.matches.iter().filter(|m| m.is_complete).count() as u32;
        let total = self.matches.len() as u32;
        DataStatusSummary {
            total,
            complete,
            missing: total - complete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataManagerVariant {
    /// Full-screen modal with competition selection.
    Modal,
    /// Simplified panel pinned to the default competition.
    Panel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAction {
    Fetch(MatchId),
    Delete(MatchId),
    FetchAll,
}

impl DataAction {
    pub fn label(&self) -> String {
        match self {
            DataAction::Fetch(id) => format!("Fetch match {id}"),
            DataAction::Delete(id) => format!("Delete match {id}"),
            DataAction::FetchAll => "Fetch all missing".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirmation {
    Delete { match_id: MatchId, label: String },
    FetchAll { missing: usize },
}

#[derive(Debug, Clone)]
pub struct DataManager {
    pub variant: DataManagerVariant,
    pub open: bool,
    pub competitions: Slot<Vec<String>>,
    pub status: Slot<DataStatus>,
    pub pending: Option<PendingConfirmation>,
    pub error: Option<String>,
    pub message: Option<String>,
    pub selected: usize,
    /// Competition picked in the modal; the panel always shows the default.
    chosen_competition: String,
    default_competition: String,
    team_filter: Option<String>,
    busy: HashSet<MatchId>,
    fetch_all_running: bool,
}

impl DataManager {
    pub fn new(variant: DataManagerVariant, default_competition: &str) -> Self {
        Self {
            variant,
            open: false,
            competitions: Slot::new(),
            status: Slot::new(),
            pending: None,
            error: None,
            message: None,
            selected: 0,
            chosen_competition: default_competition.to_string(),
            default_competition: default_competition.to_string(),
            team_filter: None,
            busy: HashSet::new(),
            fetch_all_running: false,
        }
    }

    pub fn competition(&self) -> &str {
        match self.variant {
            DataManagerVariant::Modal => &self.chosen_competition,
            DataManagerVariant::Panel => &self.default_competition,
        }
    }

    /// The modal's competition, kept across panel visits and sessions.
    pub fn remembered_competition(&self) -> &str {
        &self.chosen_competition
    }

    /// Restores the competition picked in a previous session.
    pub fn remember_competition(&mut self, competition: &str) {
        if !competition.trim().is_empty() {
            self.chosen_competition = competition.to_string();
        }
    }

    pub fn team_filter(&self) -> Option<&str> {
        self.team_filter.as_deref()
    }

    pub fn is_busy(&self, match_id: MatchId) -> bool {
        self.busy.contains(&match_id)
    }

    pub fn is_fetch_all_running(&self) -> bool {
        self.fetch_all_running
    }

    /// Shows the manager and loads a fresh status snapshot (plus the
    /// competition list for the modal).
    pub fn open(&mut self, variant: DataManagerVariant) -> Vec<ProviderCommand> {
        let previous = self.competition().to_string();
        self.variant = variant;
        self.open = true;
        self.pending = None;
        if self.competition() != previous {
            self.reset_listing();
        }
        let mut cmds = Vec::new();
        if variant == DataManagerVariant::Modal && !self.competitions.is_populated() {
            cmds.push(ProviderCommand::FetchCompetitions {
                seq: self.competitions.begin(),
            });
        }
        cmds.push(self.refresh());
        cmds
    }

    pub fn close(&mut self) {
        self.open = false;
        self.pending = None;
    }

    /// User-initiated reload; drops any error on display.
    pub fn refresh(&mut self) -> ProviderCommand {
        self.error = None;
        self.reload()
    }

    fn reload(&mut self) -> ProviderCommand {
        ProviderCommand::FetchDataStatus {
            competition: Some(self.competition().to_string()),
            seq: self.status.begin(),
        }
    }

    fn reset_listing(&mut self) {
        self.team_filter = None;
        self.selected = 0;
        self.status.clear();
    }

    /// Switching competition resets the team filter and reloads. The panel
    /// variant has no competition picker.
    pub fn set_competition(&mut self, competition: &str) -> Option<ProviderCommand> {
        if self.variant == DataManagerVariant::Panel || competition == self.chosen_competition {
            return None;
        }
        self.chosen_competition = competition.to_string();
        self.reset_listing();
        Some(self.refresh())
    }

    pub fn cycle_competition(&mut self, forward: bool) -> Option<ProviderCommand> {
        let list = self.competitions.data()?;
        if list.is_empty() {
            return None;
        }
        let current = list.iter().position(|c| c == &self.chosen_competition);
        let next = match (current, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % list.len(),
            (Some(i), false) => (i + list.len() - 1) % list.len(),
        };
        let target = list[next].clone();
        self.set_competition(&target)
    }

    pub fn set_team_filter(&mut self, team: Option<&str>) {
        self.team_filter = team.map(str::to_string);
        self.selected = 0;
    }

    pub fn cycle_team_filter(&mut self) {
        let teams = self.teams();
        let next = match self.team_filter.as_deref() {
            None => teams.first().cloned(),
            Some(current) => {
                let idx = teams.iter().position(|t| t == current);
                idx.and_then(|i| teams.get(i + 1)).cloned()
            }
        };
        self.set_team_filter(next.as_deref());
    }

    /// Every team in the snapshot, sorted.
    pub fn teams(&self) -> Vec<String> {
        let mut teams: Vec<String> = self
            .status
            .data()
            .into_iter()
            .flat_map(|s| s.matches.iter())
            .flat_map(|m| [m.home_team.clone(), m.away_team.clone()])
            .filter(|t| !t.is_empty())
            .collect();
        teams.sort();
        teams.dedup();
        teams
    }

    /// Flat list after the client-side team filter.
    pub fn filtered(&self) -> Vec<&MatchDataStatus> {
        self.status
            .data()
            .into_iter()
            .flat_map(|s| s.matches.iter())
            .filter(|m| self.team_filter.as_deref().is_none_or(|t| m.involves_team(t)))
            .collect()
    }

    pub fn grouped(&self) -> Vec<(&'static str, Vec<&MatchDataStatus>)> {
        group_by_stage(self.filtered())
    }

    /// Matches in grouped display order; what the cursor walks over.
    pub fn visible(&self) -> Vec<&MatchDataStatus> {
        self.grouped().into_iter().flat_map(|(_, ms)| ms).collect()
    }

    pub fn selected_status(&self) -> Option<&MatchDataStatus> {
        self.visible().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.visible().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn request_fetch(&mut self, match_id: MatchId) -> Option<ProviderCommand> {
        let status = self.find(match_id)?;
        if !status.can_fetch() || self.busy.contains(&match_id) {
            return None;
        }
        self.busy.insert(match_id);
        self.message = None;
        Some(ProviderCommand::FetchMatchData {
            match_id,
            competition: Some(self.competition().to_string()),
        })
    }

    /// Deletion needs confirmation; this only arms it.
    pub fn request_delete(&mut self, match_id: MatchId) -> bool {
        let Some(status) = self.find(match_id) else {
            return false;
        };
        if !status.can_delete() || self.busy.contains(&match_id) {
            return false;
        }
        let label = status.display_label();
        self.pending = Some(PendingConfirmation::Delete { match_id, label });
        true
    }

    pub fn request_fetch_all(&mut self) -> bool {
        if self.fetch_all_running {
            return false;
        }
        let missing = self
            .status
            .data()
            .map(|s| s.matches.iter().filter(|m| m.can_fetch()).count())
            .unwrap_or(0);
        self.pending = Some(PendingConfirmation::FetchAll { missing });
        true
    }

    pub fn confirm(&mut self) -> Option<ProviderCommand> {
        match self.pending.take()? {
            PendingConfirmation::Delete { match_id, .. } => {
                self.busy.insert(match_id);
                Some(ProviderCommand::DeleteMatchData {
                    match_id,
                    competition: Some(self.competition().to_string()),
                })
            }
            PendingConfirmation::FetchAll { .. } => {
                self.fetch_all_running = true;
                Some(ProviderCommand::FetchAllMissing)
            }
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn on_competitions(&mut self, seq: u64, competitions: Vec<String>) -> bool {
        self.competitions.resolve(seq, competitions)
    }

    pub fn on_status(&mut self, seq: u64, status: DataStatus) -> bool {
        if !self.status.resolve(seq, status) {
            return false;
        }
        let len = self.visible().len();
        self.selected = self.selected.min(len.saturating_sub(1));
        true
    }

    pub fn on_status_failed(&mut self, seq: u64, error: &str) -> bool {
        if !self.status.fail(seq) {
            return false;
        }
        self.error = Some(format!("Failed to load data status: {error}"));
        true
    }

    /// Settles a fetch/delete/fetch-all. Always reloads the status snapshot;
    /// the flag says whether siblings should refresh.
    pub fn on_mutation_finished(
        &mut self,
        action: DataAction,
        outcome: Result<String, String>,
    ) -> (Vec<ProviderCommand>, bool) {
        match action {
            DataAction::Fetch(id) | DataAction::Delete(id) => {
                self.busy.remove(&id);
            }
            DataAction::FetchAll => self.fetch_all_running = false,
        }
        let changed = match outcome {
            Ok(message) => {
                self.message = Some(message);
                self.error = None;
                true
            }
            Err(err) => {
                self.error = Some(format!("{} failed: {err}", action.label()));
                false
            }
        };
        (vec![self.reload()], changed)
    }

    fn find(&self, match_id: MatchId) -> Option<&MatchDataStatus> {
        self.status
            .data()?
            .matches
            .iter()
            .find(|m| m.match_id == match_id)
    }
}

pub fn stage_rank(stage: &str) -> Option<usize> {
    STAGE_ORDER
        .iter()
        .position(|s| s.eq_ignore_ascii_case(stage.trim()))
}

/// Buckets matches by stage in [`STAGE_ORDER`]; unknown stages are dropped,
/// empty stages omitted, and input order is kept within a stage.
pub fn group_by_stage<'a>(
    matches: impl IntoIterator<Item = &'a MatchDataStatus>,
) -> Vec<(&'static str, Vec<&'a MatchDataStatus>)> {
    let mut groups: Vec<(&'static str, Vec<&'a MatchDataStatus>)> =
        STAGE_ORDER.iter().map(|stage| (*stage, Vec::new())).collect();
    for status in matches {
        let Some(rank) = status.competition_stage.as_deref().and_then(stage_rank) else {
            continue;
        };
        groups[rank].1.push(status);
    }
    groups.retain(|(_, ms)| !ms.is_empty());
    groups
}
