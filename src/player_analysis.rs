use crate::pitch::{FAILURE_RED, SUCCESS_GREEN};
use crate::slot::Slot;
use crate::state::{
    Coords, FetchOptions, Formation, Impact, MatchId, MatchInfo, MatchSummary, Moment,
    PitchVizData, Player, PlayerAnalysis, PlayerComparison, PlayerRef, PositionSample,
    ProviderCommand, Selection, TeamStats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchesPhase {
    Idle,
    Loading,
    Loaded,
}

/// A moment tagged with the side of the ledger it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalMoment {
    pub moment: Moment,
    pub impact: Impact,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceBreakdown {
    pub positive_impact_rate: f64,
    /// `None` when the backend reports pass accuracy as "N/A".
    pub pass_reliability: Option<f64>,
    pub threat_creation: f64,
    pub decision_quality: Option<f64>,
    pub involvement: f64,
}

/// Owns every slot fed by match/team/player selection.
#[derive(Debug, Clone)]
pub struct PlayerAnalysisState {
    pub phase: MatchesPhase,
    pub matches: Slot<Vec<MatchInfo>>,
    pub players: Slot<Vec<Player>>,
    pub analysis: Slot<PlayerAnalysis>,
    pub summary: Slot<MatchSummary>,
    pub team_stats: Slot<TeamStats>,
    pub formation: Slot<Formation>,
    pub comparison: Slot<PlayerComparison>,
    pub active_viz: Option<PitchVizData>,
    pub active_moment: Option<usize>,
    pub analysis_error: Option<String>,
    pub show_heat_map: bool,
    pub show_formation: bool,
    analysis_player: Option<String>,
}

impl Default for PlayerAnalysisState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerAnalysisState {
    pub fn new() -> Self {
        Self {
            phase: MatchesPhase::Idle,
            matches: Slot::new(),
            players: Slot::new(),
            analysis: Slot::new(),
            summary: Slot::new(),
            team_stats: Slot::new(),
            formation: Slot::new(),
            comparison: Slot::new(),
            active_viz: None,
            active_moment: None,
            analysis_error: None,
            show_heat_map: true,
            show_formation: false,
            analysis_player: None,
        }
    }

    pub fn load_matches(&mut self) -> ProviderCommand {
        self.phase = MatchesPhase::Loading;
        ProviderCommand::FetchMatches {
            seq: self.matches.begin(),
        }
    }

    /// Stores the match list and returns the match to auto-select, if nothing
    /// is selected yet.
    pub fn on_matches_loaded(
        &mut self,
        seq: u64,
        matches: Vec<MatchInfo>,
        selection: &Selection,
    ) -> Option<MatchId> {
        if !self.matches.resolve(seq, matches) {
            return None;
        }
        self.phase = MatchesPhase::Loaded;
        if selection.match_id.is_some() {
            return None;
        }
        self.matches.data()?.first().map(|m| m.match_id)
    }

    pub fn on_matches_failed(&mut self, seq: u64) -> bool {
        if !self.matches.fail(seq) {
            return false;
        }
        self.phase = MatchesPhase::Loaded;
        true
    }

    /// Resets every match-dependent slot and fires the four match-level
    /// fetches. They are independent; one failing leaves the others alone.
    pub fn on_match_selected(&mut self, selection: &Selection) -> Vec<ProviderCommand> {
        self.players.clear();
        self.analysis.clear();
        self.summary.clear();
        self.team_stats.clear();
        self.formation.clear();
        self.comparison.clear();
        self.active_viz = None;
        self.active_moment = None;
        self.analysis_error = None;
        self.analysis_player = None;

        let Some(match_id) = selection.match_id else {
            return Vec::new();
        };
        let mut cmds = vec![
            ProviderCommand::FetchPlayers {
                match_id,
                seq: self.players.begin(),
            },
            ProviderCommand::FetchMatchSummary {
                match_id,
                seq: self.summary.begin(),
            },
        ];
        cmds.extend(self.team_fetches(match_id, selection.team.clone()));
        cmds
    }

    pub fn on_players_loaded(
        &mut self,
        seq: u64,
        players: Vec<Player>,
        selection: &mut Selection,
        options: &FetchOptions,
    ) -> Vec<ProviderCommand> {
        if !self.players.resolve(seq, players) {
            return Vec::new();
        }
        if selection.player.is_some() {
            return Vec::new();
        }
        let Some(first) = self.first_player(None).cloned() else {
            return Vec::new();
        };

        let mut cmds = Vec::new();
        let team_changed = selection.team.as_deref() != Some(first.team.as_str());
        selection.team = Some(first.team.clone());
        if team_changed && let Some(match_id) = selection.match_id {
            cmds.extend(self.team_fetches(match_id, selection.team.clone()));
        }
        cmds.extend(self.on_player_selected(selection, first.to_ref(), options));
        cmds
    }

    pub fn on_players_failed(&mut self, seq: u64, error: &str) -> bool {
        if !self.players.fail(seq) {
            return false;
        }
        self.analysis_error = Some(format!("Failed to load players: {error}"));
        true
    }

    /// Switches the team filter: picks the team's first player and reloads
    /// team stats and formation for it.
    pub fn on_team_changed(
        &mut self,
        selection: &mut Selection,
        team: &str,
        options: &FetchOptions,
    ) -> Vec<ProviderCommand> {
        selection.team = Some(team.to_string());
        let Some(match_id) = selection.match_id else {
            return Vec::new();
        };
        let mut cmds = self.team_fetches(match_id, selection.team.clone());
        if let Some(first) = self.first_player(Some(team)).cloned() {
            cmds.extend(self.on_player_selected(selection, first.to_ref(), options));
        }
        cmds
    }

    pub fn on_player_selected(
        &mut self,
        selection: &mut Selection,
        player: PlayerRef,
        options: &FetchOptions,
    ) -> Vec<ProviderCommand> {
        if player.name.trim().is_empty() && player.id.is_none() {
            return Vec::new();
        }
        selection.player = Some(player.clone());
        let Some(match_id) = selection.match_id else {
            return Vec::new();
        };
        self.analysis_error = None;
        self.analysis_player = Some(player.name.clone());
        let mut cmds = vec![ProviderCommand::FetchPlayerAnalysis {
            player,
            match_id,
            top_n: options.top_n,
            seq: self.analysis.begin(),
        }];
        if selection.compare_player.is_some() {
            cmds.extend(self.request_comparison(selection));
        }
        cmds
    }

    /// Replaces the analysis wholesale and shows its best moment on the pitch.
    pub fn on_analysis_loaded(&mut self, seq: u64, analysis: PlayerAnalysis) -> bool {
        if !self.analysis.resolve(seq, analysis) {
            return false;
        }
        self.analysis_error = None;
        self.active_moment = None;
        self.active_viz = self.analysis.data().and_then(|analysis| {
            let player = self.analysis_player.as_deref();
            if let Some(first) = analysis.top_highlights.first() {
                return Some(viz_for_moment(first, Impact::Positive, &analysis.positions, player));
            }
            analysis
                .areas_for_improvement
                .first()
                .map(|m| viz_for_moment(m, Impact::Negative, &analysis.positions, player))
        });
        if self.active_viz.is_some() {
            let first_tagged = self
                .analysis
                .data()
                .and_then(|a| a.top_highlights.first().or(a.areas_for_improvement.first()))
                .cloned();
            self.active_moment = first_tagged.and_then(|first| {
                self.critical_moments()
                    .iter()
                    .position(|cm| cm.moment == first)
            });
        }
        true
    }

    pub fn on_analysis_failed(&mut self, seq: u64, error: &str) -> bool {
        if !self.analysis.fail(seq) {
            return false;
        }
        self.active_viz = None;
        self.active_moment = None;
        self.analysis_error = Some(format!("Failed to load player analysis: {error}"));
        true
    }

    /// Puts the `index`-th critical moment on the pitch.
    pub fn select_moment(&mut self, index: usize) {
        let moments = self.critical_moments();
        let Some(selected) = moments.get(index) else {
            return;
        };
        let positions = self
            .analysis
            .data()
            .map(|a| a.positions.as_slice())
            .unwrap_or_default();
        let mut viz = viz_for_moment(
            &selected.moment,
            selected.impact,
            positions,
            self.analysis_player.as_deref(),
        );
        viz.outcome = viz.outcome.to_lowercase();
        self.active_viz = Some(viz);
        self.active_moment = Some(index);
    }

    pub fn request_comparison(&mut self, selection: &Selection) -> Option<ProviderCommand> {
        let match_id = selection.match_id?;
        let player1_id = selection.player.as_ref()?.id?;
        let player2_id = selection.compare_player?;
        if player1_id == player2_id {
            return None;
        }
        Some(ProviderCommand::FetchComparison {
            match_id,
            player1_id,
            player2_id,
            seq: self.comparison.begin(),
        })
    }

    pub fn critical_moments(&self) -> Vec<CriticalMoment> {
        self.analysis
            .data()
            .map(critical_moments)
            .unwrap_or_default()
    }

    pub fn performance_breakdown(&self) -> Option<PerformanceBreakdown> {
        self.analysis.data().map(performance_breakdown)
    }

    pub fn positions(&self) -> &[PositionSample] {
        self.analysis
            .data()
            .map(|a| a.positions.as_slice())
            .unwrap_or_default()
    }

    /// Teams in the order they first appear in the player list.
    pub fn teams(&self) -> Vec<String> {
        let mut teams: Vec<String> = Vec::new();
        for player in self.players.data().into_iter().flatten() {
            if !teams.iter().any(|t| t == &player.team) {
                teams.push(player.team.clone());
            }
        }
        teams
    }

    pub fn players_for_team(&self, team: Option<&str>) -> Vec<&Player> {
        self.players
            .data()
            .into_iter()
            .flatten()
            .filter(|p| team.is_none_or(|t| p.team == t))
            .collect()
    }

    fn first_player(&self, team: Option<&str>) -> Option<&Player> {
        match team {
            Some(team) => self.players_for_team(Some(team)).into_iter().next(),
            None => {
                let first_team = self.teams().into_iter().next()?;
                self.players
                    .data()?
                    .iter()
                    .find(|p| p.team == first_team)
            }
        }
    }

    fn team_fetches(&mut self, match_id: MatchId, team: Option<String>) -> Vec<ProviderCommand> {
        vec![
            ProviderCommand::FetchTeamStats {
                match_id,
                team: team.clone(),
                seq: self.team_stats.begin(),
            },
            ProviderCommand::FetchFormation {
                match_id,
                team,
                seq: self.formation.begin(),
            },
        ]
    }
}

/// The moment's own geometry, or a synthesized stand-in when it has none.
pub fn viz_for_moment(
    moment: &Moment,
    impact: Impact,
    positions: &[PositionSample],
    player_name: Option<&str>,
) -> PitchVizData {
    match &moment.pitch_viz_data {
        Some(viz) => {
            let mut viz = viz.clone();
            if viz.player_name.is_none() {
                viz.player_name = player_name.map(str::to_string);
            }
            viz
        }
        None => make_fallback_viz_data(moment, impact, positions, player_name),
    }
}

/// Deterministic placeholder geometry for a moment the backend sent without
/// coordinates: one of the player's own touches, picked by match minute.
pub fn make_fallback_viz_data(
    moment: &Moment,
    impact: Impact,
    positions: &[PositionSample],
    player_name: Option<&str>,
) -> PitchVizData {
    let index = moment.minute() as usize % positions.len().max(1);
    let (x, y, kind) = match positions.get(index) {
        Some(pos) => (pos.x, pos.y, pos.kind.clone()),
        None => (60.0, 40.0, "Pass".to_string()),
    };
    let positive = impact == Impact::Positive || moment.highlight_score > 0.0;
    let (outcome, color) = if positive {
        ("complete", SUCCESS_GREEN)
    } else {
        ("incomplete", FAILURE_RED)
    };

    PitchVizData {
        action_type: kind.to_lowercase(),
        outcome: outcome.to_string(),
        start_coords: None,
        end_coords: None,
        coords: Some(Coords::new(x, y)),
        team_color: Some(color.to_hex()),
        player_name: player_name.map(str::to_string),
    }
}

/// Highlights then lowlights, tagged, most recent minute first.
pub fn critical_moments(analysis: &PlayerAnalysis) -> Vec<CriticalMoment> {
    let mut moments: Vec<CriticalMoment> = analysis
        .top_highlights
        .iter()
        .map(|m| CriticalMoment {
            moment: m.clone(),
            impact: Impact::Positive,
        })
        .chain(analysis.areas_for_improvement.iter().map(|m| CriticalMoment {
            moment: m.clone(),
            impact: Impact::Negative,
        }))
        .collect();
    moments.sort_by_key(|cm| std::cmp::Reverse(cm.moment.minute()));
    moments
}

pub fn performance_breakdown(analysis: &PlayerAnalysis) -> PerformanceBreakdown {
    let stats = &analysis.stats;
    let total_actions = stats.total_actions as f64;
    let positive_impact_rate = if total_actions > 0.0 {
        (stats.positive_contributions as f64 / total_actions * 10.0).min(10.0)
    } else {
        0.0
    };

    let highlights = stats
        .highlight_count
        .unwrap_or(analysis.top_highlights.len() as u32) as f64;
    let lowlights = stats
        .lowlight_count
        .unwrap_or(analysis.areas_for_improvement.len() as u32) as f64;
    let decision_quality =
        (highlights + lowlights > 0.0).then(|| highlights / (highlights + lowlights) * 10.0);

    PerformanceBreakdown {
        positive_impact_rate,
        pass_reliability: parse_pass_accuracy(&stats.pass_accuracy).map(|pct| pct / 10.0),
        threat_creation: (stats.total_xt * 10.0).clamp(0.0, 10.0),
        decision_quality,
        involvement: (total_actions / 10.0).min(10.0),
    }
}

/// `"73%"` -> `73.0`; `"N/A"` (or anything unparseable) -> `None`.
pub fn parse_pass_accuracy(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("n/a") {
        return None;
    }
    trimmed
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|pct| pct.is_finite())
        .map(|pct| pct.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_accuracy_parsing() {
        assert_eq!(parse_pass_accuracy("73%"), Some(73.0));
        assert_eq!(parse_pass_accuracy(" 88 % "), Some(88.0));
        assert_eq!(parse_pass_accuracy("N/A"), None);
        assert_eq!(parse_pass_accuracy(""), None);
    }

    #[test]
    fn fallback_without_positions_uses_pitch_centre() {
        let moment = Moment {
            minute: Some(33),
            highlight_score: 0.2,
            ..Moment::default()
        };
        let viz = make_fallback_viz_data(&moment, Impact::Positive, &[], None);
        assert_eq!(viz.coords, Some(Coords::new(60.0, 40.0)));
        assert_eq!(viz.action_type, "pass");
        assert_eq!(viz.outcome, "complete");
    }

    #[test]
    fn fallback_positive_tag_wins_over_negative_score() {
        let moment = Moment {
            minute: Some(1),
            highlight_score: -0.3,
            ..Moment::default()
        };
        let viz = make_fallback_viz_data(&moment, Impact::Positive, &[], None);
        assert_eq!(viz.outcome, "complete");
    }
}
