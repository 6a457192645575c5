use anyhow::{Context, Result};
use reqwest::{Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::analytics::{
    AnalyticsPayload, AnalyticsRequest, AnalyticsTab, MomentumData, PassingNetworkData,
    PressingData, ScoreImpactData, SetPiecesData, SubstitutionsData,
};
use crate::data_manager::DataStatus;
use crate::error::ApiError;
use crate::http_client::http_client;
use crate::state::{
    Formation, MatchId, MatchInfo, MatchSummary, Player, PlayerAnalysis, PlayerComparison,
    PlayerId, PlayerRef, TeamStats,
};

/// Every backend route the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Matches,
    Players {
        match_id: MatchId,
    },
    PlayerAnalysis {
        player: PlayerRef,
        match_id: MatchId,
        top_n: u32,
    },
    Compare {
        player1_id: PlayerId,
        player2_id: PlayerId,
        match_id: MatchId,
    },
    MatchSummary {
        match_id: MatchId,
    },
    TeamStats {
        match_id: MatchId,
        team: Option<String>,
    },
    Formation {
        match_id: MatchId,
        team: Option<String>,
    },
    Analytics(AnalyticsRequest),
    DataStatus {
        competition: Option<String>,
        team: Option<String>,
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
    Competitions,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::FetchMatchData { .. } | Endpoint::FetchAllMissing => Method::POST,
            Endpoint::DeleteMatchData { .. } => Method::DELETE,
            _ => Method::GET,
        }
    }

    fn path(&self) -> Vec<String> {
        let fixed = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        match self {
            Endpoint::Matches => fixed(&["api", "matches"]),
            Endpoint::Players { .. } => fixed(&["api", "players"]),
            Endpoint::PlayerAnalysis { player, .. } => match player.id {
                // The id route sidesteps names with accents, dots and slashes.
                Some(id) => vec![
                    "api".into(),
                    "player".into(),
                    "id".into(),
                    id.to_string(),
                    "analysis".into(),
                ],
                None => vec![
                    "api".into(),
                    "player".into(),
                    player.name.clone(),
                    "analysis".into(),
                ],
            },
            Endpoint::Compare { .. } => fixed(&["api", "player", "compare"]),
            Endpoint::MatchSummary { .. } => fixed(&["api", "match", "summary"]),
            Endpoint::TeamStats { .. } => fixed(&["api", "team", "stats"]),
            Endpoint::Formation { .. } => fixed(&["api", "formation"]),
            Endpoint::Analytics(req) => {
                let leaf = match req.tab {
                    AnalyticsTab::Momentum => "momentum",
                    AnalyticsTab::ScoreImpact => "score-impact",
                    AnalyticsTab::SetPieces => "set-pieces",
                    AnalyticsTab::PassingNetwork => "passing-network",
                    AnalyticsTab::Pressing => "pressing",
                    AnalyticsTab::Substitutions => "substitutions",
                };
                fixed(&["api", "match", leaf])
            }
            Endpoint::DataStatus { .. } => fixed(&["api", "data", "status"]),
            Endpoint::FetchMatchData { match_id, .. } => vec![
                "api".into(),
                "data".into(),
                "fetch".into(),
                match_id.to_string(),
            ],
            Endpoint::DeleteMatchData { match_id, .. } => vec![
                "api".into(),
                "data".into(),
                "delete".into(),
                match_id.to_string(),
            ],
            Endpoint::FetchAllMissing => fixed(&["api", "data", "fetch-all"]),
            Endpoint::Competitions => fixed(&["api", "data", "competitions"]),
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        match self {
            Endpoint::Matches | Endpoint::FetchAllMissing | Endpoint::Competitions => {}
            Endpoint::Players { match_id } | Endpoint::MatchSummary { match_id } => {
                query.push(("match_id", match_id.to_string()));
            }
            Endpoint::PlayerAnalysis {
                match_id, top_n, ..
            } => {
                query.push(("top_n", top_n.to_string()));
                query.push(("match_id", match_id.to_string()));
            }
            Endpoint::Compare {
                player1_id,
                player2_id,
                match_id,
            } => {
                query.push(("player1_id", player1_id.to_string()));
                query.push(("player2_id", player2_id.to_string()));
                query.push(("match_id", match_id.to_string()));
            }
            Endpoint::TeamStats { match_id, team } | Endpoint::Formation { match_id, team } => {
                query.push(("match_id", match_id.to_string()));
                if let Some(team) = team {
                    query.push(("team", team.clone()));
                }
            }
            Endpoint::Analytics(req) => {
                query.push(("match_id", req.match_id.to_string()));
                match req.tab {
                    AnalyticsTab::Momentum => {
                        query.push(("interval_minutes", req.interval_minutes.to_string()));
                    }
                    AnalyticsTab::PassingNetwork => {
                        if let Some(team) = &req.team {
                            query.push(("team", team.clone()));
                        }
                        query.push(("min_passes", req.min_passes.to_string()));
                    }
                    _ => {}
                }
            }
            Endpoint::DataStatus { competition, team } => {
                if let Some(competition) = competition {
                    query.push(("competition", competition.clone()));
                }
                if let Some(team) = team {
                    query.push(("team", team.clone()));
                }
            }
            Endpoint::FetchMatchData { competition, .. }
            | Endpoint::DeleteMatchData { competition, .. } => {
                if let Some(competition) = competition {
                    query.push(("competition", competition.clone()));
                }
            }
        }
        query
    }

    /// Full URL under `base` (which may itself carry a path prefix).
    pub fn url(&self, base: &str) -> Result<Url, ApiError> {
        let bad_url = |reason: String| ApiError::Url {
            url: base.to_string(),
            reason,
        };
        let mut url = Url::parse(base.trim()).map_err(|err| bad_url(err.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| bad_url("base url cannot carry a path".to_string()))?;
            segments.pop_if_empty();
            for part in self.path() {
                segments.push(&part);
            }
        }
        let query = self.query();
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Everything the provider needs from the backend. [`Backend`] is the HTTP
/// implementation; tests substitute their own.
pub trait AnalyticsApi: Send + Sync {
    fn matches(&self) -> Result<Vec<MatchInfo>>;
    fn players(&self, match_id: MatchId) -> Result<Vec<Player>>;
    fn player_analysis(
        &self,
        player: &PlayerRef,
        match_id: MatchId,
        top_n: u32,
    ) -> Result<PlayerAnalysis>;
    fn compare(
        &self,
        player1_id: PlayerId,
        player2_id: PlayerId,
        match_id: MatchId,
    ) -> Result<PlayerComparison>;
    fn match_summary(&self, match_id: MatchId) -> Result<MatchSummary>;
    fn team_stats(&self, match_id: MatchId, team: Option<&str>) -> Result<TeamStats>;
    fn formation(&self, match_id: MatchId, team: Option<&str>) -> Result<Formation>;
    fn analytics(&self, request: &AnalyticsRequest) -> Result<AnalyticsPayload>;
    fn competitions(&self) -> Result<Vec<String>>;
    fn data_status(&self, competition: Option<&str>, team: Option<&str>) -> Result<DataStatus>;
    fn fetch_match_data(&self, match_id: MatchId, competition: Option<&str>) -> Result<String>;
    fn delete_match_data(&self, match_id: MatchId, competition: Option<&str>) -> Result<String>;
    fn fetch_all_missing(&self) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct Backend {
    base_url: String,
}

impl Backend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends the request; any non-2xx is an error regardless of code.
    fn send(&self, endpoint: &Endpoint) -> Result<String> {
        let client = http_client()?;
        let url = endpoint.url(&self.base_url)?;
        let url_text = url.to_string();
        debug!(method = %endpoint.method(), url = %url_text, "backend request");

        let resp = client
            .request(endpoint.method(), url)
            .send()
            .map_err(|source| ApiError::Transport {
                url: url_text.clone(),
                source,
            })?;
        let status = resp.status();
        let body = resp.text().map_err(|source| ApiError::Transport {
            url: url_text.clone(),
            source,
        })?;
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url_text,
                status: status.as_u16(),
                body: truncate(&body, 200),
            }
            .into());
        }
        Ok(body)
    }
}

impl AnalyticsApi for Backend {
    fn matches(&self) -> Result<Vec<MatchInfo>> {
        let body = self.send(&Endpoint::Matches).context("list matches")?;
        parse_matches_json(&body)
    }

    fn players(&self, match_id: MatchId) -> Result<Vec<Player>> {
        let body = self
            .send(&Endpoint::Players { match_id })
            .context("list players")?;
        parse_players_json(&body)
    }

    fn player_analysis(
        &self,
        player: &PlayerRef,
        match_id: MatchId,
        top_n: u32,
    ) -> Result<PlayerAnalysis> {
        let endpoint = Endpoint::PlayerAnalysis {
            player: player.clone(),
            match_id,
            top_n,
        };
        let body = self
            .send(&endpoint)
            .with_context(|| format!("analysis for {}", player.name))?;
        parse_player_analysis_json(&body)
    }

    fn compare(
        &self,
        player1_id: PlayerId,
        player2_id: PlayerId,
        match_id: MatchId,
    ) -> Result<PlayerComparison> {
        let body = self
            .send(&Endpoint::Compare {
                player1_id,
                player2_id,
                match_id,
            })
            .context("compare players")?;
        parse_json(&body, "comparison")
    }

    fn match_summary(&self, match_id: MatchId) -> Result<MatchSummary> {
        let body = self
            .send(&Endpoint::MatchSummary { match_id })
            .context("match summary")?;
        parse_json(&body, "match summary")
    }

    fn team_stats(&self, match_id: MatchId, team: Option<&str>) -> Result<TeamStats> {
        let body = self
            .send(&Endpoint::TeamStats {
                match_id,
                team: team.map(str::to_string),
            })
            .context("team stats")?;
        parse_json(&body, "team stats")
    }

    fn formation(&self, match_id: MatchId, team: Option<&str>) -> Result<Formation> {
        let body = self
            .send(&Endpoint::Formation {
                match_id,
                team: team.map(str::to_string),
            })
            .context("formation")?;
        parse_json(&body, "formation")
    }

    fn analytics(&self, request: &AnalyticsRequest) -> Result<AnalyticsPayload> {
        let body = self
            .send(&Endpoint::Analytics(request.clone()))
            .with_context(|| request.tab.label().to_lowercase())?;
        parse_analytics_json(request.tab, &body)
    }

    fn competitions(&self) -> Result<Vec<String>> {
        let body = self.send(&Endpoint::Competitions).context("competitions")?;
        parse_competitions_json(&body)
    }

    fn data_status(&self, competition: Option<&str>, team: Option<&str>) -> Result<DataStatus> {
        let body = self
            .send(&Endpoint::DataStatus {
                competition: competition.map(str::to_string),
                team: team.map(str::to_string),
            })
            .context("data status")?;
        parse_data_status_json(&body)
    }

    fn fetch_match_data(&self, match_id: MatchId, competition: Option<&str>) -> Result<String> {
        let body = self
            .send(&Endpoint::FetchMatchData {
                match_id,
                competition: competition.map(str::to_string),
            })
            .context("fetch match data")?;
        Ok(mutation_message(&body, "Match data fetched"))
    }

    fn delete_match_data(&self, match_id: MatchId, competition: Option<&str>) -> Result<String> {
        let body = self
            .send(&Endpoint::DeleteMatchData {
                match_id,
                competition: competition.map(str::to_string),
            })
            .context("delete match data")?;
        Ok(mutation_message(&body, "Match data deleted"))
    }

    fn fetch_all_missing(&self) -> Result<String> {
        let body = self
            .send(&Endpoint::FetchAllMissing)
            .context("fetch all missing")?;
        Ok(mutation_message(&body, "Missing matches fetched"))
    }
}

fn is_blank(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "null"
}

fn parse_json<T: DeserializeOwned>(raw: &str, what: &'static str) -> Result<T> {
    let value = serde_json::from_str::<T>(raw.trim())
        .map_err(|source| ApiError::Decode { what, source })?;
    Ok(value)
}

/// Accepts either a bare array or an object wrapping it under `key`.
fn parse_list<T: DeserializeOwned>(raw: &str, key: &str, what: &'static str) -> Result<Vec<T>> {
    if is_blank(raw) {
        return Ok(Vec::new());
    }
    let root: Value = parse_json(raw, what)?;
    let list = match root {
        Value::Array(_) => root,
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    };
    if list.is_null() {
        return Ok(Vec::new());
    }
    let items =
        serde_json::from_value::<Vec<T>>(list).map_err(|source| ApiError::Decode { what, source })?;
    Ok(items)
}

pub fn parse_matches_json(raw: &str) -> Result<Vec<MatchInfo>> {
    parse_list(raw, "matches", "matches")
}

pub fn parse_players_json(raw: &str) -> Result<Vec<Player>> {
    parse_list(raw, "players", "players")
}

pub fn parse_player_analysis_json(raw: &str) -> Result<PlayerAnalysis> {
    if is_blank(raw) {
        return Ok(PlayerAnalysis::default());
    }
    parse_json(raw, "player analysis")
}

pub fn parse_data_status_json(raw: &str) -> Result<DataStatus> {
    if is_blank(raw) {
        return Ok(DataStatus::default());
    }
    let root: Value = parse_json(raw, "data status")?;
    if root.is_array() {
        let matches = serde_json::from_value(root).map_err(|source| ApiError::Decode {
            what: "data status",
            source,
        })?;
        return Ok(DataStatus {
            matches,
            summary: None,
        });
    }
    let status = serde_json::from_value(root).map_err(|source| ApiError::Decode {
        what: "data status",
        source,
    })?;
    Ok(status)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CompetitionEntry {
    Name(String),
    Object {
        #[serde(alias = "competition_name")]
        name: String,
    },
}

pub fn parse_competitions_json(raw: &str) -> Result<Vec<String>> {
    let entries: Vec<CompetitionEntry> = parse_list(raw, "competitions", "competitions")?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            CompetitionEntry::Name(name) | CompetitionEntry::Object { name } => name,
        })
        .filter(|name| !name.trim().is_empty())
        .collect())
}

pub fn parse_analytics_json(tab: AnalyticsTab, raw: &str) -> Result<AnalyticsPayload> {
    let raw = if is_blank(raw) { "{}" } else { raw };
    let payload = match tab {
        AnalyticsTab::Momentum => {
            AnalyticsPayload::Momentum(parse_json::<MomentumData>(raw, "momentum")?)
        }
        AnalyticsTab::ScoreImpact => {
            AnalyticsPayload::ScoreImpact(parse_json::<ScoreImpactData>(raw, "score impact")?)
        }
        AnalyticsTab::SetPieces => {
            AnalyticsPayload::SetPieces(parse_json::<SetPiecesData>(raw, "set pieces")?)
        }
        AnalyticsTab::PassingNetwork => AnalyticsPayload::PassingNetwork(parse_json::<
            PassingNetworkData,
        >(
            raw, "passing network"
        )?),
        AnalyticsTab::Pressing => {
            AnalyticsPayload::Pressing(parse_json::<PressingData>(raw, "pressing")?)
        }
        AnalyticsTab::Substitutions => {
            AnalyticsPayload::Substitutions(parse_json::<SubstitutionsData>(raw, "substitutions")?)
        }
    };
    Ok(payload)
}

/// Mutation endpoints answer with a loose `{status, message, fetched, failed}`
/// object; squeeze it into one console line.
pub fn mutation_message(raw: &str, fallback: &str) -> String {
    let Ok(root) = serde_json::from_str::<Value>(raw.trim()) else {
        return fallback.to_string();
    };
    let message = root
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string());
    let counts: Vec<String> = ["fetched", "failed", "skipped"]
        .iter()
        .filter_map(|key| root.get(*key).and_then(Value::as_u64).map(|n| format!("{key} {n}")))
        .collect();
    if counts.is_empty() {
        message
    } else {
        format!("{message} ({})", counts.join(", "))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}
