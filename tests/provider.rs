use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use anyhow::{Result, anyhow};

use wc22_analytics::analytics::{AnalyticsPayload, AnalyticsRequest, AnalyticsTab, MomentumData};
use wc22_analytics::api::AnalyticsApi;
use wc22_analytics::data_manager::{DataAction, DataStatus};
use wc22_analytics::provider::{execute, spawn_provider};
use wc22_analytics::state::{
    Delta, Formation, MatchId, MatchInfo, MatchSummary, Player, PlayerAnalysis, PlayerComparison,
    PlayerId, PlayerRef, ProviderCommand, SlotKey, TeamStats,
};

/// Canned backend: answers match lists and momentum, fails everything else.
#[derive(Default)]
struct FakeApi {
    analysis_calls: Mutex<Vec<PlayerRef>>,
}

impl AnalyticsApi for FakeApi {
    fn matches(&self) -> Result<Vec<MatchInfo>> {
        Ok(vec![MatchInfo {
            match_id: 3788741,
            label: "Qatar vs Ecuador".to_string(),
            competition_stage: Some("Group Stage".to_string()),
            home_team: None,
            away_team: None,
            match_date: None,
        }])
    }

    fn players(&self, _match_id: MatchId) -> Result<Vec<Player>> {
        Err(anyhow!("http 503"))
    }

    fn player_analysis(
        &self,
        player: &PlayerRef,
        _match_id: MatchId,
        _top_n: u32,
    ) -> Result<PlayerAnalysis> {
        self.analysis_calls
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(player.clone());
        Ok(PlayerAnalysis::default())
    }

    fn compare(&self, _: PlayerId, _: PlayerId, _: MatchId) -> Result<PlayerComparison> {
        Err(anyhow!("not found"))
    }

    fn match_summary(&self, _match_id: MatchId) -> Result<MatchSummary> {
        Err(anyhow!("not found"))
    }

    fn team_stats(&self, _match_id: MatchId, _team: Option<&str>) -> Result<TeamStats> {
        Err(anyhow!("not found"))
    }

    fn formation(&self, _match_id: MatchId, _team: Option<&str>) -> Result<Formation> {
        Err(anyhow!("not found"))
    }

    fn analytics(&self, request: &AnalyticsRequest) -> Result<AnalyticsPayload> {
        match request.tab {
            AnalyticsTab::Momentum => Ok(AnalyticsPayload::Momentum(MomentumData::default())),
            _ => Err(anyhow!("http 500")),
        }
    }

    fn competitions(&self) -> Result<Vec<String>> {
        Ok(vec!["World Cup 2022".to_string()])
    }

    fn data_status(&self, _competition: Option<&str>, _team: Option<&str>) -> Result<DataStatus> {
        Ok(DataStatus::default())
    }

    fn fetch_match_data(&self, match_id: MatchId, _competition: Option<&str>) -> Result<String> {
        Ok(format!("fetched {match_id}"))
    }

    fn delete_match_data(&self, _match_id: MatchId, _competition: Option<&str>) -> Result<String> {
        Err(anyhow!("http 409"))
    }

    fn fetch_all_missing(&self) -> Result<String> {
        Ok("nothing missing".to_string())
    }
}

fn request(tab: AnalyticsTab) -> AnalyticsRequest {
    AnalyticsRequest {
        tab,
        match_id: 3788741,
        team: None,
        interval_minutes: 5,
        min_passes: 3,
    }
}

#[test]
fn successes_carry_their_token() {
    let api = FakeApi::default();
    match execute(&api, ProviderCommand::FetchMatches { seq: 4 }) {
        Delta::Matches { seq, matches } => {
            assert_eq!(seq, 4);
            assert_eq!(matches[0].match_id, 3788741);
        }
        other => panic!("unexpected {other:?}"),
    }
    match execute(
        &api,
        ProviderCommand::FetchAnalytics {
            request: request(AnalyticsTab::Momentum),
            seq: 9,
        },
    ) {
        Delta::Analytics { seq, payload } => {
            assert_eq!(seq, 9);
            assert_eq!(payload.tab(), AnalyticsTab::Momentum);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn failures_name_the_slot() {
    let api = FakeApi::default();
    match execute(&api, ProviderCommand::FetchPlayers { match_id: 1, seq: 2 }) {
        Delta::FetchFailed { slot, seq, error } => {
            assert_eq!(slot, SlotKey::Players);
            assert_eq!(seq, 2);
            assert!(error.contains("503"));
        }
        other => panic!("unexpected {other:?}"),
    }
    match execute(
        &api,
        ProviderCommand::FetchAnalytics {
            request: request(AnalyticsTab::Pressing),
            seq: 3,
        },
    ) {
        Delta::FetchFailed { slot, .. } => {
            assert_eq!(slot, SlotKey::Analytics(AnalyticsTab::Pressing));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn mutations_report_outcome() {
    let api = FakeApi::default();
    match execute(
        &api,
        ProviderCommand::FetchMatchData {
            match_id: 77,
            competition: None,
        },
    ) {
        Delta::DataMutation { action, outcome } => {
            assert_eq!(action, DataAction::Fetch(77));
            assert_eq!(outcome, Ok("fetched 77".to_string()));
        }
        other => panic!("unexpected {other:?}"),
    }
    match execute(
        &api,
        ProviderCommand::DeleteMatchData {
            match_id: 78,
            competition: None,
        },
    ) {
        Delta::DataMutation { action, outcome } => {
            assert_eq!(action, DataAction::Delete(78));
            assert!(outcome.is_err_and(|e| e.contains("409")));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn provider_thread_answers_every_command() {
    let api = Arc::new(FakeApi::default());
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let handle = spawn_provider(api.clone(), 2, tx, cmd_rx);

    for seq in 1..=3 {
        cmd_tx
            .send(ProviderCommand::FetchPlayerAnalysis {
                player: PlayerRef {
                    id: Some(seq),
                    name: format!("P{seq}"),
                },
                match_id: 1,
                top_n: 5,
                seq,
            })
            .expect("send");
    }
    cmd_tx.send(ProviderCommand::FetchAllMissing).expect("send");

    let mut seen = Vec::new();
    for _ in 0..4 {
        let delta = rx.recv_timeout(Duration::from_secs(5)).expect("delta");
        seen.push(delta);
    }
    drop(cmd_tx);
    handle.join().expect("provider thread");

    let analysis_seqs = {
        let mut seqs: Vec<u64> = seen
            .iter()
            .filter_map(|d| match d {
                Delta::PlayerAnalysis { seq, .. } => Some(*seq),
                _ => None,
            })
            .collect();
        seqs.sort_unstable();
        seqs
    };
    assert_eq!(analysis_seqs, vec![1, 2, 3]);
    assert!(seen.iter().any(|d| matches!(
        d,
        Delta::DataMutation {
            action: DataAction::FetchAll,
            outcome: Ok(_)
        }
    )));
    assert_eq!(api.analysis_calls.lock().expect("lock").len(), 3);
}
