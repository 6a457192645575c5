use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use tracing::{info, warn};

use crate::api::AnalyticsApi;
use crate::data_manager::DataAction;
use crate::state::{Delta, ProviderCommand, SlotKey};

/// Runs backend requests off the UI thread. Each command becomes one job on
/// the fetch pool and answers with exactly one [`Delta`]. The thread exits
/// once every command sender is dropped.
pub fn spawn_provider(
    api: Arc<dyn AnalyticsApi>,
    parallelism: usize,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let pool = build_fetch_pool(parallelism);
        for cmd in cmd_rx {
            let api = api.clone();
            let tx = tx.clone();
            let job = move || {
                let delta = execute(api.as_ref(), cmd);
                let _ = tx.send(delta);
            };
            if let Some(pool) = pool.as_ref() {
                pool.spawn(job);
            } else {
                thread::spawn(job);
            }
        }
        info!("provider command channel closed");
    })
}

fn build_fetch_pool(parallelism: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.clamp(2, 32))
        .thread_name(|idx| format!("fetch-{idx}"))
        .build()
        .ok()
}

/// Performs one command synchronously. Failures come back as
/// [`Delta::FetchFailed`] tagged with the slot and token that asked.
pub fn execute(api: &dyn AnalyticsApi, cmd: ProviderCommand) -> Delta {
    match cmd {
        ProviderCommand::FetchMatches { seq } => match api.matches() {
            Ok(matches) => Delta::Matches { seq, matches },
            Err(err) => failed(SlotKey::Matches, seq, err),
        },
        ProviderCommand::FetchPlayers { match_id, seq } => match api.players(match_id) {
            Ok(players) => Delta::Players { seq, players },
            Err(err) => failed(SlotKey::Players, seq, err),
        },
        ProviderCommand::FetchPlayerAnalysis {
            player,
            match_id,
            top_n,
            seq,
        } => match api.player_analysis(&player, match_id, top_n) {
            Ok(analysis) => Delta::PlayerAnalysis { seq, analysis },
            Err(err) => failed(SlotKey::PlayerAnalysis, seq, err),
        },
        ProviderCommand::FetchMatchSummary { match_id, seq } => match api.match_summary(match_id)
        {
            Ok(summary) => Delta::MatchSummary { seq, summary },
            Err(err) => failed(SlotKey::MatchSummary, seq, err),
        },
        ProviderCommand::FetchTeamStats {
            match_id,
            team,
            seq,
        } => match api.team_stats(match_id, team.as_deref()) {
            Ok(stats) => Delta::TeamStats { seq, stats },
            Err(err) => failed(SlotKey::TeamStats, seq, err),
        },
        ProviderCommand::FetchFormation {
            match_id,
            team,
            seq,
        } => match api.formation(match_id, team.as_deref()) {
            Ok(formation) => Delta::Formation { seq, formation },
            Err(err) => failed(SlotKey::Formation, seq, err),
        },
        ProviderCommand::FetchComparison {
            match_id,
            player1_id,
            player2_id,
            seq,
        } => match api.compare(player1_id, player2_id, match_id) {
            Ok(comparison) => Delta::Comparison { seq, comparison },
            Err(err) => failed(SlotKey::Comparison, seq, err),
        },
        ProviderCommand::FetchAnalytics { request, seq } => match api.analytics(&request) {
            Ok(payload) => Delta::Analytics { seq, payload },
            Err(err) => failed(SlotKey::Analytics(request.tab), seq, err),
        },
        ProviderCommand::FetchCompetitions { seq } => match api.competitions() {
            Ok(competitions) => Delta::Competitions { seq, competitions },
            Err(err) => failed(SlotKey::Competitions, seq, err),
        },
        ProviderCommand::FetchDataStatus { competition, seq } => {
            match api.data_status(competition.as_deref(), None) {
                Ok(status) => Delta::DataStatus { seq, status },
                Err(err) => failed(SlotKey::DataStatus, seq, err),
            }
        }
        ProviderCommand::FetchMatchData {
            match_id,
            competition,
        } => mutation(
            DataAction::Fetch(match_id),
            api.fetch_match_data(match_id, competition.as_deref()),
        ),
        ProviderCommand::DeleteMatchData {
            match_id,
            competition,
        } => mutation(
            DataAction::Delete(match_id),
            api.delete_match_data(match_id, competition.as_deref()),
        ),
        ProviderCommand::FetchAllMissing => {
            mutation(DataAction::FetchAll, api.fetch_all_missing())
        }
    }
}

fn failed(slot: SlotKey, seq: u64, err: anyhow::Error) -> Delta {
    warn!(?slot, seq, error = %format!("{err:#}"), "backend request failed");
    Delta::FetchFailed {
        slot,
        seq,
        error: format!("{err:#}"),
    }
}

fn mutation(action: DataAction, result: anyhow::Result<String>) -> Delta {
    let outcome = match result {
        Ok(message) => {
            info!(action = %action.label(), "data mutation finished");
            Ok(message)
        }
        Err(err) => {
            warn!(action = %action.label(), error = %format!("{err:#}"), "data mutation failed");
            Err(format!("{err:#}"))
        }
    };
    Delta::DataMutation { action, outcome }
}
