use wc22_analytics::player_analysis::MatchesPhase;
use wc22_analytics::state::{
    AppState, Delta, FetchOptions, MatchInfo, MatchSummary, Player, ProviderCommand, Screen,
    SlotKey, apply_delta,
};
use wc22_analytics::theme::Theme;

fn match_info(id: u64) -> MatchInfo {
    MatchInfo {
        match_id: id,
        label: format!("Match {id}"),
        competition_stage: None,
        home_team: None,
        away_team: None,
        match_date: None,
    }
}

fn player(id: u64, name: &str, team: &str) -> Player {
    Player {
        id: Some(id),
        name: name.to_string(),
        nickname: None,
        jersey_number: None,
        team: team.to_string(),
        position: None,
    }
}

fn fetch_matches_seq(cmds: &[ProviderCommand]) -> u64 {
    cmds.iter()
        .find_map(|c| match c {
            ProviderCommand::FetchMatches { seq } => Some(*seq),
            _ => None,
        })
        .expect("match list fetch")
}

#[test]
fn match_list_auto_selects_first_match_once() {
    let mut state = AppState::new();
    assert_eq!(state.screen, Screen::Analysis);
    let seq = fetch_matches_seq(&state.start());
    assert_eq!(state.analysis.phase, MatchesPhase::Loading);

    let cmds = apply_delta(
        &mut state,
        Delta::Matches {
            seq,
            matches: vec![match_info(10), match_info(20)],
        },
    );
    assert_eq!(state.analysis.phase, MatchesPhase::Loaded);
    assert_eq!(state.selection.match_id, Some(10));
    assert!(cmds.iter().any(|c| matches!(c, ProviderCommand::FetchPlayers { match_id: 10, .. })));
    assert!(cmds.iter().any(|c| matches!(c, ProviderCommand::FetchFormation { .. })));

    // A reload keeps the current selection.
    let seq = fetch_matches_seq(&[state.analysis.load_matches()]);
    let cmds = apply_delta(
        &mut state,
        Delta::Matches {
            seq,
            matches: vec![match_info(20), match_info(10)],
        },
    );
    assert!(cmds.is_empty());
    assert_eq!(state.selection.match_id, Some(10));
}

#[test]
fn empty_match_list_selects_nothing() {
    let mut state = AppState::new();
    let seq = fetch_matches_seq(&state.start());
    let cmds = apply_delta(
        &mut state,
        Delta::Matches {
            seq,
            matches: Vec::new(),
        },
    );
    assert!(cmds.is_empty());
    assert_eq!(state.selection.match_id, None);
}

#[test]
fn stale_responses_do_not_leak_across_matches() {
    let mut state = AppState::new();
    let first = state.select_match(1);
    let old_summary_seq = first
        .iter()
        .find_map(|c| match c {
            ProviderCommand::FetchMatchSummary { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("summary fetch");
    let old_players_seq = first
        .iter()
        .find_map(|c| match c {
            ProviderCommand::FetchPlayers { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("players fetch");

    state.select_match(2);

    apply_delta(
        &mut state,
        Delta::MatchSummary {
            seq: old_summary_seq,
            summary: MatchSummary {
                match_id: Some(1),
                ..MatchSummary::default()
            },
        },
    );
    let cmds = apply_delta(
        &mut state,
        Delta::Players {
            seq: old_players_seq,
            players: vec![player(1, "Old", "Old FC")],
        },
    );
    assert!(cmds.is_empty());
    assert!(state.analysis.summary.data().is_none());
    assert!(state.analysis.players.data().is_none());
    assert_eq!(state.selection.player, None);

    // Superseded failures are silent.
    let logs_before = state.logs.len();
    apply_delta(
        &mut state,
        Delta::FetchFailed {
            slot: SlotKey::Players,
            seq: old_players_seq,
            error: "timeout".to_string(),
        },
    );
    assert_eq!(state.logs.len(), logs_before);
    assert!(state.analysis.analysis_error.is_none());
}

#[test]
fn players_failure_surfaces_inline_error() {
    let mut state = AppState::new();
    let cmds = state.select_match(5);
    let seq = cmds
        .iter()
        .find_map(|c| match c {
            ProviderCommand::FetchPlayers { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("players fetch");
    apply_delta(
        &mut state,
        Delta::FetchFailed {
            slot: SlotKey::Players,
            seq,
            error: "http 502".to_string(),
        },
    );
    assert!(
        state
            .analysis
            .analysis_error
            .as_deref()
            .is_some_and(|e| e.contains("http 502"))
    );
    assert!(state.logs.back().is_some_and(|l| l.contains("Players")));
}

#[test]
fn compare_player_triggers_comparison_fetch() {
    let mut state = AppState::new();
    let cmds = state.select_match(5);
    let seq = cmds
        .iter()
        .find_map(|c| match c {
            ProviderCommand::FetchPlayers { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("players fetch");
    apply_delta(
        &mut state,
        Delta::Players {
            seq,
            players: vec![player(1, "A", "X"), player(2, "B", "Y")],
        },
    );
    let cmds = state.set_compare_player(2);
    assert!(matches!(
        cmds.as_slice(),
        [ProviderCommand::FetchComparison {
            player1_id: 1,
            player2_id: 2,
            match_id: 5,
            ..
        }]
    ));

    // Switching team moves to that team's first player.
    let cmds = state.select_team("Y");
    assert!(cmds.iter().any(|c| matches!(
        c,
        ProviderCommand::FetchPlayerAnalysis { player, .. } if player.id == Some(2)
    )));
    assert!(cmds.iter().any(|c| matches!(
        c,
        ProviderCommand::FetchTeamStats { team: Some(team), .. } if team == "Y"
    )));
    assert!(cmds.iter().any(|c| matches!(
        c,
        ProviderCommand::FetchFormation { team: Some(team), .. } if team == "Y"
    )));
    assert!(state.select_team("Y").is_empty());
}

#[test]
fn options_flow_into_requests() {
    let options = FetchOptions {
        momentum_interval_minutes: 15,
        passing_min_passes: 5,
        top_n: 8,
    };
    let mut state = AppState::with_options(options, "Euro 2020");
    let cmds = state.select_match(3);
    assert!(cmds.iter().any(|c| matches!(
        c,
        ProviderCommand::FetchAnalytics { request, .. } if request.interval_minutes == 15
    )));
    assert_eq!(state.data_manager.competition(), "Euro 2020");
}

#[test]
fn console_keeps_recent_lines() {
    let mut state = AppState::new();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert!(state.logs.back().is_some_and(|l| l.ends_with("line 249")));
}

#[test]
fn theme_toggles() {
    let mut state = AppState::new();
    assert_eq!(state.theme, Theme::Dark);
    state.toggle_theme();
    assert_eq!(state.theme, Theme::Light);
}
