use wc22_analytics::pitch::{FAILURE_RED, SUCCESS_GREEN, action_color};
use wc22_analytics::player_analysis::{
    PlayerAnalysisState, critical_moments, make_fallback_viz_data, performance_breakdown,
};
use wc22_analytics::state::{
    Coords, FetchOptions, Impact, Moment, PitchVizData, Player, PlayerAnalysis, PlayerRef,
    PlayerStats, PositionSample, ProviderCommand, Selection,
};

fn positions() -> Vec<PositionSample> {
    (0..5)
        .map(|i| PositionSample {
            x: 10.0 * (i + 1) as f64,
            y: 5.0 * (i + 1) as f64,
            kind: ["Pass", "Carry", "Shot", "Tackle", "Block"][i].to_string(),
        })
        .collect()
}

fn moment_at(minute: u32, score: f64) -> Moment {
    Moment {
        minute: Some(minute),
        highlight_score: score,
        ..Moment::default()
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

#[test]
fn fallback_picks_position_by_minute() {
    let moment = moment_at(12, -0.4);
    let positions = positions();
    let viz = make_fallback_viz_data(&moment, Impact::Negative, &positions, Some("Messi"));

    assert_eq!(viz.coords, Some(Coords::new(positions[2].x, positions[2].y)));
    assert_eq!(viz.action_type, "shot");
    assert_eq!(viz.outcome, "incomplete");
    assert_eq!(viz.team_color.as_deref(), Some("#ef4444"));
    assert_eq!(action_color(&viz), FAILURE_RED);
    assert_eq!(viz.player_name.as_deref(), Some("Messi"));
}

#[test]
fn fallback_minute_comes_from_time_display() {
    let moment = Moment {
        time_display: "17:45".to_string(),
        highlight_score: 0.9,
        ..Moment::default()
    };
    let positions = positions();
    let viz = make_fallback_viz_data(&moment, Impact::Positive, &positions, None);
    assert_eq!(viz.coords, Some(Coords::new(positions[2].x, positions[2].y)));
    assert_eq!(viz.outcome, "complete");
    assert_eq!(action_color(&viz), SUCCESS_GREEN);
}

#[test]
fn critical_moments_sort_by_minute_descending() {
    let analysis = PlayerAnalysis {
        top_highlights: vec![moment_at(10, 0.5), moment_at(80, 0.7)],
        areas_for_improvement: vec![moment_at(45, -0.2)],
        ..PlayerAnalysis::default()
    };
    let moments = critical_moments(&analysis);
    let minutes: Vec<u32> = moments.iter().map(|cm| cm.moment.minute()).collect();
    assert_eq!(minutes, vec![80, 45, 10]);
    assert_eq!(moments[1].impact, Impact::Negative);
    assert_eq!(moments[0].impact, Impact::Positive);
}

#[test]
fn pass_reliability_follows_reported_accuracy() {
    let mut analysis = PlayerAnalysis {
        stats: PlayerStats {
            pass_accuracy: "73%".to_string(),
            ..PlayerStats::default()
        },
        ..PlayerAnalysis::default()
    };
    let reliability = performance_breakdown(&analysis)
        .pass_reliability
        .expect("reliability");
    assert!((reliability - 7.3).abs() < 1e-9);

    analysis.stats.pass_accuracy = "N/A".to_string();
    assert_eq!(performance_breakdown(&analysis).pass_reliability, None);
}

#[test]
fn breakdown_scores_stay_within_ten() {
    let analysis = PlayerAnalysis {
        stats: PlayerStats {
            total_actions: 250,
            positive_contributions: 300,
            total_xt: 3.2,
            pass_accuracy: "91%".to_string(),
            highlight_count: Some(6),
            lowlight_count: Some(2),
            ..PlayerStats::default()
        },
        ..PlayerAnalysis::default()
    };
    let b = performance_breakdown(&analysis);
    assert_eq!(b.positive_impact_rate, 10.0);
    assert_eq!(b.threat_creation, 10.0);
    assert_eq!(b.involvement, 10.0);
    assert_eq!(b.decision_quality, Some(7.5));

    let empty = performance_breakdown(&PlayerAnalysis::default());
    assert_eq!(empty.positive_impact_rate, 0.0);
    assert_eq!(empty.decision_quality, None);
}

#[test]
fn players_loaded_auto_selects_first_player_of_first_team() {
    let mut state = PlayerAnalysisState::new();
    let mut selection = Selection {
        match_id: Some(3788741),
        ..Selection::default()
    };
    let cmds = state.on_match_selected(&selection);
    let players_seq = cmds
        .iter()
        .find_map(|cmd| match cmd {
            ProviderCommand::FetchPlayers { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("players fetch");
    assert!(cmds.iter().any(|c| matches!(c, ProviderCommand::FetchMatchSummary { .. })));

    let cmds = state.on_players_loaded(
        players_seq,
        vec![
            player(1, "Aurélien Tchouaméni", "France"),
            player(2, "Antoine Griezmann", "France"),
            player(3, "Lionel Messi", "Argentina"),
        ],
        &mut selection,
        &FetchOptions::default(),
    );

    assert_eq!(selection.team.as_deref(), Some("France"));
    assert_eq!(
        selection.player,
        Some(PlayerRef {
            id: Some(1),
            name: "Aurélien Tchouaméni".to_string()
        })
    );
    assert!(cmds.iter().any(|c| matches!(
        c,
        ProviderCommand::FetchTeamStats { team: Some(t), .. } if t == "France"
    )));
    assert!(cmds.iter().any(|c| matches!(
        c,
        ProviderCommand::FetchPlayerAnalysis { player, top_n: 5, .. } if player.id == Some(1)
    )));
    assert_eq!(state.teams(), vec!["France".to_string(), "Argentina".to_string()]);
}

#[test]
fn stale_analysis_is_discarded() {
    let mut state = PlayerAnalysisState::new();
    let mut selection = Selection {
        match_id: Some(9),
        ..Selection::default()
    };
    let options = FetchOptions::default();
    let first = state.on_player_selected(
        &mut selection,
        PlayerRef {
            id: Some(1),
            name: "A".to_string(),
        },
        &options,
    );
    let second = state.on_player_selected(
        &mut selection,
        PlayerRef {
            id: Some(2),
            name: "B".to_string(),
        },
        &options,
    );
    let seq_of = |cmds: &[ProviderCommand]| match &cmds[0] {
        ProviderCommand::FetchPlayerAnalysis { seq, .. } => *seq,
        other => panic!("unexpected {other:?}"),
    };

    let stale = PlayerAnalysis {
        stats: PlayerStats {
            name: "A".to_string(),
            ..PlayerStats::default()
        },
        ..PlayerAnalysis::default()
    };
    let fresh = PlayerAnalysis {
        stats: PlayerStats {
            name: "B".to_string(),
            ..PlayerStats::default()
        },
        ..PlayerAnalysis::default()
    };

    assert!(state.on_analysis_loaded(seq_of(&second), fresh));
    assert!(!state.on_analysis_loaded(seq_of(&first), stale));
    assert_eq!(
        state.analysis.data().map(|a| a.stats.name.as_str()),
        Some("B")
    );
}

#[test]
fn loaded_analysis_shows_first_highlight() {
    let mut state = PlayerAnalysisState::new();
    let mut selection = Selection {
        match_id: Some(9),
        ..Selection::default()
    };
    let cmds = state.on_player_selected(
        &mut selection,
        PlayerRef {
            id: Some(4),
            name: "Ángel Di María".to_string(),
        },
        &FetchOptions::default(),
    );
    let ProviderCommand::FetchPlayerAnalysis { seq, .. } = cmds[0] else {
        panic!("expected analysis fetch");
    };
    let goal = PitchVizData {
        action_type: "Shot".to_string(),
        outcome: "Goal".to_string(),
        coords: Some(Coords::new(108.0, 36.0)),
        ..PitchVizData::default()
    };
    let analysis = PlayerAnalysis {
        top_highlights: vec![Moment {
            minute: Some(36),
            highlight_score: 1.4,
            pitch_viz_data: Some(goal),
            ..Moment::default()
        }],
        areas_for_improvement: vec![moment_at(70, -0.5)],
        positions: positions(),
        ..PlayerAnalysis::default()
    };
    assert!(state.on_analysis_loaded(seq, analysis));

    let viz = state.active_viz.as_ref().expect("active viz");
    assert_eq!(viz.outcome, "Goal");
    assert_eq!(viz.player_name.as_deref(), Some("Ángel Di María"));
    // Lowlight at 70' sorts ahead of the 36' highlight.
    assert_eq!(state.active_moment, Some(1));

    state.select_moment(0);
    let viz = state.active_viz.as_ref().expect("active viz");
    assert_eq!(viz.outcome, "incomplete");
    assert_eq!(state.active_moment, Some(0));
}

#[test]
fn failed_analysis_sets_visible_error() {
    let mut state = PlayerAnalysisState::new();
    let mut selection = Selection {
        match_id: Some(9),
        ..Selection::default()
    };
    let cmds = state.on_player_selected(
        &mut selection,
        PlayerRef {
            id: None,
            name: "Somebody".to_string(),
        },
        &FetchOptions::default(),
    );
    let ProviderCommand::FetchPlayerAnalysis { seq, .. } = cmds[0] else {
        panic!("expected analysis fetch");
    };
    assert!(state.on_analysis_failed(seq, "http 404"));
    assert!(state.analysis.data().is_none());
    assert!(
        state
            .analysis_error
            .as_deref()
            .is_some_and(|e| e.contains("http 404"))
    );
}

#[test]
fn comparison_needs_two_distinct_ids() {
    let mut state = PlayerAnalysisState::new();
    let mut selection = Selection {
        match_id: Some(9),
        player: Some(PlayerRef {
            id: Some(1),
            name: "A".to_string(),
        }),
        ..Selection::default()
    };
    assert!(state.request_comparison(&selection).is_none());
    selection.compare_player = Some(1);
    assert!(state.request_comparison(&selection).is_none());
    selection.compare_player = Some(2);
    assert!(matches!(
        state.request_comparison(&selection),
        Some(ProviderCommand::FetchComparison {
            player1_id: 1,
            player2_id: 2,
            match_id: 9,
            ..
        })
    ));
}
