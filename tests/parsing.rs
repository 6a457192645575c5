use wc22_analytics::analytics::{AnalyticsPayload, AnalyticsTab};
use wc22_analytics::api::{
    Endpoint, mutation_message, parse_analytics_json, parse_competitions_json,
    parse_data_status_json, parse_matches_json, parse_player_analysis_json, parse_players_json,
};
use wc22_analytics::error::ApiError;
use wc22_analytics::state::{Coords, PlayerAnalysis, PlayerRef};

static PLAYER_ANALYSIS_JSON: &str = include_str!("fixtures/player_analysis.json");

#[test]
fn player_analysis_fixture() {
    let analysis = parse_player_analysis_json(PLAYER_ANALYSIS_JSON).expect("valid fixture");
    assert_eq!(analysis.stats.total_actions, 87);
    assert_eq!(analysis.stats.pass_accuracy, "73.5%");
    assert_eq!(analysis.stats.ml_models_active.get("xt"), Some(&true));
    assert_eq!(analysis.top_highlights.len(), 3);
    assert_eq!(analysis.areas_for_improvement.len(), 1);
    assert_eq!(analysis.positions.len(), 5);
    assert_eq!(analysis.positions[3].kind, "Shot");

    let penalty = &analysis.top_highlights[0];
    assert_eq!(penalty.minute(), 22);
    let viz = penalty.pitch_viz_data.as_ref().expect("viz");
    assert_eq!(viz.action_type, "Shot");
    assert_eq!(viz.coords, Some(Coords::new(108.0, 40.0)));

    let through_ball = analysis.top_highlights[1]
        .pitch_viz_data
        .as_ref()
        .expect("viz");
    assert_eq!(through_ball.start_coords, Some(Coords::new(62.5, 30.1)));
    assert!(analysis.top_highlights[2].pitch_viz_data.is_none());
}

#[test]
fn loose_stat_shapes() {
    let raw = r#"{
        "stats": {"name": "X", "pass_accuracy": 81, "xt": 0.4},
        "lowlights": [{"time_display": "5:02", "highlight_score": -0.1,
                       "pitch_viz_data": {"type": "Pass", "outcome": null,
                                          "start_coords": [1, null]}}],
        "all_positions": []
    }"#;
    let analysis = parse_player_analysis_json(raw).expect("valid json");
    assert_eq!(analysis.stats.pass_accuracy, "81");
    assert_eq!(analysis.stats.total_xt, 0.4);
    let viz = analysis.areas_for_improvement[0]
        .pitch_viz_data
        .as_ref()
        .expect("viz");
    assert_eq!(viz.outcome, "");
    assert_eq!(
        viz.start_coords,
        Some(Coords {
            x: Some(1.0),
            y: None
        })
    );
    assert_eq!(analysis.areas_for_improvement[0].minute(), 5);

    assert_eq!(
        parse_player_analysis_json("  ").expect("blank"),
        PlayerAnalysis::default()
    );
}

#[test]
fn lists_accept_bare_or_wrapped_arrays() {
    let bare = r#"[{"match_id": 3869685, "home_team": "Argentina", "away_team": "France"}]"#;
    let wrapped = r#"{"matches": [{"id": 3869685, "label": "Argentina vs France (Final)"}]}"#;
    let a = parse_matches_json(bare).expect("bare");
    let b = parse_matches_json(wrapped).expect("wrapped");
    assert_eq!(a[0].match_id, b[0].match_id);
    assert_eq!(a[0].display_label(), "Argentina vs France");
    assert_eq!(b[0].display_label(), "Argentina vs France (Final)");
    assert!(parse_matches_json("").expect("blank").is_empty());
    assert!(parse_matches_json(r#"{"matches": null}"#).expect("null").is_empty());

    let players = parse_players_json(
        r#"{"players": [{"player_id": 5503, "name": "Lionel Andrés Messi Cuccittini",
            "nickname": "Lionel Messi", "jersey": 10, "team": "Argentina"}]}"#,
    )
    .expect("players");
    assert_eq!(players[0].id, Some(5503));
    assert_eq!(players[0].jersey_number, Some(10));
    assert_eq!(players[0].display_name(), "Lionel Messi");
}

#[test]
fn malformed_json_is_a_decode_error() {
    let err = parse_matches_json("{not json").expect_err("should fail");
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Decode { .. })
    ));
}

#[test]
fn analytics_payloads_by_tab() {
    let momentum = parse_analytics_json(
        AnalyticsTab::Momentum,
        r#"{"home_team": "Argentina", "away_team": "France",
            "momentum": [{"start_minute": 0, "end_minute": 5,
                          "home_dominance": 0.6, "away_dominance": -0.9}]}"#,
    )
    .expect("momentum");
    let AnalyticsPayload::Momentum(data) = &momentum else {
        panic!("wrong payload {momentum:?}");
    };
    assert_eq!(data.intervals.len(), 1);
    assert_eq!(data.max_dominance(), 0.9);
    assert_eq!(momentum.tab(), AnalyticsTab::Momentum);

    let network = parse_analytics_json(
        AnalyticsTab::PassingNetwork,
        r#"{"nodes": [{"name": "Enzo Fernández", "x": 48, "y": 42, "pass_count": 71}],
            "links": [{"source": "Enzo Fernández", "target": "Lionel Messi", "passes": 9}]}"#,
    )
    .expect("network");
    let AnalyticsPayload::PassingNetwork(data) = network else {
        panic!("wrong payload");
    };
    assert_eq!(data.nodes[0].passes, 71);
    assert_eq!(data.edges[0].count, 9);

    let subs = parse_analytics_json(AnalyticsTab::Substitutions, "null").expect("null body");
    assert_eq!(subs.tab(), AnalyticsTab::Substitutions);
}

#[test]
fn data_status_and_competitions() {
    let status = parse_data_status_json(
        r#"{"matches": [{"id": 1, "stage": "Final", "is_complete": true}],
            "summary": {"total": 64, "complete": 10, "missing": 54}}"#,
    )
    .expect("status");
    assert_eq!(status.matches[0].competition_stage.as_deref(), Some("Final"));
    assert_eq!(status.summary_or_computed().total, 64);

    let bare = parse_data_status_json(r#"[{"match_id": 2}]"#).expect("bare status");
    assert_eq!(bare.matches.len(), 1);
    assert!(bare.summary.is_none());

    let names = parse_competitions_json(
        r#"{"competitions": ["World Cup 2022", {"name": "Euro 2020"}, ""]}"#,
    )
    .expect("competitions");
    assert_eq!(names, vec!["World Cup 2022", "Euro 2020"]);
}

#[test]
fn mutation_messages() {
    assert_eq!(
        mutation_message(r#"{"message": "Fetched 3 matches", "fetched": 3, "failed": 1}"#, "x"),
        "Fetched 3 matches (fetched 3, failed 1)"
    );
    assert_eq!(mutation_message("not json", "Done"), "Done");
    assert_eq!(mutation_message(r#"{"status": "ok"}"#, "Done"), "Done");
}

#[test]
fn endpoint_urls() {
    let base = "http://localhost:8000/";
    let by_id = Endpoint::PlayerAnalysis {
        player: PlayerRef {
            id: Some(5503),
            name: "Lionel Messi".to_string(),
        },
        match_id: 3869685,
        top_n: 5,
    };
    assert_eq!(
        by_id.url(base).expect("url").as_str(),
        "http://localhost:8000/api/player/id/5503/analysis?top_n=5&match_id=3869685"
    );

    let by_name = Endpoint::PlayerAnalysis {
        player: PlayerRef {
            id: None,
            name: "Ángel Di María".to_string(),
        },
        match_id: 1,
        top_n: 3,
    };
    let url = by_name.url(base).expect("url");
    assert_eq!(
        url.path(),
        "/api/player/%C3%81ngel%20Di%20Mar%C3%ADa/analysis"
    );

    let matches = Endpoint::Matches.url("http://example.test/backend").expect("url");
    assert_eq!(matches.as_str(), "http://example.test/backend/api/matches");

    let team_stats = Endpoint::TeamStats {
        match_id: 7,
        team: Some("Saudi Arabia".to_string()),
    };
    assert_eq!(
        team_stats.url(base).expect("url").query(),
        Some("match_id=7&team=Saudi+Arabia")
    );

    let delete = Endpoint::DeleteMatchData {
        match_id: 9,
        competition: Some("World Cup 2022".to_string()),
    };
    assert_eq!(delete.method(), reqwest::Method::DELETE);
    assert_eq!(
        delete.url(base).expect("url").as_str(),
        "http://localhost:8000/api/data/delete/9?competition=World+Cup+2022"
    );

    assert!(matches!(
        Endpoint::Matches.url("not a url"),
        Err(ApiError::Url { .. })
    ));
}
