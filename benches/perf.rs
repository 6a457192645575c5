use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use wc22_analytics::api::{parse_analytics_json, parse_player_analysis_json};
use wc22_analytics::analytics::AnalyticsTab;
use wc22_analytics::pitch::{DEFAULT_TEAL, PitchInput, passing_network_scene, render_pitch};
use wc22_analytics::player_analysis::{critical_moments, performance_breakdown, viz_for_moment};
use wc22_analytics::state::{FormationPlayer, Impact, PositionSample};

fn bench_player_analysis_parse(c: &mut Criterion) {
    c.bench_function("player_analysis_parse", |b| {
        b.iter(|| {
            let analysis = parse_player_analysis_json(black_box(PLAYER_ANALYSIS_JSON)).unwrap();
            black_box(analysis.top_highlights.len());
        })
    });
}

fn bench_critical_moments(c: &mut Criterion) {
    let analysis = parse_player_analysis_json(PLAYER_ANALYSIS_JSON).expect("valid fixture json");
    c.bench_function("critical_moments", |b| {
        b.iter(|| {
            let moments = critical_moments(black_box(&analysis));
            black_box(performance_breakdown(&analysis));
            black_box(moments.len());
        })
    });
}

fn bench_render_pitch(c: &mut Criterion) {
    let analysis = parse_player_analysis_json(PLAYER_ANALYSIS_JSON).expect("valid fixture json");
    let positions: Vec<PositionSample> = (0..400)
        .map(|i| PositionSample {
            x: (i * 7 % 120) as f64,
            y: (i * 13 % 80) as f64,
            kind: ["Pass", "Carry", "Shot", "Pressure"][i % 4].to_string(),
        })
        .collect();
    let formation: Vec<FormationPlayer> = (0..11)
        .map(|i| FormationPlayer {
            player_id: Some(i),
            name: format!("Player {i}"),
            jersey_number: Some(i as u32 + 1),
            position: None,
            x: 10.0 + (i * 9) as f64,
            y: 10.0 + (i * 6 % 60) as f64,
        })
        .collect();
    let viz = viz_for_moment(
        &analysis.top_highlights[1],
        Impact::Positive,
        &analysis.positions,
        Some("Lionel Messi"),
    );

    c.bench_function("render_pitch", |b| {
        b.iter(|| {
            let scene = render_pitch(black_box(&PitchInput {
                active: Some(&viz),
                positions: &positions,
                formation: &formation,
                show_heat_map: true,
                show_formation: true,
                team_color: DEFAULT_TEAL,
            }));
            black_box(scene.primitives.len());
        })
    });
}

fn bench_passing_network(c: &mut Criterion) {
    let payload = parse_analytics_json(AnalyticsTab::PassingNetwork, PASSING_JSON)
        .expect("valid passing json");
    let wc22_analytics::analytics::AnalyticsPayload::PassingNetwork(network) = payload else {
        panic!("expected passing network payload");
    };
    c.bench_function("passing_network_scene", |b| {
        b.iter(|| {
            let scene = passing_network_scene(black_box(&network), DEFAULT_TEAL);
            black_box(scene.primitives.len());
        })
    });
}

criterion_group!(
    perf,
    bench_player_analysis_parse,
    bench_critical_moments,
    bench_render_pitch,
    bench_passing_network
);
criterion_main!(perf);

static PLAYER_ANALYSIS_JSON: &str = include_str!("../tests/fixtures/player_analysis.json");
static PASSING_JSON: &str = r#"{
  "team": "Argentina",
  "nodes": [
    {"player": "Emiliano Martínez", "x": 5, "y": 40, "passes": 22},
    {"player": "Cristian Romero", "x": 22, "y": 30, "passes": 48},
    {"player": "Nicolás Otamendi", "x": 22, "y": 50, "passes": 51},
    {"player": "Rodrigo De Paul", "x": 50, "y": 28, "passes": 63},
    {"player": "Enzo Fernández", "x": 48, "y": 42, "passes": 71},
    {"player": "Lionel Messi", "x": 80, "y": 36, "passes": 55}
  ],
  "edges": [
    {"from": "Cristian Romero", "to": "Nicolás Otamendi", "count": 14},
    {"from": "Nicolás Otamendi", "to": "Enzo Fernández", "count": 19},
    {"from": "Enzo Fernández", "to": "Rodrigo De Paul", "count": 12},
    {"from": "Rodrigo De Paul", "to": "Lionel Messi", "count": 17},
    {"from": "Enzo Fernández", "to": "Lionel Messi", "count": 9}
  ]
}"#;
