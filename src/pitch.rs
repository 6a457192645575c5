//! Pitch geometry.
//!
//! Everything here is a pure function from typed action/position records to a
//! list of [`Primitive`]s on a 120 x 80 pitch (origin top-left, y down). The
//! terminal UI draws them on a canvas; nothing in this module knows how.

use crate::analytics::PassingNetworkData;
use crate::state::{Coords, FormationPlayer, PitchVizData, PositionSample};

pub const PITCH_LENGTH: f64 = 120.0;
pub const PITCH_WIDTH: f64 = 80.0;
pub const CENTER: Point = Point { x: 60.0, y: 40.0 };
/// Centre of the right-hand goal mouth; shots aim here.
pub const RIGHT_GOAL: Point = Point { x: 120.0, y: 40.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const SUCCESS_GREEN: Rgb = Rgb(0x22, 0xc5, 0x5e);
pub const FAILURE_RED: Rgb = Rgb(0xef, 0x44, 0x44);
pub const NEUTRAL_BLUE: Rgb = Rgb(0x3b, 0x82, 0xf6);
pub const DEFAULT_TEAL: Rgb = Rgb(0x14, 0xb8, 0xa6);
pub const HEAT_GRAY: Rgb = Rgb(0x9c, 0xa3, 0xaf);
const LABEL_WHITE: Rgb = Rgb(0xf8, 0xfa, 0xfc);

const HEAT_PALETTE: &[(&str, Rgb)] = &[
    ("Pass", Rgb(0x3b, 0x82, 0xf6)),
    ("Shot", Rgb(0xef, 0x44, 0x44)),
    ("Dribble", Rgb(0xa8, 0x55, 0xf7)),
    ("Carry", Rgb(0x06, 0xb6, 0xd4)),
    ("Ball Recovery", Rgb(0x22, 0xc5, 0x5e)),
    ("Interception", Rgb(0xf5, 0x9e, 0x0b)),
    ("Tackle", Rgb(0xf9, 0x73, 0x16)),
    ("Block", Rgb(0xec, 0x48, 0x99)),
    ("Clearance", Rgb(0x63, 0x66, 0xf1)),
];

impl Rgb {
    /// Parses `#rrggbb` / `rrggbb` / `#rgb`.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Backend coordinate clamped onto the pitch; non-finite parts go to
    /// the centre spot.
    pub fn on_pitch(x: f64, y: f64) -> Self {
        let axis = |v: f64, max: f64, centre: f64| {
            if v.is_finite() { v.clamp(0.0, max) } else { centre }
        };
        Point {
            x: axis(x, PITCH_LENGTH, CENTER.x),
            y: axis(y, PITCH_WIDTH, CENTER.y),
        }
    }

    fn offset(self, dx: f64, dy: f64) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl From<Coords> for Point {
    /// Missing halves fall back to the centre spot.
    fn from(coords: Coords) -> Self {
        Point::on_pitch(coords.x.unwrap_or(CENTER.x), coords.y.unwrap_or(CENTER.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    Success,
    Failure,
    Neutral,
    /// Empty outcome string.
    Unspecified,
}

pub fn classify_outcome(outcome: &str) -> OutcomeClass {
    let outcome = outcome.trim().to_lowercase();
    match outcome.as_str() {
        "" => OutcomeClass::Unspecified,
        "goal" | "complete" | "won" | "success" => OutcomeClass::Success,
        "saved" | "blocked" => OutcomeClass::Neutral,
        // incomplete, missed, lost, out, pass offside, unknown, fail(ed), and
        // anything unrecognised.
        _ => OutcomeClass::Failure,
    }
}

pub fn is_success(outcome: &str) -> bool {
    classify_outcome(outcome) == OutcomeClass::Success
}

pub fn action_color(viz: &PitchVizData) -> Rgb {
    match classify_outcome(&viz.outcome) {
        OutcomeClass::Success => SUCCESS_GREEN,
        OutcomeClass::Failure => FAILURE_RED,
        OutcomeClass::Neutral => NEUTRAL_BLUE,
        OutcomeClass::Unspecified => viz
            .team_color
            .as_deref()
            .and_then(Rgb::from_hex)
            .unwrap_or(DEFAULT_TEAL),
    }
}

pub fn heat_color(kind: &str) -> Rgb {
    HEAT_PALETTE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(kind.trim()))
        .map(|(_, color)| *color)
        .unwrap_or(HEAT_GRAY)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionShape {
    Movement { start: Point, end: Point },
    Point { at: Point },
    Empty,
}

/// Decides how an action is drawn: a line for passes, carries and dribbles
/// with both ends, a target for shots, defensive actions and single-point
/// actions, nothing when there is no usable coordinate.
pub fn action_shape(viz: &PitchVizData) -> ActionShape {
    let kind = viz.action_type.trim().to_lowercase();
    let has_start = viz.start_coords.is_some();
    let has_end = viz.end_coords.is_some();

    if let (Some(start), Some(end)) = (viz.start_coords, viz.end_coords)
        && matches!(kind.as_str(), "pass" | "carry" | "dribble")
    {
        return ActionShape::Movement {
            start: start.into(),
            end: end.into(),
        };
    }

    let single_point = viz.coords.is_some() && !(has_start && has_end);
    let dribble_point = kind == "dribble" && viz.coords.is_some();
    if matches!(kind.as_str(), "shot" | "defense") || dribble_point || single_point {
        let at = viz
            .coords
            .or(viz.start_coords)
            .or(viz.end_coords)
            .map(Point::from)
            .unwrap_or(CENTER);
        return ActionShape::Point { at };
    }
    ActionShape::Empty
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    PlayerName,
    OutcomeBadge,
    Jersey,
    NameChip,
    NodeLabel,
    Caption,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        from: Point,
        to: Point,
        color: Rgb,
        width: f64,
        opacity: f64,
        dashed: bool,
        arrow_head: bool,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Rgb,
        opacity: f64,
        filled: bool,
        blurred: bool,
    },
    Text {
        at: Point,
        text: String,
        color: Rgb,
        kind: TextKind,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchScene {
    pub primitives: Vec<Primitive>,
}

impl PitchScene {
    pub fn caption(&self) -> Option<&str> {
        self.primitives.iter().find_map(|p| match p {
            Primitive::Text {
                text,
                kind: TextKind::Caption,
                ..
            } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn texts(&self, wanted: TextKind) -> Vec<&str> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { text, kind, .. } if *kind == wanted => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PitchInput<'a> {
    pub active: Option<&'a PitchVizData>,
    pub positions: &'a [PositionSample],
    pub formation: &'a [FormationPlayer],
    pub show_heat_map: bool,
    pub show_formation: bool,
    pub team_color: Rgb,
}

/// Builds the full scene: heat map, then formation, then the active action
/// on top.
pub fn render_pitch(input: &PitchInput<'_>) -> PitchScene {
    let mut out = Vec::new();

    if input.show_heat_map {
        for pos in input.positions {
            out.push(Primitive::Circle {
                center: Point::on_pitch(pos.x, pos.y),
                radius: 3.5,
                color: heat_color(&pos.kind),
                opacity: 0.35,
                filled: true,
                blurred: true,
            });
        }
    }

    if input.show_formation {
        formation_layer(input.formation, input.team_color, &mut out);
    }

    let shape = input
        .active
        .map(action_shape)
        .unwrap_or(ActionShape::Empty);
    match (input.active, shape) {
        (Some(viz), ActionShape::Movement { start, end }) => movement_layer(viz, start, end, &mut out),
        (Some(viz), ActionShape::Point { at }) => point_layer(viz, at, &mut out),
        _ => {
            let caption = if input.positions.is_empty() {
                "Select a player"
            } else {
                "Click a moment below"
            };
            out.push(Primitive::Text {
                at: CENTER,
                text: caption.to_string(),
                color: HEAT_GRAY,
                kind: TextKind::Caption,
            });
        }
    }

    PitchScene { primitives: out }
}

fn movement_layer(viz: &PitchVizData, start: Point, end: Point, out: &mut Vec<Primitive>) {
    let color = action_color(viz);
    let success = is_success(&viz.outcome);

    out.push(Primitive::Line {
        from: start,
        to: end,
        color,
        width: 6.0,
        opacity: 0.25,
        dashed: false,
        arrow_head: false,
    });
    out.push(Primitive::Line {
        from: start,
        to: end,
        color,
        width: 2.0,
        opacity: 1.0,
        dashed: !success,
        arrow_head: success,
    });
    out.push(Primitive::Circle {
        center: start,
        radius: 1.5,
        color,
        opacity: 1.0,
        filled: true,
        blurred: false,
    });

    if success {
        out.push(Primitive::Circle {
            center: end,
            radius: 1.2,
            color,
            opacity: 1.0,
            filled: true,
            blurred: false,
        });
    } else {
        const ARM: f64 = 1.5;
        out.push(cross_stroke(end.offset(-ARM, -ARM), end.offset(ARM, ARM), color));
        out.push(cross_stroke(end.offset(-ARM, ARM), end.offset(ARM, -ARM), color));
    }

    if let Some(name) = viz.player_name.as_deref().filter(|n| !n.is_empty()) {
        out.push(Primitive::Text {
            at: start.offset(0.0, -3.0),
            text: name.to_string(),
            color: LABEL_WHITE,
            kind: TextKind::PlayerName,
        });
    }
    out.push(Primitive::Text {
        at: end.offset(0.0, -3.0),
        text: if success { "COMPLETE" } else { "INCOMPLETE" }.to_string(),
        color,
        kind: TextKind::OutcomeBadge,
    });
}

fn cross_stroke(from: Point, to: Point, color: Rgb) -> Primitive {
    Primitive::Line {
        from,
        to,
        color,
        width: 2.0,
        opacity: 1.0,
        dashed: false,
        arrow_head: false,
    }
}

fn point_layer(viz: &PitchVizData, at: Point, out: &mut Vec<Primitive>) {
    let color = action_color(viz);
    for (radius, opacity, filled, blurred) in [
        (4.0, 0.2, true, true),
        (2.5, 0.45, false, false),
        (1.2, 1.0, true, false),
    ] {
        out.push(Primitive::Circle {
            center: at,
            radius,
            color,
            opacity,
            filled,
            blurred,
        });
    }

    if viz.action_type.trim().eq_ignore_ascii_case("shot") {
        out.push(Primitive::Line {
            from: at,
            to: RIGHT_GOAL,
            color,
            width: 0.8,
            opacity: 0.6,
            dashed: true,
            arrow_head: false,
        });
    }

    if let Some(name) = viz.player_name.as_deref().filter(|n| !n.is_empty()) {
        out.push(Primitive::Text {
            at: at.offset(0.0, -5.0),
            text: name.to_string(),
            color: LABEL_WHITE,
            kind: TextKind::PlayerName,
        });
    }
    if !viz.outcome.trim().is_empty() {
        out.push(Primitive::Text {
            at: at.offset(0.0, 5.0),
            text: viz.outcome.trim().to_uppercase(),
            color,
            kind: TextKind::OutcomeBadge,
        });
    }
}

fn formation_layer(formation: &[FormationPlayer], team_color: Rgb, out: &mut Vec<Primitive>) {
    for player in formation {
        let at = Point::on_pitch(player.x, player.y);
        out.push(Primitive::Circle {
            center: at,
            radius: 2.2,
            color: team_color,
            opacity: 1.0,
            filled: true,
            blurred: false,
        });
        out.push(Primitive::Text {
            at,
            text: player
                .jersey_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            color: LABEL_WHITE,
            kind: TextKind::Jersey,
        });
        out.push(Primitive::Text {
            at: at.offset(0.0, 4.5),
            text: player.short_name().to_string(),
            color: LABEL_WHITE,
            kind: TextKind::NameChip,
        });
    }
}

/// Passing network: node size follows pass volume, edge weight follows pass
/// count between the pair. Edges naming unknown players are skipped.
pub fn passing_network_scene(network: &PassingNetworkData, team_color: Rgb) -> PitchScene {
    let mut out = Vec::new();
    let max_edge = network.edges.iter().map(|e| e.count).max().unwrap_or(0).max(1) as f64;
    let max_node = network.nodes.iter().map(|n| n.passes).max().unwrap_or(0).max(1) as f64;

    for edge in &network.edges {
        let from = network.nodes.iter().find(|n| n.player == edge.from);
        let to = network.nodes.iter().find(|n| n.player == edge.to);
        let (Some(from), Some(to)) = (from, to) else {
            continue;
        };
        let weight = edge.count as f64 / max_edge;
        out.push(Primitive::Line {
            from: Point::on_pitch(from.x, from.y),
            to: Point::on_pitch(to.x, to.y),
            color: team_color,
            width: 0.5 + weight * 2.5,
            opacity: 0.3 + weight * 0.6,
            dashed: false,
            arrow_head: false,
        });
    }

    for node in &network.nodes {
        let at = Point::on_pitch(node.x, node.y);
        out.push(Primitive::Circle {
            center: at,
            radius: 1.2 + node.passes as f64 / max_node * 2.3,
            color: team_color,
            opacity: 1.0,
            filled: true,
            blurred: false,
        });
        let label = node
            .player
            .split_whitespace()
            .last()
            .unwrap_or(&node.player)
            .to_string();
        out.push(Primitive::Text {
            at: at.offset(0.0, 4.0),
            text: label,
            color: LABEL_WHITE,
            kind: TextKind::NodeLabel,
        });
    }

    if out.is_empty() {
        out.push(Primitive::Text {
            at: CENTER,
            text: "No passing data".to_string(),
            color: HEAT_GRAY,
            kind: TextKind::Caption,
        });
    }
    PitchScene { primitives: out }
}

/// Maps a dominance score onto a bar of at most `full_width` cells.
pub fn dominance_bar_width(score: f64, max_score: f64, full_width: u16) -> u16 {
    if !score.is_finite() || !max_score.is_finite() || max_score <= 0.0 {
        return 0;
    }
    let ratio = (score.abs() / max_score).clamp(0.0, 1.0);
    (ratio * full_width as f64).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgb::from_hex("#22c55e"), Some(SUCCESS_GREEN));
        assert_eq!(Rgb::from_hex("fff"), Some(Rgb(255, 255, 255)));
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
        assert_eq!(SUCCESS_GREEN.to_hex(), "#22c55e");
    }

    #[test]
    fn missing_halves_resolve_to_centre() {
        let p = Point::from(Coords { x: Some(10.0), y: None });
        assert_eq!(p, Point::new(10.0, 40.0));
    }

    #[test]
    fn coordinates_clamp_to_pitch() {
        assert_eq!(Point::on_pitch(-5.0, 1e9), Point::new(0.0, PITCH_WIDTH));
        assert_eq!(Point::on_pitch(f64::NAN, f64::INFINITY), CENTER);
    }

    #[test]
    fn dominance_bar_scales_and_clamps() {
        assert_eq!(dominance_bar_width(0.5, 1.0, 20), 10);
        assert_eq!(dominance_bar_width(3.0, 1.0, 20), 20);
        assert_eq!(dominance_bar_width(1.0, 0.0, 20), 0);
    }
}
