use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::pitch::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub muted: Color,
    pub accent: Color,
    pub selected_bg: Color,
    pub pitch_bg: Color,
    pub pitch_lines: Color,
    pub error: Color,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "LIGHT",
            Theme::Dark => "DARK",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                fg: Color::White,
                bg: Color::Reset,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                selected_bg: Color::DarkGray,
                pitch_bg: Color::Rgb(0x0f, 0x3d, 0x24),
                pitch_lines: Color::Rgb(0x9c, 0xa3, 0xaf),
                error: Color::LightRed,
            },
            Theme::Light => Palette {
                fg: Color::Black,
                bg: Color::White,
                muted: Color::Gray,
                accent: Color::Blue,
                selected_bg: Color::Rgb(0xe5, 0xe7, 0xeb),
                pitch_bg: Color::Rgb(0x4a, 0xa8, 0x5c),
                pitch_lines: Color::White,
                error: Color::Red,
            },
        }
    }
}

pub fn rgb_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}
