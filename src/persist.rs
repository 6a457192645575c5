use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::theme::Theme;

const PREFS_DIR: &str = "wc22_analytics";
const PREFS_FILE: &str = "prefs.json";
const PREFS_VERSION: u32 = 1;

/// The only things kept between runs. Match data always comes from the backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Preferences {
    version: u32,
    pub theme: Theme,
    #[serde(default)]
    pub competition: Option<String>,
}

pub fn load_preferences() -> Option<Preferences> {
    let path = prefs_path()?;
    let raw = fs::read_to_string(path).ok()?;
    parse_preferences(&raw)
}

pub fn parse_preferences(raw: &str) -> Option<Preferences> {
    let prefs = serde_json::from_str::<Preferences>(raw).ok()?;
    (prefs.version == PREFS_VERSION).then_some(prefs)
}

pub fn load_into_state(state: &mut AppState) {
    let Some(prefs) = load_preferences() else {
        return;
    };
    state.theme = prefs.theme;
    if let Some(competition) = prefs.competition.as_deref() {
        state.data_manager.remember_competition(competition);
    }
}

pub fn save_from_state(state: &AppState) -> Result<()> {
    let prefs = Preferences {
        version: PREFS_VERSION,
        theme: state.theme,
        competition: Some(state.data_manager.remembered_competition().to_string()),
    };
    save_preferences(&prefs)
}

fn save_preferences(prefs: &Preferences) -> Result<()> {
    let Some(path) = prefs_path() else {
        return Ok(());
    };
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).context("create prefs dir")?;
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(prefs).context("serialize prefs")?;
    fs::write(&tmp, json).context("write prefs")?;
    fs::rename(&tmp, &path).context("swap prefs")?;
    Ok(())
}

fn prefs_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CONFIG_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(PREFS_DIR).join(PREFS_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".config").join(PREFS_DIR).join(PREFS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_other_versions() {
        assert!(parse_preferences(r#"{"version":0,"theme":"light"}"#).is_none());
        let prefs = parse_preferences(r#"{"version":1,"theme":"light"}"#).unwrap();
        assert_eq!(prefs.theme, Theme::Light);
        assert!(prefs.competition.is_none());
    }
}
