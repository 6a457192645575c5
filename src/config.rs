use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_COMPETITION: &str = "World Cup 2022";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base: String,
    /// `None` means requests never time out.
    pub http_timeout: Option<Duration>,
    pub fetch_parallelism: usize,
    pub momentum_interval_minutes: u32,
    pub passing_min_passes: u32,
    pub analysis_top_n: u32,
    pub default_competition: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            http_timeout: Some(Duration::from_secs(30)),
            fetch_parallelism: 6,
            momentum_interval_minutes: 5,
            passing_min_passes: 3,
            analysis_top_n: 5,
            default_competition: DEFAULT_COMPETITION.to_string(),
            log_file: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key lookup; unparseable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();
        let parse_u64 = |key: &str| lookup(key).and_then(|val| val.trim().parse::<u64>().ok());

        let api_base = lookup("ANALYTICS_API_BASE")
            .map(|val| val.trim().trim_end_matches('/').to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.api_base);

        let timeout_secs = parse_u64("HTTP_TIMEOUT_SECS").unwrap_or(30);
        let http_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let default_competition = lookup("DEFAULT_COMPETITION")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.default_competition);

        let log_file = lookup("ANALYTICS_LOG")
            .filter(|val| !val.trim().is_empty())
            .map(PathBuf::from);

        Self {
            api_base,
            http_timeout,
            fetch_parallelism: parse_u64("FETCH_PARALLELISM")
                .map(|val| val.clamp(2, 32) as usize)
                .unwrap_or(defaults.fetch_parallelism),
            momentum_interval_minutes: parse_u64("MOMENTUM_INTERVAL_MINUTES")
                .map(|val| val.clamp(1, 45) as u32)
                .unwrap_or(defaults.momentum_interval_minutes),
            passing_min_passes: parse_u64("PASSING_MIN_PASSES")
                .map(|val| val.clamp(1, 1000) as u32)
                .unwrap_or(defaults.passing_min_passes),
            analysis_top_n: parse_u64("ANALYSIS_TOP_N")
                .map(|val| val.clamp(1, 50) as u32)
                .unwrap_or(defaults.analysis_top_n),
            default_competition,
            log_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let s = settings(&[]);
        assert_eq!(s.api_base, DEFAULT_API_BASE);
        assert_eq!(s.http_timeout, Some(Duration::from_secs(30)));
        assert_eq!(s.fetch_parallelism, 6);
        assert_eq!(s.default_competition, DEFAULT_COMPETITION);
        assert!(s.log_file.is_none());
    }

    #[test]
    fn trims_base_and_clamps_numbers() {
        let s = settings(&[
            ("ANALYTICS_API_BASE", " http://api.local:9000/ "),
            ("HTTP_TIMEOUT_SECS", "0"),
            ("FETCH_PARALLELISM", "1"),
            ("MOMENTUM_INTERVAL_MINUTES", "90"),
            ("PASSING_MIN_PASSES", "0"),
            ("ANALYSIS_TOP_N", "abc"),
        ]);
        assert_eq!(s.api_base, "http://api.local:9000");
        assert_eq!(s.http_timeout, None);
        assert_eq!(s.fetch_parallelism, 2);
        assert_eq!(s.momentum_interval_minutes, 45);
        assert_eq!(s.passing_min_passes, 1);
        assert_eq!(s.analysis_top_n, 5);
    }
}
