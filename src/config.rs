use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analytics::ClassificationMode;

/// Application-level constants
pub const APP_NAME: &str = "CardioCheck";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "cardiocheck.db";

/// Prefix of the environment overrides read by `EngineConfig::from_env`.
pub const ENV_PREFIX: &str = "CARDIOCHECK_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Get the application data directory
/// ~/CardioCheck/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Default database location
pub fn database_path() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join(DATABASE_FILE))
}

/// True in debug builds.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "info,cardiocheck=debug"
    } else {
        "info"
    }
}

// ═══════════════════════════════════════════════════════════
// Engine settings
// ═══════════════════════════════════════════════════════════

/// Tunables of the analytics, the advice client and the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classification_mode: ClassificationMode,
    pub smart_analysis_enabled: bool,
    /// Readings sent with a recent-analysis prompt.
    pub context_window: usize,
    /// Readings loaded for trend analysis.
    pub analysis_window: usize,
    /// Readings loaded for reminder-hour suggestion.
    pub schedule_window: usize,
    pub advisor_endpoint: String,
    pub advisor_model: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub monitor_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classification_mode: ClassificationMode::Clinical,
            smart_analysis_enabled: true,
            context_window: 3,
            analysis_window: 10,
            schedule_window: 30,
            advisor_endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            advisor_model: "gpt-3.5-turbo".to_string(),
            connect_timeout_secs: 15,
            request_timeout_secs: 20,
            monitor_interval_secs: 6 * 60 * 60,
        }
    }
}

impl EngineConfig {
    /// Defaults with `CARDIOCHECK_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from `lookup`, keyed by full variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, value)) = get("CLASSIFICATION_MODE") {
            config.classification_mode = value
                .parse()
                .map_err(|reason| invalid(&key, &value, reason))?;
        }
        if let Some((key, value)) = get("SMART_ANALYSIS") {
            config.smart_analysis_enabled = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = get("CONTEXT_WINDOW") {
            config.context_window = parse_positive(&key, &value)?;
        }
        if let Some((key, value)) = get("ANALYSIS_WINDOW") {
            config.analysis_window = parse_positive(&key, &value)?;
        }
        if let Some((key, value)) = get("SCHEDULE_WINDOW") {
            config.schedule_window = parse_positive(&key, &value)?;
        }
        if let Some((_, value)) = get("ADVISOR_ENDPOINT") {
            config.advisor_endpoint = value;
        }
        if let Some((_, value)) = get("ADVISOR_MODEL") {
            config.advisor_model = value;
        }
        if let Some((key, value)) = get("MONITOR_INTERVAL_SECS") {
            config.monitor_interval_secs = parse_positive(&key, &value)?;
        }

        Ok(config)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        Ok(_) => Err(invalid(key, value, "must be greater than zero")),
        Err(_) => Err(invalid(key, value, "expected a number")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir().unwrap();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("CardioCheck"));
    }

    #[test]
    fn database_under_app_data() {
        let db = database_path().unwrap();
        assert!(db.starts_with(app_data_dir().unwrap()));
        assert!(db.ends_with(DATABASE_FILE));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn dev_filter_enables_crate_debug() {
        if is_dev() {
            assert!(default_log_filter().contains("cardiocheck=debug"));
        } else {
            assert_eq!(default_log_filter(), "info");
        }
    }

    #[test]
    fn defaults_match_app_behaviour() {
        let config = EngineConfig::default();
        assert_eq!(config.classification_mode, ClassificationMode::Clinical);
        assert_eq!(config.context_window, 3);
        assert_eq!(config.analysis_window, 10);
        assert_eq!(config.schedule_window, 30);
        assert_eq!(config.monitor_interval(), Duration::from_secs(21_600));
        assert_eq!(config.advisor_model, "gpt-3.5-turbo");
    }

    #[test]
    fn overrides_are_applied() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("CARDIOCHECK_CLASSIFICATION_MODE", "legacy"),
            ("CARDIOCHECK_SMART_ANALYSIS", "off"),
            ("CARDIOCHECK_CONTEXT_WINDOW", "5"),
            ("CARDIOCHECK_ADVISOR_MODEL", "gpt-4o-mini"),
            ("CARDIOCHECK_MONITOR_INTERVAL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.classification_mode, ClassificationMode::Legacy);
        assert!(!config.smart_analysis_enabled);
        assert_eq!(config.context_window, 5);
        assert_eq!(config.advisor_model, "gpt-4o-mini");
        assert_eq!(config.monitor_interval_secs, 60);
        assert_eq!(config.analysis_window, 10);
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[("CARDIOCHECK_CONTEXT_WINDOW", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CARDIOCHECK_CONTEXT_WINDOW"));

        assert!(EngineConfig::from_lookup(lookup(&[("CARDIOCHECK_SMART_ANALYSIS", "maybe")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[("CARDIOCHECK_CLASSIFICATION_MODE", "strict")])).is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"context_window": 4}"#).unwrap();
        assert_eq!(config.context_window, 4);
        assert_eq!(config.request_timeout_secs, 20);
    }
}
