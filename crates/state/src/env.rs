use anyhow::{Context, Result};
use artimine_discovery::IgnorePatterns;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_IGNORE_PATTERNS: &str = "ARTIMINE_IGNORE_PATTERNS";
pub const ENV_EXTRA_IGNORE: &str = "ARTIMINE_EXTRA_IGNORE";
pub const ENV_GIT_TIMEOUT_MS: &str = "ARTIMINE_GIT_TIMEOUT_MS";
pub const ENV_CHURN_WINDOW_DAYS: &str = "ARTIMINE_CHURN_WINDOW_DAYS";
pub const ENV_DB: &str = "ARTIMINE_DB";
pub const ENV_CONFIG: &str = "ARTIMINE_CONFIG";

const DEFAULT_GIT_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_CHURN_WINDOW_DAYS: i64 = 14;
const DATA_DIR: &str = ".artimine";

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Path of the JSON settings file: `ARTIMINE_CONFIG` or `~/.artimine/config.json`.
pub fn config_file() -> Option<PathBuf> {
    if let Ok(custom) = std::env::var(ENV_CONFIG) {
        return Some(PathBuf::from(custom));
    }
    home_dir().ok().map(|h| h.join(DATA_DIR).join("config.json"))
}

fn default_db_path() -> PathBuf {
    home_dir()
        .map(|h| h.join(DATA_DIR))
        .unwrap_or_else(|_| PathBuf::from(DATA_DIR))
        .join("artimine.db")
}

/// Settings as written in the config file; every field is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    #[serde(default)]
    pub ignore_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub extra_ignore: Option<Vec<String>>,
    #[serde(default)]
    pub git_timeout_ms: Option<u64>,
    #[serde(default)]
    pub churn_window_days: Option<i64>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub criticality: Option<HashMap<String, f64>>,
}

/// Loads the settings file, treating a missing file as empty.
pub fn load_file_settings(path: &Path) -> Result<FileSettings> {
    if !path.exists() {
        return Ok(FileSettings::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid settings file {}", path.display()))
}

/// Effective runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ignore_patterns: IgnorePatterns,
    /// `None` disables the git timeout.
    pub git_timeout: Option<Duration>,
    pub churn_window_days: i64,
    pub db_path: PathBuf,
    /// Per-path OACI criticality weights.
    pub criticality: HashMap<String, f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ignore_patterns: IgnorePatterns::default(),
            git_timeout: Some(Duration::from_millis(DEFAULT_GIT_TIMEOUT_MS)),
            churn_window_days: DEFAULT_CHURN_WINDOW_DAYS,
            db_path: default_db_path(),
            criticality: HashMap::new(),
        }
    }
}

impl Settings {
    /// Layers `file` and then the environment over the defaults.
    pub fn resolve(file: FileSettings) -> Self {
        let defaults = Settings::default();

        let mut ignore_patterns = match env_list(ENV_IGNORE_PATTERNS).or(file.ignore_patterns) {
            Some(list) => list.into_iter().collect(),
            None => defaults.ignore_patterns,
        };
        for extra in [file.extra_ignore, env_list(ENV_EXTRA_IGNORE)]
            .into_iter()
            .flatten()
        {
            ignore_patterns.extend(extra);
        }

        let timeout_ms = env_number::<u64>(ENV_GIT_TIMEOUT_MS)
            .or(file.git_timeout_ms)
            .unwrap_or(DEFAULT_GIT_TIMEOUT_MS);
        let git_timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));

        let churn_window_days = env_number::<i64>(ENV_CHURN_WINDOW_DAYS)
            .or(file.churn_window_days)
            .filter(|days| {
                let ok = *days >= 0;
                if !ok {
                    tracing::warn!(days, "negative churn window, using default");
                }
                ok
            })
            .unwrap_or(DEFAULT_CHURN_WINDOW_DAYS);

        let db_path = std::env::var(ENV_DB)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .or(file.db_path)
            .unwrap_or(defaults.db_path);

        Self {
            ignore_patterns,
            git_timeout,
            churn_window_days,
            db_path,
            criticality: file.criticality.unwrap_or_default(),
        }
    }
}

/// Loads settings from the environment, the config file and defaults, in that precedence.
pub fn load_settings() -> Result<Settings> {
    let file = match config_file() {
        Some(path) => load_file_settings(&path)?,
        None => FileSettings::default(),
    };
    Ok(Settings::resolve(file))
}

/// Comma-separated list; blank entries are dropped.
fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Parses a numeric variable, warning and returning `None` when invalid.
fn env_number<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "invalid numeric setting, using default");
            None
        }
    }
}
