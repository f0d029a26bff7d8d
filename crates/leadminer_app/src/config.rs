//! Application settings: optional RON file, then environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use leadminer_engine::{ARCHIVE_BASE_URL, DEFAULT_MAX_RUNS, GOOGLE_BASE_URL};
use miner_logging::LogDestination;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "leadminer.ron";

/// Values pre-filled in the search form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormDefaults {
    pub limit: usize,
    pub line_interval: i64,
    pub filter_mode: String,
    pub delay: f64,
    pub provider: String,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            limit: 10,
            line_interval: 30,
            filter_mode: "leads_only".into(),
            delay: 2.0,
            provider: "archive".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind: String,
    pub output_dir: PathBuf,
    pub archive_base_url: String,
    pub google_base_url: String,
    pub google_api_key: Option<String>,
    pub google_engine_id: Option<String>,
    /// Wall-clock budget for one run; `0` disables it.
    pub time_budget_secs: u64,
    pub fetch_timeout_secs: u64,
    pub search_timeout_secs: u64,
    pub max_jitter_ms: u64,
    pub stream_poll_ms: u64,
    /// Progress streams for runs that never start are closed after this long.
    pub stream_idle_secs: u64,
    pub max_runs: usize,
    pub log_level: String,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
    pub defaults: FormDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".into(),
            output_dir: PathBuf::from("output"),
            archive_base_url: ARCHIVE_BASE_URL.into(),
            google_base_url: GOOGLE_BASE_URL.into(),
            google_api_key: None,
            google_engine_id: None,
            time_budget_secs: 50,
            fetch_timeout_secs: 25,
            search_timeout_secs: 15,
            max_jitter_ms: 1500,
            stream_poll_ms: 500,
            stream_idle_secs: 120,
            max_runs: DEFAULT_MAX_RUNS,
            log_level: "info".into(),
            log_destination: LogDestination::Terminal,
            log_file: miner_logging::default_log_file(),
            defaults: FormDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Read `LEADMINER_CONFIG` (or `leadminer.ron`) if present, then apply the
    /// process environment on top.
    pub fn load() -> Result<Self> {
        dotenv_outcome(dotenvy::dotenv())?;
        let path = std::env::var("LEADMINER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_ron(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_ron(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Override fields from environment-style variables supplied by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(bind) = var("LEADMINER_BIND") {
            self.bind = bind;
        }
        if let Some(dir) = var("LEADMINER_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(key) = var("GOOGLE_API_KEY") {
            self.google_api_key = Some(key);
        }
        if let Some(cx) = var("GOOGLE_CSE_ID") {
            self.google_engine_id = Some(cx);
        }
        if let Some(secs) = var("LEADMINER_TIME_BUDGET_SECS") {
            self.time_budget_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("LEADMINER_TIME_BUDGET_SECS must be a number, got {secs:?}"))?;
        }
        if let Some(level) = var("LEADMINER_LOG") {
            self.log_level = level;
        }
        if let Some(destination) = var("LEADMINER_LOG_DESTINATION") {
            self.log_destination = LogDestination::parse(&destination).with_context(|| {
                format!("LEADMINER_LOG_DESTINATION must be file, terminal or both, got {destination:?}")
            })?;
        }
        Ok(())
    }

    pub fn time_budget(&self) -> Option<Duration> {
        (self.time_budget_secs > 0).then(|| Duration::from_secs(self.time_budget_secs))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs.max(1))
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    pub fn stream_poll(&self) -> Duration {
        Duration::from_millis(self.stream_poll_ms.max(10))
    }

    pub fn stream_idle(&self) -> Duration {
        Duration::from_secs(self.stream_idle_secs)
    }

    /// Both Google credentials, when configured.
    pub fn google_credentials(&self) -> Option<(&str, &str)> {
        match (self.google_api_key.as_deref(), self.google_engine_id.as_deref()) {
            (Some(key), Some(cx)) if !key.trim().is_empty() && !cx.trim().is_empty() => {
                Some((key, cx))
            }
            _ => None,
        }
    }
}

/// A missing `.env` is fine; one that exists but does not parse is not.
fn dotenv_outcome<T>(loaded: std::result::Result<T, dotenvy::Error>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("loading .env"),
    }
}
