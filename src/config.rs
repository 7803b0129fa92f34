use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::http_client::DEFAULT_TIMEOUT_SECS;
use crate::schema::CompetitionMode;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSource {
    Http,
    Demo,
}

/// Settings read from the environment (`.env` files are loaded by the binaries).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub initial_mode: CompetitionMode,
    pub source: ServiceSource,
    pub export_dir: PathBuf,
    pub export_degrades_ordering: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            initial_mode: CompetitionMode::Decathlon,
            source: ServiceSource::Http,
            export_dir: PathBuf::from("."),
            export_degrades_ordering: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` with an injectable lookup, so tests need not touch
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("STANDINGS_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let timeout_secs = get("STANDINGS_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);

        let initial_mode = match get("STANDINGS_MODE") {
            Some(code) => code
                .parse::<CompetitionMode>()
                .context("STANDINGS_MODE must be DEC or HEP")?,
            None => defaults.initial_mode,
        };

        let source = match get("STANDINGS_SOURCE").map(|v| v.trim().to_lowercase()) {
            None => ServiceSource::Http,
            Some(v) if v == "http" => ServiceSource::Http,
            Some(v) if v == "demo" => ServiceSource::Demo,
            Some(other) => anyhow::bail!("STANDINGS_SOURCE must be http or demo, got {other:?}"),
        };

        let export_dir = get("STANDINGS_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.export_dir);

        let export_degrades_ordering = get("STANDINGS_EXPORT_DEGRADES")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            initial_mode,
            source,
            export_dir,
            export_degrades_ordering,
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
