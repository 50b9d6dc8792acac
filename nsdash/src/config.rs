//! Client settings: defaults, optional TOML file, environment overrides

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the nomenclature API; endpoint paths are joined onto it
    pub api_base_url: String,
    /// Base of the navigable links built for sequence search hits
    pub site_base_url: String,
    /// Fixed lifetime of a session, counted from login
    pub session_duration_secs: u64,
    pub request_timeout_secs: u64,
    /// Where the token, expiry and cached lookups are persisted
    pub storage_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000/NS/api/".into(),
            site_base_url: "http://127.0.0.1:3000".into(),
            session_duration_secs: 3600,
            request_timeout_secs: 30,
            storage_path: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn session_duration(&self) -> TimeDelta {
        i64::try_from(self.session_duration_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage_path.clone().unwrap_or_else(default_storage_path)
    }

    /// Apply `NSDASH_*` overrides from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("NSDASH_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("NSDASH_SITE_BASE_URL") {
            self.site_base_url = v;
        }
        if let Some(v) = lookup("NSDASH_SESSION_DURATION_SECS") {
            self.session_duration_secs = parse_secs("NSDASH_SESSION_DURATION_SECS", &v)?;
        }
        if let Some(v) = lookup("NSDASH_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_secs("NSDASH_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("NSDASH_STORAGE_PATH") {
            self.storage_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("NSDASH_LOG") {
            self.log_filter = v;
        }
        Ok(())
    }
}

fn parse_secs(name: &str, raw: &str) -> AppResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| {
            AppError::Config(format!(
                "{name} must be a whole number of seconds, got {raw:?}"
            ))
        })
}

pub fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nsdash")
        .join("storage.json")
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nsdash").join("config.toml"))
}

/// Parse settings from TOML text; absent keys keep their defaults.
pub fn parse_settings(raw: &str) -> AppResult<Settings> {
    toml::from_str(raw).map_err(|e| AppError::Config(e.to_string()))
}

/// Defaults, then the TOML file at `path` (or the default config path), then environment.
///
/// A missing file is not an error.
pub fn load_settings(path: Option<&Path>) -> AppResult<Settings> {
    let path = path.map(Path::to_path_buf).or_else(default_config_path);

    let mut settings = match path {
        Some(path) => match fs::read_to_string(&path) {
            Ok(raw) => parse_settings(&raw)
                .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(AppError::Config(format!("{}: {e}", path.display()))),
        },
        None => Settings::default(),
    };

    settings.apply_env(|name| std::env::var(name).ok())?;
    Ok(settings)
}
