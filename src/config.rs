//! Configuration handling for the TUI

use crate::state::{Prefill, DEFAULT_PERSIST_DELAY};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Address used when neither the config nor the command line names one
pub const DEFAULT_BASE_URL: &str = "https://forms.local/transfer-application";

/// Environment variable overriding the restored address
pub const ADDRESS_ENV: &str = "FORMSTATE_URL";

/// User configuration for the TUI
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Address the fragment is attached to
    pub base_url: Option<String>,
    /// Coalescing window for keystroke-driven writes
    pub persist_debounce_ms: Option<u64>,
    /// Directory receiving exported documents
    pub export_dir: Option<PathBuf>,
    /// Prefill file, `prefill.json` in the config dir when unset
    pub prefill_path: Option<PathBuf>,
}

impl AppConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("io", "formstate", "formstate-tui")
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn persist_delay(&self) -> Duration {
        self.persist_debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PERSIST_DELAY)
    }

    /// Per-user data directory, falling back to the working directory
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// File mirroring the current address between runs
    pub fn session_path() -> PathBuf {
        Self::data_dir().join("session.url")
    }

    pub fn log_path() -> PathBuf {
        Self::data_dir().join("formstate-tui.log")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("exports"))
    }

    fn prefill_file(&self) -> Option<PathBuf> {
        self.prefill_path.clone().or_else(|| {
            Self::project_dirs().map(|dirs| dirs.config_dir().join("prefill.json"))
        })
    }

    /// Load the prefill table; a missing default file means no prefill
    pub fn load_prefill(&self) -> Result<Prefill> {
        let Some(path) = self.prefill_file() else {
            return Ok(Prefill::default());
        };
        if self.prefill_path.is_none() && !path.exists() {
            return Ok(Prefill::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prefill {}", path.display()))?;
        let prefill = Prefill::from_json(&content)
            .with_context(|| format!("Invalid prefill in {}", path.display()))?;
        tracing::info!("Loaded {} prefill entries from {}", prefill.len(), path.display());
        Ok(prefill)
    }
}

/// Address given on the command line or in the environment, in that order
pub fn address_override(
    mut args: impl Iterator<Item = String>,
    env: Option<String>,
) -> Option<String> {
    args.nth(1)
        .or(env)
        .filter(|address| !address.trim().is_empty())
}
