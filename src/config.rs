//! Engine configuration, loadable from a toml file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    EXCERPT_MAX_CHARS, SESSION_STORE_CAPACITY, SESSION_TTI_SECS, UNDO_WINDOW_SECS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Seconds during which the last mutating action can be undone
    #[serde(default = "default_undo_window_secs")]
    pub undo_window_secs: u64,
    /// Idle seconds before an untouched session is swept from the store
    #[serde(default = "default_session_tti_secs")]
    pub session_tti_secs: u64,
    /// Maximum number of retained sessions
    #[serde(default = "default_session_capacity")]
    pub session_capacity: u64,
    /// Character cap for spoken content excerpts
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            undo_window_secs: UNDO_WINDOW_SECS,
            session_tti_secs: SESSION_TTI_SECS,
            session_capacity: SESSION_STORE_CAPACITY,
            excerpt_chars: EXCERPT_MAX_CHARS,
        }
    }
}

impl TriageConfig {
    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs)
    }

    pub fn session_tti(&self) -> Duration {
        Duration::from_secs(self.session_tti_secs)
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("voxtriage"))
            .context("Could not determine config directory")
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from the default path. A missing file means defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }
}

fn default_undo_window_secs() -> u64 {
    UNDO_WINDOW_SECS
}

fn default_session_tti_secs() -> u64 {
    SESSION_TTI_SECS
}

fn default_session_capacity() -> u64 {
    SESSION_STORE_CAPACITY
}

fn default_excerpt_chars() -> usize {
    EXCERPT_MAX_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = TriageConfig::default();
        assert_eq!(config.undo_window(), Duration::from_secs(UNDO_WINDOW_SECS));
        assert_eq!(config.session_tti(), Duration::from_secs(SESSION_TTI_SECS));
        assert_eq!(config.excerpt_chars, EXCERPT_MAX_CHARS);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TriageConfig = toml::from_str("undo_window_secs = 5").unwrap();
        assert_eq!(config.undo_window_secs, 5);
        assert_eq!(config.session_tti_secs, SESSION_TTI_SECS);
        assert_eq!(config.session_capacity, SESSION_STORE_CAPACITY);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: TriageConfig = toml::from_str("").unwrap();
        assert_eq!(config.undo_window_secs, UNDO_WINDOW_SECS);
    }
}
