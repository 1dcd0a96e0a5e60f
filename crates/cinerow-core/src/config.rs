use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CinerowError;
use crate::history::HistoryLimits;
use crate::mapper::MappingRules;
use crate::search::SearchSettings;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable that overrides `provider.api_key`.
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub playback: PlaybackConfig,
    pub timing: TimingConfig,
    pub mapping: MappingRules,
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub image_base: String,
    pub image_small: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub embed_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    pub hover_delay_ms: u64,
    pub search_debounce_ms: u64,
    pub min_query_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub history_limit: usize,
    pub continue_limit: usize,
    pub recent_limit: usize,
    pub continue_threshold: f32,
}

impl AppConfig {
    /// Load config: user file (if it exists) merged over built-in defaults,
    /// then the API key environment override.
    pub fn load() -> Result<Self, CinerowError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Load the file at `path` merged over the defaults. A missing file
    /// yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, CinerowError> {
        if !path.exists() {
            return Self::parse(None);
        }
        let user = std::fs::read_to_string(path)?;
        Self::parse(Some(&user))
    }

    /// Parse a user config, with every key it omits taken from the defaults.
    pub fn parse(user: Option<&str>) -> Result<Self, CinerowError> {
        let mut merged: toml::Value =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| CinerowError::Config(e.to_string()))?;
        if let Some(user) = user {
            let overlay: toml::Value =
                toml::from_str(user).map_err(|e| CinerowError::Config(e.to_string()))?;
            merge(&mut merged, overlay);
        }
        merged
            .try_into::<AppConfig>()
            .map_err(|e| CinerowError::Config(e.to_string()))
    }

    /// Replace the configured API key with a non-empty override.
    pub fn apply_api_key_override(&mut self, key: Option<String>) {
        if let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            self.provider.api_key = key;
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.provider.api_key.trim().is_empty()
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), CinerowError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CinerowError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, CinerowError> {
        toml::to_string_pretty(self).map_err(|e| CinerowError::Config(e.to_string()))
    }

    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.timing.hover_delay_ms)
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            debounce: Duration::from_millis(self.timing.search_debounce_ms),
            min_query_len: self.timing.min_query_len,
        }
    }

    /// Mapping rules with the provider's image bases applied.
    pub fn mapping_rules(&self) -> MappingRules {
        MappingRules {
            image_base: self.provider.image_base.clone(),
            image_small: self.provider.image_small.clone(),
            ..self.mapping.clone()
        }
    }

    pub fn history_limits(&self) -> HistoryLimits {
        HistoryLimits {
            max_entries: self.library.history_limit,
            continue_limit: self.library.continue_limit,
            recent_limit: self.library.recent_limit,
            finished_threshold: self.library.continue_threshold,
        }
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the database file.
    pub fn db_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("cinerow.db"))
            .unwrap_or_else(|| PathBuf::from("cinerow.db"))
    }

    /// Ensure the data directory exists and return the DB path.
    pub fn ensure_db_path() -> Result<PathBuf, CinerowError> {
        let path = Self::db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "cinerow")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::parse(None).expect("built-in default config is valid TOML")
    }
}

/// Recursively overlay `overlay` onto `base`. Tables merge key by key; any
/// other value replaces the base value.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
