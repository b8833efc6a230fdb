/// Studio configuration
///
/// Read from `config.json` in the user's config directory:
/// - Linux: ~/.config/character-studio/config.json
/// - macOS: ~/Library/Application Support/character-studio/config.json
/// - Windows: %APPDATA%\character-studio\config.json
///
/// Every field is optional. `GEMINI_API_KEY` (or `API_KEY`) from the
/// environment or a `.env` file takes precedence over the stored key.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::media::MediaStore;

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StudioConfig {
    /// Key for the generation API; the video tool asks for one if missing
    pub api_key: Option<String>,
    /// Base URL of the generation API
    pub api_base: String,
    /// Model used for scene composition, edits and character portraits
    pub image_model: String,
    /// Model used for image-to-video generation
    pub video_model: String,
    /// Seconds between video operation polls
    pub poll_interval_secs: u64,
    /// Polls before a video operation is considered timed out
    pub max_video_polls: u32,
    /// Timeout for a single HTTP request
    pub request_timeout_secs: u64,
    /// Where generated media is written (defaults to the user cache dir)
    pub media_dir: Option<PathBuf>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            image_model: "gemini-2.5-flash-image-preview".to_string(),
            video_model: "veo-2.0-generate-001".to_string(),
            poll_interval_secs: 10,
            max_video_polls: 60,
            request_timeout_secs: 120,
            media_dir: None,
        }
    }
}

impl StudioConfig {
    /// Load the config file (if any) and apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            tracing::debug!("No .env loaded: {}", err);
        }

        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.apply_env_key(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("📁 Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the path where the config file is expected
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("character-studio");
        path.push("config.json");
        Some(path)
    }

    fn apply_env_key(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let from_env = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty());

        if from_env.is_some() {
            self.api_key = from_env;
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Media cache for generated output
    pub fn media_store(&self) -> MediaStore {
        let dir = self
            .media_dir
            .clone()
            .or_else(MediaStore::default_dir)
            .unwrap_or_else(|| std::env::temp_dir().join("character-studio"));
        MediaStore::new(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "video_model": "veo-3.0-generate-preview", "poll_interval_secs": 2 }"#)
            .unwrap();

        let config = StudioConfig::from_file(&path).unwrap();

        assert_eq!(config.video_model, "veo-3.0-generate-preview");
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.image_model, StudioConfig::default().image_model);
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            StudioConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_key_overrides_file_key() {
        let mut config = StudioConfig {
            api_key: Some("from-file".to_string()),
            ..StudioConfig::default()
        };

        config.apply_env_key(|name| (name == "API_KEY").then(|| " from-env ".to_string()));
        assert_eq!(config.api_key(), Some("from-env"));
    }

    #[test]
    fn test_blank_env_key_is_ignored() {
        let mut config = StudioConfig {
            api_key: Some("from-file".to_string()),
            ..StudioConfig::default()
        };

        config.apply_env_key(|_| Some("   ".to_string()));
        assert_eq!(config.api_key(), Some("from-file"));
    }

    #[test]
    fn test_media_dir_override() {
        let config = StudioConfig {
            media_dir: Some(PathBuf::from("/tmp/studio-media")),
            ..StudioConfig::default()
        };
        assert_eq!(config.media_store(), MediaStore::new(PathBuf::from("/tmp/studio-media")));
    }
}
