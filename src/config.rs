use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::api::client::DEFAULT_BASE_URL;
use crate::dataset::labels::playlists_from_table;
use crate::dataset::{LabelSet, Pacing};

/// Environment variable holding an already-issued Spotify access token.
pub const TOKEN_ENV: &str = "SPOTIFY_ACCESS_TOKEN";

/// Application configuration loaded from TOML config file.
/// All fields have defaults; the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where datasets are written and the APPEND folder lives.
    pub csv_directory: Option<PathBuf>,
    /// Base name of the output file, without extension.
    pub csv_name: String,
    /// Spotify user the playlists are read as.
    pub user_id: Option<String>,
    /// Write the leading index column.
    pub write_index: bool,
    /// Spotify Web API settings.
    pub api: ApiConfig,
    /// Playlist id -> label table, in file order.
    pub playlists: toml::Table,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Pause after each track fetch in milliseconds.
    pub track_delay_ms: u64,
    /// Pause after each playlist in milliseconds.
    pub playlist_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            csv_directory: None,
            csv_name: "dataset".to_string(),
            user_id: None,
            write_index: true,
            api: ApiConfig::default(),
            playlists: toml::Table::new(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            track_delay_ms: 300,
            playlist_delay_ms: 5000,
        }
    }
}

impl ApiConfig {
    pub fn pacing(&self) -> Pacing {
        Pacing::from_millis(self.track_delay_ms, self.playlist_delay_ms)
    }
}

impl AppConfig {
    /// Load config from `~/.config/featureset/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("{e:#}. Using defaults.");
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit path. Unlike [`AppConfig::load`], any
    /// read or parse failure is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// The `[playlists]` table as ordered label sets.
    pub fn playlists(&self) -> Result<Vec<(String, LabelSet)>> {
        Ok(playlists_from_table(&self.playlists)?)
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Read the `[playlists]` table of a standalone playlists file.
pub fn load_playlists(path: &Path) -> Result<Vec<(String, LabelSet)>> {
    #[derive(Deserialize)]
    struct PlaylistsFile {
        playlists: toml::Table,
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: PlaylistsFile = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(playlists_from_table(&file.playlists)?)
}
