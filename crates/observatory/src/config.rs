//! Configuration file support for observatory.
//!
//! Loads `observatory.toml` from `--config` or the user config directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use observatory_transcripts::{QueryWindows, StoreConfig};

/// The config file name
pub const CONFIG_FILE_NAME: &str = "observatory.toml";

/// Port the HTTP server listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 3001;

/// Configuration loaded from `observatory.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ObservatoryConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    /// Recency windows and caps for the live queries
    #[serde(default)]
    pub windows: QueryWindows,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Transcript and cache locations. `~/` expands to the home directory.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub projects_dir: Option<PathBuf>,
    /// Defaults to `projects_dir`
    pub agents_dir: Option<PathBuf>,
    pub stats_cache: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub port: Option<u16>,
}

/// Command-line flags that take precedence over the file.
#[derive(Debug, Default)]
pub struct PathOverrides {
    pub projects_dir: Option<PathBuf>,
    pub agents_dir: Option<PathBuf>,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreConfig,
    pub stats_cache: PathBuf,
    pub port: u16,
}

impl ObservatoryConfig {
    /// `<config dir>/observatory/observatory.toml`, if a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("observatory").join(CONFIG_FILE_NAME))
    }

    /// Load configuration from `path`.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: ObservatoryConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(config))
    }

    /// Apply overrides and defaults relative to `home`.
    pub fn resolve(self, overrides: PathOverrides, home: &Path) -> Settings {
        let claude_dir = home.join(".claude");

        let projects_dir = overrides
            .projects_dir
            .or(self.paths.projects_dir)
            .map(|p| expand_tilde(&p, home))
            .unwrap_or_else(|| claude_dir.join("projects"));

        let agents_dir = overrides
            .agents_dir
            .or(self.paths.agents_dir)
            .map(|p| expand_tilde(&p, home))
            .unwrap_or_else(|| projects_dir.clone());

        let stats_cache = self
            .paths
            .stats_cache
            .map(|p| expand_tilde(&p, home))
            .unwrap_or_else(|| claude_dir.join("stats-cache.json"));

        Settings {
            store: StoreConfig {
                projects_dir,
                agents_dir,
                windows: self.windows,
            },
            stats_cache,
            port: self.server.port.unwrap_or(DEFAULT_PORT),
        }
    }
}

/// Resolve settings from an explicit config path or the default location.
///
/// An explicit path that does not exist is an error; a missing default file
/// just means defaults.
pub fn load_settings(explicit: Option<&Path>, overrides: PathOverrides) -> Result<Settings> {
    let config = match explicit {
        Some(path) => Some(
            ObservatoryConfig::load(path)?
                .with_context(|| format!("Config file not found: {}", path.display()))?,
        ),
        None => match ObservatoryConfig::default_path() {
            Some(path) => ObservatoryConfig::load(&path)?,
            None => None,
        },
    };

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(config.unwrap_or_default().resolve(overrides, &home))
}

fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
