/// CLI configuration
use crate::error::{CliError, Result};
use pacer_playback::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File read when no explicit configuration path is given
pub const DEFAULT_CONFIG_FILE: &str = "pacer.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub library: LibrarySettings,

    #[serde(default)]
    pub playback: SchedulerConfig,

    /// Virtual time advanced per simulated render frame
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// Directory holding raw track assets
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,

    /// JSON document listing every track and program
    #[serde(default = "default_document")]
    pub document: PathBuf,
}

impl CliConfig {
    /// Load from `path` (or `pacer.toml` when present), then `PACER_*` variables
    ///
    /// Nested keys use a double underscore, e.g.
    /// `PACER_PLAYBACK__SCHEDULE_LEAD_SECS=2`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings =
                    settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("PACER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(CliError::Config(
                "tick_interval_ms must be at least 1".to_string(),
            ));
        }
        self.playback
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Tick interval in seconds
    pub fn tick_secs(&self) -> f64 {
        self.tick_interval_ms as f64 / 1000.0
    }
}

fn default_tick_interval_ms() -> u64 {
    50
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from("./data/assets")
}

fn default_document() -> PathBuf {
    PathBuf::from("./data/library.json")
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            asset_dir: default_asset_dir(),
            document: default_document(),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            library: LibrarySettings::default(),
            playback: SchedulerConfig::default(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}
