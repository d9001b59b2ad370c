//! Configuration file
//!
//! One [`Config`] holds every section the plotter needs. Each component is
//! handed its own section at construction and never sees the rest.

use std::path::{Path, PathBuf};

use plotkit_communication::{ConnectionParams, SessionConfig};
use plotkit_core::DEFAULT_QUEUE_CAPACITY;
use plotkit_designer::{LayoutOptions, PenSettings, PenStrategy, PlotOptions, ToolpathOptions};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SettingsError, SettingsResult};

/// Job queue settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub capacity: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Complete plotter configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutOptions,
    pub toolpath: ToolpathOptions,
    pub pen: PenSettings,
    pub connection: ConnectionParams,
    pub session: SessionConfig,
    pub queue: QueueSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("none").to_string()).into()),
    }
}

fn invalid(key: &str, reason: &str) -> SettingsError {
    SettingsError::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from a `.toml` or `.json` file.
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format_of(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save config to a `.toml` or `.json` file, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        tracing::debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Load `path` when given, else the default config file when it exists,
    /// else defaults.
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match default_config_path() {
            Ok(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> SettingsResult<()> {
        self.layout.validate()?;

        let feed = self.toolpath.feed_rate;
        if !(feed.is_finite() && feed > 0.0) {
            return Err(ConfigError::ValueOutOfRange {
                key: "toolpath.feed_rate".to_string(),
                value: feed.to_string(),
            }
            .into());
        }
        if let PenStrategy::Connected { tolerance_mm } = self.toolpath.strategy {
            if !(tolerance_mm.is_finite() && tolerance_mm >= 0.0) {
                return Err(invalid("toolpath.strategy.tolerance_mm", "must not be negative"));
            }
        }
        if !(self.pen.dwell_seconds.is_finite() && self.pen.dwell_seconds >= 0.0) {
            return Err(invalid("pen.dwell_seconds", "must not be negative"));
        }
        if self.pen.pen_up.trim().is_empty() || self.pen.pen_down.trim().is_empty() {
            return Err(invalid("pen", "pen commands must not be empty"));
        }

        if self.connection.baud_rate == 0 {
            return Err(invalid("connection.baud_rate", "must be > 0"));
        }
        if self.connection.timeout_ms == 0 {
            return Err(invalid("connection.timeout_ms", "must be > 0"));
        }

        self.session
            .validate()
            .map_err(|reason| invalid("session", &reason))?;

        if self.queue.capacity == 0 {
            return Err(invalid("queue.capacity", "must be > 0"));
        }
        Ok(())
    }

    /// Options for the text to G-code pipeline.
    pub fn plot_options(&self) -> PlotOptions {
        PlotOptions {
            layout: self.layout.clone(),
            toolpath: self.toolpath,
            pen: self.pen.clone(),
        }
    }

    /// Session settings, with the pen-up command the programs use.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            pen_up_command: self.pen.pen_up.clone(),
            ..self.session.clone()
        }
    }
}

/// `<config dir>/plotkit/config.toml`
pub fn default_config_path() -> SettingsResult<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        SettingsError::ConfigDirectory("no configuration directory on this platform".to_string())
    })?;
    Ok(base.join("plotkit").join("config.toml"))
}
