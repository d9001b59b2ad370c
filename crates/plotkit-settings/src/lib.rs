//! # plotkit Settings
//!
//! Loads, validates and saves the plotter configuration file.

pub mod config;
pub mod error;

pub use config::{default_config_path, Config, QueueSettings};
pub use error::{ConfigError, SettingsError, SettingsResult};
