//! Configuration module for vmchart-rs
//!
//! This module handles the chart configuration:
//! - Encoding options (symbol encoding, sample cap, missing-field policy)
//! - Chart style (service URL, colours, line width) in [`settings`]
//! - The plot choices offered for an instance
//!
//! # Config Location
//!
//! The configuration file is TOML, stored in the platform-appropriate
//! config directory under `vmchart-rs`:
//! - **Linux**: `~/.config/vmchart-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/vmchart-rs/config.toml`
//! - **Windows**: `%APPDATA%\vmchart-rs\config.toml`
//!
//! Every key is optional; missing keys take their default.
//!
//! # Example
//!
//! ```toml
//! encoding = "simple"
//! sample_cap = 150
//! missing_field = "zero"
//!
//! [style]
//! series_colors = ["4684ee", "b00c12"]
//! ```

pub mod settings;

pub use settings::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::encoding::Encoding;
use crate::error::{ChartError, Result};
use crate::plot::EncodeOptions;
use crate::series::MissingFieldPolicy;
use crate::transform::DEFAULT_SAMPLE_CAP;

/// Application identifier for config directories
pub const APP_ID: &str = "vmchart-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Smallest height a history chart is drawn at
pub const DEFAULT_MIN_PLOT_HEIGHT: u32 = 400;

/// Plot choices offered for a single instance
pub const DEFAULT_PLOTS: &[&str] = &[
    "Load|Jobs",
    "Load|TransferredFiles",
    "Load|TransferredBytes",
    "Load|Transfer Files",
    "Load|Transfer Bytes",
    "Jobs|TransferredFiles",
];

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Chart configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Symbol encoding of the chart data
    #[serde(default)]
    pub encoding: Encoding,

    /// Maximum samples per series after downsampling
    #[serde(default = "default_sample_cap")]
    pub sample_cap: usize,

    /// Handling of rows without a value for the plotted field
    #[serde(default)]
    pub missing_field: MissingFieldPolicy,

    /// Minimum chart height in pixels
    #[serde(default = "default_min_plot_height")]
    pub min_plot_height: u32,

    /// Plot selectors offered to the user
    #[serde(default = "default_plots")]
    pub plots: Vec<String>,

    /// Chart request styling
    #[serde(default)]
    pub style: ChartStyle,
}

fn default_sample_cap() -> usize {
    DEFAULT_SAMPLE_CAP
}

fn default_min_plot_height() -> u32 {
    DEFAULT_MIN_PLOT_HEIGHT
}

fn default_plots() -> Vec<String> {
    DEFAULT_PLOTS.iter().map(|s| s.to_string()).collect()
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            sample_cap: default_sample_cap(),
            missing_field: MissingFieldPolicy::default(),
            min_plot_height: default_min_plot_height(),
            plots: default_plots(),
            style: ChartStyle::default(),
        }
    }
}

impl ChartConfig {
    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChartError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ChartError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = default_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChartError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ChartError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            ChartError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.sample_cap == 0 {
            return Err(ChartError::Config("sample_cap must be at least 1".to_string()));
        }
        if let Some(bad) = self
            .style
            .series_colors
            .iter()
            .find(|c| c.len() != 6 || !c.chars().all(|ch| ch.is_ascii_hexdigit()))
        {
            return Err(ChartError::Config(format!(
                "series colour '{}' is not a 6-digit hex value",
                bad
            )));
        }
        Ok(())
    }

    /// Options for the encode pipeline
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            encoding: self.encoding,
            sample_cap: self.sample_cap,
            missing_field: self.missing_field,
        }
    }
}
