//! Configuration file support for evergreen
//!
//! Reads from .evergreen/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Contact cadence settings
    #[serde(default)]
    pub contacts: ContactConfig,

    /// Dashboard display settings
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Capture classification settings
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Contact-related configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContactConfig {
    /// Days between touches for contacts without an explicit cadence
    /// Default: 30
    #[serde(default = "default_cadence_days")]
    pub default_cadence_days: u32,
}

/// Dashboard-related configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DashboardConfig {
    /// Trailing windows (in days) shown for completion rates
    /// Default: [7, 30, 90]
    #[serde(default = "default_windows")]
    pub windows: Vec<u32>,
}

/// Capture classification configuration
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct CaptureConfig {
    /// Extra classification rules, tried before the built-in ones.
    /// Each rule is a case-insensitive regex mapped to a category.
    #[serde(default)]
    pub rules: Vec<CaptureRule>,
}

/// One user-defined classification rule
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureRule {
    pub pattern: String,
    pub category: String,
}

fn default_cadence_days() -> u32 {
    30
}

fn default_windows() -> Vec<u32> {
    vec![7, 30, 90]
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            default_cadence_days: default_cadence_days(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            windows: default_windows(),
        }
    }
}

impl Config {
    /// Load config from .evergreen/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_path() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str(&contents) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".evergreen").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }
}
