//! Configuration loading and parsing
//!
//! Everything the command line accepts can also come from a TOML file;
//! command line values win.

use anyhow::{Context, Result};
use can_log_scanner::SortColumn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub log: Option<PathBuf>,
    #[serde(default)]
    pub dbc_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanSection {
    pub start: Option<TimeInput>,
    pub target: Option<TimeInput>,
    pub window: Option<f64>,
    pub block: Option<AddressInput>,
    pub allow: Option<AddressInput>,
}

/// A time field: a TOML integer or the same text the command line takes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TimeInput {
    Seconds(i64),
    Text(String),
}

impl TimeInput {
    /// Text form, for parsing with the same rules as the command line
    pub fn as_text(&self) -> String {
        match self {
            TimeInput::Seconds(secs) => secs.to_string(),
            TimeInput::Text(text) => text.clone(),
        }
    }
}

/// An address list: `"1a0, 3e9"` or `["1a0", "3e9"]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AddressInput {
    Text(String),
    List(Vec<String>),
}

impl AddressInput {
    /// Comma-separated form
    pub fn as_text(&self) -> String {
        match self {
            AddressInput::Text(text) => text.clone(),
            AddressInput::List(items) => items.join(","),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub sort: SortColumn,
    #[serde(default)]
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
