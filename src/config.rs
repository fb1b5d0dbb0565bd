use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analysis::DEFAULT_BLOCK_LENGTH;
use crate::audio::extract::DEFAULT_ENERGY_WINDOW_MS;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_block_length")]
    pub block_length: f32,
}

#[derive(Debug, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_energy_window_ms")]
    pub energy_window_ms: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub pretty: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            block_length: default_block_length(),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            energy_window_ms: default_energy_window_ms(),
        }
    }
}

fn default_block_length() -> f32 { DEFAULT_BLOCK_LENGTH }
fn default_energy_window_ms() -> u32 { DEFAULT_ENERGY_WINDOW_MS }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::debug!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// Explicit path, else `lyricmotion.toml` in the working directory, else the
/// per-user config file.
pub fn find_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("lyricmotion.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("lyricmotion").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("lyricmotion").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
