// src/settings.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::drivers::fieldtrip::{DEFAULT_HOST, DEFAULT_PORT};
use crate::drivers::source::DEFAULT_BLOCK_SIZE;
use crate::drivers::{PlotType, TruncationMode, ViewerError};

/// Environment variable pointing at a JSON settings file.
pub const CONFIG_ENV: &str = "FTVIEWER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ftviewer.json";

// 数据来源
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    Buffer,
    Simulation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub sample_rate_hz: f64,
    pub frequency_hz: f64,
    pub amplitude: f64,
    pub noise: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            sample_rate_hz: 250.0,
            frequency_hz: 2.0,
            amplitude: 1.0,
            noise: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub source: SourceMode,
    pub host: String,
    pub port: u16,
    pub block_size: u32,
    pub channel: usize,
    pub tick_interval_ms: u64,
    pub max_num_points: usize,
    pub plot_type: PlotType,
    pub truncation: TruncationMode,
    pub simulation: SimulationSettings,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            source: SourceMode::Buffer,
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            block_size: DEFAULT_BLOCK_SIZE,
            channel: 0,
            tick_interval_ms: 100,
            max_num_points: 1000,
            plot_type: PlotType::Line,
            truncation: TruncationMode::Exact,
            simulation: SimulationSettings::default(),
        }
    }
}

impl ViewerSettings {
    /// Defaults, overridden by the file named in `FTVIEWER_CONFIG` or by
    /// `ftviewer.json` when present.
    pub fn load() -> Result<Self, ViewerError> {
        match config_path() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ViewerError> {
        let raw = fs::read_to_string(path)?;
        let settings = Self::from_json(&raw)?;
        log::info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_json(raw: &str) -> Result<Self, ViewerError> {
        let settings: Self = serde_json::from_str(raw)
            .map_err(|e| ViewerError::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ViewerError> {
        let fail = |msg: &str| Err(ViewerError::InvalidConfig(msg.to_owned()));
        if self.max_num_points == 0 {
            return fail("max_num_points must be at least 1");
        }
        if self.block_size == 0 {
            return fail("block_size must be at least 1");
        }
        if self.tick_interval_ms == 0 {
            return fail("tick_interval_ms must be at least 1");
        }
        if self.host.trim().is_empty() {
            return fail("host must not be empty");
        }
        if self.simulation.sample_rate_hz <= 0.0 {
            return fail("simulation.sample_rate_hz must be greater than zero");
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
    fallback.exists().then_some(fallback)
}
