//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {reason}")]
    Invalid { reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
    pub frames: u64,
    /// Log each tracker's summary every this many frames.
    pub report_every: u64,
    pub loops: Vec<LoopConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub name: String,
    pub frame_interval_ms: u64,
    /// Every n-th frame is stalled by `stall_ms`. Zero disables stalls.
    pub stall_every: u64,
    pub stall_ms: u64,
    /// Upper bound of random extra delay added to each frame.
    pub spread_us: u64,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            frames: 600,
            report_every: 60,
            loops: vec![
                LoopConfig {
                    name: "Render".to_string(),
                    frame_interval_ms: 16,
                    stall_every: 90,
                    stall_ms: 8,
                    spread_us: 500,
                },
                LoopConfig {
                    name: "Physics".to_string(),
                    frame_interval_ms: 10,
                    stall_every: 0,
                    stall_ms: 0,
                    spread_us: 200,
                },
            ],
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            frame_interval_ms: 16,
            stall_every: 0,
            stall_ms: 0,
            spread_us: 0,
        }
    }
}

impl JitterConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: JitterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.loops.is_empty() {
            return Err(invalid("at least one loop is required"));
        }
        if self.report_every == 0 {
            return Err(invalid("report_every must be greater than zero"));
        }
        for (index, lp) in self.loops.iter().enumerate() {
            if lp.frame_interval_ms == 0 {
                return Err(invalid(format!("loop {} has a zero frame interval", index)));
            }
            if lp.stall_every > 0 && lp.stall_ms == 0 {
                return Err(invalid(format!("loop {} stalls every {} frames for zero ms", index, lp.stall_every)));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { reason: reason.into() }
}
