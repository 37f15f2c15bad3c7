use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Environment variables with this prefix override file settings,
/// e.g. `TRANSCRIBER__PLAYER__JUMP_OFFSET_MS=2000`.
const ENV_PREFIX: &str = "TRANSCRIBER";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
}

#[derive(Debug, Deserialize)]
pub struct PlayerConfig {
    /// Signed jump distance in milliseconds
    #[serde(default = "default_jump_offset_ms")]
    pub jump_offset_ms: i64,
}

#[derive(Debug, Deserialize)]
pub struct PollerConfig {
    /// Delay between two samples of the player, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordingConfig {
    /// Recording started on launch: a local path or an http(s) URI
    #[serde(default)]
    pub path: String,
}

fn default_jump_offset_ms() -> i64 {
    5000
}

fn default_interval_ms() -> u64 {
    50
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            jump_offset_ms: default_jump_offset_ms(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        // A zero interval would turn the poller back into a hot spin
        Duration::from_millis(self.interval_ms.max(1))
    }
}

impl Config {
    /// Load configuration from an optional file (extension inferred) layered
    /// under `TRANSCRIBER__*` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}
