use std::time::Duration;

/// Configuration for playback sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between two samples of the player
    /// Default: 50ms
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl From<&crate::config::PollerConfig> for SessionConfig {
    fn from(cfg: &crate::config::PollerConfig) -> Self {
        Self {
            poll_interval: cfg.interval(),
        }
    }
}
