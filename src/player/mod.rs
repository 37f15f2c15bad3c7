//! Media engine abstraction
//!
//! The core never talks to an engine directly. It goes through
//! [`SharedPlayer`], which serializes every call so the position poller and
//! foreground commands (pause, jumps) never hit the engine at the same time.

mod clock;

pub use clock::ClockPlayer;

use crate::error::{Error, PlayerError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Playback state reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    Idle,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
    Ended,
    Error,
}

impl PlayerState {
    /// Map a raw libVLC `libvlc_state_t` code to a state.
    pub fn from_code(code: i32) -> Result<Self, PlayerError> {
        match code {
            0 => Ok(Self::Idle),
            1 => Ok(Self::Opening),
            2 => Ok(Self::Buffering),
            3 => Ok(Self::Playing),
            4 => Ok(Self::Paused),
            5 => Ok(Self::Stopped),
            6 => Ok(Self::Ended),
            7 => Ok(Self::Error),
            other => Err(PlayerError::UnknownState(other)),
        }
    }

    /// Position samples are only meaningful while playing or paused
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// No further samples will follow
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Error)
    }
}

/// How the engine should open a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Local file; the engine is asked to cache/index it
    Local,
    /// Remote stream, opened as-is
    Stream,
}

/// A validated recording reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub uri: String,
    pub mode: LoadMode,
}

impl MediaSource {
    /// Validate `path` and pick the load mode from its prefix.
    pub fn parse(path: &str) -> Result<Self, Error> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }

        if trimmed.starts_with("http") {
            Ok(Self {
                uri: trimmed.to_string(),
                mode: LoadMode::Stream,
            })
        } else {
            Ok(Self {
                uri: shellexpand::tilde(trimmed).into_owned(),
                mode: LoadMode::Local,
            })
        }
    }

    /// Whether the engine should cache/index the media
    pub fn cache_hint(&self) -> bool {
        self.mode == LoadMode::Local
    }
}

/// Media engine interface required by the core
///
/// Implementations:
/// - [`ClockPlayer`]: self-contained engine driven by a wall clock
/// - Bindings to a native engine (libVLC and friends) live outside this crate
#[async_trait::async_trait]
pub trait PlayerHandle: Send + Sync {
    /// Prepare `source` for playback
    async fn load_media(&mut self, source: &MediaSource) -> Result<(), PlayerError>;

    /// Begin or resume playback
    async fn play(&mut self) -> Result<(), PlayerError>;

    /// Pause when `pause` is true, resume otherwise
    async fn pause(&mut self, pause: bool) -> Result<(), PlayerError>;

    /// Halt playback (process teardown)
    async fn stop(&mut self) -> Result<(), PlayerError>;

    /// Elapsed time in milliseconds
    async fn current_time(&mut self) -> Result<i64, PlayerError>;

    /// Seek to an absolute time; out-of-range values are the engine's business
    async fn set_time(&mut self, ms: i64) -> Result<(), PlayerError>;

    /// Total duration in milliseconds, non-positive while unknown
    async fn total_length(&mut self) -> Result<i64, PlayerError>;

    /// Elapsed fraction of the recording in `[0.0, 1.0]`
    async fn position(&mut self) -> Result<f64, PlayerError>;

    async fn state(&mut self) -> Result<PlayerState, PlayerError>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Process-wide handle to the single engine instance
#[derive(Clone)]
pub struct SharedPlayer {
    inner: Arc<Mutex<Box<dyn PlayerHandle>>>,
}

impl SharedPlayer {
    pub fn new(player: impl PlayerHandle + 'static) -> Self {
        Self::from_boxed(Box::new(player))
    }

    pub fn from_boxed(player: Box<dyn PlayerHandle>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(player)),
        }
    }

    pub async fn name(&self) -> String {
        self.inner.lock().await.name().to_string()
    }

    pub async fn load_media(&self, source: &MediaSource) -> Result<(), PlayerError> {
        self.inner.lock().await.load_media(source).await
    }

    pub async fn play(&self) -> Result<(), PlayerError> {
        self.inner.lock().await.play().await
    }

    pub async fn pause(&self, pause: bool) -> Result<(), PlayerError> {
        self.inner.lock().await.pause(pause).await
    }

    pub async fn stop(&self) -> Result<(), PlayerError> {
        self.inner.lock().await.stop().await
    }

    pub async fn current_time(&self) -> Result<i64, PlayerError> {
        self.inner.lock().await.current_time().await
    }

    pub async fn set_time(&self, ms: i64) -> Result<(), PlayerError> {
        self.inner.lock().await.set_time(ms).await
    }

    pub async fn total_length(&self) -> Result<i64, PlayerError> {
        self.inner.lock().await.total_length().await
    }

    pub async fn position(&self) -> Result<f64, PlayerError> {
        self.inner.lock().await.position().await
    }

    pub async fn state(&self) -> Result<PlayerState, PlayerError> {
        self.inner.lock().await.state().await
    }
}
