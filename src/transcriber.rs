use crate::error::{Error, Result};
use crate::player::{PlayerState, SharedPlayer};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Default jump distance in milliseconds
pub const DEFAULT_JUMP_OFFSET_MS: i64 = 5000;

#[derive(Debug, Clone, Copy)]
enum Direction {
    Back,
    Forward,
}

/// Owns the player and the jump configuration for the current recording
pub struct Transcriber {
    /// Signed jump distance in milliseconds
    jump_offset_ms: AtomicI64,

    /// Recording passed to the last start, set by the session controller
    recording: RwLock<Option<String>>,

    player: SharedPlayer,
}

impl Transcriber {
    pub fn new(player: SharedPlayer) -> Self {
        Self::with_jump_offset(player, DEFAULT_JUMP_OFFSET_MS)
    }

    pub fn with_jump_offset(player: SharedPlayer, jump_offset_ms: i64) -> Self {
        Self {
            jump_offset_ms: AtomicI64::new(jump_offset_ms),
            recording: RwLock::new(None),
            player,
        }
    }

    pub fn player(&self) -> &SharedPlayer {
        &self.player
    }

    pub fn jump_offset_ms(&self) -> i64 {
        self.jump_offset_ms.load(Ordering::SeqCst)
    }

    pub fn set_jump_offset_ms(&self, ms: i64) {
        info!("Jump offset set to {}ms", ms);
        self.jump_offset_ms.store(ms, Ordering::SeqCst);
    }

    /// Recording passed to the last start, if any
    pub async fn recording(&self) -> Option<String> {
        self.recording.read().await.clone()
    }

    pub(crate) async fn set_recording(&self, path: &str) {
        *self.recording.write().await = Some(path.to_string());
    }

    /// Seek back by the jump offset
    pub async fn jump_back(&self) -> Result<()> {
        self.jump(Direction::Back).await
    }

    /// Seek forward by the jump offset
    pub async fn jump_forward(&self) -> Result<()> {
        self.jump(Direction::Forward).await
    }

    /// Relative seek. The target is not clamped here; range handling is up to the player.
    async fn jump(&self, direction: Direction) -> Result<()> {
        let label = match direction {
            Direction::Back => "Jump back",
            Direction::Forward => "Jump forward",
        };

        let now = match self.player.current_time().await {
            Ok(ms) => ms,
            Err(e) => {
                warn!("{}: {}", label, e);
                return Err(Error::Query {
                    what: "time",
                    source: e,
                });
            }
        };

        let offset_ms = self.jump_offset_ms();
        let target_ms = match direction {
            Direction::Back => now.saturating_sub(offset_ms),
            Direction::Forward => now.saturating_add(offset_ms),
        };
        debug!("{}: {}ms -> {}ms", label, now, target_ms);

        self.player
            .set_time(target_ms)
            .await
            .map_err(|source| Error::Seek { target_ms, source })
    }

    /// Pause when playing, resume otherwise. Returns whether playback is now running.
    pub async fn toggle_pause(&self) -> Result<bool> {
        let state = self.player.state().await.map_err(Error::query("state"))?;
        let playing = state == PlayerState::Playing;

        self.player
            .pause(playing)
            .await
            .map_err(Error::Playback)?;

        info!("Playback {}", if playing { "paused" } else { "resumed" });
        Ok(!playing)
    }
}
