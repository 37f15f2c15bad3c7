use super::{LoadMode, MediaSource, PlayerHandle, PlayerState};
use crate::error::PlayerError;
use std::path::Path;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::time::Instant;
use tracing::{debug, info};

/// Engine that tracks playback against a wall clock without producing audio.
///
/// Local recordings are probed with symphonia to learn their duration;
/// remote streams cannot be opened.
#[derive(Debug, Default)]
pub struct ClockPlayer {
    media: Option<Loaded>,
}

#[derive(Debug)]
struct Loaded {
    uri: String,
    length_ms: i64,
    state: PlayerState,
    /// Playback time accumulated before `resumed_at`
    offset_ms: i64,
    /// Set while the clock is running
    resumed_at: Option<Instant>,
}

impl Loaded {
    fn elapsed_ms(&self) -> i64 {
        let running = self
            .resumed_at
            .map(|at| at.elapsed().as_millis() as i64)
            .unwrap_or(0);
        (self.offset_ms + running).clamp(0, self.length_ms)
    }

    /// Freeze the clock at the current time
    fn halt(&mut self) {
        self.offset_ms = self.elapsed_ms();
        self.resumed_at = None;
    }

    fn refresh(&mut self) {
        if self.state == PlayerState::Playing && self.elapsed_ms() >= self.length_ms {
            self.halt();
            self.state = PlayerState::Ended;
            debug!("Reached end of {}", self.uri);
        }
    }
}

impl ClockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn loaded(&mut self) -> Result<&mut Loaded, PlayerError> {
        let media = self.media.as_mut().ok_or(PlayerError::NoMedia)?;
        media.refresh();
        Ok(media)
    }
}

/// Read the duration of a local recording in milliseconds
fn probe_length_ms(path: &Path) -> Result<i64, String> {
    let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| format!("unsupported format: {}", e))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| "no audio track".to_string())?;

    let params = &track.codec_params;
    match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => Ok((frames * 1000 / rate as u64) as i64),
        _ => Err("duration unknown".to_string()),
    }
}

#[async_trait::async_trait]
impl PlayerHandle for ClockPlayer {
    async fn load_media(&mut self, source: &MediaSource) -> Result<(), PlayerError> {
        if source.mode == LoadMode::Stream {
            return Err(PlayerError::Open {
                uri: source.uri.clone(),
                reason: "streaming is not supported by the clock player".to_string(),
            });
        }

        let path = source.uri.clone();
        let length_ms = tokio::task::spawn_blocking(move || probe_length_ms(Path::new(&path)))
            .await
            .map_err(|e| PlayerError::Engine(format!("probe task failed: {}", e)))?
            .map_err(|reason| PlayerError::Open {
                uri: source.uri.clone(),
                reason,
            })?;

        info!("Loaded {} ({}ms)", source.uri, length_ms);

        self.media = Some(Loaded {
            uri: source.uri.clone(),
            length_ms,
            state: PlayerState::Opening,
            offset_ms: 0,
            resumed_at: None,
        });
        Ok(())
    }

    async fn play(&mut self) -> Result<(), PlayerError> {
        let media = self.loaded()?;
        match media.state {
            PlayerState::Playing => return Ok(()),
            PlayerState::Ended => media.offset_ms = 0,
            _ => {}
        }
        media.state = PlayerState::Playing;
        media.resumed_at = Some(Instant::now());
        Ok(())
    }

    async fn pause(&mut self, pause: bool) -> Result<(), PlayerError> {
        let media = self.loaded()?;
        match (pause, media.state) {
            (true, PlayerState::Playing) => {
                media.halt();
                media.state = PlayerState::Paused;
            }
            (false, PlayerState::Paused) => {
                media.state = PlayerState::Playing;
                media.resumed_at = Some(Instant::now());
            }
            _ => {}
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), PlayerError> {
        if let Some(media) = self.media.as_mut() {
            media.state = PlayerState::Stopped;
            media.offset_ms = 0;
            media.resumed_at = None;
        }
        Ok(())
    }

    async fn current_time(&mut self) -> Result<i64, PlayerError> {
        Ok(self.loaded()?.elapsed_ms())
    }

    async fn set_time(&mut self, ms: i64) -> Result<(), PlayerError> {
        let media = self.loaded()?;
        media.offset_ms = ms.clamp(0, media.length_ms);
        if media.resumed_at.is_some() {
            media.resumed_at = Some(Instant::now());
        }
        if media.state == PlayerState::Ended && media.offset_ms < media.length_ms {
            media.state = PlayerState::Paused;
        }
        Ok(())
    }

    async fn total_length(&mut self) -> Result<i64, PlayerError> {
        Ok(self.loaded()?.length_ms)
    }

    async fn position(&mut self) -> Result<f64, PlayerError> {
        let media = self.loaded()?;
        if media.length_ms <= 0 {
            return Ok(0.0);
        }
        Ok(media.elapsed_ms() as f64 / media.length_ms as f64)
    }

    async fn state(&mut self) -> Result<PlayerState, PlayerError> {
        match self.media.as_mut() {
            Some(media) => {
                media.refresh();
                Ok(media.state)
            }
            None => Ok(PlayerState::Idle),
        }
    }

    fn name(&self) -> &str {
        "clock"
    }
}
