// Integration tests for the clock player
//
// WAV fixtures are generated on the fly so the duration probe runs against
// real files.

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;
use transcriber::{
    ChannelSubscriber, ClockPlayer, Error, MediaSource, PlaybackEvent, PlayerError,
    PlayerHandle, PlayerState, SessionConfig, SessionController, SharedPlayer, Transcriber,
};

/// Write `duration_ms` of silence at 8kHz mono
fn write_wav(dir: &Path, name: &str, duration_ms: u32) -> Result<PathBuf> {
    let path = dir.join(name);
    let spec = WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(&path, spec)?;
    for _ in 0..(8 * duration_ms) {
        writer.write_sample(0i16)?;
    }
    writer.finalize()?;

    Ok(path)
}

fn local(path: &Path) -> Result<MediaSource> {
    Ok(MediaSource::parse(&path.to_string_lossy())?)
}

#[tokio::test]
async fn test_probes_length_of_local_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_wav(temp_dir.path(), "one-second.wav", 1000)?;

    let mut player = ClockPlayer::new();
    player.load_media(&local(&path)?).await?;

    assert_eq!(player.total_length().await?, 1000);
    assert_eq!(player.state().await?, PlayerState::Opening);
    assert_eq!(player.current_time().await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_transport_and_clamped_seeks() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_wav(temp_dir.path(), "two-seconds.wav", 2000)?;

    let mut player = ClockPlayer::new();
    player.load_media(&local(&path)?).await?;
    player.play().await?;
    assert_eq!(player.state().await?, PlayerState::Playing);

    player.pause(true).await?;
    assert_eq!(player.state().await?, PlayerState::Paused);

    // Out-of-range seeks are clamped by the engine
    player.set_time(-3000).await?;
    assert_eq!(player.current_time().await?, 0);

    player.set_time(1000).await?;
    assert_eq!(player.current_time().await?, 1000);
    assert!((player.position().await? - 0.5).abs() < f64::EPSILON);

    player.pause(false).await?;
    player.set_time(99_999).await?;
    assert_eq!(player.state().await?, PlayerState::Ended);

    player.stop().await?;
    assert_eq!(player.state().await?, PlayerState::Stopped);

    Ok(())
}

#[tokio::test]
async fn test_rejects_streams_and_missing_files() -> Result<()> {
    let mut player = ClockPlayer::new();

    let stream = MediaSource::parse("https://example.org/talk.mp3")?;
    assert!(matches!(
        player.load_media(&stream).await,
        Err(PlayerError::Open { .. })
    ));

    let missing = MediaSource::parse("/definitely/not/here.wav")?;
    assert!(matches!(
        player.load_media(&missing).await,
        Err(PlayerError::Open { .. })
    ));

    // Nothing loaded
    assert_eq!(player.current_time().await, Err(PlayerError::NoMedia));
    assert_eq!(player.state().await?, PlayerState::Idle);

    Ok(())
}

#[tokio::test]
async fn test_session_plays_recording_to_the_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_wav(temp_dir.path(), "short.wav", 300)?;

    let transcriber = Arc::new(Transcriber::new(SharedPlayer::new(ClockPlayer::new())));
    let (subscriber, mut rx) = ChannelSubscriber::new();
    let controller = SessionController::new(
        Arc::clone(&transcriber),
        Arc::new(subscriber),
        SessionConfig {
            poll_interval: Duration::from_millis(10),
        },
    );

    let session = controller.start(&path.to_string_lossy()).await?;
    timeout(Duration::from_secs(5), controller.join()).await?;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(
        events.first(),
        Some(&PlaybackEvent::LengthKnown { session: session.id(), length_ms: 300 })
    );
    assert_eq!(
        events.last(),
        Some(&PlaybackEvent::Terminated { session: session.id(), error: None })
    );

    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::Sample { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert!(!percents.is_empty());
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "Samples must not go backwards");

    Ok(())
}

#[tokio::test]
async fn test_session_reports_unplayable_stream() -> Result<()> {
    let transcriber = Arc::new(Transcriber::new(SharedPlayer::new(ClockPlayer::new())));
    let (subscriber, _rx) = ChannelSubscriber::new();
    let controller =
        SessionController::new(transcriber, Arc::new(subscriber), SessionConfig::default());

    let result = controller.start("http://radio.example.org/live").await;

    assert!(matches!(result, Err(Error::Load { .. })));
    assert_eq!(controller.active_pollers(), 0);

    Ok(())
}
