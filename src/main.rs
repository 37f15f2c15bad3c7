use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use transcriber::{
    format_clock, ChannelSubscriber, ClockPlayer, Config, PlaybackEvent, SessionConfig,
    SessionController, SharedPlayer, Transcriber,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::load("config/transcriber")?;

    info!("Transcriber v{}", env!("CARGO_PKG_VERSION"));
    info!("Jump offset: {}ms", cfg.player.jump_offset_ms);
    info!("Poll interval: {}ms", cfg.poller.interval_ms);

    let player = SharedPlayer::new(ClockPlayer::new());
    info!("Player engine: {}", player.name().await);

    let transcriber = Arc::new(Transcriber::with_jump_offset(
        player,
        cfg.player.jump_offset_ms,
    ));
    let (subscriber, mut events) = ChannelSubscriber::new();
    let controller = SessionController::new(
        transcriber,
        Arc::new(subscriber),
        SessionConfig::from(&cfg.poller),
    );

    let session = controller
        .start(&cfg.recording.path)
        .await
        .with_context(|| format!("Failed to start {:?}", cfg.recording.path))?;

    let mut last_percent = None;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                tracing::debug!("{}", serde_json::to_string(&event)?);

                match event {
                    PlaybackEvent::LengthKnown { length_ms, .. } => {
                        info!("Total length: {}", format_clock(length_ms));
                    }
                    PlaybackEvent::Sample { percent, .. } if last_percent != Some(percent) => {
                        last_percent = Some(percent);
                        info!("Position: {}%", percent);
                    }
                    PlaybackEvent::Sample { .. } => {}
                    PlaybackEvent::Terminated { error: None, .. } => {
                        info!("Recording finished");
                        break;
                    }
                    PlaybackEvent::Terminated { error: Some(e), .. } => {
                        error!("Playback stopped: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping session {}", session.id());
                break;
            }
        }
    }

    controller.shutdown().await?;
    Ok(())
}
