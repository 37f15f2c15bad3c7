use super::config::SessionConfig;
use super::events::{SessionId, Subscriber};
use super::poller::{CancelHandle, PollerTask, PositionPoller};
use crate::error::{Error, Result};
use crate::player::MediaSource;
use crate::transcriber::Transcriber;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Returned by [`SessionController::start`]
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    cancel: CancelHandle,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Request cancellation of this session's poller without waiting for it
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct ActivePoller {
    id: SessionId,
    cancel: CancelHandle,
    poller: PollerTask,
}

/// Starts playback of a recording and keeps at most one position poller alive
pub struct SessionController {
    transcriber: Arc<Transcriber>,

    subscriber: Arc<dyn Subscriber>,

    config: SessionConfig,

    /// Poller spawned by the last successful start.
    /// Holding this lock serializes concurrent starts.
    active: Mutex<Option<ActivePoller>>,

    /// Number of poller tasks still running
    live_pollers: Arc<AtomicUsize>,
}

impl SessionController {
    pub fn new(
        transcriber: Arc<Transcriber>,
        subscriber: Arc<dyn Subscriber>,
        config: SessionConfig,
    ) -> Self {
        Self {
            transcriber,
            subscriber,
            config,
            active: Mutex::new(None),
            live_pollers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn transcriber(&self) -> &Arc<Transcriber> {
        &self.transcriber
    }

    /// Load `path`, start playback and spawn a fresh position poller.
    ///
    /// Any poller from a previous start is cancelled and waited for before
    /// the player is touched. On failure no poller is left running.
    pub async fn start(&self, path: &str) -> Result<SessionHandle> {
        let source = MediaSource::parse(path)?;

        let mut active = self.active.lock().await;

        // Join barrier: the previous poller must be gone before we go on
        if let Some(previous) = active.take() {
            previous.cancel.cancel();
            Self::wait_for(previous).await;
        }

        info!("Starting recording: {}", source.uri);
        self.transcriber.set_recording(path).await;

        let player = self.transcriber.player();

        player
            .load_media(&source)
            .await
            .map_err(|e| Error::Load {
                uri: source.uri.clone(),
                source: e,
            })?;

        player.play().await.map_err(Error::Playback)?;

        let id = SessionId::new();
        let (cancel, cancel_rx) = CancelHandle::new();
        let poller = PositionPoller::new(
            id,
            player.clone(),
            Arc::clone(&self.subscriber),
            cancel_rx,
            self.config.poll_interval,
        )
        .spawn(&self.live_pollers);

        *active = Some(ActivePoller {
            id,
            cancel: cancel.clone(),
            poller,
        });

        info!("Session started: {}", id);
        Ok(SessionHandle { id, cancel })
    }

    /// Cancel the current poller, if any, and wait until it has exited
    pub async fn cancel(&self) {
        let mut active = self.active.lock().await;
        if let Some(current) = active.take() {
            info!("Cancelling session: {}", current.id);
            current.cancel.cancel();
            Self::wait_for(current).await;
        }
    }

    /// Wait for the current poller to finish on its own.
    ///
    /// Does not block a concurrent [`start`](Self::start), which will cancel it.
    pub async fn join(&self) {
        let done = {
            let active = self.active.lock().await;
            match active.as_ref() {
                Some(current) => current.poller.done.clone(),
                None => return,
            }
        };
        PollerTask::exited(done).await;
    }

    /// Stop the poller and the player. Meant for process teardown.
    pub async fn shutdown(&self) -> Result<()> {
        self.cancel().await;
        info!("Stopping player");
        self.transcriber
            .player()
            .stop()
            .await
            .map_err(Error::Playback)
    }

    /// Session of the most recent successful start
    pub async fn current_session(&self) -> Option<SessionId> {
        self.active.lock().await.as_ref().map(|a| a.id)
    }

    /// Number of position pollers currently running (never more than one)
    pub fn active_pollers(&self) -> usize {
        self.live_pollers.load(Ordering::SeqCst)
    }

    async fn wait_for(previous: ActivePoller) {
        if let Err(e) = previous.poller.task.await {
            error!("Position poller {} panicked: {}", previous.id, e);
        }
    }
}
