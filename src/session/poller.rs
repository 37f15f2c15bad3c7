use super::events::{SessionId, Subscriber};
use crate::error::Error;
use crate::player::{PlayerState, SharedPlayer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Requests cancellation of one position poller
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub(crate) fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Ask the poller to stop at its next check. Does not wait.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Convert an elapsed fraction into a slider percentage
pub(crate) fn to_percent(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Held by the poller task for its whole life. Dropping it decrements the
/// live count and closes the completion channel, on every exit path.
struct ActiveGuard {
    count: Arc<AtomicUsize>,
    _done: watch::Sender<()>,
}

impl ActiveGuard {
    fn acquire(count: &Arc<AtomicUsize>) -> (Self, watch::Receiver<()>) {
        count.fetch_add(1, Ordering::SeqCst);
        let (done, done_rx) = watch::channel(());
        let guard = Self {
            count: Arc::clone(count),
            _done: done,
        };
        (guard, done_rx)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A spawned poller
pub(crate) struct PollerTask {
    pub(crate) task: JoinHandle<()>,
    /// Closed when the poller exits
    pub(crate) done: watch::Receiver<()>,
}

impl PollerTask {
    /// Wait for the poller to exit without consuming the task
    pub(crate) async fn exited(mut done: watch::Receiver<()>) {
        while done.changed().await.is_ok() {}
    }
}

enum Exit {
    Cancelled,
    Finished(Option<Error>),
}

/// Background task sampling the player until cancelled or the recording ends
pub(crate) struct PositionPoller {
    session: SessionId,
    player: SharedPlayer,
    subscriber: Arc<dyn Subscriber>,
    cancel: watch::Receiver<bool>,
    interval: Duration,
}

impl PositionPoller {
    pub(crate) fn new(
        session: SessionId,
        player: SharedPlayer,
        subscriber: Arc<dyn Subscriber>,
        cancel: watch::Receiver<bool>,
        interval: Duration,
    ) -> Self {
        Self {
            session,
            player,
            subscriber,
            cancel,
            interval,
        }
    }

    /// Spawn the poller. Its completion is signalled exactly once, when the loop exits.
    pub(crate) fn spawn(self, active: &Arc<AtomicUsize>) -> PollerTask {
        let (guard, done) = ActiveGuard::acquire(active);
        let task = tokio::spawn(async move {
            let _guard = guard;
            self.run().await;
        });
        PollerTask { task, done }
    }

    async fn run(mut self) {
        info!("Position poller started: {}", self.session);

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let exit = match self.wait_for_length(&mut ticker).await {
            Some(length_ms) => {
                self.subscriber.on_length_known(self.session, length_ms);
                self.sample(&mut ticker).await
            }
            None => Exit::Cancelled,
        };

        match exit {
            Exit::Cancelled => info!("Position poller cancelled: {}", self.session),
            Exit::Finished(None) => {
                info!("Recording finished: {}", self.session);
                self.subscriber.on_terminated(self.session, None);
            }
            Exit::Finished(Some(e)) => {
                error!("Position poller stopped: {}: {}", self.session, e);
                self.subscriber.on_terminated(self.session, Some(&e));
            }
        }
    }

    fn cancelled(&self) -> bool {
        // A dropped sender counts as cancellation so no poller is orphaned
        let requested = *self.cancel.borrow();
        requested || self.cancel.has_changed().is_err()
    }

    /// Wait for the next tick. Returns false once cancellation was requested.
    async fn next_tick(&mut self, ticker: &mut Interval) -> bool {
        if self.cancelled() {
            return false;
        }

        tokio::select! {
            biased;
            _ = self.cancel.changed() => {}
            _ = ticker.tick() => {}
        }

        !self.cancelled()
    }

    /// Poll until the player knows the total length. `None` if cancelled first.
    async fn wait_for_length(&mut self, ticker: &mut Interval) -> Option<i64> {
        while self.next_tick(ticker).await {
            match self.player.total_length().await {
                Ok(ms) if ms > 0 => return Some(ms),
                Ok(_) => {}
                Err(e) => debug!("Length not available yet: {}", e),
            }
        }
        None
    }

    async fn sample(&mut self, ticker: &mut Interval) -> Exit {
        while self.next_tick(ticker).await {
            let state = match self.player.state().await {
                Ok(state) => state,
                Err(e) => return Exit::Finished(Some(Error::query("state")(e))),
            };

            match state {
                PlayerState::Ended => return Exit::Finished(None),
                PlayerState::Error => return Exit::Finished(Some(Error::PlayerFault)),
                s if !s.is_active() => continue,
                _ => {}
            }

            let fraction = match self.player.position().await {
                Ok(fraction) => fraction,
                Err(e) => return Exit::Finished(Some(Error::query("position")(e))),
            };

            self.subscriber.on_sample(self.session, to_percent(fraction));
        }
        Exit::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_conversion() {
        assert_eq!(to_percent(0.0), 0);
        assert_eq!(to_percent(0.37), 37);
        assert_eq!(to_percent(0.29), 29);
        assert_eq!(to_percent(1.0), 100);
    }

    #[test]
    fn test_percent_clamps_out_of_range() {
        assert_eq!(to_percent(-0.5), 0);
        assert_eq!(to_percent(1.7), 100);
        assert_eq!(to_percent(f64::NAN), 0);
    }

    #[test]
    fn test_cancel_handle_clones_share_signal() {
        let (handle, rx) = CancelHandle::new();
        let other = handle.clone();

        other.cancel();

        assert!(handle.is_cancelled());
        assert!(*rx.borrow());
    }
}
