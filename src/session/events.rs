use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identifies one start of a recording (one position poller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receives notifications from the position poller.
///
/// Callbacks run on the poller task; implementations that touch shared
/// UI state must synchronize on their own.
pub trait Subscriber: Send + Sync {
    /// Total length became known (emitted once per session)
    fn on_length_known(&self, session: SessionId, length_ms: i64);

    /// Playback position as a percentage in `[0, 100]`
    fn on_sample(&self, session: SessionId, percent: u8);

    /// The poller stopped on its own; `None` means the recording ended normally
    fn on_terminated(&self, session: SessionId, error: Option<&Error>);
}

/// Owned form of the subscriber callbacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    LengthKnown { session: SessionId, length_ms: i64 },
    Sample { session: SessionId, percent: u8 },
    Terminated { session: SessionId, error: Option<String> },
}

impl PlaybackEvent {
    pub fn session(&self) -> SessionId {
        match self {
            Self::LengthKnown { session, .. }
            | Self::Sample { session, .. }
            | Self::Terminated { session, .. } => *session,
        }
    }
}

/// Forwards callbacks into an unbounded channel
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl ChannelSubscriber {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: PlaybackEvent) {
        // Receiver gone means nobody is listening anymore
        let _ = self.tx.send(event);
    }
}

impl Subscriber for ChannelSubscriber {
    fn on_length_known(&self, session: SessionId, length_ms: i64) {
        self.send(PlaybackEvent::LengthKnown { session, length_ms });
    }

    fn on_sample(&self, session: SessionId, percent: u8) {
        self.send(PlaybackEvent::Sample { session, percent });
    }

    fn on_terminated(&self, session: SessionId, error: Option<&Error>) {
        self.send(PlaybackEvent::Terminated {
            session,
            error: error.map(|e| e.to_string()),
        });
    }
}

/// Render milliseconds as `m:ss`
pub fn format_clock(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}
