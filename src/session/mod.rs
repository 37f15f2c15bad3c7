//! Playback session management
//!
//! This module provides the `SessionController` that manages:
//! - Loading and starting a recording on the shared player
//! - The background position poller feeding a `Subscriber`
//! - The join barrier guaranteeing a single live poller across restarts

mod config;
mod events;
mod poller;
mod session;

pub use config::SessionConfig;
pub use events::{format_clock, ChannelSubscriber, PlaybackEvent, SessionId, Subscriber};
pub use poller::CancelHandle;
pub use session::{SessionController, SessionHandle};
