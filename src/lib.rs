pub mod config;
pub mod error;
pub mod player;
pub mod session;
pub mod transcriber;

pub use config::Config;
pub use error::{Error, PlayerError, Result};
pub use player::{ClockPlayer, LoadMode, MediaSource, PlayerHandle, PlayerState, SharedPlayer};
pub use session::{
    format_clock, CancelHandle, ChannelSubscriber, PlaybackEvent, SessionConfig, SessionController,
    SessionHandle, SessionId, Subscriber,
};
pub use transcriber::Transcriber;
