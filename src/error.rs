use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a media engine behind a [`PlayerHandle`](crate::player::PlayerHandle).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// A query or command needs media but nothing is loaded
    #[error("no media loaded")]
    NoMedia,

    /// The source could not be opened or decoded
    #[error("cannot open {uri}: {reason}")]
    Open { uri: String, reason: String },

    /// The engine reported a raw state code it does not document
    #[error("unknown player state code {0}")]
    UnknownState(i32),

    /// Any other engine-side failure
    #[error("{0}")]
    Engine(String),
}

/// Error taxonomy of the playback core.
#[derive(Debug, Error)]
pub enum Error {
    /// Empty or otherwise unusable recording path, rejected before any player call
    #[error("invalid recording path: {0:?}")]
    InvalidPath(String),

    /// The player could not load the recording
    #[error("failed to load {uri}")]
    Load {
        uri: String,
        #[source]
        source: PlayerError,
    },

    /// The player refused to start playback
    #[error("failed to start playback")]
    Playback(#[source] PlayerError),

    /// A state, position, length or time query failed
    #[error("failed to read player {what}")]
    Query {
        what: &'static str,
        #[source]
        source: PlayerError,
    },

    /// A seek request was rejected by the player
    #[error("failed to seek to {target_ms}ms")]
    Seek {
        target_ms: i64,
        #[source]
        source: PlayerError,
    },

    /// The player moved into its error state while a recording was playing
    #[error("player reported an error state")]
    PlayerFault,
}

impl Error {
    pub(crate) fn query(what: &'static str) -> impl FnOnce(PlayerError) -> Self {
        move |source| Self::Query { what, source }
    }
}
