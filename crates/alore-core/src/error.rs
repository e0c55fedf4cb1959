//! Error types for Alore Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Media element errors
    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("Fullscreen request denied: {0}")]
    Fullscreen(String),

    // Video feed errors
    #[error("Failed to connect to video feed: {url}")]
    FeedConnect { url: String, source: reqwest::Error },

    #[error("Video feed returned HTTP {status}: {url}")]
    FeedStatus { url: String, status: u16 },

    #[error("Malformed video feed message: {0}")]
    FeedDecode(String),

    #[error("Video feed unavailable: {0}")]
    FeedUnavailable(String),

    // Prompt errors
    #[error("Prompt endpoint returned HTTP {status}")]
    PromptRejected { status: u16 },

    // Watchlist errors
    #[error("Invalid progress value: {seconds}")]
    InvalidProgress { seconds: f64 },

    #[error("Watchlist persistence failed: {0}")]
    Watchlist(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Error::Playback(msg.into())
    }

    /// Returns true if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FeedConnect { .. }
                | Error::FeedDecode(_)
                | Error::PromptRejected { .. }
                | Error::Playback(_)
                | Error::Network(_)
        )
    }

    /// Returns the error code for log correlation
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Playback(_) => "PLAYBACK",
            Error::Fullscreen(_) => "FULLSCREEN",
            Error::FeedConnect { .. } => "FEED_CONNECT",
            Error::FeedStatus { .. } => "FEED_STATUS",
            Error::FeedDecode(_) => "FEED_DECODE",
            Error::FeedUnavailable(_) => "FEED_UNAVAILABLE",
            Error::PromptRejected { .. } => "PROMPT_REJECTED",
            Error::InvalidProgress { .. } => "INVALID_PROGRESS",
            Error::Watchlist(_) => "WATCHLIST",
            Error::Network(_) => "NETWORK",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}
