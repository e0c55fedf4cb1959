//! Core types for Alore Player

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Unique identifier for a controller session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a show in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowId(pub String);

impl ShowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShowId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A show being played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    /// Catalogue identifier
    pub id: ShowId,
    /// Human-readable title
    pub title: String,
}

impl Show {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ShowId::new(id),
            title: title.into(),
        }
    }
}

/// Saved resume position for a show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowProgress {
    /// Show the position belongs to
    pub show_id: ShowId,
    /// Title at the time of saving
    #[serde(default)]
    pub title: String,
    /// Elapsed seconds to resume from
    pub resume_seconds: f64,
    /// When the position was recorded
    pub updated_at: DateTime<Utc>,
}

/// A contiguous buffered span of the media timeline, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Server-sent event stream delivering `{videoUrl}` messages
    pub stream_url: Url,
    /// Endpoint receiving `{prompt}` submissions
    pub prompt_url: Url,
    /// Pointer inactivity before controls hide (milliseconds)
    pub idle_timeout_ms: u64,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            stream_url: Url::parse("http://127.0.0.1:8000/stream").expect("static url"),
            prompt_url: Url::parse("http://127.0.0.1:8000/prompt").expect("static url"),
            idle_timeout_ms: 3000,
            request_timeout_ms: 10000,
        }
    }
}

impl PlayerConfig {
    /// Parse configuration from a JSON document; missing keys take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_ms == 0 {
            return Err(Error::InvalidConfig("idle_timeout_ms must be positive".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("request_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
