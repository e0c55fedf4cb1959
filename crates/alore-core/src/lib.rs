//! Alore Core - Player Controller Library for Alore
//!
//! This crate provides the playback coordination layer of the Alore player:
//! - Playback state store with message-style updates
//! - Media element abstraction and a headless simulation
//! - Idle cursor detection for auto-hiding controls
//! - Live video feed over server-sent events
//! - Watch progress persistence
//! - Prompt side channel
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Alore Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │  Video Feed  │  │    Media     │  │  Watchlist   │           │
//! │  │    (SSE)     │  │   Element    │  │              │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │   Player    │                              │
//! │                    │ Controller  │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │ Idle Cursor  │  │   Player    │  │    Prompt    │            │
//! │  │              │  │    Store    │  │     Sink     │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod timecode;
pub mod store;
pub mod media;
pub mod fullscreen;
pub mod watchlist;
pub mod idle;
pub mod feed;
pub mod prompt;
pub mod controller;

pub use error::{Error, Result};
pub use types::*;
pub use timecode::{convert_to_time_code, DEFAULT_TIMESTAMP};
pub use store::{PlaybackState, PlayerAction, PlayerStore};
pub use media::{MediaElement, MediaEvent, SimulatedMedia};
pub use fullscreen::{handle_fullscreen, FullscreenSurface, HeadlessSurface};
pub use watchlist::{JsonFileWatchlist, MemoryWatchlist, Watchlist};
pub use idle::{CursorState, IdleCursor};
pub use feed::{ChannelFeed, SseDecoder, SseEvent, SseVideoFeed, VideoFeed, VideoUpdate};
pub use prompt::{HttpPromptClient, Key, PromptField, PromptSink};
pub use controller::{Lifecycle, PlayerController};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Alore Core initialized");
}
