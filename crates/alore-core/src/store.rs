//! Playback state store
//!
//! The single source of truth for what the UI shows about playback. State is
//! mutated only by the controller dispatching [`PlayerAction`]s; readers
//! either take a snapshot or subscribe to a watch channel and get woken on
//! every change.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Snapshot of playback state as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Media is playing
    pub playing: bool,
    /// Elapsed time over duration, in [0, 1]
    pub progress: f64,
    /// End of the last buffered range over duration, in [0, 1]
    pub buffered: f64,
    /// Playback is stalled waiting for data
    pub waiting: bool,
    /// Player container is fullscreen
    pub fullscreen: bool,
}

/// Store update messages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum PlayerAction {
    SetPlaying(bool),
    SetProgress(f64),
    SetBuffer(f64),
    SetWaiting(bool),
    SetFullscreen(bool),
    /// Back to the initial state
    Reset,
}

impl PlaybackState {
    /// Apply an action, returning true if anything changed
    pub fn apply(&mut self, action: PlayerAction) -> bool {
        let before = *self;
        match action {
            PlayerAction::SetPlaying(playing) => self.playing = playing,
            PlayerAction::SetProgress(progress) => self.progress = clamp_fraction(progress),
            PlayerAction::SetBuffer(buffered) => self.buffered = clamp_fraction(buffered),
            PlayerAction::SetWaiting(waiting) => self.waiting = waiting,
            PlayerAction::SetFullscreen(fullscreen) => self.fullscreen = fullscreen,
            PlayerAction::Reset => *self = PlaybackState::default(),
        }
        *self != before
    }
}

/// Fractions outside [0, 1] are clamped; NaN and infinities count as zero.
pub(crate) fn clamp_fraction(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Shared handle to the playback state
///
/// Cloning the store yields another handle to the same state. Hosts can
/// read and subscribe but not write:
///
/// ```compile_fail
/// use alore_core::{PlayerAction, PlayerStore};
///
/// PlayerStore::new().dispatch(PlayerAction::SetProgress(0.9));
/// ```
#[derive(Debug, Clone)]
pub struct PlayerStore {
    tx: Arc<watch::Sender<PlaybackState>>,
}

impl PlayerStore {
    /// Create a store in the initial state
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PlaybackState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Apply an action. Subscribers are notified only if the state changed.
    ///
    /// Only the controller and its collaborators dispatch; hosts observe the
    /// store through [`state`](Self::state) and [`subscribe`](Self::subscribe).
    pub(crate) fn dispatch(&self, action: PlayerAction) {
        let changed = self.tx.send_if_modified(|state| state.apply(action));
        if changed {
            debug!(?action, "Player state updated");
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> PlaybackState {
        *self.tx.borrow()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.tx.subscribe()
    }
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_clamps_fractions() {
        let mut state = PlaybackState::default();
        state.apply(PlayerAction::SetProgress(1.4));
        assert_eq!(state.progress, 1.0);
        state.apply(PlayerAction::SetBuffer(-0.2));
        assert_eq!(state.buffered, 0.0);
        state.apply(PlayerAction::SetProgress(f64::NAN));
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn test_apply_reports_change() {
        let mut state = PlaybackState::default();
        assert!(state.apply(PlayerAction::SetPlaying(true)));
        assert!(!state.apply(PlayerAction::SetPlaying(true)));
    }

    #[test]
    fn test_reset() {
        let store = PlayerStore::new();
        store.dispatch(PlayerAction::SetPlaying(true));
        store.dispatch(PlayerAction::SetFullscreen(true));
        store.dispatch(PlayerAction::SetProgress(0.5));
        store.dispatch(PlayerAction::Reset);
        assert_eq!(store.state(), PlaybackState::default());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = PlayerStore::new();
        let mut rx = store.subscribe();

        store.dispatch(PlayerAction::SetWaiting(true));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().waiting);

        // No-op dispatch does not wake subscribers
        store.dispatch(PlayerAction::SetWaiting(true));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_clones_share_state() {
        let store = PlayerStore::new();
        let other = store.clone();
        other.dispatch(PlayerAction::SetBuffer(0.25));
        assert_eq!(store.state().buffered, 0.25);
    }

    #[test]
    fn test_action_wire_format() {
        let json = serde_json::to_string(&PlayerAction::SetProgress(0.5)).unwrap();
        assert_eq!(json, r#"{"action":"set_progress","value":0.5}"#);
    }
}
