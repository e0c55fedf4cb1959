//! Idle cursor detection
//!
//! Controls and pointer stay visible while the viewer moves the pointer. After
//! a period without interaction the controls hide, but only while media is
//! playing: a paused player keeps its chrome on screen.

use crate::store::PlayerStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

/// Visibility of the player chrome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorState {
    /// Controls and cursor shown
    Active,
    /// Controls and cursor hidden
    Idle,
}

impl std::fmt::Display for CursorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CursorState::Active => write!(f, "active"),
            CursorState::Idle => write!(f, "idle"),
        }
    }
}

/// Inactivity countdown with at most one pending timer
pub struct IdleCursor {
    timeout: Duration,
    store: PlayerStore,
    state_tx: Arc<watch::Sender<CursorState>>,
    /// Bumped on every interaction; a countdown only fires for its own generation
    generation: Arc<AtomicU64>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl IdleCursor {
    /// Starts out hidden until the first interaction.
    pub fn new(timeout: Duration, store: PlayerStore) -> Self {
        let (state_tx, _) = watch::channel(CursorState::Idle);
        Self {
            timeout,
            store,
            state_tx: Arc::new(state_tx),
            generation: Arc::new(AtomicU64::new(0)),
            timer: Mutex::new(None),
        }
    }

    pub fn state(&self) -> CursorState {
        *self.state_tx.borrow()
    }

    pub fn controls_visible(&self) -> bool {
        self.state() == CursorState::Active
    }

    /// Subscribe to visibility changes
    pub fn subscribe(&self) -> watch::Receiver<CursorState> {
        self.state_tx.subscribe()
    }

    /// Pointer moved: show controls and restart the countdown
    pub async fn interact(&self) {
        let mut timer = self.timer.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(pending) = timer.take() {
            pending.abort();
        }

        // Published after the bump, so a stale countdown can no longer hide
        self.set_state(CursorState::Active);

        let current = self.generation.clone();
        let state_tx = self.state_tx.clone();
        let store = self.store.clone();
        let timeout = self.timeout;

        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            if !store.state().playing {
                debug!("Playback paused, keeping controls visible");
                return;
            }
            if hide_if_current(&state_tx, &current, generation) {
                debug!("Pointer idle, hiding controls");
            }
        }));
    }

    /// Drop any pending countdown without changing visibility
    pub async fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(pending) = self.timer.lock().await.take() {
            pending.abort();
        }
    }

    /// True while a countdown is running
    pub async fn is_counting_down(&self) -> bool {
        self.timer
            .lock()
            .await
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    fn set_state(&self, next: CursorState) {
        let changed = self.state_tx.send_if_modified(|state| {
            let changed = *state != next;
            *state = next;
            changed
        });
        if changed {
            debug!(state = %next, "Cursor state changed");
        }
    }
}

/// Hide the controls if no interaction happened since `generation` was taken.
///
/// The check runs under the channel's write lock, so it cannot interleave
/// with an interaction publishing `Active`.
fn hide_if_current(
    state_tx: &watch::Sender<CursorState>,
    current: &AtomicU64,
    generation: u64,
) -> bool {
    state_tx.send_if_modified(|state| {
        if current.load(Ordering::SeqCst) != generation || *state == CursorState::Idle {
            return false;
        }
        *state = CursorState::Idle;
        true
    })
}

impl Drop for IdleCursor {
    fn drop(&mut self) {
        if let Some(pending) = self.timer.get_mut().take() {
            pending.abort();
        }
    }
}
