//! Player Controller - Main orchestrator for a single show
//!
//! Coordinates:
//! - Resume position on start, progress persistence on stop/unload
//! - Media element events to store updates
//! - Idle cursor countdown
//! - Live video feed subscription
//! - Prompt submissions

use crate::{
    feed::{SseVideoFeed, VideoFeed, VideoUpdate},
    fullscreen::{handle_fullscreen, FullscreenSurface},
    idle::{CursorState, IdleCursor},
    media::{MediaElement, MediaEvent},
    prompt::{HttpPromptClient, Key, PromptField, PromptSink},
    store::{clamp_fraction, PlayerAction, PlayerStore},
    timecode::{convert_to_time_code, DEFAULT_TIMESTAMP},
    types::{PlayerConfig, SessionId, Show},
    watchlist::Watchlist,
    Result,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

type SharedMedia = Arc<RwLock<Option<Box<dyn MediaElement>>>>;

/// Controller lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Constructed, not yet started
    Created,
    /// Feed subscribed, playback requested
    Started,
    /// Torn down; cannot be restarted
    Stopped,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Created => write!(f, "created"),
            Lifecycle::Started => write!(f, "started"),
            Lifecycle::Stopped => write!(f, "stopped"),
        }
    }
}

struct LifecycleState {
    phase: Lifecycle,
    feed_task: Option<JoinHandle<()>>,
    playing_task: Option<JoinHandle<()>>,
}

/// Player controller for one show
pub struct PlayerController {
    /// Unique session ID
    id: SessionId,
    /// Controller configuration
    config: PlayerConfig,
    /// Show being played
    show: Show,
    /// The one media element, if attached
    media: SharedMedia,
    /// Playback state store
    store: PlayerStore,
    /// Resume positions
    watchlist: Arc<dyn Watchlist>,
    /// Live video updates
    feed: Arc<dyn VideoFeed>,
    /// Prompt destination
    prompt_sink: Arc<dyn PromptSink>,
    /// Controls visibility
    idle: Arc<IdleCursor>,
    /// Prompt field text
    prompt: RwLock<PromptField>,
    /// Phase and background tasks
    lifecycle: Mutex<LifecycleState>,
}

impl PlayerController {
    /// Create a controller using the SSE feed and HTTP prompt endpoint from
    /// `config`
    pub fn new(
        config: PlayerConfig,
        show: Show,
        store: PlayerStore,
        watchlist: Arc<dyn Watchlist>,
    ) -> Result<Self> {
        config.validate()?;

        let feed = SseVideoFeed::new(config.stream_url.clone(), config.request_timeout())?;
        let prompt_sink = HttpPromptClient::new(config.prompt_url.clone(), config.request_timeout())?;
        let idle = IdleCursor::new(config.idle_timeout(), store.clone());

        Ok(Self {
            id: SessionId::new(),
            config,
            show,
            media: Arc::new(RwLock::new(None)),
            store,
            watchlist,
            feed: Arc::new(feed),
            prompt_sink: Arc::new(prompt_sink),
            idle: Arc::new(idle),
            prompt: RwLock::new(PromptField::new()),
            lifecycle: Mutex::new(LifecycleState {
                phase: Lifecycle::Created,
                feed_task: None,
                playing_task: None,
            }),
        })
    }

    /// Replace the video feed
    pub fn with_feed(mut self, feed: Arc<dyn VideoFeed>) -> Self {
        self.feed = feed;
        self
    }

    /// Replace the prompt destination
    pub fn with_prompt_sink(mut self, sink: Arc<dyn PromptSink>) -> Self {
        self.prompt_sink = sink;
        self
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn show(&self) -> &Show {
        &self.show
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Store the controller dispatches to
    pub fn store(&self) -> &PlayerStore {
        &self.store
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.lock().await.phase
    }

    // =========================================================================
    // Media element
    // =========================================================================

    /// Attach the media element, replacing any previous one
    pub async fn attach_media(&self, media: Box<dyn MediaElement>) {
        *self.media.write().await = Some(media);
        debug!(session = %self.id, "Media element attached");
    }

    /// Detach and return the media element
    pub async fn detach_media(&self) -> Option<Box<dyn MediaElement>> {
        let media = self.media.write().await.take();
        debug!(session = %self.id, attached = media.is_some(), "Media element detached");
        media
    }

    pub async fn has_media(&self) -> bool {
        self.media.read().await.is_some()
    }

    /// Run `f` against the media element, if one is attached
    pub async fn inspect_media<R>(&self, f: impl FnOnce(&dyn MediaElement) -> R) -> Option<R> {
        let media = self.media.read().await;
        media.as_deref().map(f)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Resume the show and subscribe to the video feed.
    ///
    /// Without a media element this only logs a warning; attach one and call
    /// again. Starting twice, or after stopping, does nothing.
    #[instrument(skip(self), fields(session = %self.id, show = %self.show.id))]
    pub async fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.phase != Lifecycle::Created {
            debug!(phase = %lifecycle.phase, "Start ignored");
            return Ok(());
        }
        if !self.has_media().await {
            warn!("No media element attached, start deferred");
            return Ok(());
        }

        let resume = self.watchlist.show_progress(&self.show.id).await;
        {
            let mut media = self.media.write().await;
            if let Some(media) = media.as_deref_mut() {
                // Seek before play
                if let Some(seconds) = resume.filter(|s| *s > 0.0) {
                    info!(seconds, "Resuming from saved position");
                    media.set_current_time(seconds);
                }
                if media.is_paused() {
                    if let Err(e) = media.play() {
                        warn!(error = %e, code = e.error_code(), "Initial play failed");
                    }
                }
            }
        }

        lifecycle.feed_task = Some(self.spawn_feed());
        lifecycle.playing_task = Some(self.spawn_playing_watch());
        lifecycle.phase = Lifecycle::Started;
        drop(lifecycle);

        self.idle.interact().await;

        info!(title = %self.show.title, "Player started");
        Ok(())
    }

    /// Save progress, close the feed and reset the store. Idempotent.
    pub async fn stop(&self) {
        self.shutdown("stop").await;
    }

    /// Page is going away: same teardown as [`stop`](Self::stop), and
    /// whichever runs first is the only one that saves progress.
    pub async fn before_unload(&self) {
        self.shutdown("unload").await;
    }

    #[instrument(skip(self), fields(session = %self.id, show = %self.show.id))]
    async fn shutdown(&self, reason: &'static str) {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.phase == Lifecycle::Stopped {
            return;
        }
        lifecycle.phase = Lifecycle::Stopped;

        self.save_progress().await;

        if let Some(task) = lifecycle.feed_task.take() {
            task.abort();
            let _ = task.await;
            info!("Video feed subscription closed");
        }
        if let Some(task) = lifecycle.playing_task.take() {
            task.abort();
            let _ = task.await;
        }

        self.idle.cancel().await;
        self.store.dispatch(PlayerAction::Reset);

        info!(reason, "Player stopped");
    }

    async fn save_progress(&self) {
        let Some(seconds) = self.inspect_media(|media| media.current_time()).await else {
            debug!("No media element, nothing to save");
            return;
        };

        match self.watchlist.add_progress(&self.show, seconds).await {
            Ok(()) => info!(seconds, "Progress saved"),
            Err(e) => warn!(error = %e, code = e.error_code(), "Failed to save progress"),
        }
    }

    fn spawn_feed(&self) -> JoinHandle<()> {
        let feed = self.feed.clone();
        let media = self.media.clone();
        let session = self.id;

        tokio::spawn(async move {
            let mut updates = match feed.subscribe().await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(%session, error = %e, code = e.error_code(), "Video feed unavailable");
                    return;
                }
            };

            while let Some(update) = updates.next().await {
                match update {
                    Ok(update) => apply_video_update(&media, &update).await,
                    Err(e) => {
                        warn!(%session, error = %e, code = e.error_code(), "Video feed message dropped")
                    }
                }
            }

            info!(%session, "Video feed ended");
        })
    }

    /// Re-arm the idle countdown whenever playback starts or stops
    fn spawn_playing_watch(&self) -> JoinHandle<()> {
        let mut rx = self.store.subscribe();
        let mut playing = rx.borrow_and_update().playing;
        let idle = self.idle.clone();

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let now = rx.borrow_and_update().playing;
                if now != playing {
                    playing = now;
                    idle.interact().await;
                }
            }
        })
    }

    // =========================================================================
    // Idle cursor
    // =========================================================================

    /// Pointer moved over the player
    pub async fn interact(&self) {
        self.idle.interact().await;
    }

    pub fn controls_active(&self) -> bool {
        self.idle.controls_visible()
    }

    pub fn cursor_state(&self) -> CursorState {
        self.idle.state()
    }

    /// Subscribe to controls visibility
    pub fn subscribe_controls(&self) -> watch::Receiver<CursorState> {
        self.idle.subscribe()
    }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Plays if paused, else pauses
    pub async fn toggle_play(&self) {
        let mut media = self.media.write().await;
        let Some(media) = media.as_deref_mut() else {
            return;
        };

        if media.is_paused() {
            if let Err(e) = media.play() {
                warn!(session = %self.id, error = %e, "Play failed");
            }
        } else {
            media.pause();
        }
    }

    /// Opens `container` fullscreen if windowed, else leaves fullscreen
    pub fn toggle_fullscreen(&self, container: Option<&mut dyn FullscreenSurface>) {
        let Some(container) = container else {
            return;
        };

        match handle_fullscreen(container) {
            Ok(fullscreen) => self.store.dispatch(PlayerAction::SetFullscreen(fullscreen)),
            Err(e) => warn!(session = %self.id, error = %e, "Fullscreen toggle failed"),
        }
    }

    /// Seek to a fraction of the duration
    pub async fn jump_to_abs(&self, abs: f64) {
        let mut media = self.media.write().await;
        let Some(media) = media.as_deref_mut() else {
            return;
        };

        let duration = media.duration();
        if !(duration.is_finite() && duration > 0.0) {
            debug!(session = %self.id, "Duration unknown, seek ignored");
            return;
        }
        media.set_current_time(duration * clamp_fraction(abs));
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Elapsed time as a time code
    pub async fn current_time_stamp(&self) -> String {
        self.inspect_media(|media| convert_to_time_code(media.current_time()))
            .await
            .unwrap_or_else(|| DEFAULT_TIMESTAMP.to_string())
    }

    /// Remaining time as a time code
    pub async fn missing_time_stamp(&self) -> String {
        self.inspect_media(|media| convert_to_time_code(media.duration() - media.current_time()))
            .await
            .unwrap_or_else(|| DEFAULT_TIMESTAMP.to_string())
    }

    /// Time code at a fraction of the duration
    pub async fn time_stamp_from_abs(&self, abs: f64) -> String {
        self.inspect_media(|media| convert_to_time_code(media.duration() * abs))
            .await
            .unwrap_or_else(|| DEFAULT_TIMESTAMP.to_string())
    }

    /// Elapsed fraction, 0 without media or duration
    pub async fn progress(&self) -> f64 {
        self.inspect_media(progress_of).await.unwrap_or(0.0)
    }

    /// Buffered fraction, 0 without media or duration
    pub async fn buffered(&self) -> f64 {
        self.inspect_media(buffered_of).await.unwrap_or(0.0)
    }

    // =========================================================================
    // Media events
    // =========================================================================

    /// Bridge a media element event into the store.
    ///
    /// Values are read from the element when the event is handled; the play
    /// state comes from the element's paused flag, not from the event kind.
    pub async fn handle_media_event(&self, event: MediaEvent) {
        if event == MediaEvent::Waiting {
            self.store.dispatch(PlayerAction::SetWaiting(true));
            return;
        }

        let media = self.media.read().await;
        let Some(media) = media.as_deref() else {
            return;
        };

        match event {
            MediaEvent::Play | MediaEvent::Pause => {
                self.store.dispatch(PlayerAction::SetPlaying(!media.is_paused()));
            }
            MediaEvent::TimeUpdate => {
                self.store.dispatch(PlayerAction::SetProgress(progress_of(media)));
                self.store.dispatch(PlayerAction::SetWaiting(false));
            }
            MediaEvent::Progress => {
                self.store.dispatch(PlayerAction::SetBuffer(buffered_of(media)));
            }
            MediaEvent::Waiting => {}
        }
    }

    /// Drain and bridge events queued by the media element.
    ///
    /// Returns how many events were handled.
    pub async fn pump_media_events(&self) -> usize {
        let events = match self.media.write().await.as_deref_mut() {
            Some(media) => media.take_events(),
            None => return 0,
        };

        let count = events.len();
        for event in events {
            self.handle_media_event(event).await;
        }
        count
    }

    // =========================================================================
    // Prompt
    // =========================================================================

    pub async fn prompt_value(&self) -> String {
        self.prompt.read().await.value().to_string()
    }

    pub async fn set_prompt_value(&self, value: impl Into<String>) {
        self.prompt.write().await.set_value(value);
    }

    /// Key pressed in the prompt field. Enter submits the current text and
    /// returns the submission task.
    pub async fn prompt_key_press(&self, key: Key) -> Option<JoinHandle<()>> {
        let text = self.prompt.read().await.on_key(key)?;
        Some(self.submit_prompt(text))
    }

    /// Send a prompt in the background. Failures are logged, never retried.
    pub fn submit_prompt(&self, text: String) -> JoinHandle<()> {
        let sink = self.prompt_sink.clone();
        let session = self.id;

        tokio::spawn(async move {
            if let Err(e) = sink.send_prompt(&text).await {
                error!(%session, error = %e, code = e.error_code(), "Prompt submission failed");
            }
        })
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        let lifecycle = self.lifecycle.get_mut();
        for task in [lifecycle.feed_task.take(), lifecycle.playing_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

async fn apply_video_update(media: &SharedMedia, update: &VideoUpdate) {
    let mut media = media.write().await;
    let Some(media) = media.as_deref_mut() else {
        debug!(url = %update.video_url, "No media element, video update dropped");
        return;
    };

    media.set_source(&update.video_url);
    if let Err(e) = media.play() {
        warn!(url = %update.video_url, error = %e, "Play after source switch failed");
    }
    info!(url = %update.video_url, "Video source switched");
}

fn ratio(value: f64, duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        clamp_fraction(value / duration)
    } else {
        0.0
    }
}

fn progress_of(media: &dyn MediaElement) -> f64 {
    ratio(media.current_time(), media.duration())
}

fn buffered_of(media: &dyn MediaElement) -> f64 {
    media
        .buffered()
        .last()
        .map(|range| ratio(range.end, media.duration()))
        .unwrap_or(0.0)
}
