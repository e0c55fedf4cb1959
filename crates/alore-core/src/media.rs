//! Media element abstraction
//!
//! The controller never talks to a concrete decoder. Hosts hand it something
//! implementing [`MediaElement`]: a browser video element binding, a
//! GStreamer pipeline wrapper, or the [`SimulatedMedia`] used by the CLI and
//! the tests.

use crate::{types::TimeRange, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Events a media element reports to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaEvent {
    /// Playback started or resumed
    Play,
    /// Playback paused
    Pause,
    /// Current time advanced or jumped
    TimeUpdate,
    /// Playback stalled for lack of data
    Waiting,
    /// More media was buffered
    Progress,
}

impl std::fmt::Display for MediaEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaEvent::Play => write!(f, "play"),
            MediaEvent::Pause => write!(f, "pause"),
            MediaEvent::TimeUpdate => write!(f, "timeupdate"),
            MediaEvent::Waiting => write!(f, "waiting"),
            MediaEvent::Progress => write!(f, "progress"),
        }
    }
}

/// A playable media element
pub trait MediaElement: Send + Sync {
    /// Elapsed playback time in seconds
    fn current_time(&self) -> f64;

    /// Seek to a position in seconds
    fn set_current_time(&mut self, seconds: f64);

    /// Total duration in seconds. NaN while unknown.
    fn duration(&self) -> f64;

    /// True unless playback is running
    fn is_paused(&self) -> bool;

    /// Start or resume playback. Hosts may refuse, e.g. autoplay policies.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Buffered ranges in timeline order
    fn buffered(&self) -> Vec<TimeRange>;

    /// Currently loaded source
    fn source(&self) -> Option<String>;

    /// Replace the source. Position resets to zero and playback stops.
    fn set_source(&mut self, url: &str);

    /// Events raised since the last call, oldest first. Hosts that deliver
    /// events through callbacks leave this empty.
    fn take_events(&mut self) -> Vec<MediaEvent> {
        Vec::new()
    }
}

#[derive(Debug)]
struct SimulatedState {
    source: Option<String>,
    current_time: f64,
    duration: f64,
    paused: bool,
    buffered_end: f64,
    /// Seconds of media fetched per second of wall time
    download_rate: f64,
    refuse_play: bool,
    events: VecDeque<MediaEvent>,
}

/// Headless media element
///
/// Simulates a progressive download: the buffer grows by `download_rate`
/// seconds per second of [`advance`](Self::advance), playback consumes it in
/// real time and stalls (raising `waiting`) when it catches up. Clones share
/// the same element, so a host can keep a handle after giving one to the
/// controller.
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    inner: Arc<Mutex<SimulatedState>>,
}

impl SimulatedMedia {
    /// Create an element whose sources all report `duration` seconds
    pub fn new(duration: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimulatedState {
                source: None,
                current_time: 0.0,
                duration,
                paused: true,
                buffered_end: 0.0,
                download_rate: 4.0,
                refuse_play: false,
                events: VecDeque::new(),
            })),
        }
    }

    /// Set how fast the simulated buffer fills
    pub fn with_download_rate(self, rate: f64) -> Self {
        self.state().download_rate = rate.max(0.0);
        self
    }

    /// Make `play()` fail, as a browser blocking autoplay would
    pub fn set_refuse_play(&self, refuse: bool) {
        self.state().refuse_play = refuse;
    }

    fn state(&self) -> MutexGuard<'_, SimulatedState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Advance wall time by `seconds`, growing the buffer and, when playing,
    /// the current time
    pub fn advance(&self, seconds: f64) {
        if seconds <= 0.0 {
            return;
        }
        let mut state = self.state();
        if state.source.is_none() {
            return;
        }

        let duration = state.duration;
        if state.buffered_end < duration {
            state.buffered_end = (state.buffered_end + seconds * state.download_rate).min(duration);
            state.events.push_back(MediaEvent::Progress);
        }

        if state.paused {
            return;
        }

        let target = (state.current_time + seconds).min(duration);
        if target > state.buffered_end {
            state.current_time = state.buffered_end;
            state.events.push_back(MediaEvent::TimeUpdate);
            state.events.push_back(MediaEvent::Waiting);
        } else {
            state.current_time = target;
            state.events.push_back(MediaEvent::TimeUpdate);
        }

        if state.current_time >= duration {
            state.paused = true;
            state.events.push_back(MediaEvent::Pause);
        }
    }
}

impl MediaElement for SimulatedMedia {
    fn current_time(&self) -> f64 {
        self.state().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut state = self.state();
        let upper = if state.duration.is_finite() { state.duration } else { f64::MAX };
        state.current_time = if seconds.is_finite() { seconds.clamp(0.0, upper) } else { 0.0 };
        // Seeking past the buffer restarts the download from the new position
        if state.current_time > state.buffered_end {
            state.buffered_end = state.current_time;
        }
        state.events.push_back(MediaEvent::TimeUpdate);
    }

    fn duration(&self) -> f64 {
        let state = self.state();
        if state.source.is_some() {
            state.duration
        } else {
            f64::NAN
        }
    }

    fn is_paused(&self) -> bool {
        self.state().paused
    }

    fn play(&mut self) -> Result<()> {
        let mut state = self.state();
        if state.refuse_play {
            return Err(Error::playback("play() refused by host"));
        }
        if state.source.is_none() {
            return Err(Error::playback("no source loaded"));
        }
        if state.paused {
            state.paused = false;
            state.events.push_back(MediaEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state();
        if !state.paused {
            state.paused = true;
            state.events.push_back(MediaEvent::Pause);
        }
    }

    fn buffered(&self) -> Vec<TimeRange> {
        let state = self.state();
        if state.buffered_end > 0.0 {
            vec![TimeRange::new(0.0, state.buffered_end)]
        } else {
            Vec::new()
        }
    }

    fn source(&self) -> Option<String> {
        self.state().source.clone()
    }

    fn set_source(&mut self, url: &str) {
        let mut state = self.state();
        let was_playing = !state.paused;
        state.source = Some(url.to_string());
        state.current_time = 0.0;
        state.buffered_end = 0.0;
        state.paused = true;
        if was_playing {
            state.events.push_back(MediaEvent::Pause);
        }
    }

    fn take_events(&mut self) -> Vec<MediaEvent> {
        self.state().events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(duration: f64) -> SimulatedMedia {
        let mut media = SimulatedMedia::new(duration);
        media.set_source("https://cdn.example.com/a.mp4");
        media
    }

    #[test]
    fn test_duration_unknown_without_source() {
        let media = SimulatedMedia::new(120.0);
        assert!(media.duration().is_nan());
        assert!(media.buffered().is_empty());
    }

    #[test]
    fn test_play_requires_source() {
        let mut media = SimulatedMedia::new(120.0);
        assert!(media.play().is_err());
        assert!(media.is_paused());
    }

    #[test]
    fn test_advance_plays_through_buffer() {
        let mut media = loaded(120.0);
        media.play().unwrap();
        media.take_events();

        media.advance(2.0);
        assert_eq!(media.current_time(), 2.0);
        assert_eq!(media.buffered(), vec![TimeRange::new(0.0, 8.0)]);
        assert_eq!(
            media.take_events(),
            vec![MediaEvent::Progress, MediaEvent::TimeUpdate]
        );
    }

    #[test]
    fn test_stall_when_buffer_runs_dry() {
        let mut media = loaded(120.0).with_download_rate(0.5);
        media.play().unwrap();
        media.take_events();

        media.advance(2.0);
        assert_eq!(media.current_time(), 1.0);
        assert!(media.take_events().contains(&MediaEvent::Waiting));
    }

    #[test]
    fn test_pauses_at_end() {
        let mut media = loaded(3.0);
        media.play().unwrap();
        media.advance(5.0);
        assert_eq!(media.current_time(), 3.0);
        assert!(media.is_paused());
        assert_eq!(media.take_events().last(), Some(&MediaEvent::Pause));
    }

    #[test]
    fn test_set_source_resets_position() {
        let mut media = loaded(60.0);
        media.set_current_time(30.0);
        media.play().unwrap();
        media.set_source("https://cdn.example.com/b.mp4");
        assert_eq!(media.current_time(), 0.0);
        assert!(media.is_paused());
        assert_eq!(media.source().as_deref(), Some("https://cdn.example.com/b.mp4"));
    }

    #[test]
    fn test_clones_share_element() {
        let mut media = loaded(60.0);
        let handle = media.clone();
        media.set_current_time(12.0);
        assert_eq!(handle.current_time(), 12.0);
    }
}
