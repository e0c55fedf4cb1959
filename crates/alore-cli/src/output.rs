//! Output formatting for CLI

use alore_core::ShowProgress;
use serde::Serialize;
use std::fmt;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Render a record in the selected format, one line per record
pub fn format_output<T: Serialize + fmt::Display>(data: &T, format: &str) -> String {
    match OutputFormat::from(format) {
        OutputFormat::Json => serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Text => data.to_string(),
    }
}

/// One tick of a playback session
#[derive(Debug, Serialize)]
pub struct StatusLine {
    pub elapsed: String,
    pub remaining: String,
    pub progress: f64,
    pub buffered: f64,
    pub playing: bool,
    pub waiting: bool,
    pub controls: bool,
    pub source: Option<String>,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match (self.playing, self.waiting) {
            (_, true) => "waiting",
            (true, false) => "playing",
            (false, false) => "paused",
        };
        write!(
            f,
            "[{} / -{}] {:>5.1}% buffered {:>5.1}% {:<7} controls:{}",
            self.elapsed,
            self.remaining,
            self.progress * 100.0,
            self.buffered * 100.0,
            state,
            if self.controls { "shown" } else { "hidden" },
        )?;
        if let Some(source) = &self.source {
            write!(f, " {}", source)?;
        }
        Ok(())
    }
}

/// A video update received from the feed
#[derive(Debug, Serialize)]
pub struct FeedLine {
    pub received_at: String,
    pub video_url: String,
}

impl fmt::Display for FeedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.received_at, self.video_url)
    }
}

/// Result of a prompt submission
#[derive(Debug, Serialize)]
pub struct PromptOutcome {
    pub endpoint: String,
    pub sent: bool,
    pub error: Option<String>,
}

impl fmt::Display for PromptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            None => write!(f, "Prompt sent to {}", self.endpoint),
            Some(e) => write!(f, "Prompt to {} failed: {}", self.endpoint, e),
        }
    }
}

/// One saved watchlist entry
#[derive(Debug, Serialize)]
pub struct ProgressRow<'a> {
    #[serde(flatten)]
    pub entry: &'a ShowProgress,
    pub resume_at: String,
}

impl fmt::Display for ProgressRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<20} {:>9}  {}  {}",
            self.entry.show_id.as_str(),
            self.resume_at,
            self.entry.updated_at.format("%Y-%m-%d %H:%M:%S"),
            self.entry.title,
        )
    }
}

/// A formatted time code
#[derive(Debug, Serialize)]
pub struct TimecodeLine {
    pub seconds: f64,
    pub timecode: String,
}

impl fmt::Display for TimecodeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.timecode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selection() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Text);
    }

    #[test]
    fn test_status_line_text() {
        let line = StatusLine {
            elapsed: "01:05".into(),
            remaining: "08:55".into(),
            progress: 0.108,
            buffered: 0.5,
            playing: true,
            waiting: false,
            controls: false,
            source: None,
        };
        let text = format_output(&line, "text");
        assert!(text.starts_with("[01:05 / -08:55]"));
        assert!(text.contains("playing"));
        assert!(text.contains("controls:hidden"));
    }

    #[test]
    fn test_timecode_json() {
        let line = TimecodeLine {
            seconds: 75.0,
            timecode: "01:15".into(),
        };
        assert_eq!(
            format_output(&line, "json"),
            r#"{"seconds":75.0,"timecode":"01:15"}"#
        );
    }
}
