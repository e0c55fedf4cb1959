//! CLI command implementations

use crate::output::{
    format_output, FeedLine, OutputFormat, ProgressRow, PromptOutcome, StatusLine, TimecodeLine,
};
use alore_core::{
    convert_to_time_code, HttpPromptClient, JsonFileWatchlist, Key, MediaElement, PlayerConfig,
    PlayerController, PlayerStore, PromptSink, Show, SimulatedMedia, SseVideoFeed, VideoFeed,
    Watchlist,
};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

/// Watchlist file used when none is given
pub const DEFAULT_WATCHLIST: &str = "alore-watchlist.json";

/// Simulated playback step
const TICK: Duration = Duration::from_secs(1);

/// Options for a headless playback session
pub struct PlayOptions {
    pub show: String,
    pub title: Option<String>,
    pub duration: f64,
    pub run_for: f64,
    pub watchlist: PathBuf,
    pub source: Option<String>,
}

/// Load configuration from an optional file, then apply flag overrides
pub fn load_config(
    path: Option<PathBuf>,
    stream_url: Option<Url>,
    prompt_url: Option<Url>,
) -> anyhow::Result<PlayerConfig> {
    let mut config = match path {
        Some(path) => PlayerConfig::from_file(&path)?,
        None => PlayerConfig::default(),
    };

    if let Some(url) = stream_url {
        config.stream_url = url;
    }
    if let Some(url) = prompt_url {
        config.prompt_url = url;
    }

    config.validate()?;
    Ok(config)
}

/// Run a headless playback session
pub async fn play(config: PlayerConfig, options: PlayOptions, format: &str) -> anyhow::Result<()> {
    if !(options.duration.is_finite() && options.duration > 0.0) {
        anyhow::bail!("duration must be a positive number of seconds");
    }

    let watchlist = Arc::new(JsonFileWatchlist::open(&options.watchlist).await?);
    let title = options.title.unwrap_or_else(|| options.show.clone());
    let show = Show::new(options.show, title);

    let controller = PlayerController::new(config, show, PlayerStore::new(), watchlist)?;
    info!(
        session = %controller.id(),
        show = %controller.show().id,
        stream = %controller.config().stream_url,
        "Starting playback session"
    );

    let mut media = SimulatedMedia::new(options.duration);
    if let Some(source) = &options.source {
        media.set_source(source);
    }
    controller.attach_media(Box::new(media.clone())).await;
    controller.start().await?;

    let mut ticker = tokio::time::interval(TICK);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut submissions: Vec<JoinHandle<()>> = Vec::new();
    let mut elapsed = 0.0;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                media.advance(TICK.as_secs_f64());
                controller.pump_media_events().await;
                println!("{}", format_output(&status_line(&controller, &media).await, format));

                elapsed += TICK.as_secs_f64();
                if options.run_for > 0.0 && elapsed >= options.run_for {
                    info!(elapsed, "Run time reached");
                    break;
                }
                if media.current_time() >= media.duration() {
                    info!("Media ended");
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(text)) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        controller.interact().await;
                        controller.set_prompt_value(text).await;
                        if let Some(task) = controller.prompt_key_press(Key::Enter).await {
                            submissions.push(task);
                        }
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "Stopped reading prompts from stdin");
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c => {
                info!("Interrupted");
                controller.before_unload().await;
                return Ok(());
            }
        }
    }

    controller.stop().await;

    // Let pending prompts finish before exiting
    for task in submissions {
        let _ = task.await;
    }

    Ok(())
}

async fn status_line(controller: &PlayerController, media: &SimulatedMedia) -> StatusLine {
    let state = controller.store().state();
    StatusLine {
        elapsed: controller.current_time_stamp().await,
        remaining: controller.missing_time_stamp().await,
        progress: state.progress,
        buffered: state.buffered,
        playing: state.playing,
        waiting: state.waiting,
        controls: controller.controls_active(),
        source: media.source(),
    }
}

/// Print every update from the video feed
pub async fn watch(config: &PlayerConfig, format: &str) -> anyhow::Result<()> {
    let feed = SseVideoFeed::new(config.stream_url.clone(), config.request_timeout())?;
    println!("Watching: {}", feed.url());

    let mut updates = feed.subscribe().await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            update = updates.next() => match update {
                Some(Ok(update)) => {
                    let line = FeedLine {
                        received_at: chrono::Utc::now().format("%H:%M:%S").to_string(),
                        video_url: update.video_url,
                    };
                    println!("{}", format_output(&line, format));
                }
                Some(Err(e)) if e.is_recoverable() => {
                    warn!(error = %e, code = e.error_code(), "Skipping feed message");
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    println!("Feed closed.");
                    break;
                }
            },
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}

/// Send a single prompt
pub async fn prompt(config: &PlayerConfig, text: &str, format: &str) -> anyhow::Result<()> {
    let client = HttpPromptClient::new(config.prompt_url.clone(), config.request_timeout())?;
    let result = client.send_prompt(text).await;

    let outcome = PromptOutcome {
        endpoint: client.endpoint().to_string(),
        sent: result.is_ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
    };
    println!("{}", format_output(&outcome, format));

    result?;
    Ok(())
}

/// List saved watch progress
pub async fn watchlist(path: &Path, format: &str) -> anyhow::Result<()> {
    let watchlist = JsonFileWatchlist::open(path).await?;
    let entries = watchlist.entries().await;

    if entries.is_empty() {
        if OutputFormat::from(format) == OutputFormat::Json {
            println!("[]");
        } else {
            println!("No saved progress in {}", path.display());
        }
        return Ok(());
    }

    for entry in &entries {
        let row = ProgressRow {
            entry,
            resume_at: convert_to_time_code(entry.resume_seconds),
        };
        println!("{}", format_output(&row, format));
    }

    Ok(())
}

/// Format seconds as a time code
pub fn timecode(seconds: f64, format: &str) {
    let line = TimecodeLine {
        seconds,
        timecode: convert_to_time_code(seconds),
    };
    println!("{}", format_output(&line, format));
}
