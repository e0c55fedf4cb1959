//! Alore CLI - Headless Player Session and Feed Tools
//!
//! Features:
//! - Headless playback with a simulated media element
//! - Live video feed watching
//! - Prompt submission
//! - Watchlist inspection
//! - Time code formatting

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

mod commands;
mod output;

/// Alore CLI - Player session toolkit
#[derive(Parser)]
#[command(name = "alore-cli")]
#[command(author = "Alore Developers")]
#[command(version)]
#[command(about = "Headless player session and live feed toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Player configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the video feed URL
    #[arg(long)]
    stream_url: Option<Url>,

    /// Override the prompt endpoint URL
    #[arg(long)]
    prompt_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless playback session
    Play {
        /// Show identifier
        #[arg(short, long)]
        show: String,

        /// Show title (defaults to the identifier)
        #[arg(short, long)]
        title: Option<String>,

        /// Simulated media duration in seconds
        #[arg(short, long, default_value = "600")]
        duration: f64,

        /// Stop after this many seconds (0 = until the media ends)
        #[arg(short, long, default_value = "0")]
        run_for: f64,

        /// Watchlist file
        #[arg(short, long, default_value = commands::DEFAULT_WATCHLIST)]
        watchlist: PathBuf,

        /// Initial media source
        #[arg(long)]
        source: Option<String>,
    },

    /// Print every update from the video feed
    Watch,

    /// Send a single prompt
    Prompt {
        /// Prompt text
        text: String,
    },

    /// List saved watch progress
    Watchlist {
        /// Watchlist file
        #[arg(short, long, default_value = commands::DEFAULT_WATCHLIST)]
        path: PathBuf,
    },

    /// Format seconds as a time code
    Timecode {
        /// Elapsed seconds
        #[arg(allow_negative_numbers = true)]
        seconds: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    alore_core::init();

    match cli.command {
        Commands::Play {
            show,
            title,
            duration,
            run_for,
            watchlist,
            source,
        } => {
            let config = commands::load_config(cli.config, cli.stream_url, cli.prompt_url)?;
            let options = commands::PlayOptions {
                show,
                title,
                duration,
                run_for,
                watchlist,
                source,
            };
            commands::play(config, options, &cli.format).await?;
        }
        Commands::Watch => {
            let config = commands::load_config(cli.config, cli.stream_url, cli.prompt_url)?;
            commands::watch(&config, &cli.format).await?;
        }
        Commands::Prompt { text } => {
            let config = commands::load_config(cli.config, cli.stream_url, cli.prompt_url)?;
            commands::prompt(&config, &text, &cli.format).await?;
        }
        Commands::Watchlist { path } => {
            commands::watchlist(&path, &cli.format).await?;
        }
        Commands::Timecode { seconds } => {
            commands::timecode(seconds, &cli.format);
        }
    }

    Ok(())
}
