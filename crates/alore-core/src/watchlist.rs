//! Watch progress persistence
//!
//! The controller reads a show's resume position when it starts and writes
//! the elapsed time back when it stops.

use crate::{
    types::{Show, ShowId, ShowProgress},
    Error, Result,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Per-show resume positions
#[async_trait]
pub trait Watchlist: Send + Sync {
    /// Saved resume position for a show, in seconds
    async fn show_progress(&self, show_id: &ShowId) -> Option<f64>;

    /// Record the elapsed time for a show
    async fn add_progress(&self, show: &Show, seconds: f64) -> Result<()>;

    /// All saved positions, ordered by show id
    async fn entries(&self) -> Vec<ShowProgress>;
}

fn validate_seconds(seconds: f64) -> Result<()> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidProgress { seconds })
    }
}

fn progress_entry(show: &Show, seconds: f64) -> ShowProgress {
    ShowProgress {
        show_id: show.id.clone(),
        title: show.title.clone(),
        resume_seconds: seconds,
        updated_at: Utc::now(),
    }
}

/// Watchlist kept in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryWatchlist {
    entries: RwLock<BTreeMap<ShowId, ShowProgress>>,
}

impl MemoryWatchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a resume position
    pub async fn insert(&self, show: &Show, seconds: f64) -> Result<()> {
        self.add_progress(show, seconds).await
    }
}

#[async_trait]
impl Watchlist for MemoryWatchlist {
    async fn show_progress(&self, show_id: &ShowId) -> Option<f64> {
        self.entries
            .read()
            .await
            .get(show_id)
            .map(|entry| entry.resume_seconds)
    }

    async fn add_progress(&self, show: &Show, seconds: f64) -> Result<()> {
        validate_seconds(seconds)?;
        self.entries
            .write()
            .await
            .insert(show.id.clone(), progress_entry(show, seconds));
        debug!(show = %show.id, seconds, "Progress recorded");
        Ok(())
    }

    async fn entries(&self) -> Vec<ShowProgress> {
        self.entries.read().await.values().cloned().collect()
    }
}

/// Watchlist persisted as a JSON array on disk
///
/// The whole file is rewritten on every save, through a temporary file that
/// is renamed over the original.
#[derive(Debug)]
pub struct JsonFileWatchlist {
    path: PathBuf,
    entries: RwLock<BTreeMap<ShowId, ShowProgress>>,
}

impl JsonFileWatchlist {
    /// Open a watchlist file. A missing file is an empty watchlist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                let list: Vec<ShowProgress> = serde_json::from_str(&contents).map_err(|e| {
                    Error::Watchlist(format!("{}: {}", path.display(), e))
                })?;
                list.into_iter()
                    .map(|entry| (entry.show_id.clone(), entry))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), shows = entries.len(), "Watchlist loaded");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<ShowId, ShowProgress>) -> Result<()> {
        let list: Vec<&ShowProgress> = entries.values().collect();
        let json = serde_json::to_string_pretty(&list)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("json.part");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Watchlist for JsonFileWatchlist {
    async fn show_progress(&self, show_id: &ShowId) -> Option<f64> {
        self.entries
            .read()
            .await
            .get(show_id)
            .map(|entry| entry.resume_seconds)
    }

    async fn add_progress(&self, show: &Show, seconds: f64) -> Result<()> {
        validate_seconds(seconds)?;

        // Held across the write so concurrent saves land in order
        let mut entries = self.entries.write().await;
        entries.insert(show.id.clone(), progress_entry(show, seconds));
        self.persist(&entries).await?;

        info!(show = %show.id, seconds, path = %self.path.display(), "Progress saved");
        Ok(())
    }

    async fn entries(&self) -> Vec<ShowProgress> {
        self.entries.read().await.values().cloned().collect()
    }
}
