//! Counters describing what the pipeline has processed.
//!
//! Only counts are kept; no record content is retained.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Processing counters for the current session.
#[derive(Debug)]
pub struct ProcessingLog {
    /// Trajectory records read from input tables
    records_loaded: AtomicU64,
    /// Feature rows produced
    rows_extracted: AtomicU64,
    /// Feature rows whose entry point lies in the zone
    entries_inside: AtomicU64,
    /// Labels built
    labels_built: AtomicU64,
    /// Labels equal to 1
    positive_labels: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl ProcessingLog {
    pub fn new() -> Self {
        Self {
            records_loaded: AtomicU64::new(0),
            rows_extracted: AtomicU64::new(0),
            entries_inside: AtomicU64::new(0),
            labels_built: AtomicU64::new(0),
            positive_labels: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that accumulates onto counters persisted at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("could not load previous processing stats: {e}");
        }

        log
    }

    pub fn record_loaded(&self, count: u64) {
        self.records_loaded.fetch_add(count, Ordering::Relaxed);
    }

    /// Record an extraction batch.
    pub fn record_extracted(&self, rows: u64, inside: u64) {
        self.rows_extracted.fetch_add(rows, Ordering::Relaxed);
        self.entries_inside.fetch_add(inside, Ordering::Relaxed);
    }

    /// Record a labelling batch.
    pub fn record_labels(&self, labels: &[u8]) {
        let positive = labels.iter().filter(|&&l| l == 1).count() as u64;
        self.labels_built
            .fetch_add(labels.len() as u64, Ordering::Relaxed);
        self.positive_labels.fetch_add(positive, Ordering::Relaxed);
    }

    pub fn stats(&self) -> ProcessingStats {
        ProcessingStats {
            records_loaded: self.records_loaded.load(Ordering::Relaxed),
            rows_extracted: self.rows_extracted.load(Ordering::Relaxed),
            entries_inside: self.entries_inside.load(Ordering::Relaxed),
            labels_built: self.labels_built.load(Ordering::Relaxed),
            positive_labels: self.positive_labels.load(Ordering::Relaxed),
            session_start: self.session_start,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Processing Statistics:\n\
             - Records loaded: {}\n\
             - Feature rows extracted: {}\n\
             - Entries inside zone: {}\n\
             - Labels built: {} ({} positive)",
            stats.records_loaded,
            stats.rows_extracted,
            stats.entries_inside,
            stats.labels_built,
            stats.positive_labels
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                records_loaded: stats.records_loaded,
                rows_extracted: stats.rows_extracted,
                entries_inside: stats.entries_inside,
                labels_built: stats.labels_built,
                positive_labels: stats.positive_labels,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.records_loaded
                    .store(persisted.records_loaded, Ordering::Relaxed);
                self.rows_extracted
                    .store(persisted.rows_extracted, Ordering::Relaxed);
                self.entries_inside
                    .store(persisted.entries_inside, Ordering::Relaxed);
                self.labels_built
                    .store(persisted.labels_built, Ordering::Relaxed);
                self.positive_labels
                    .store(persisted.positive_labels, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    pub fn reset(&self) {
        self.records_loaded.store(0, Ordering::Relaxed);
        self.rows_extracted.store(0, Ordering::Relaxed);
        self.entries_inside.store(0, Ordering::Relaxed);
        self.labels_built.store(0, Ordering::Relaxed);
        self.positive_labels.store(0, Ordering::Relaxed);
    }
}

impl Default for ProcessingLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of processing statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub records_loaded: u64,
    pub rows_extracted: u64,
    pub entries_inside: u64,
    pub labels_built: u64,
    pub positive_labels: u64,
    pub session_start: DateTime<Utc>,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    records_loaded: u64,
    rows_extracted: u64,
    entries_inside: u64,
    labels_built: u64,
    positive_labels: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared processing log.
pub type SharedProcessingLog = Arc<ProcessingLog>;

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedProcessingLog {
    Arc::new(ProcessingLog::with_persistence(path))
}
