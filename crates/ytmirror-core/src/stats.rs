//! Per-run accounting, merged across batches and reportable as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::downloader::response::{DownloadResponse, DownloadStatus};

/// Counters for one mirror run. Handed to the driver per download and
/// merged at batch end rather than living in ambient global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub attempted: u32,
    pub succeeded: u32,
    pub skipped: u32,
    pub failed: u32,
    pub errored: u32,
    pub retries: u32,
    /// Kilobytes actually fetched this run (resumed portions excluded).
    pub downloaded_kb: f64,
}

impl RunStats {
    /// Count one finished download by its response status.
    pub fn record(&mut self, response: &DownloadResponse) {
        match response.status {
            DownloadStatus::Success => self.succeeded += 1,
            DownloadStatus::Failure => self.failed += 1,
            DownloadStatus::Error => self.errored += 1,
        }
    }

    /// Fold another batch's counters into this one.
    pub fn merge(&mut self, other: &RunStats) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.errored += other.errored;
        self.retries += other.retries;
        self.downloaded_kb += other.downloaded_kb;
    }

    /// One-line human summary for the end of a run.
    pub fn summary(&self) -> String {
        format!(
            "{} attempted, {} succeeded, {} skipped, {} failed, {} errored, {} retried, {:.1}MB downloaded",
            self.attempted,
            self.succeeded,
            self.skipped,
            self.failed,
            self.errored,
            self.retries,
            self.downloaded_kb / 1024.0
        )
    }

    /// Write the counters as pretty JSON (creates parent dirs if needed).
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize run stats")?;
        std::fs::write(path, json)
            .with_context(|| format!("write run stats: {}", path.display()))?;
        Ok(())
    }
}
