//! Counters collected while a pipeline runs.
//!
//! [`PipelineMetrics`] is shared by reference between the parser driver,
//! the encoder workers and the writer. [`RunSummary`] is the snapshot handed
//! back to the caller once the run has shut down; it can be logged or saved
//! as JSON.
//!
//! # Example
//!
//! ```no_run
//! use fss::{Pipeline, PipelineConfig, Source};
//!
//! # fn main() -> anyhow::Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let summary = pipeline.run(&[Source::Stdin], &mut std::io::stdout())?;
//! summary.save_to_file("metrics.json")?;
//! # Ok(())
//! # }
//! ```

use crate::buffer_pool::PoolSnapshot;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// Live counters updated by the pipeline stages.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    sources: AtomicU64,
    partitions: AtomicU64,
    rows: AtomicU64,
    documents_encoded: AtomicU64,
    documents_written: AtomicU64,
    bytes_written: AtomicU64,
}

impl PipelineMetrics {
    pub(crate) fn record_source(&self, partitions: usize, rows: usize) {
        self.sources.fetch_add(1, Ordering::Relaxed);
        self.partitions
            .fetch_add(partitions as u64, Ordering::Relaxed);
        self.rows.fetch_add(rows as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_encoded(&self) {
        self.documents_encoded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_written(&self, bytes: usize) {
        self.documents_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Freeze the counters into a [`RunSummary`].
    #[must_use]
    pub fn summary(&self, elapsed: Duration, pool: PoolSnapshot) -> RunSummary {
        RunSummary {
            sources: self.sources.load(Ordering::Relaxed),
            partitions: self.partitions.load(Ordering::Relaxed),
            rows: self.rows.load(Ordering::Relaxed),
            documents_encoded: self.documents_encoded.load(Ordering::Relaxed),
            documents_written: self.documents_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            elapsed_ms: elapsed.as_millis() as u64,
            pool,
        }
    }
}

/// Totals for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Inputs parsed to the end.
    pub sources: u64,
    /// Partitions read across all inputs.
    pub partitions: u64,
    /// Rows decoded across all inputs.
    pub rows: u64,
    pub documents_encoded: u64,
    pub documents_written: u64,
    /// Output bytes, newline delimiters included.
    pub bytes_written: u64,
    pub elapsed_ms: u64,
    pub pool: PoolSnapshot,
}

impl RunSummary {
    /// Emit the summary as an `info` event.
    pub fn log(&self) {
        info!(
            sources = self.sources,
            partitions = self.partitions,
            rows = self.rows,
            documents_written = self.documents_written,
            bytes_written = self.bytes_written,
            elapsed_ms = self.elapsed_ms,
            pool_hit_rate = self.pool.hit_rate(),
            "flatten finished"
        );
    }

    /// Write the summary as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, self)
            .with_context(|| format!("serialize metrics to {}", path.display()))?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    }
}
