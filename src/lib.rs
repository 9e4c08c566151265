//! # fss
//!
//! Flattens Cassandra `sstabledump` JSON into newline-delimited JSON.
//!
//! `sstabledump` writes one big array of partitions, each holding its rows:
//!
//! ```text
//! [{"key":"k1","rows":[{"a":1},{"a":2}]}]
//! ```
//!
//! Batch engines (Athena, Hive, Spark) want one record per line, so every row
//! is re-emitted on its own line with the partition metadata embedded:
//!
//! ```text
//! {"a":1,"partition":{"key":"k1"}}
//! {"a":2,"partition":{"key":"k1"}}
//! ```
//!
//! The input is never loaded as a whole. A streaming [`parser`] walks the
//! array on the calling thread, a pool of encoder threads serializes rows
//! into pooled buffers, and a single writer thread streams them out. Output
//! order across rows is not defined.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fss::{Pipeline, PipelineConfig, Source};
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let sources = Source::from_args(&["dump-1.json", "dumps/*.json.gz"])?;
//! let summary = pipeline.run(&sources, &mut std::io::stdout())?;
//! println!("{} rows", summary.rows);
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Operations return [`anyhow::Result`]. Malformed input surfaces as a
//! [`StructureError`], encoder and writer failures as a [`PipelineError`];
//! both can be recovered with `downcast_ref`.
//!
//! ## Feature Flags
//!
//! - `compression-gzip`, `compression-zstd`, `compression-bzip2`,
//!   `compression-xz` - transparent (de)compression, all on by default
//!
//! ## Module Overview
//!
//! - [`parser`] - streaming structural parser
//! - [`document`] - partition, row and document types
//! - [`buffer_pool`] - reusable output buffers
//! - [`encoder`] - row serialization (the writer stage is internal)
//! - [`pipeline`] - orchestration and shutdown
//! - [`source`] and [`io`] - inputs, globbing and compression
//! - [`config`], [`metrics`], [`logging`] - ambient plumbing
//! - [`testing`] - fixtures and assertions for tests

pub mod buffer_pool;
pub mod config;
pub mod document;
pub mod encoder;
pub mod error;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod source;
pub mod testing;
mod writer;

pub use buffer_pool::BufferPool;
pub use config::PipelineConfig;
pub use document::{Document, PARTITION_KEY, Partition, Row};
pub use error::{ConfigError, Location, PipelineError, StructureError};
pub use metrics::RunSummary;
pub use parser::{ParseSummary, parse_documents};
pub use pipeline::Pipeline;
pub use source::{Input, STDIN_SENTINEL, Source};
