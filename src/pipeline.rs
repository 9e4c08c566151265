//! Pipeline orchestration: parse → encode (N workers) → write.
//!
//! ```text
//!             document channel              buffer channel
//!  parser ──► (unbounded or bounded) ──► encoder × N ──► (bounded) ──► writer ──► sink
//! (caller)                                                             (1 thread)
//! ```
//!
//! The writer and the encoder pool are started before any input is opened.
//! Inputs are parsed one after another on the calling thread and share the
//! same encoder and writer stages. Shutdown always runs in the same order:
//! close the document channel, join the encoders, close the buffer channel,
//! join the writer.
//!
//! A failing input stops the parser, but every row emitted before the failure
//! still reaches the sink. Only an encoder or writer failure cancels the run,
//! since output is no longer possible.
//!
//! Output order across rows is not defined: encoders race each other, and the
//! writer emits buffers in the order they arrive.

use crate::buffer_pool::{BufferPool, DEFAULT_BUFFER_CAPACITY};
use crate::config::PipelineConfig;
use crate::document::Document;
use crate::encoder::run_encoder;
use crate::error::PipelineError;
use crate::metrics::{PipelineMetrics, RunSummary};
use crate::parser::parse_documents;
use crate::source::Input;
use crate::writer::run_writer;
use anyhow::{Context, Result};
use crossbeam::channel::{self, Sender};
use std::io::{BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Cancellation flag shared by every stage of one run.
#[derive(Debug, Default)]
pub(crate) struct Shutdown(AtomicBool);

impl Shutdown {
    pub(crate) fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub(crate) fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A configured flatten pipeline. Cheap to keep around and run repeatedly.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// # Errors
    /// Returns a [`ConfigError`](crate::error::ConfigError) if `config` is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate().context("invalid pipeline configuration")?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Flatten every input in `inputs`, in order, into `sink`.
    ///
    /// Processing stops at the first failing input; later inputs are not
    /// opened. Rows emitted before the failure may already be in `sink`.
    ///
    /// # Errors
    /// The first error of the run: a [`StructureError`](crate::error::StructureError)
    /// or open failure from the inputs, otherwise a [`PipelineError`] from the
    /// encoder or writer stage.
    pub fn run<I, W>(&self, inputs: &[I], sink: &mut W) -> Result<RunSummary>
    where
        I: Input,
        W: Write + Send,
    {
        let started = Instant::now();
        let pool = BufferPool::new(DEFAULT_BUFFER_CAPACITY, self.config.max_retained_buffer);
        let metrics = PipelineMetrics::default();
        let shutdown = Shutdown::default();

        info!(
            inputs = inputs.len(),
            workers = self.config.workers,
            output_capacity = self.config.output_capacity,
            "starting flatten pipeline"
        );

        self.run_stages(inputs, sink, &pool, &shutdown, &metrics)?;

        let summary = metrics.summary(started.elapsed(), pool.metrics().snapshot());
        summary.log();
        Ok(summary)
    }

    fn run_stages<I, W>(
        &self,
        inputs: &[I],
        sink: &mut W,
        pool: &BufferPool,
        shutdown: &Shutdown,
        metrics: &PipelineMetrics,
    ) -> Result<()>
    where
        I: Input,
        W: Write + Send,
    {
        let write_buffer_size = self.config.write_buffer_size;

        thread::scope(|s| -> Result<()> {
            let (doc_tx, doc_rx) = match self.config.document_capacity {
                Some(cap) => channel::bounded::<Document>(cap),
                None => channel::unbounded::<Document>(),
            };
            let (buf_tx, buf_rx) = channel::bounded::<Vec<u8>>(self.config.output_capacity);

            let writer = thread::Builder::new()
                .name("fss-writer".into())
                .spawn_scoped(s, move || {
                    run_writer(buf_rx, sink, write_buffer_size, pool, shutdown, metrics)
                })
                .context("spawn writer thread")?;

            let mut encoders = Vec::with_capacity(self.config.workers);
            for i in 0..self.config.workers {
                let docs = doc_rx.clone();
                let out = buf_tx.clone();
                let handle = thread::Builder::new()
                    .name(format!("fss-encoder-{i}"))
                    .spawn_scoped(s, move || run_encoder(docs, out, pool, shutdown, metrics))
                    .context("spawn encoder thread")?;
                encoders.push(handle);
            }
            drop(doc_rx);
            drop(buf_tx);

            // A parse error only closes the document channel: rows already
            // queued are still encoded and written.
            let parsed = self.drive(inputs, &doc_tx, shutdown, metrics);
            drop(doc_tx);

            let mut encoded = Ok(());
            for handle in encoders {
                let res = handle
                    .join()
                    .unwrap_or(Err(PipelineError::StagePanicked { stage: "encoder" }));
                if encoded.is_ok() {
                    encoded = res;
                }
            }
            let written = writer
                .join()
                .unwrap_or(Err(PipelineError::StagePanicked { stage: "writer" }));

            // A `Cancelled` parse result only echoes a downstream failure.
            match parsed {
                Err(err) if !is_cancelled(&err) => return Err(err),
                parsed => {
                    encoded?;
                    written?;
                    parsed
                }
            }
        })
    }

    /// Parse each input on the calling thread, feeding the encoders.
    fn drive<I: Input>(
        &self,
        inputs: &[I],
        docs: &Sender<Document>,
        shutdown: &Shutdown,
        metrics: &PipelineMetrics,
    ) -> Result<()> {
        for input in inputs {
            if shutdown.is_triggered() {
                return Err(PipelineError::Cancelled.into());
            }
            let name = input.name();
            debug!(input = %name, "opening input");
            let reader = input.open().with_context(|| format!("open {name}"))?;
            let reader = BufReader::with_capacity(self.config.read_buffer_size, reader);

            let summary = parse_documents(reader, |doc| {
                if shutdown.is_triggered() {
                    return Err(PipelineError::Cancelled.into());
                }
                docs.send(doc).map_err(|_| PipelineError::Cancelled.into())
            })
            .with_context(|| format!("process {name}"))
            .inspect_err(|err| {
                if !is_cancelled(err) {
                    debug!(input = %name, error = %format!("{err:#}"), "input rejected");
                }
            })?;

            metrics.record_source(summary.partitions, summary.rows);
            debug!(
                input = %name,
                partitions = summary.partitions,
                rows = summary.rows,
                "input done"
            );
        }
        Ok(())
    }
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Cancelled)
    )
}
