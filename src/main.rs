//! `fss` CLI: flattens `sstabledump` JSON arrays into newline-delimited rows.

use std::fs::{File, create_dir_all};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use fss::io::compression::{FinishWrite, auto_detect_writer};
use fss::logging::init_tracing;
use fss::{Pipeline, PipelineConfig, Source};

/// Converts Cassandra's `sstabledump` JSON arrays to a list of smaller
/// objects, one per line, so batch jobs (Athena, Hive, Spark) can read dumps
/// without loading them whole.
#[derive(Parser, Debug)]
#[command(name = "fss", version, about)]
struct Cli {
    /// `sstabledump` JSON files or glob patterns; `-` reads stdin (the
    /// default when no file is given). Compressed inputs are detected.
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Encoder threads [default: number of CPUs]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Encoded rows buffered ahead of the writer
    #[arg(long, default_value_t = fss::config::DEFAULT_OUTPUT_CAPACITY)]
    queue_capacity: usize,

    /// Bound the decoded-row queue (unbounded by default)
    #[arg(long)]
    document_capacity: Option<usize>,

    /// Write to this file instead of stdout; compressed by extension
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Save run metrics as JSON to this file
    #[arg(long, value_name = "PATH")]
    metrics_file: Option<PathBuf>,

    /// More log output on stderr (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn verbosity(&self) -> i8 {
        if self.quiet {
            -1
        } else {
            self.verbose.min(3) as i8
        }
    }

    fn pipeline_config(&self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            workers: self.workers.unwrap_or(defaults.workers),
            output_capacity: self.queue_capacity,
            document_capacity: self.document_capacity,
            ..defaults
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbosity());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let pipeline = Pipeline::new(cli.pipeline_config())?;
    let sources = Source::from_args(&cli.files)?;
    debug!(?sources, "resolved inputs");

    let summary = match &cli.output {
        Some(path) => {
            let mut sink = create_output(path)?;
            let summary = pipeline.run(&sources, &mut sink)?;
            sink.finish()
                .with_context(|| format!("finish {}", path.display()))?;
            summary
        }
        None => pipeline.run(&sources, &mut io::stdout())?,
    };

    if let Some(path) = &cli.metrics_file {
        summary.save_to_file(path)?;
    }
    Ok(())
}

fn create_output(path: &Path) -> Result<Box<dyn FinishWrite>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    auto_detect_writer(f, path).with_context(|| format!("setup compression for {}", path.display()))
}
