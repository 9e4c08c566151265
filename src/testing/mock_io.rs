//! In-memory inputs and pipeline runs.

use crate::config::PipelineConfig;
use crate::pipeline::Pipeline;
use crate::source::Input;
use anyhow::{Context, Result};
use serde_json::Value;
use std::borrow::Cow;
use std::io::Read;

/// An [`Input`] backed by a byte buffer.
#[derive(Clone, Debug)]
pub struct MemoryInput {
    name: String,
    data: Vec<u8>,
}

impl MemoryInput {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

impl Input for MemoryInput {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn open(&self) -> Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.data.as_slice()))
    }
}

/// Output lines of a run, without their newline delimiters.
///
/// # Errors
/// Returns an error if the output is not UTF-8 or does not end in a newline.
pub fn output_lines(output: &[u8]) -> Result<Vec<String>> {
    if output.is_empty() {
        return Ok(Vec::new());
    }
    let text = std::str::from_utf8(output).context("output is not UTF-8")?;
    let body = text
        .strip_suffix('\n')
        .context("output does not end with a newline")?;
    Ok(body.split('\n').map(str::to_owned).collect())
}

/// Run `inputs` through a pipeline built from `config`, returning the raw output.
///
/// # Errors
/// Returns the pipeline error, if any.
pub fn run_to_vec(config: PipelineConfig, inputs: &[MemoryInput]) -> Result<Vec<u8>> {
    let pipeline = Pipeline::new(config)?;
    let mut out = Vec::new();
    pipeline.run(inputs, &mut out)?;
    Ok(out)
}

/// Flatten one in-memory dump with default settings and parse every line.
///
/// # Errors
/// Returns the pipeline error, or an error if a line is not JSON.
pub fn flatten_str(input: &str) -> Result<Vec<Value>> {
    let out = run_to_vec(
        PipelineConfig::default(),
        &[MemoryInput::new("memory", input)],
    )?;
    output_lines(&out)?
        .iter()
        .map(|line| serde_json::from_str(line).with_context(|| format!("parse line {line}")))
        .collect()
}
