//! Error types for parsing, pipeline orchestration and configuration.
//!
//! Operations return [`anyhow::Result`]; the typed errors below sit at the root
//! of those chains so callers can tell them apart with
//! [`anyhow::Error::downcast_ref`].

use std::fmt;
use std::io;
use thiserror::Error;

/// Position in the input where a structural problem was detected.
///
/// Partition and row indices are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Before the outer array was opened.
    Start,
    /// Between fields of a partition object.
    Partition { partition: usize },
    /// Inside the value of a metadata field.
    Field { partition: usize, field: String },
    /// Inside the `rows` array, between rows.
    Rows { partition: usize },
    /// Inside a single row object.
    Row { partition: usize, row: usize },
    /// After the outer array was closed.
    End,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start of input"),
            Self::Partition { partition } => write!(f, "partition #{partition}"),
            Self::Field { partition, field } => {
                write!(f, "field `{field}` of partition #{partition}")
            }
            Self::Rows { partition } => write!(f, "`rows` of partition #{partition}"),
            Self::Row { partition, row } => write!(f, "row #{row} of partition #{partition}"),
            Self::End => f.write_str("end of input"),
        }
    }
}

/// Malformed input detected by the structural parser.
#[derive(Debug, Error)]
pub enum StructureError {
    /// The top-level value is not an array (or the input is empty).
    #[error("expected first element to be an array")]
    NotAnArray,

    /// An element of the outer array is not an object.
    #[error("expected partition #{partition} to be an object")]
    PartitionNotObject { partition: usize },

    /// A metadata field appears twice in the same partition.
    #[error("duplicate field `{field}` in partition #{partition}")]
    DuplicateField { partition: usize, field: String },

    /// The `rows` value is missing or is not an array.
    #[error("expected `rows` of partition #{partition} to be an array")]
    RowsNotArray { partition: usize },

    /// An element of `rows` is not an object.
    #[error("expected row #{row} of partition #{partition} to be an object")]
    RowNotObject { partition: usize, row: usize },

    /// A row already carries the key the partition is stored under.
    #[error("did not expect row #{row} of partition #{partition} to contain a `partition` key")]
    RowHasPartitionKey { partition: usize, row: usize },

    /// A field follows the `rows` array inside a partition.
    #[error("expected `rows` to be the last field of partition #{partition}, found `{field}`")]
    TrailingField { partition: usize, field: String },

    /// The input ended before the outer array was closed.
    #[error("end of array not found (stream ended at {location}): {source}")]
    UnterminatedArray {
        location: Location,
        #[source]
        source: serde_json::Error,
    },

    /// Something other than whitespace follows the outer array.
    #[error("unexpected data after the top-level array: {source}")]
    TrailingData {
        #[source]
        source: serde_json::Error,
    },

    /// The tokenizer rejected the input.
    #[error("could not decode {location}: {source}")]
    Decode {
        location: Location,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures raised by the encoder and writer stages, or used to unwind them.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Another stage failed and the run is shutting down.
    #[error("pipeline cancelled")]
    Cancelled,

    /// A decoded document could not be serialized.
    #[error("could not encode document: {0}")]
    Encode(#[source] serde_json::Error),

    /// The output sink rejected a write.
    #[error("could not write to output: {0}")]
    Write(#[source] io::Error),

    /// A worker thread panicked.
    #[error("{stage} stage panicked")]
    StagePanicked { stage: &'static str },
}

/// Invalid [`PipelineConfig`](crate::config::PipelineConfig) values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{field}` must be greater than zero")]
    Zero { field: &'static str },
}
