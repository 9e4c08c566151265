//! Pipeline tuning knobs.

use crate::buffer_pool::DEFAULT_MAX_RETAINED_CAPACITY;
use crate::error::ConfigError;

/// Capacity of the encoded-buffer channel between encoders and the writer.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 100;

/// Read buffer placed in front of every input.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Write buffer placed in front of the output sink.
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Sizing of the parse → encode → write pipeline.
///
/// ```
/// use fss::PipelineConfig;
///
/// let config = PipelineConfig {
///     workers: 2,
///     document_capacity: Some(1_000),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of encoder threads.
    pub workers: usize,
    /// Bound of the encoded-buffer channel. This is what keeps memory flat
    /// when the sink is slower than the encoders.
    pub output_capacity: usize,
    /// Bound of the document channel; `None` leaves it unbounded so the
    /// parser never waits on the encoders.
    pub document_capacity: Option<usize>,
    /// Size of the read buffer wrapped around each input.
    pub read_buffer_size: usize,
    /// Size of the write buffer wrapped around the sink.
    pub write_buffer_size: usize,
    /// Pooled buffers that grew beyond this are released to the allocator.
    pub max_retained_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
            document_capacity: None,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            max_retained_buffer: DEFAULT_MAX_RETAINED_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Check that every size is usable.
    ///
    /// # Errors
    /// Returns [`ConfigError::Zero`] naming the first field that is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("workers", self.workers),
            ("output_capacity", self.output_capacity),
            ("document_capacity", self.document_capacity.unwrap_or(1)),
            ("read_buffer_size", self.read_buffer_size),
            ("write_buffer_size", self.write_buffer_size),
        ];
        match sizes.into_iter().find(|(_, v)| *v == 0) {
            Some((field, _)) => Err(ConfigError::Zero { field }),
            None => Ok(()),
        }
    }
}
