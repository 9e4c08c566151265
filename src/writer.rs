//! Single consumer that turns encoded buffers into newline-delimited output.

use crate::buffer_pool::BufferPool;
use crate::error::PipelineError;
use crate::metrics::PipelineMetrics;
use crate::pipeline::Shutdown;
use crossbeam::channel::Receiver;
use std::io::{BufWriter, Write};

/// Drain `buffers` into `sink`, one line per buffer, in arrival order.
///
/// Every buffer goes back to `pool` after it is written. Buffers still queued
/// when the run is cancelled are written too; the loop ends only when every
/// sender is gone. The sink is flushed before returning.
pub(crate) fn run_writer<W: Write>(
    buffers: Receiver<Vec<u8>>,
    sink: W,
    write_buffer_size: usize,
    pool: &BufferPool,
    shutdown: &Shutdown,
    metrics: &PipelineMetrics,
) -> Result<(), PipelineError> {
    let mut out = BufWriter::with_capacity(write_buffer_size, sink);
    for buf in buffers.iter() {
        let written = out.write_all(&buf).and_then(|()| out.write_all(b"\n"));
        let len = buf.len() + 1;
        pool.put(buf);
        if let Err(err) = written {
            shutdown.trigger();
            return Err(PipelineError::Write(err));
        }
        metrics.record_written(len);
    }
    out.flush().map_err(|err| {
        shutdown.trigger();
        PipelineError::Write(err)
    })
}
