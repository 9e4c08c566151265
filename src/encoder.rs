//! Row encoder workers.
//!
//! Each worker pulls [`Document`]s from the shared document channel,
//! serializes them as compact JSON into a pooled buffer and moves the buffer
//! to the writer. `serde_json`'s default formatter emits no insignificant
//! whitespace, so one pass produces the final bytes.

use crate::buffer_pool::BufferPool;
use crate::document::Document;
use crate::error::PipelineError;
use crate::metrics::PipelineMetrics;
use crate::pipeline::Shutdown;
use crossbeam::channel::{Receiver, Sender};
use tracing::debug;

/// Append the compact JSON form of `doc` to `buf`.
///
/// # Errors
/// Returns the serializer error; `buf` may hold a partial document.
pub fn encode_document(doc: &Document, buf: &mut Vec<u8>) -> Result<(), serde_json::Error> {
    // compact formatter: serializing and compacting are the same pass
    serde_json::to_writer(buf, doc)
}

/// Worker loop. Returns once the document channel is closed and drained,
/// the writer has gone away, or another encoder or the writer failed.
pub(crate) fn run_encoder(
    docs: Receiver<Document>,
    out: Sender<Vec<u8>>,
    pool: &BufferPool,
    shutdown: &Shutdown,
    metrics: &PipelineMetrics,
) -> Result<(), PipelineError> {
    for doc in docs.iter() {
        if shutdown.is_triggered() {
            break;
        }
        let mut buf = pool.get();
        if let Err(err) = encode_document(&doc, &mut buf) {
            pool.put(buf);
            shutdown.trigger();
            return Err(PipelineError::Encode(err));
        }
        metrics.record_encoded();
        if out.send(buf).is_err() {
            // writer already failed and reports its own error
            debug!("output channel closed, encoder stopping");
            shutdown.trigger();
            break;
        }
    }
    Ok(())
}
