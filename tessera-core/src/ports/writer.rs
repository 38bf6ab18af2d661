// tessera-core/src/ports/writer.rs

use crate::domain::record::ItemRecord;
use crate::error::TesseraError;
use async_trait::async_trait;

/// Sink for finished output records.
///
/// With a processing pool larger than one, `put` is invoked concurrently and
/// the implementation must be internally safe for that; otherwise bind the
/// run to pool size 1.
#[async_trait]
pub trait ItemWriter: Send + Sync {
    async fn put(&self, record: ItemRecord) -> Result<(), TesseraError>;

    /// Called exactly once, after the stream is drained.
    async fn close(&self) -> Result<(), TesseraError> {
        Ok(())
    }

    /// Records the writer dropped on its own side. Consulted once after the
    /// run; a nonzero count downgrades the run result without raising.
    fn skipped_count(&self) -> usize {
        0
    }
}
