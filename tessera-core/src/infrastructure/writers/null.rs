// tessera-core/src/infrastructure/writers/null.rs

use crate::domain::record::ItemRecord;
use crate::error::TesseraError;
use crate::ports::writer::ItemWriter;
use async_trait::async_trait;

/// A writer that does absolutely nothing with records given to it, just
/// drops them on the floor. Useful for dry runs and benchmarking the mapper.
#[derive(Debug, Default)]
pub struct NullWriter;

#[async_trait]
impl ItemWriter for NullWriter {
    async fn put(&self, _record: ItemRecord) -> Result<(), TesseraError> {
        Ok(())
    }
}
