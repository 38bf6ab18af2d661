// tessera-core/src/infrastructure/writers/json_file.rs

use crate::domain::record::ItemRecord;
use crate::error::TesseraError;
use crate::ports::writer::ItemWriter;
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Writes one JSON document per line to a local file. Safe for concurrent
/// `put` calls; line order follows task completion order, not read order.
pub struct JsonFileWriter {
    out: Mutex<BufWriter<File>>,
}

impl JsonFileWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, TesseraError> {
        let file = File::create(path)?;
        Ok(Self {
            out: Mutex::new(BufWriter::new(file)),
        })
    }
}

#[async_trait]
impl ItemWriter for JsonFileWriter {
    async fn put(&self, record: ItemRecord) -> Result<(), TesseraError> {
        let line = serde_json::to_string(&record)
            .map_err(|e| TesseraError::InternalError(format!("record serialization: {e}")))?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| TesseraError::InternalError("output file lock poisoned".into()))?;
        writeln!(out, "{line}")?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TesseraError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| TesseraError::InternalError("output file lock poisoned".into()))?;
        out.flush()?;
        Ok(())
    }
}
