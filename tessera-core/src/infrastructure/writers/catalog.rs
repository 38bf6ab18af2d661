// tessera-core/src/infrastructure/writers/catalog.rs

use crate::domain::record::ItemRecord;
use crate::error::TesseraError;
use crate::ports::writer::ItemWriter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Writes finished records to the catalog's REST API, one POST per record.
///
/// A record the catalog rejects (non-2xx response) is counted as skipped and
/// the run continues; the driver downgrades the final result when the count
/// is nonzero. Transport failures abort the run instead.
pub struct CatalogWriter {
    client: reqwest::Client,
    items_url: String,
    api_key: Option<String>,
    skipped: AtomicUsize,
}

impl CatalogWriter {
    pub fn new(api_root: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            items_url: format!("{}/items", api_root.trim_end_matches('/')),
            api_key,
            skipped: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ItemWriter for CatalogWriter {
    async fn put(&self, record: ItemRecord) -> Result<(), TesseraError> {
        let mut request = self.client.post(&self.items_url).json(record.as_map());
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        let response = request.send().await?;
        if response.status().is_success() {
            debug!(status = response.status().as_u16(), "record posted to catalog");
        } else {
            warn!(
                status = response.status().as_u16(),
                "catalog rejected record, counting it as skipped"
            );
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn skipped_count(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }
}
