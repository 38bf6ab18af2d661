// tessera-core/src/ports/store.rs

use crate::error::TesseraError;
use async_trait::async_trait;

/// Read-only view over the catalog's relational store, used once per run to
/// build the collection and item identifier maps.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Collection name / id pairs.
    async fn collections(&self) -> Result<Vec<(String, u64)>, TesseraError>;

    /// External identifier / internal item id pairs, joined through the
    /// distinguished `Identifier` element.
    async fn item_identifiers(&self) -> Result<Vec<(String, u64)>, TesseraError>;
}
