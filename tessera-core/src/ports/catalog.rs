// tessera-core/src/ports/catalog.rs

use crate::domain::identifiers::{Element, ElementSet, ItemType};
use crate::error::TesseraError;
use async_trait::async_trait;

/// Read-only view over the catalog service, used once per run to build the
/// identifier maps.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn element_sets(&self) -> Result<Vec<ElementSet>, TesseraError>;

    async fn elements(&self) -> Result<Vec<Element>, TesseraError>;

    async fn item_types(&self) -> Result<Vec<ItemType>, TesseraError>;
}
