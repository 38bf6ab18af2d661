// tessera-core/src/application/resolver.rs

use crate::domain::identifiers::IdentifierMaps;
use crate::error::TesseraError;
use crate::ports::catalog::CatalogApi;
use crate::ports::store::RelationalStore;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Builds the identifier maps lazily, once, from the two external sources:
/// the catalog service (element sets, elements, item types) and the
/// relational store (collections, existing item identifiers). The result is
/// memoized for the run's lifetime and shared read-only.
pub struct IdentifierResolver {
    catalog: Arc<dyn CatalogApi>,
    store: Arc<dyn RelationalStore>,
    maps: OnceCell<Arc<IdentifierMaps>>,
}

impl IdentifierResolver {
    pub fn new(catalog: Arc<dyn CatalogApi>, store: Arc<dyn RelationalStore>) -> Self {
        Self {
            catalog,
            store,
            maps: OnceCell::new(),
        }
    }

    pub async fn maps(&self) -> Result<Arc<IdentifierMaps>, TesseraError> {
        self.maps
            .get_or_try_init(|| async {
                let element_sets = self.catalog.element_sets().await?;
                let elements = self.catalog.elements().await?;
                let item_types = self.catalog.item_types().await?;
                let collections = self.store.collections().await?;
                let items = self.store.item_identifiers().await?;
                info!(
                    element_sets = element_sets.len(),
                    elements = elements.len(),
                    item_types = item_types.len(),
                    collections = collections.len(),
                    items = items.len(),
                    "identifier maps built"
                );
                Ok(Arc::new(IdentifierMaps::from_parts(
                    element_sets,
                    elements,
                    item_types,
                    collections,
                    items,
                )))
            })
            .await
            .cloned()
    }
}
