// tessera-core/src/infrastructure/adapters/memory.rs

use crate::domain::identifiers::{Element, ElementSet, IdentifierMaps, ItemType};
use crate::error::TesseraError;
use crate::ports::catalog::CatalogApi;
use crate::ports::store::RelationalStore;
use async_trait::async_trait;
use std::path::Path;

/// In-memory `CatalogApi`, for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    element_sets: Vec<ElementSet>,
    elements: Vec<Element>,
    item_types: Vec<ItemType>,
}

impl MemoryCatalog {
    pub fn new(
        element_sets: Vec<ElementSet>,
        elements: Vec<Element>,
        item_types: Vec<ItemType>,
    ) -> Self {
        Self {
            element_sets,
            elements,
            item_types,
        }
    }
}

#[async_trait]
impl CatalogApi for MemoryCatalog {
    async fn element_sets(&self) -> Result<Vec<ElementSet>, TesseraError> {
        Ok(self.element_sets.clone())
    }

    async fn elements(&self) -> Result<Vec<Element>, TesseraError> {
        Ok(self.elements.clone())
    }

    async fn item_types(&self) -> Result<Vec<ItemType>, TesseraError> {
        Ok(self.item_types.clone())
    }
}

/// In-memory `RelationalStore`, for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Vec<(String, u64)>,
    items: Vec<(String, u64)>,
}

impl MemoryStore {
    pub fn new(collections: Vec<(String, u64)>, items: Vec<(String, u64)>) -> Self {
        Self { collections, items }
    }
}

#[async_trait]
impl RelationalStore for MemoryStore {
    async fn collections(&self) -> Result<Vec<(String, u64)>, TesseraError> {
        Ok(self.collections.clone())
    }

    async fn item_identifiers(&self) -> Result<Vec<(String, u64)>, TesseraError> {
        Ok(self.items.clone())
    }
}

/// Load pre-built identifier maps from a JSON fixture file, bypassing the
/// catalog and relational store entirely.
pub fn load_identifier_maps(path: impl AsRef<Path>) -> Result<IdentifierMaps, TesseraError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| TesseraError::InternalError(format!("identifier maps fixture: {e}")))
}
