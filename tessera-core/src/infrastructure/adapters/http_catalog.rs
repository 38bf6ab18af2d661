// tessera-core/src/infrastructure/adapters/http_catalog.rs

use crate::domain::identifiers::{Element, ElementSet, ItemType};
use crate::error::TesseraError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::catalog::CatalogApi;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// `CatalogApi` over the catalog's REST endpoints (`/element_sets`,
/// `/elements`, `/item_types`).
pub struct HttpCatalog {
    client: reqwest::Client,
    api_root: String,
}

impl HttpCatalog {
    pub fn new(api_root: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_root: api_root.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, TesseraError> {
        let url = format!("{}/{}", self.api_root, path);
        debug!(url = %url, "fetching catalog listing");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(InfrastructureError::HttpStatus {
                status: response.status().as_u16(),
                url,
            }
            .into());
        }
        Ok(response.json().await?)
    }
}

// The REST shape nests the element set reference; flatten it into the
// domain's `Element`.
#[derive(Deserialize)]
struct RawElement {
    id: u64,
    name: String,
    element_set: RawRef,
}

#[derive(Deserialize)]
struct RawRef {
    id: u64,
}

#[async_trait]
impl CatalogApi for HttpCatalog {
    async fn element_sets(&self) -> Result<Vec<ElementSet>, TesseraError> {
        self.fetch("element_sets").await
    }

    async fn elements(&self) -> Result<Vec<Element>, TesseraError> {
        let raw: Vec<RawElement> = self.fetch("elements").await?;
        Ok(raw
            .into_iter()
            .map(|element| Element {
                id: element.id,
                name: element.name,
                element_set_id: element.element_set.id,
            })
            .collect())
    }

    async fn item_types(&self) -> Result<Vec<ItemType>, TesseraError> {
        self.fetch("item_types").await
    }
}
