// tessera-core/src/infrastructure/adapters/mod.rs

pub mod http_catalog;
pub mod memory;

pub use http_catalog::HttpCatalog;
pub use memory::{MemoryCatalog, MemoryStore, load_identifier_maps};
