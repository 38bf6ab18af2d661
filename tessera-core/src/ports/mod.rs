// tessera-core/src/ports/mod.rs

pub mod catalog;
pub mod reader;
pub mod store;
pub mod writer;

pub use catalog::CatalogApi;
pub use reader::{ItemReader, SourceRecord};
pub use store::RelationalStore;
pub use writer::ItemWriter;
