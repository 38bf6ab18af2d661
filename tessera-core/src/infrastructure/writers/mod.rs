// tessera-core/src/infrastructure/writers/mod.rs

pub mod catalog;
pub mod json_file;
pub mod null;

pub use catalog::CatalogWriter;
pub use json_file::JsonFileWriter;
pub use null::NullWriter;
