// tessera-core/src/application/mod.rs

pub mod importer;
pub mod resolver;

pub use importer::{ImportReport, Importer};
pub use resolver::IdentifierResolver;
