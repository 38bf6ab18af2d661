// tessera-core/src/infrastructure/readers/mod.rs

pub mod xml;

pub use xml::{XmlDocument, XmlNode, XmlReader};
