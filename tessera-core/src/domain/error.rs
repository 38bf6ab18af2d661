// tessera-core/src/domain/error.rs

use crate::domain::diagnostics::ConfigLoadError;
use crate::domain::rules::DeclLocation;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Naming error at {location}: {detail}")]
    #[diagnostic(
        code(tessera::domain::naming),
        help("Element rules need a non-empty element name and element set name.")
    )]
    Naming {
        detail: String,
        location: DeclLocation,
    },

    #[error("Arity error at {location}: {detail}")]
    #[diagnostic(
        code(tessera::domain::arity),
        help("Extraction callables take (item, accumulator) or (item, accumulator, context).")
    )]
    Arity {
        detail: String,
        location: DeclLocation,
    },

    #[error("Item type '{0}' does not resolve to a catalog identifier")]
    #[diagnostic(code(tessera::domain::unknown_item_type))]
    UnknownItemType(String),

    #[error("Element '{element}' in set '{element_set}' does not resolve to a catalog identifier")]
    #[diagnostic(code(tessera::domain::unknown_element))]
    UnknownElement {
        element: String,
        element_set: String,
    },

    #[error("Error mapping record id `{item_id}` at position {position} while executing {rule}")]
    #[diagnostic(code(tessera::domain::mapping))]
    Mapping {
        position: usize,
        item_id: String,
        rule: String,
        #[source]
        source: Box<crate::error::TesseraError>,
    },

    #[error(transparent)]
    #[diagnostic(code(tessera::domain::config_load))]
    ConfigLoad(#[from] ConfigLoadError),
}
