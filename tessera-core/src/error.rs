// tessera-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TesseraError {
    // --- DOMAIN ERRORS (declaration, resolution, mapping) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, HTTP, parsing) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATIVE ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),

    #[error("After-processing step '{step}' failed: {source}")]
    AfterProcessing {
        step: String,
        #[source]
        source: Box<TesseraError>,
    },
}

// Manual implementation to avoid duplicate enum variants but keep ergonomics
impl From<std::io::Error> for TesseraError {
    fn from(err: std::io::Error) -> Self {
        TesseraError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<reqwest::Error> for TesseraError {
    fn from(err: reqwest::Error) -> Self {
        TesseraError::Infrastructure(InfrastructureError::Http(err))
    }
}
