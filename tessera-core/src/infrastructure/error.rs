// tessera-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(tessera::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CATALOG HTTP ---
    #[error("Catalog HTTP Error: {0}")]
    #[diagnostic(
        code(tessera::infra::http),
        help("Check the catalog API root and that the service is reachable.")
    )]
    Http(#[from] reqwest::Error),

    #[error("Catalog API returned status {status} for {url}")]
    #[diagnostic(code(tessera::infra::http_status))]
    HttpStatus { status: u16, url: String },

    // --- XML SOURCES ---
    #[error("XML Parsing Error: {0}")]
    #[diagnostic(
        code(tessera::infra::xml),
        help("Check that the source file is well-formed XML.")
    )]
    Xml(#[from] quick_xml::Error),

    // --- CONFIG ---
    #[error("Configuration Error: {0}")]
    #[diagnostic(code(tessera::infra::config))]
    Config(String),
}
