// tessera-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts consumed by the pipeline (reader, writer, catalog, store).
pub mod ports;

// 2. Domain (Core logic)
// Settings, identifier maps, rule tree, per-record context, diagnostics.
// Depends on nothing else (no infra, no app).
pub mod domain;

// 3. Infrastructure (Adapters)
// Technical implementations (XML reader, HTTP catalog, writers).
// Depends on the domain and the ports.
pub mod infrastructure;

// 4. Application (Use Cases)
// Orchestration (pipeline driver, identifier resolution).
// Depends on the domain, the infra and the ports.
pub mod application;

// Extraction helpers exposed to mapping declarations.
pub mod macros;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use application::importer::{ImportReport, Importer};
pub use domain::rules::builder::ImporterBuilder;
pub use error::TesseraError;
