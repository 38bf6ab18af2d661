// tessera-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod error;
pub mod readers;
pub mod writers;

pub use error::InfrastructureError;
