// tessera-core/src/domain/mod.rs

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod identifiers;
pub mod record;
pub mod rules;
pub mod settings;

pub use context::Context;
pub use diagnostics::ConfigLoadError;
pub use error::DomainError;
pub use identifiers::IdentifierMaps;
pub use record::ItemRecord;
pub use settings::SettingsStore;
