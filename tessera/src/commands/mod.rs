// tessera/src/commands/mod.rs

pub mod import;
