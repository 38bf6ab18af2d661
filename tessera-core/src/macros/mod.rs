// tessera-core/src/macros/mod.rs

pub mod xpath;

pub use xpath::extract_xpath;
