// tessera-core/src/domain/rules/mod.rs

pub mod builder;
pub mod extract;
pub mod item_type;
pub mod predicate;
pub mod step;

pub use builder::{ImporterBuilder, ItemTypeScope};
pub use extract::{Accumulator, Extract};
pub use item_type::{ItemTypeRule, RuleTree};
pub use predicate::{Predicate, PredicateRegistry};
pub use step::{CollectionRule, ElementRule, FieldRule, MapRule};

use std::fmt;

/// Source location captured when a rule is declared. Reported back on every
/// construction or mapping failure involving the rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclLocation {
    pub file: String,
    pub line: u32,
}

impl DeclLocation {
    #[track_caller]
    pub fn capture() -> Self {
        let caller = std::panic::Location::caller();
        Self {
            file: caller.file().to_string(),
            line: caller.line(),
        }
    }
}

impl fmt::Display for DeclLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Cheap description of a rule, carried on the context while the rule runs
/// and used only for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInfo {
    pub kind: &'static str,
    pub name: String,
    pub location: DeclLocation,
}

impl fmt::Display for RuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} at {})", self.kind, self.name, self.location)
    }
}
