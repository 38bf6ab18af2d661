// tessera-core/src/domain/rules/predicate.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

pub type PredicateFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Author-facing routing predicate of an item-type rule, as declared.
/// A closed set of shapes: absent, a named predicate dispatched through the
/// registry, or a callable.
#[derive(Clone, Default)]
pub enum Predicate {
    /// No predicate declared: every external id is accepted.
    #[default]
    AlwaysTrue,
    /// Dispatch by name through the builder's predicate registry.
    Named(String),
    Callable(PredicateFn),
}

impl Predicate {
    pub fn callable(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Predicate::Callable(Arc::new(f))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Predicate::Named(name.into())
    }

    /// Resolve the declared shape once, at construction. A name missing from
    /// the registry resolves to reject-everything rather than raising.
    pub(crate) fn resolve(self, registry: &PredicateRegistry) -> ResolvedPredicate {
        match self {
            Predicate::AlwaysTrue => ResolvedPredicate::AlwaysTrue,
            Predicate::Callable(f) => ResolvedPredicate::Callable(f),
            Predicate::Named(name) => match registry.get(&name) {
                Some(f) => ResolvedPredicate::Callable(f),
                None => {
                    warn!(predicate = %name, "unknown predicate name, rule will reject every record");
                    ResolvedPredicate::Reject
                }
            },
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::AlwaysTrue => write!(f, "Predicate::AlwaysTrue"),
            Predicate::Named(name) => write!(f, "Predicate::Named({:?})", name),
            Predicate::Callable(_) => write!(f, "Predicate::Callable(..)"),
        }
    }
}

/// Predicate after one-time resolution against the registry.
#[derive(Clone)]
pub(crate) enum ResolvedPredicate {
    AlwaysTrue,
    Callable(PredicateFn),
    Reject,
}

impl ResolvedPredicate {
    pub fn accepts(&self, external_id: &str) -> bool {
        match self {
            ResolvedPredicate::AlwaysTrue => true,
            ResolvedPredicate::Callable(f) => f(external_id),
            ResolvedPredicate::Reject => false,
        }
    }
}

/// Named predicates that `Predicate::Named` declarations dispatch to.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    entries: HashMap<String, PredicateFn>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, f: impl Fn(&str) -> bool + Send + Sync + 'static) {
        self.entries.insert(name.into(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<PredicateFn> {
        self.entries.get(name).cloned()
    }
}
