// tessera-core/src/domain/rules/builder.rs

use crate::domain::identifiers::IdentifierMaps;
use crate::domain::rules::extract::Extract;
use crate::domain::rules::item_type::{ItemTypeRule, RuleTree};
use crate::domain::rules::predicate::{Predicate, PredicateRegistry};
use crate::domain::rules::step::{CollectionRule, ElementRule, FieldRule, MapRule};
use crate::domain::rules::DeclLocation;
use crate::error::TesseraError;
use std::sync::Arc;

/// Declaration API for the rule tree. Rules are declared in order, validated
/// eagerly, and frozen into an immutable [`RuleTree`] by [`build`].
///
/// Every declaration records its caller location; the accumulated trace is
/// what [`ConfigLoadError`](crate::domain::diagnostics::ConfigLoadError)
/// reports when a mapping config fails to load.
///
/// [`build`]: ImporterBuilder::build
pub struct ImporterBuilder<I> {
    maps: Arc<IdentifierMaps>,
    registry: PredicateRegistry,
    rules: Vec<ItemTypeRule<I>>,
    trace: Vec<DeclLocation>,
}

impl<I> std::fmt::Debug for ImporterBuilder<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImporterBuilder")
            .field("rules", &self.rules.len())
            .field("trace", &self.trace)
            .finish()
    }
}

impl<I> ImporterBuilder<I> {
    pub fn new(maps: Arc<IdentifierMaps>) -> Self {
        Self {
            maps,
            registry: PredicateRegistry::new(),
            rules: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// Register a predicate that `Predicate::Named` declarations dispatch to.
    pub fn register_predicate(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.registry.register(name, f);
        self
    }

    /// Open an item-type scope. The predicate shape is resolved here, once;
    /// the item type name must resolve to a catalog id or declaration fails.
    #[track_caller]
    pub fn item_type(
        &mut self,
        name: &str,
        predicate: Predicate,
        declare: impl FnOnce(&mut ItemTypeScope<'_, I>) -> Result<(), TesseraError>,
    ) -> Result<&mut Self, TesseraError> {
        let location = DeclLocation::capture();
        self.trace.push(location.clone());

        let mut scope = ItemTypeScope {
            maps: &self.maps,
            rules: Vec::new(),
            trace: &mut self.trace,
        };
        declare(&mut scope)?;
        let rules = scope.rules;

        let resolved = predicate.resolve(&self.registry);
        self.rules
            .push(ItemTypeRule::new(name, &self.maps, resolved, rules, location)?);
        Ok(self)
    }

    /// Declaration locations seen so far, in declaration order.
    pub fn declaration_trace(&self) -> &[DeclLocation] {
        &self.trace
    }

    pub fn build(self) -> RuleTree<I> {
        RuleTree::new(self.rules)
    }
}

/// Scope opened by [`ImporterBuilder::item_type`], declaring the child rules
/// of one item-type rule.
pub struct ItemTypeScope<'a, I> {
    maps: &'a IdentifierMaps,
    rules: Vec<MapRule<I>>,
    trace: &'a mut Vec<DeclLocation>,
}

impl<'a, I> ItemTypeScope<'a, I> {
    /// Declare a field rule. The distinguished name `collection` declares a
    /// collection rule instead, wrapping each value as an id reference.
    #[track_caller]
    pub fn to_field(
        &mut self,
        field_name: &str,
        extract: Option<Extract<I>>,
        refine: Option<Extract<I>>,
    ) -> Result<&mut Self, TesseraError> {
        let location = DeclLocation::capture();
        self.trace.push(location.clone());
        let rule = if field_name == "collection" {
            MapRule::Collection(CollectionRule::new(extract, refine, location))
        } else {
            MapRule::Field(FieldRule::new(field_name, extract, refine, location))
        };
        self.rules.push(rule);
        Ok(self)
    }

    /// Declare an element rule; name, set name and identifier resolution are
    /// validated here, before any record is read.
    #[track_caller]
    pub fn to_element(
        &mut self,
        element_name: &str,
        element_set_name: &str,
        extract: Option<Extract<I>>,
        refine: Option<Extract<I>>,
    ) -> Result<&mut Self, TesseraError> {
        let location = DeclLocation::capture();
        self.trace.push(location.clone());
        let rule = ElementRule::new(
            element_name,
            element_set_name,
            self.maps,
            extract,
            refine,
            location,
        )?;
        self.rules.push(MapRule::Element(rule));
        Ok(self)
    }
}
