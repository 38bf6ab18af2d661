// tessera-core/src/domain/rules/item_type.rs

use crate::domain::context::Context;
use crate::domain::error::DomainError;
use crate::domain::identifiers::IdentifierMaps;
use crate::domain::record::ItemRecord;
use crate::domain::rules::predicate::ResolvedPredicate;
use crate::domain::rules::step::MapRule;
use crate::domain::rules::{DeclLocation, RuleInfo};
use crate::error::TesseraError;
use tracing::error;

/// Top-level per-record dispatch rule. Holds its child rules in declaration
/// order and produces one output record when its predicate accepts.
pub struct ItemTypeRule<I> {
    name: String,
    item_type_id: u64,
    predicate: ResolvedPredicate,
    rules: Vec<MapRule<I>>,
    location: DeclLocation,
}

impl<I> ItemTypeRule<I> {
    /// The item type name is resolved against the identifier maps exactly
    /// once, here. An unresolvable name is a fatal configuration defect.
    pub(crate) fn new(
        name: impl Into<String>,
        maps: &IdentifierMaps,
        predicate: ResolvedPredicate,
        rules: Vec<MapRule<I>>,
        location: DeclLocation,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        let item_type_id = maps
            .item_type_id(&name)
            .ok_or_else(|| DomainError::UnknownItemType(name.clone()))?;
        Ok(Self {
            name,
            item_type_id,
            predicate,
            rules,
            location,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn item_type_id(&self) -> u64 {
        self.item_type_id
    }

    pub fn info(&self) -> RuleInfo {
        RuleInfo {
            kind: "to_item_type",
            name: self.name.clone(),
            location: self.location.clone(),
        }
    }

    pub fn can_process(&self, external_id: &str) -> bool {
        self.predicate.accepts(external_id)
    }

    /// Build the output record: seed it with the resolved item type id, then
    /// run each child rule in declaration order, merging by kind. Stops as
    /// soon as the context's skip flag is set.
    pub fn execute(&self, context: &mut Context<I>) -> Result<ItemRecord, TesseraError> {
        let mut record = ItemRecord::seeded(self.item_type_id);
        for rule in &self.rules {
            if context.is_skipped() {
                break;
            }
            context.set_current_rule(rule.info());
            let outcome = rule.execute(context);
            let values = log_mapping_errors(context, outcome)?;
            record.merge(rule.field_name(), values);
            context.clear_current_rule();
        }
        Ok(record)
    }
}

/// Log a mapping failure with everything a reader needs to find the record
/// and the rule, then propagate it unchanged in substance.
fn log_mapping_errors<I, T>(
    context: &mut Context<I>,
    result: Result<T, TesseraError>,
) -> Result<T, TesseraError> {
    result.map_err(|source| {
        let rule = context
            .current_rule()
            .map(|info| info.to_string())
            .unwrap_or_else(|| "(unknown rule)".to_string());
        error!(
            position = context.position(),
            item_id = %context.source_item_id(),
            rule = %rule,
            error = %source,
            "unexpected error while mapping record"
        );
        TesseraError::Domain(DomainError::Mapping {
            position: context.position(),
            item_id: context.source_item_id().to_string(),
            rule,
            source: Box::new(source),
        })
    })
}

/// The immutable rule tree: item-type rules in declaration order. Exactly one
/// fires per record — the first whose predicate accepts the external id.
pub struct RuleTree<I> {
    rules: Vec<ItemTypeRule<I>>,
}

impl<I> std::fmt::Debug for RuleTree<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleTree")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl<I> RuleTree<I> {
    pub(crate) fn new(rules: Vec<ItemTypeRule<I>>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// One execution pass for one record. On success the finished record is
    /// placed on the context; a skipped record leaves no output behind.
    pub fn map_record(&self, context: &mut Context<I>) -> Result<(), TesseraError> {
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.can_process(context.source_item_id()));
        match rule {
            Some(rule) => {
                let record = rule.execute(context)?;
                if !context.is_skipped() {
                    context.set_output(record);
                }
                Ok(())
            }
            None => {
                context.skip("no item type rule matched the external id");
                Ok(())
            }
        }
    }
}
