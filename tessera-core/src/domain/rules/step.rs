// tessera-core/src/domain/rules/step.rs

use crate::domain::context::Context;
use crate::domain::error::DomainError;
use crate::domain::identifiers::IdentifierMaps;
use crate::domain::record::{ELEMENT_TEXTS, ElementText};
use crate::domain::rules::extract::{Accumulator, Extract};
use crate::domain::rules::{DeclLocation, RuleInfo};
use crate::error::TesseraError;
use serde_json::{Value, json};

/// Shared accumulator protocol of the child rules: run the extraction
/// callable, then the refinement callable, each against the same accumulator.
pub(crate) struct RuleCore<I> {
    name: String,
    extract: Option<Extract<I>>,
    refine: Option<Extract<I>>,
    location: DeclLocation,
}

impl<I> RuleCore<I> {
    fn new(
        name: impl Into<String>,
        extract: Option<Extract<I>>,
        refine: Option<Extract<I>>,
        location: DeclLocation,
    ) -> Self {
        Self {
            name: name.into(),
            extract,
            refine,
            location,
        }
    }

    fn execute(&self, context: &mut Context<I>) -> Result<Accumulator, TesseraError> {
        let mut accumulator = Accumulator::new();
        let item = context.source_item();
        if let Some(extract) = &self.extract {
            extract.run(&item, &mut accumulator, context)?;
        }
        if let Some(refine) = &self.refine {
            refine.run(&item, &mut accumulator, context)?;
        }
        Ok(accumulator)
    }
}

/// Writes its accumulator under a single output field; the last declaration
/// for a field wins.
pub struct FieldRule<I> {
    core: RuleCore<I>,
}

impl<I> FieldRule<I> {
    pub fn new(
        field_name: impl Into<String>,
        extract: Option<Extract<I>>,
        refine: Option<Extract<I>>,
        location: DeclLocation,
    ) -> Self {
        Self {
            core: RuleCore::new(field_name, extract, refine, location),
        }
    }
}

/// Multi-valued: tags each accumulated value with the element id resolved at
/// construction and appends to the record's element text list.
pub struct ElementRule<I> {
    core: RuleCore<I>,
    element_name: String,
    element_set_name: String,
    element_id: u64,
}

impl<I> ElementRule<I> {
    /// Fails fast on an empty element or set name, and on a name that does
    /// not resolve in the identifier maps.
    pub fn new(
        element_name: impl Into<String>,
        element_set_name: impl Into<String>,
        maps: &IdentifierMaps,
        extract: Option<Extract<I>>,
        refine: Option<Extract<I>>,
        location: DeclLocation,
    ) -> Result<Self, DomainError> {
        let element_name = element_name.into();
        let element_set_name = element_set_name.into();
        if element_name.is_empty() {
            return Err(DomainError::Naming {
                detail: "to_element requires the element name as the first argument".into(),
                location,
            });
        }
        if element_set_name.is_empty() {
            return Err(DomainError::Naming {
                detail: "to_element requires the element set name as the second argument".into(),
                location,
            });
        }
        let element_id = maps
            .element_id(&element_set_name, &element_name)
            .ok_or_else(|| DomainError::UnknownElement {
                element: element_name.clone(),
                element_set: element_set_name.clone(),
            })?;
        Ok(Self {
            core: RuleCore::new(ELEMENT_TEXTS, extract, refine, location),
            element_name,
            element_set_name,
            element_id,
        })
    }

    pub fn element_id(&self) -> u64 {
        self.element_id
    }
}

/// Multi-valued-protocol rule that wraps each accumulated value as an
/// `{id: value}` collection reference; the record keeps the last one.
pub struct CollectionRule<I> {
    core: RuleCore<I>,
}

impl<I> CollectionRule<I> {
    pub fn new(
        extract: Option<Extract<I>>,
        refine: Option<Extract<I>>,
        location: DeclLocation,
    ) -> Self {
        Self {
            core: RuleCore::new("collection", extract, refine, location),
        }
    }
}

/// A child rule of an item-type rule, merged into the output record by kind.
pub enum MapRule<I> {
    Field(FieldRule<I>),
    Element(ElementRule<I>),
    Collection(CollectionRule<I>),
}

impl<I> MapRule<I> {
    /// The output field this rule's values are merged under.
    pub fn field_name(&self) -> &str {
        match self {
            MapRule::Field(rule) => &rule.core.name,
            MapRule::Element(rule) => &rule.core.name,
            MapRule::Collection(rule) => &rule.core.name,
        }
    }

    pub fn info(&self) -> RuleInfo {
        let (kind, name, location) = match self {
            MapRule::Field(rule) => ("to_field", rule.core.name.clone(), &rule.core.location),
            MapRule::Element(rule) => (
                "to_element",
                format!("{}/{}", rule.element_name, rule.element_set_name),
                &rule.core.location,
            ),
            MapRule::Collection(rule) => {
                ("to_collection", rule.core.name.clone(), &rule.core.location)
            }
        };
        RuleInfo {
            kind,
            name,
            location: location.clone(),
        }
    }

    /// Run the accumulator protocol, then shape the raw values by kind.
    pub fn execute(&self, context: &mut Context<I>) -> Result<Vec<Value>, TesseraError> {
        match self {
            MapRule::Field(rule) => rule.core.execute(context),
            MapRule::Element(rule) => {
                let accumulator = rule.core.execute(context)?;
                Ok(accumulator
                    .into_iter()
                    .map(|value| {
                        serde_json::to_value(ElementText::plain(rule.element_id, value))
                            .unwrap_or(Value::Null)
                    })
                    .collect())
            }
            MapRule::Collection(rule) => {
                let accumulator = rule.core.execute(context)?;
                Ok(accumulator
                    .into_iter()
                    .map(|value| json!({ "id": value }))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::identifiers::{Element, ElementSet, IdentifierMaps};

    fn maps_with_birth_date() -> IdentifierMaps {
        IdentifierMaps::from_parts(
            vec![ElementSet { id: 3, name: "Item Type Metadata".into() }],
            vec![Element { id: 50, name: "Birth Date".into(), element_set_id: 3 }],
            vec![],
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_field_rule_runs_extract_then_refine() {
        let rule = MapRule::Field(FieldRule::new(
            "identifier",
            Some(Extract::with_item(|_, acc| {
                acc.push(json!("raw_value"));
                Ok(())
            })),
            Some(Extract::with_context(|_, acc, _| {
                // Refinement sees what extraction produced.
                let refined = acc
                    .pop()
                    .and_then(|v| v.as_str().map(|s| s.trim_start_matches("raw_").to_string()))
                    .unwrap_or_default();
                acc.push(json!(refined));
                Ok(())
            })),
            DeclLocation::capture(),
        ));
        let mut ctx = Context::for_tests(json!({}));
        let values = rule.execute(&mut ctx).unwrap();
        assert_eq!(values, vec![json!("value")]);
    }

    #[test]
    fn test_element_rule_tags_values_with_resolved_id() {
        let maps = maps_with_birth_date();
        let rule = MapRule::Element(
            ElementRule::new(
                "Birth Date",
                "Item Type Metadata",
                &maps,
                Some(Extract::with_item(|_, acc| {
                    acc.push(json!("1823"));
                    Ok(())
                })),
                None,
                DeclLocation::capture(),
            )
            .unwrap(),
        );
        let mut ctx = Context::for_tests(json!({}));
        let values = rule.execute(&mut ctx).unwrap();
        assert_eq!(
            values,
            vec![json!({"html": false, "element": {"id": 50}, "text": "1823"})]
        );
        assert_eq!(rule.field_name(), ELEMENT_TEXTS);
    }

    #[test]
    fn test_element_rule_requires_names() {
        let maps = maps_with_birth_date();
        let empty_name =
            ElementRule::<Value>::new("", "Item Type Metadata", &maps, None, None, DeclLocation::capture());
        assert!(matches!(empty_name, Err(DomainError::Naming { .. })));
        let empty_set =
            ElementRule::<Value>::new("Birth Date", "", &maps, None, None, DeclLocation::capture());
        assert!(matches!(empty_set, Err(DomainError::Naming { .. })));
    }

    #[test]
    fn test_element_rule_fails_on_unresolved_name() {
        let maps = maps_with_birth_date();
        let unknown = ElementRule::<Value>::new(
            "Death Date",
            "Item Type Metadata",
            &maps,
            None,
            None,
            DeclLocation::capture(),
        );
        assert!(matches!(unknown, Err(DomainError::UnknownElement { .. })));
    }

    #[test]
    fn test_collection_rule_wraps_ids() {
        let rule = MapRule::Collection(CollectionRule::new(
            Some(Extract::with_item(|_, acc| {
                acc.push(json!(5));
                Ok(())
            })),
            None,
            DeclLocation::capture(),
        ));
        let mut ctx = Context::for_tests(json!({}));
        let values = rule.execute(&mut ctx).unwrap();
        assert_eq!(values, vec![json!({"id": 5})]);
        assert_eq!(rule.field_name(), "collection");
    }

    #[test]
    fn test_rule_without_callables_yields_nothing() {
        let rule = MapRule::<Value>::Field(FieldRule::new(
            "identifier",
            None,
            None,
            DeclLocation::capture(),
        ));
        let mut ctx = Context::for_tests(json!({}));
        assert!(rule.execute(&mut ctx).unwrap().is_empty());
    }
}
