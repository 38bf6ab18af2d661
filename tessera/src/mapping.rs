// tessera/src/mapping.rs
//
// YAML mapping shim: turns a declarative config file into the rule tree.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tessera_core::domain::diagnostics::ConfigLoadError;
use tessera_core::domain::error::DomainError;
use tessera_core::domain::identifiers::IdentifierMaps;
use tessera_core::domain::rules::{DeclLocation, Extract, ImporterBuilder, Predicate, RuleTree};
use tessera_core::error::TesseraError;
use tessera_core::infrastructure::error::InfrastructureError;
use tessera_core::infrastructure::readers::xml::XmlDocument;
use tessera_core::macros::extract_xpath;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    pub item_types: Vec<ItemTypeDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemTypeDecl {
    pub name: String,
    /// Substring of the external id this item type claims; absent claims all.
    #[serde(rename = "match")]
    pub matches: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub elements: Vec<ElementDecl>,
    /// Path whose value names the collection the item belongs to.
    pub collection: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,
    pub xpath: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementDecl {
    pub name: String,
    pub set: String,
    pub xpath: String,
}

/// Load `path` and declare its rules against the builder API. Any failure is
/// wrapped in [`ConfigLoadError`] so the report names the config file and,
/// best effort, the offending line.
pub fn load_mapping(
    path: &Path,
    maps: Arc<IdentifierMaps>,
) -> Result<RuleTree<XmlDocument>, TesseraError> {
    let content = std::fs::read_to_string(path).map_err(|err| wrap(path, &[], err.into()))?;
    let config: MappingConfig = serde_yaml::from_str(&content)
        .map_err(|err| wrap(path, &[], InfrastructureError::Config(err.to_string()).into()))?;

    let mut builder = ImporterBuilder::new(maps);
    for decl in config.item_types {
        let predicate = match decl.matches.clone() {
            Some(needle) => Predicate::callable(move |id: &str| id.contains(&needle)),
            None => Predicate::AlwaysTrue,
        };
        let outcome = builder
            .item_type(&decl.name, predicate, |rules| {
                for field in &decl.fields {
                    rules.to_field(&field.name, Some(extract_xpath(field.xpath.clone())), None)?;
                }
                for element in &decl.elements {
                    rules.to_element(
                        &element.name,
                        &element.set,
                        Some(extract_xpath(element.xpath.clone())),
                        None,
                    )?;
                }
                if let Some(xpath) = decl.collection.clone() {
                    rules.to_field("collection", Some(collection_lookup(xpath)), None)?;
                }
                Ok(())
            })
            .map(|_| ());
        if let Err(err) = outcome {
            let trace = builder.declaration_trace().to_vec();
            return Err(wrap(path, &trace, err));
        }
    }
    Ok(builder.build())
}

/// The selected value is a collection name; the output field wants its id.
/// Names absent from the maps contribute nothing.
fn collection_lookup(xpath: String) -> Extract<XmlDocument> {
    Extract::with_context(move |document: &XmlDocument, accumulator, context| {
        for name in document.select(&xpath) {
            if let Some(id) = context.maps().collection_id(&name) {
                accumulator.push(json!(id));
            }
        }
        Ok(())
    })
}

fn wrap(path: &Path, trace: &[DeclLocation], original: TesseraError) -> TesseraError {
    TesseraError::Domain(DomainError::ConfigLoad(ConfigLoadError::new(
        path, trace, original,
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tessera_core::domain::identifiers::{Element, ElementSet, ItemType};

    fn sample_maps() -> Arc<IdentifierMaps> {
        Arc::new(IdentifierMaps::from_parts(
            vec![ElementSet { id: 3, name: "Item Type Metadata".into() }],
            vec![Element { id: 50, name: "Birth Date".into(), element_set_id: 3 }],
            vec![
                ItemType { id: 12, name: "Person".into() },
                ItemType { id: 13, name: "Organization".into() },
            ],
            vec![("Letters".into(), 7)],
            vec![],
        ))
    }

    fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.yml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_loads_a_full_mapping() {
        let (_dir, path) = write_config(
            r#"
item_types:
  - name: Person
    match: person
    fields:
      - name: identifier
        xpath: "/person/@id"
    elements:
      - name: Birth Date
        set: Item Type Metadata
        xpath: "//birth"
    collection: "//collection"
  - name: Organization
    match: org
"#,
        );
        let tree = load_mapping(&path, sample_maps()).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_syntax_error_reports_file_and_line() {
        let (_dir, path) = write_config("item_types:\n  - name: Person\n   bad indent: [\n");
        let err = load_mapping(&path, sample_maps()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Error loading configuration file"));
        assert!(message.contains("mapping.yml"));
        match err {
            TesseraError::Domain(DomainError::ConfigLoad(load)) => {
                // serde_yaml messages carry "at line N column M".
                assert!(load.lineno.is_some());
            }
            other => panic!("expected a config load error, got {other}"),
        }
    }

    #[test]
    fn test_unknown_element_is_a_declaration_failure() {
        let (_dir, path) = write_config(
            r#"
item_types:
  - name: Person
    elements:
      - name: Shoe Size
        set: Item Type Metadata
        xpath: "//shoe"
"#,
        );
        let err = load_mapping(&path, sample_maps()).unwrap_err();
        assert!(err.to_string().starts_with("Error loading configuration file"));
        assert!(err.to_string().contains("Shoe Size"));
    }

    #[test]
    fn test_collection_names_resolve_to_ids() {
        let (_dir, path) = write_config(
            r#"
item_types:
  - name: Person
    collection: "//collection"
"#,
        );
        let tree = load_mapping(&path, sample_maps()).unwrap();
        let doc =
            XmlDocument::parse("<person><collection>Letters</collection></person>", false).unwrap();
        let mut ctx = tessera_core::domain::Context::new(
            doc,
            "person_1",
            1,
            Arc::new(Default::default()),
            sample_maps(),
        );
        tree.map_record(&mut ctx).unwrap();
        let record = ctx.take_output().unwrap();
        assert_eq!(record.get("collection"), Some(&json!({"id": 7})));
    }
}
