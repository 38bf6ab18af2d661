// tessera-core/src/domain/identifiers.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

// --- CATALOG LISTING SHAPES (as returned by the catalog port) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSet {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: u64,
    pub name: String,
    pub element_set_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemType {
    pub id: u64,
    pub name: String,
}

/// The four name→identifier lookup tables, built once per run and shared
/// read-only across workers. Rule construction resolves names against these
/// tables exactly once; the resolved ids are never refreshed per record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifierMaps {
    /// element set name → element name → element id
    pub elements: HashMap<String, HashMap<String, u64>>,
    /// item type name → item type id
    pub item_types: HashMap<String, u64>,
    /// collection name → collection id
    pub collections: HashMap<String, u64>,
    /// item external identifier → existing internal item id
    pub items: HashMap<String, u64>,
}

impl IdentifierMaps {
    pub fn from_parts(
        element_sets: Vec<ElementSet>,
        elements: Vec<Element>,
        item_types: Vec<ItemType>,
        collections: Vec<(String, u64)>,
        items: Vec<(String, u64)>,
    ) -> Self {
        let set_names: HashMap<u64, String> = element_sets
            .iter()
            .map(|set| (set.id, set.name.clone()))
            .collect();

        let mut element_map: HashMap<String, HashMap<String, u64>> = element_sets
            .into_iter()
            .map(|set| (set.name, HashMap::new()))
            .collect();

        for element in elements {
            match set_names.get(&element.element_set_id) {
                Some(set_name) => {
                    element_map
                        .entry(set_name.clone())
                        .or_default()
                        .insert(element.name, element.id);
                }
                None => {
                    warn!(
                        element = %element.name,
                        element_set_id = element.element_set_id,
                        "element references an unknown element set, ignoring"
                    );
                }
            }
        }

        Self {
            elements: element_map,
            item_types: item_types.into_iter().map(|t| (t.name, t.id)).collect(),
            collections: collections.into_iter().collect(),
            items: items.into_iter().collect(),
        }
    }

    pub fn element_id(&self, element_set_name: &str, element_name: &str) -> Option<u64> {
        self.elements.get(element_set_name)?.get(element_name).copied()
    }

    pub fn item_type_id(&self, item_type_name: &str) -> Option<u64> {
        self.item_types.get(item_type_name).copied()
    }

    pub fn collection_id(&self, collection_name: &str) -> Option<u64> {
        self.collections.get(collection_name).copied()
    }

    /// Internal id of an already-imported item, keyed by its external
    /// identifier.
    pub fn item_id(&self, external_identifier: &str) -> Option<u64> {
        self.items.get(external_identifier).copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_maps() -> IdentifierMaps {
        IdentifierMaps::from_parts(
            vec![
                ElementSet { id: 1, name: "Dublin Core".into() },
                ElementSet { id: 3, name: "Item Type Metadata".into() },
            ],
            vec![
                Element { id: 43, name: "Title".into(), element_set_id: 1 },
                Element { id: 50, name: "Birth Date".into(), element_set_id: 3 },
                Element { id: 99, name: "Orphan".into(), element_set_id: 42 },
            ],
            vec![ItemType { id: 12, name: "Person".into() }],
            vec![("Letters".into(), 5)],
            vec![("people_0042".into(), 731)],
        )
    }

    #[test]
    fn test_two_level_element_lookup() {
        let maps = sample_maps();
        assert_eq!(maps.element_id("Dublin Core", "Title"), Some(43));
        assert_eq!(maps.element_id("Item Type Metadata", "Birth Date"), Some(50));
        assert_eq!(maps.element_id("Dublin Core", "Birth Date"), None);
        assert_eq!(maps.element_id("Nope", "Title"), None);
    }

    #[test]
    fn test_elements_with_unknown_set_are_dropped() {
        let maps = sample_maps();
        assert!(maps.elements.values().all(|set| !set.contains_key("Orphan")));
    }

    #[test]
    fn test_scalar_lookups() {
        let maps = sample_maps();
        assert_eq!(maps.item_type_id("Person"), Some(12));
        assert_eq!(maps.collection_id("Letters"), Some(5));
        assert_eq!(maps.item_id("people_0042"), Some(731));
        assert_eq!(maps.item_id("people_9999"), None);
    }

    #[test]
    fn test_fixture_round_trip() {
        let maps = sample_maps();
        let json = serde_json::to_string(&maps).unwrap();
        let restored: IdentifierMaps = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.element_id("Dublin Core", "Title"), Some(43));
    }
}
