// tessera-core/src/domain/record.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Field name holding the multi-valued element text list.
pub const ELEMENT_TEXTS: &str = "element_texts";

/// Only `tags` and `element_texts` are multi-valued fields.
const MULTI_VALUED: [&str; 2] = [ELEMENT_TEXTS, "tags"];

/// An `{id: ...}` reference to a catalog object (item type, collection...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: Value,
}

/// One entry of the element text list: a raw text value tagged with the
/// catalog identifier of its element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementText {
    pub html: bool,
    pub element: IdRef,
    pub text: Value,
}

impl ElementText {
    pub fn plain(element_id: u64, text: Value) -> Self {
        Self {
            html: false,
            element: IdRef {
                id: Value::from(element_id),
            },
            text,
        }
    }
}

/// The normalized output record built for one source item, keyed by field
/// name. Serializes directly to the catalog's JSON item representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRecord {
    fields: Map<String, Value>,
}

impl ItemRecord {
    /// Seed record for an item-type rule: empty element list, resolved item
    /// type id, catalog visibility defaults.
    pub fn seeded(item_type_id: u64) -> Self {
        let mut fields = Map::new();
        fields.insert(ELEMENT_TEXTS.into(), json!([]));
        fields.insert("item_type".into(), json!({ "id": item_type_id }));
        fields.insert("public".into(), json!(true));
        fields.insert("featured".into(), json!(false));
        Self { fields }
    }

    /// Merge one rule's values under `field`. Multi-valued fields concatenate
    /// in arrival order; everything else is overwritten with the last value,
    /// so the last declaration wins.
    pub fn merge(&mut self, field: &str, values: Vec<Value>) {
        if MULTI_VALUED.contains(&field) {
            let list = self
                .fields
                .entry(field.to_string())
                .or_insert_with(|| json!([]));
            if let Value::Array(list) = list {
                list.extend(values);
            }
        } else {
            self.fields
                .insert(field.to_string(), values.into_iter().next_back().unwrap_or(Value::Null));
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn item_type_id(&self) -> Option<u64> {
        self.fields.get("item_type")?.get("id")?.as_u64()
    }

    pub fn element_texts(&self) -> Vec<ElementText> {
        self.fields
            .get(ELEMENT_TEXTS)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.fields)
    }
}
