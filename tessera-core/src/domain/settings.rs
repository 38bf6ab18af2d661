// tessera-core/src/domain/settings.rs

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Configuration map for an [`Importer`](crate::Importer), passed along to the
/// readers and writers it interacts with.
///
/// Keys are case-insensitive strings, values are free-form JSON scalars.
/// `provide` is a cautious store: it only writes when the key has not been
/// explicitly set yet, and an explicit `false` or `null` still counts as set.
///
/// There is also a built-in defaults table, consulted on read misses. Call
/// [`fill_in_defaults`](SettingsStore::fill_in_defaults) once configuration
/// loading is done to materialize every default for inspection.
#[derive(Clone, Default)]
pub struct SettingsStore {
    entries: BTreeMap<String, Value>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut store = Self::new();
        for (key, value) in pairs {
            store.set(key.into(), value);
        }
        store
    }

    fn normalize(key: &str) -> String {
        key.to_ascii_lowercase()
    }

    /// Explicit entry first, then the defaults table.
    pub fn get(&self, key: &str) -> Option<Value> {
        let key = Self::normalize(key);
        if let Some(value) = self.entries.get(&key) {
            return Some(value.clone());
        }
        Self::defaults()
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.clone())
    }

    /// Has the key been explicitly set? Defaults do not count.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&Self::normalize(key))
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(Self::normalize(&key.into()), value);
    }

    /// Cautious store: writes only if there was no explicit value for `key`.
    /// Unlike a falsy-guard, an existing `false` or `null` beats the new value.
    pub fn provide(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if !self.contains(&key) {
            self.set(key, value);
        }
    }

    /// Materialize every default into the explicit layer, never overwriting
    /// an explicit entry.
    pub fn fill_in_defaults(&mut self) {
        for (key, value) in Self::defaults() {
            self.provide(*key, value.clone());
        }
    }

    // --- TYPED VIEWS (driver-side conveniences) ---

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Numeric read, tolerant of numeric strings.
    pub fn get_usize(&self, key: &str) -> Option<usize> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean read, tolerant of `"true"` strings. Missing keys are false.
    pub fn get_flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }

    fn defaults() -> &'static [(&'static str, Value)] {
        static DEFAULTS: std::sync::OnceLock<Vec<(&'static str, Value)>> =
            std::sync::OnceLock::new();
        DEFAULTS.get_or_init(|| {
            vec![
                // Reader / writer selectors
                ("reader", Value::String("xml".into())),
                ("writer", Value::String("catalog".into())),
                // Threading and logging
                ("processing_thread_pool", Value::from(1u64)),
                ("log.batch_size.severity", Value::String("info".into())),
            ]
        })
    }

    /// Entries with any key ending in `password` hidden. Used by both the
    /// `Debug` and `Serialize` forms.
    fn redacted(&self) -> BTreeMap<&str, Value> {
        self.entries
            .iter()
            .map(|(key, value)| {
                if key.ends_with("password") {
                    (key.as_str(), Value::String("[hidden]".into()))
                } else {
                    (key.as_str(), value.clone())
                }
            })
            .collect()
    }
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.redacted()).finish()
    }
}

impl Serialize for SettingsStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let redacted = self.redacted();
        let mut map = serializer.serialize_map(Some(redacted.len()))?;
        for (key, value) in redacted {
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}
