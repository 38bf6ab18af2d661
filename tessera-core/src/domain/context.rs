// tessera-core/src/domain/context.rs

use crate::domain::identifiers::IdentifierMaps;
use crate::domain::record::ItemRecord;
use crate::domain::rules::RuleInfo;
use crate::domain::settings::SettingsStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-record mutable state threaded through rule execution for one record's
/// processing pass. Each context belongs to exactly one in-flight task and is
/// never shared; the settings and identifier maps it points at are read-only.
pub struct Context<I> {
    /// Free-form scratch space for extraction callables. Lives for one record.
    clipboard: HashMap<String, Value>,
    output: Option<ItemRecord>,
    skip: bool,
    skip_message: Option<String>,
    /// Set only while a rule runs, used solely for diagnostics.
    current_rule: Option<RuleInfo>,
    source_item: Arc<I>,
    source_item_id: String,
    /// 1-based position in the stream of processed records.
    position: usize,
    settings: Arc<SettingsStore>,
    maps: Arc<IdentifierMaps>,
}

impl<I> Context<I> {
    pub fn new(
        source_item: I,
        source_item_id: impl Into<String>,
        position: usize,
        settings: Arc<SettingsStore>,
        maps: Arc<IdentifierMaps>,
    ) -> Self {
        Self {
            clipboard: HashMap::new(),
            output: None,
            skip: false,
            skip_message: None,
            current_rule: None,
            source_item: Arc::new(source_item),
            source_item_id: source_item_id.into(),
            position,
            settings,
            maps,
        }
    }

    // --- SOURCE SIDE ---

    pub fn source_item(&self) -> Arc<I> {
        self.source_item.clone()
    }

    pub fn source_item_id(&self) -> &str {
        &self.source_item_id
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn maps(&self) -> &IdentifierMaps {
        &self.maps
    }

    // --- SCRATCH SPACE ---

    pub fn clipboard(&self) -> &HashMap<String, Value> {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.clipboard
    }

    // --- SKIP CONTROL ---

    /// Mark this record as skipped; remaining rules are not run and any
    /// partially built output is discarded.
    pub fn skip(&mut self, message: impl Into<String>) {
        self.skip = true;
        self.skip_message = Some(message.into());
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    pub fn skip_message(&self) -> &str {
        self.skip_message.as_deref().unwrap_or("(no message given)")
    }

    // --- OUTPUT RECORD ---

    pub(crate) fn set_output(&mut self, record: ItemRecord) {
        self.output = Some(record);
    }

    pub fn output(&self) -> Option<&ItemRecord> {
        self.output.as_ref()
    }

    pub fn take_output(&mut self) -> Option<ItemRecord> {
        self.output.take()
    }

    // --- DIAGNOSTICS MARKER ---

    pub(crate) fn set_current_rule(&mut self, info: RuleInfo) {
        self.current_rule = Some(info);
    }

    pub(crate) fn clear_current_rule(&mut self) {
        self.current_rule = None;
    }

    pub fn current_rule(&self) -> Option<&RuleInfo> {
        self.current_rule.as_ref()
    }
}

#[cfg(test)]
impl<I> Context<I> {
    /// Bare context over default settings and empty maps, for unit tests.
    pub(crate) fn for_tests(source_item: I) -> Self {
        Self::new(
            source_item,
            "test_item",
            1,
            Arc::new(SettingsStore::new()),
            Arc::new(IdentifierMaps::default()),
        )
    }
}
