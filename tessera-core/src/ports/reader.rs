// tessera-core/src/ports/reader.rs

/// One entry of the source stream: an opaque source item plus the external
/// identifier the routing predicates see.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord<I> {
    pub item: I,
    pub item_id: String,
}

impl<I> SourceRecord<I> {
    pub fn new(item: I, item_id: impl Into<String>) -> Self {
        Self {
            item,
            item_id: item_id.into(),
        }
    }
}

/// A reader is any lazy, finite, one-shot sequence of source records. The
/// driver consumes it strictly sequentially on a single producer; record
/// position is this read order, 1-based.
pub trait ItemReader<I>: Iterator<Item = SourceRecord<I>> + Send {}

impl<I, T> ItemReader<I> for T where T: Iterator<Item = SourceRecord<I>> + Send {}
