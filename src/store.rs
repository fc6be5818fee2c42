//! Storage behind a subtitle list.
//!
//! The list owns ordering, identity and history; a [`TimeCodeStore`] only
//! keeps per-entry values in document order and knows how to read and write
//! an interchange format.

use crate::entry::{EntryAttrs, Region};
use crate::error::Result;
use crate::parser::Parser;
use crate::serialiser;

/// Opaque handle to a record in a store. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(u64);

/// Primitive per-entry storage. Getters on a handle the store does not know
/// return empty values; setters on one do nothing.
pub trait TimeCodeStore: Default {
    fn deserialize(text: &str) -> Result<Self>;
    fn serialize(&self) -> String;

    /// Handles of every record, in document order. Lists expect synced
    /// records to come first.
    fn nodes(&self) -> Vec<NodeHandle>;

    /// Creates a record at position `index` in document order.
    fn add_entry(&mut self, index: usize, attrs: &EntryAttrs) -> NodeHandle;
    fn remove_entry(&mut self, node: NodeHandle);

    fn start_time(&self, node: NodeHandle) -> Option<i64>;
    fn set_start_time(&mut self, node: NodeHandle, time: Option<i64>);
    fn end_time(&self, node: NodeHandle) -> Option<i64>;
    fn set_end_time(&mut self, node: NodeHandle, time: Option<i64>);
    fn content(&self, node: NodeHandle) -> &str;
    fn set_content(&mut self, node: NodeHandle, content: &str);
    fn region(&self, node: NodeHandle) -> Option<Region>;
    fn set_region(&mut self, node: NodeHandle, region: Option<Region>);
    fn paragraph_start(&self, node: NodeHandle) -> bool;
    fn set_paragraph_start(&mut self, node: NodeHandle, start: bool);

    /// All values of one record.
    fn attrs(&self, node: NodeHandle) -> EntryAttrs {
        EntryAttrs {
            start_time: self.start_time(node),
            end_time: self.end_time(node),
            content: self.content(node).to_string(),
            region: self.region(node),
            start_of_paragraph: self.paragraph_start(node),
        }
    }
}

/// In-memory store reading and writing SRT.
#[derive(Debug, Default)]
pub struct SrtStore {
    records: Vec<(NodeHandle, EntryAttrs)>,
    next_handle: u64,
}

impl SrtStore {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(&self, node: NodeHandle) -> Option<&EntryAttrs> {
        self.records
            .iter()
            .find(|(handle, _)| *handle == node)
            .map(|(_, attrs)| attrs)
    }

    fn record_mut(&mut self, node: NodeHandle) -> Option<&mut EntryAttrs> {
        self.records
            .iter_mut()
            .find(|(handle, _)| *handle == node)
            .map(|(_, attrs)| attrs)
    }
}

impl TimeCodeStore for SrtStore {
    fn deserialize(text: &str) -> Result<Self> {
        let mut store = SrtStore::default();
        for (index, attrs) in Parser::new().parse(text)?.iter().enumerate() {
            store.add_entry(index, attrs);
        }
        Ok(store)
    }

    fn serialize(&self) -> String {
        serialiser::serialise(self.records.iter().map(|(_, attrs)| attrs))
    }

    fn nodes(&self) -> Vec<NodeHandle> {
        self.records.iter().map(|(handle, _)| *handle).collect()
    }

    fn add_entry(&mut self, index: usize, attrs: &EntryAttrs) -> NodeHandle {
        let handle = NodeHandle(self.next_handle);
        self.next_handle += 1;
        let index = index.min(self.records.len());
        self.records.insert(index, (handle, attrs.clone()));
        handle
    }

    fn remove_entry(&mut self, node: NodeHandle) {
        self.records.retain(|(handle, _)| *handle != node);
    }

    fn start_time(&self, node: NodeHandle) -> Option<i64> {
        self.record(node).and_then(|r| r.start_time)
    }

    fn set_start_time(&mut self, node: NodeHandle, time: Option<i64>) {
        if let Some(r) = self.record_mut(node) {
            r.start_time = time;
        }
    }

    fn end_time(&self, node: NodeHandle) -> Option<i64> {
        self.record(node).and_then(|r| r.end_time)
    }

    fn set_end_time(&mut self, node: NodeHandle, time: Option<i64>) {
        if let Some(r) = self.record_mut(node) {
            r.end_time = time;
        }
    }

    fn content(&self, node: NodeHandle) -> &str {
        self.record(node).map_or("", |r| r.content.as_str())
    }

    fn set_content(&mut self, node: NodeHandle, content: &str) {
        if let Some(r) = self.record_mut(node) {
            r.content = content.to_string();
        }
    }

    fn region(&self, node: NodeHandle) -> Option<Region> {
        self.record(node).and_then(|r| r.region)
    }

    fn set_region(&mut self, node: NodeHandle, region: Option<Region>) {
        if let Some(r) = self.record_mut(node) {
            r.region = region;
        }
    }

    fn paragraph_start(&self, node: NodeHandle) -> bool {
        self.record(node).map_or(false, |r| r.start_of_paragraph)
    }

    fn set_paragraph_start(&mut self, node: NodeHandle, start: bool) {
        if let Some(r) = self.record_mut(node) {
            r.start_of_paragraph = start;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_keep_document_order() {
        let mut store = SrtStore::default();
        let b = store.add_entry(0, &EntryAttrs::default().with_content("b"));
        let a = store.add_entry(0, &EntryAttrs::default().with_content("a"));
        let c = store.add_entry(10, &EntryAttrs::default().with_content("c"));

        assert_eq!(store.nodes(), vec![a, b, c]);

        store.remove_entry(b);
        assert_eq!(store.nodes(), vec![a, c]);
        assert_eq!(store.content(b), "");
    }

    #[test]
    fn setters_write_through() {
        let mut store = SrtStore::default();
        let node = store.add_entry(0, &EntryAttrs::default());

        store.set_start_time(node, Some(10));
        store.set_end_time(node, Some(20));
        store.set_content(node, "hi");
        store.set_region(node, Some(Region::Bottom));
        store.set_paragraph_start(node, true);

        let attrs = store.attrs(node);
        assert_eq!(attrs.start_time, Some(10));
        assert_eq!(attrs.end_time, Some(20));
        assert_eq!(attrs.content, "hi");
        assert_eq!(attrs.region, Some(Region::Bottom));
        assert!(attrs.start_of_paragraph);
    }

    #[test]
    fn handles_are_not_reused() {
        let mut store = SrtStore::default();
        let first = store.add_entry(0, &EntryAttrs::default());
        store.remove_entry(first);
        let second = store.add_entry(0, &EntryAttrs::default());

        assert_ne!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn serialize_reads_back() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\nhello\n\n";
        let store = SrtStore::deserialize(text).unwrap();

        assert_eq!(store.serialize(), text);
    }
}
