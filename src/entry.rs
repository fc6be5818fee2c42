//! Value types for the entries of a subtitle list.
//!
//! Times are integer milliseconds. `None` stands for an undefined time; an
//! entry is synced only when both of its times are defined.

use std::fmt;

/// Stable identity of an entry. Assigned once when the entry is created and
/// never reused by the list that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

impl fmt::Display for EntryId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Top,
    Bottom,
}

/// Attributes used to create an entry. Anything left at its default ends up
/// as an unsynced entry with empty content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryAttrs {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub content: String,
    pub region: Option<Region>,
    pub start_of_paragraph: bool,
}

impl EntryAttrs {
    pub fn timed(start_time: i64, end_time: i64) -> Self {
        Self {
            start_time: Some(start_time),
            end_time: Some(end_time),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn with_region(mut self, region: Option<Region>) -> Self {
        self.region = region;
        self
    }

    pub fn is_synced(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }
}

/// A sparse set of field changes. `None` means "leave the field alone"; for
/// the time and region fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub start_time: Option<Option<i64>>,
    pub end_time: Option<Option<i64>>,
    pub content: Option<String>,
    pub region: Option<Option<Region>>,
    pub start_of_paragraph: Option<bool>,
}

impl EntryPatch {
    pub fn times(start_time: Option<i64>, end_time: Option<i64>) -> Self {
        Self {
            start_time: Some(start_time),
            end_time: Some(end_time),
            ..Self::default()
        }
    }

    pub fn start_time(start_time: Option<i64>) -> Self {
        Self {
            start_time: Some(start_time),
            ..Self::default()
        }
    }

    pub fn end_time(end_time: Option<i64>) -> Self {
        Self {
            end_time: Some(end_time),
            ..Self::default()
        }
    }

    pub fn content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            ..Self::default()
        }
    }

    pub fn region(region: Option<Region>) -> Self {
        Self {
            region: Some(region),
            ..Self::default()
        }
    }

    pub fn start_of_paragraph(start_of_paragraph: bool) -> Self {
        Self {
            start_of_paragraph: Some(start_of_paragraph),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_time.is_none()
            && self.end_time.is_none()
            && self.content.is_none()
            && self.region.is_none()
            && self.start_of_paragraph.is_none()
    }

    /// Lays `other` over `self`: every field `other` carries wins.
    pub(crate) fn overlay(&mut self, other: EntryPatch) {
        if other.start_time.is_some() {
            self.start_time = other.start_time;
        }
        if other.end_time.is_some() {
            self.end_time = other.end_time;
        }
        if other.content.is_some() {
            self.content = other.content;
        }
        if other.region.is_some() {
            self.region = other.region;
        }
        if other.start_of_paragraph.is_some() {
            self.start_of_paragraph = other.start_of_paragraph;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    id: EntryId,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub content: String,
    pub region: Option<Region>,
    pub start_of_paragraph: bool,
}

impl Entry {
    pub(crate) fn new(id: EntryId, attrs: EntryAttrs) -> Self {
        Self {
            id,
            start_time: attrs.start_time,
            end_time: attrs.end_time,
            content: attrs.content,
            region: attrs.region,
            start_of_paragraph: attrs.start_of_paragraph,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn is_synced(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    pub fn attrs(&self) -> EntryAttrs {
        EntryAttrs {
            start_time: self.start_time,
            end_time: self.end_time,
            content: self.content.clone(),
            region: self.region,
            start_of_paragraph: self.start_of_paragraph,
        }
    }

    /// Applies `patch` and returns the previous values of the fields that
    /// actually changed.
    pub(crate) fn apply(&mut self, patch: &EntryPatch) -> EntryPatch {
        let mut previous = EntryPatch::default();
        if let Some(start_time) = patch.start_time {
            if start_time != self.start_time {
                previous.start_time = Some(self.start_time);
                self.start_time = start_time;
            }
        }
        if let Some(end_time) = patch.end_time {
            if end_time != self.end_time {
                previous.end_time = Some(self.end_time);
                self.end_time = end_time;
            }
        }
        if let Some(content) = &patch.content {
            if *content != self.content {
                previous.content = Some(std::mem::replace(&mut self.content, content.clone()));
            }
        }
        if let Some(region) = patch.region {
            if region != self.region {
                previous.region = Some(self.region);
                self.region = region;
            }
        }
        if let Some(start_of_paragraph) = patch.start_of_paragraph {
            if start_of_paragraph != self.start_of_paragraph {
                previous.start_of_paragraph = Some(self.start_of_paragraph);
                self.start_of_paragraph = start_of_paragraph;
            }
        }
        previous
    }

    /// Detached copy for live previews. Edits to the draft never reach the
    /// list until it is committed.
    pub fn draft(&self) -> Draft {
        Draft {
            source: self.id,
            start_time: self.start_time,
            end_time: self.end_time,
            content: self.content.clone(),
            region: self.region,
            start_of_paragraph: self.start_of_paragraph,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    source: EntryId,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub content: String,
    pub region: Option<Region>,
    pub start_of_paragraph: bool,
}

impl Draft {
    pub fn source(&self) -> EntryId {
        self.source
    }

    pub(crate) fn patch_against(&self, entry: &Entry) -> EntryPatch {
        let mut patch = EntryPatch::default();
        if self.start_time != entry.start_time {
            patch.start_time = Some(self.start_time);
        }
        if self.end_time != entry.end_time {
            patch.end_time = Some(self.end_time);
        }
        if self.content != entry.content {
            patch.content = Some(self.content.clone());
        }
        if self.region != entry.region {
            patch.region = Some(self.region);
        }
        if self.start_of_paragraph != entry.start_of_paragraph {
            patch.start_of_paragraph = Some(self.start_of_paragraph);
        }
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: i64, end: i64) -> Entry {
        Entry::new(EntryId(1), EntryAttrs::timed(start, end).with_content("hello"))
    }

    #[test]
    fn apply_records_only_changed_fields() {
        let mut e = entry(100, 200);
        let mut patch = EntryPatch::times(Some(100), Some(300));
        patch.content = Some("hello".to_string());

        let previous = e.apply(&patch);

        assert_eq!(e.end_time, Some(300));
        assert_eq!(previous, EntryPatch::end_time(Some(200)));
    }

    #[test]
    fn apply_previous_restores_entry() {
        let mut e = entry(100, 200);
        let original = e.clone();
        let mut patch = EntryPatch::times(None, Some(50));
        patch.region = Some(Some(Region::Top));
        patch.start_of_paragraph = Some(true);

        let previous = e.apply(&patch);
        assert!(!e.is_synced());
        e.apply(&previous);

        assert_eq!(e, original);
    }

    #[test]
    fn overlay_prefers_other() {
        let mut newer = EntryPatch::times(Some(1), Some(2));
        newer.content = Some("a".to_string());
        newer.overlay(EntryPatch::start_time(Some(10)));

        assert_eq!(newer.start_time, Some(Some(10)));
        assert_eq!(newer.end_time, Some(Some(2)));
        assert_eq!(newer.content.as_deref(), Some("a"));
    }

    #[test]
    fn draft_patch_contains_differences() {
        let e = entry(100, 200);
        let mut draft = e.draft();
        assert!(draft.patch_against(&e).is_empty());

        draft.start_time = Some(150);
        let patch = draft.patch_against(&e);

        assert_eq!(draft.source(), e.id());
        assert_eq!(patch, EntryPatch::start_time(Some(150)));
    }

    #[test]
    fn draft_carries_paragraph_start() {
        let e = entry(100, 200);
        let mut draft = e.draft();
        assert!(!draft.start_of_paragraph);

        draft.start_of_paragraph = true;

        assert_eq!(draft.patch_against(&e), EntryPatch::start_of_paragraph(true));
    }
}
