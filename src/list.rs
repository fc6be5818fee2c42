//! The ordered subtitle list and its editing operations.
//!
//! Entries are kept as a prefix of synced entries, ordered by start time,
//! followed by unsynced entries in insertion order. Every public editing
//! operation is made of primitive inserts, removes and updates; the inverse of
//! each primitive is recorded so the whole operation can be undone as one
//! step, and the change descriptors it produced are delivered to observers in
//! a single notification.

use log::{debug, trace, warn};

use crate::allocator::{self, ShiftEdit};
use crate::changes::{CallbackId, Change, ChangeTracker};
use crate::config::EditorConfig;
use crate::entry::{Draft, Entry, EntryAttrs, EntryId, EntryPatch, Region};
use crate::error::{Result, TimelineError};
use crate::history::{Commit, History, Op, Step};
use crate::index;
use crate::store::{NodeHandle, SrtStore, TimeCodeStore};

/// New times for one entry, as passed to [`SubtitleList::update_times`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeChange {
    pub id: EntryId,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

#[derive(Debug)]
pub struct SubtitleList<S: TimeCodeStore = SrtStore> {
    store: S,
    entries: Vec<Entry>,
    nodes: Vec<NodeHandle>,
    synced_count: usize,
    next_id: u64,
    history: History,
    changes: ChangeTracker,
    config: EditorConfig,
}

impl SubtitleList<SrtStore> {
    /// A list with no entries backed by an empty SRT store.
    pub fn empty() -> Self {
        Self::new(SrtStore::default())
    }

    pub fn from_srt(text: &str) -> Result<Self> {
        Ok(Self::new(SrtStore::deserialize(text)?))
    }
}

impl<S: TimeCodeStore> SubtitleList<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, EditorConfig::default())
    }

    pub fn with_config(store: S, config: EditorConfig) -> Self {
        let mut list = Self {
            store: S::default(),
            entries: Vec::new(),
            nodes: Vec::new(),
            synced_count: 0,
            next_id: 0,
            history: History::new(config.max_undo_depth),
            changes: ChangeTracker::new(),
            config,
        };
        list.adopt(store);
        list
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replaces the whole list with the contents of `text`. On a parse error
    /// the list and its history are left as they were.
    pub fn load(&mut self, text: &str) -> Result<()> {
        let store = S::deserialize(text)?;
        self.load_store(store);
        Ok(())
    }

    pub fn load_empty(&mut self) {
        self.load_store(S::default());
    }

    /// Replaces the whole list with the records of `store` and forgets all
    /// undo history. Observers see a single reload.
    pub fn load_store(&mut self, store: S) {
        self.changes.begin_load();
        self.history.clear();
        self.adopt(store);
        debug!("loaded {} entries ({} synced)", self.len(), self.synced_count);
        self.changes.finish_load();
    }

    fn adopt(&mut self, store: S) {
        let nodes = store.nodes();
        let mut entries = Vec::with_capacity(nodes.len());
        for &node in &nodes {
            let id = self.allocate_id();
            entries.push(Entry::new(id, store.attrs(node)));
        }
        self.synced_count = entries.iter().filter(|e| e.is_synced()).count();
        self.entries = entries;
        self.nodes = nodes;
        self.store = store;
    }

    fn allocate_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Inserts a new entry at `index`. Call [`changes_done`](Self::changes_done)
    /// to commit the edit.
    pub fn insert(&mut self, index: usize, attrs: EntryAttrs) -> Result<EntryId> {
        self.insert_with_id(index, attrs, None)
    }

    fn insert_with_id(
        &mut self,
        index: usize,
        attrs: EntryAttrs,
        id: Option<EntryId>,
    ) -> Result<EntryId> {
        if index > self.entries.len() {
            return Err(TimelineError::InvalidIndex {
                index,
                len: self.entries.len(),
            });
        }
        let id = match id {
            Some(id) => id,
            None => self.allocate_id(),
        };
        let node = self.store.add_entry(index, &attrs);
        let entry = Entry::new(id, attrs);
        if entry.is_synced() {
            self.synced_count += 1;
        }
        trace!("insert {} at {}", id, index);
        self.entries.insert(index, entry);
        self.nodes.insert(index, node);

        self.history.record(Op::Remove { index });
        self.changes.queue(Change::Insert {
            entry: self.entries[index].clone(),
            before: self.entries.get(index + 1).cloned(),
        });
        Ok(id)
    }

    /// Removes the entry at `index` and returns it.
    pub fn remove(&mut self, index: usize) -> Result<Entry> {
        self.check_index(index)?;
        let entry = self.entries.remove(index);
        let node = self.nodes.remove(index);
        self.store.remove_entry(node);
        if entry.is_synced() {
            self.synced_count -= 1;
        }
        trace!("remove {} at {}", entry.id(), index);

        self.history.record(Op::Insert {
            index,
            attrs: entry.attrs(),
            id: Some(entry.id()),
        });
        self.changes.queue(Change::Remove {
            entry: entry.clone(),
        });
        Ok(entry)
    }

    /// Applies the fields present in `patch` to the entry at `index`. The
    /// entry keeps its position even when it becomes synced or unsynced.
    pub fn update(&mut self, index: usize, patch: &EntryPatch) -> Result<()> {
        self.check_index(index)?;
        let entry = &mut self.entries[index];
        let was_synced = entry.is_synced();
        let previous = entry.apply(patch);
        if previous.is_empty() {
            return Ok(());
        }

        let node = self.nodes[index];
        if previous.start_time.is_some() {
            self.store.set_start_time(node, entry.start_time);
        }
        if previous.end_time.is_some() {
            self.store.set_end_time(node, entry.end_time);
        }
        if previous.content.is_some() {
            self.store.set_content(node, &entry.content);
        }
        if previous.region.is_some() {
            self.store.set_region(node, entry.region);
        }
        if previous.start_of_paragraph.is_some() {
            self.store.set_paragraph_start(node, entry.start_of_paragraph);
        }

        match (was_synced, entry.is_synced()) {
            (false, true) => self.synced_count += 1,
            (true, false) => self.synced_count -= 1,
            _ => (),
        }
        trace!("update {} at {}", entry.id(), index);

        let entry = entry.clone();
        self.history.record(Op::Update {
            index,
            patch: previous,
        });
        self.changes.queue(Change::Update { entry });
        Ok(())
    }

    /// Replays a sequence of primitive operations.
    pub fn bulk_change(&mut self, ops: Vec<Op>) -> Result<()> {
        for op in ops {
            match op {
                Op::Insert { index, attrs, id } => {
                    self.insert_with_id(index, attrs, id)?;
                }
                Op::Remove { index } => {
                    self.remove(index)?;
                }
                Op::Update { index, patch } => self.update(index, &patch)?,
            }
        }
        Ok(())
    }

    /// Commits everything done since the last commit as one undo step and
    /// notifies observers. When `change_group` matches the group of the most
    /// recent undo step the edit joins that step instead.
    pub fn changes_done(&mut self, description: &str, change_group: Option<&str>) {
        if let Commit::Nothing = self.history.commit(description, change_group) {
            trace!("'{}' changed nothing", description);
        }
        self.changes.flush();
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(TimelineError::InvalidIndex {
                index,
                len: self.entries.len(),
            })
        }
    }

    fn require(&self, id: EntryId) -> Result<usize> {
        self.index_of(id).ok_or(TimelineError::UnknownEntry(id))
    }

    fn commit_pending(&mut self) {
        if self.history.has_pending() {
            warn!("committing edits that were never marked done");
            self.changes_done("Edit", None);
        }
    }

    pub fn undo(&mut self) -> Result<()> {
        self.commit_pending();
        let step = self.history.pop_undo().ok_or(TimelineError::UndoUnderflow)?;
        debug!("undo '{}'", step.description);
        self.bulk_change(step.ops)?;
        let ops = self.history.take_rollback();
        self.history.push_redo(Step {
            description: step.description,
            ops,
            change_group: None,
        });
        self.changes.flush();
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        self.commit_pending();
        let step = self.history.pop_redo().ok_or(TimelineError::RedoUnderflow)?;
        debug!("redo '{}'", step.description);
        self.bulk_change(step.ops)?;
        let ops = self.history.take_rollback();
        self.history.push_undo(Step {
            description: step.description,
            ops,
            change_group: None,
        });
        self.changes.flush();
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }

    pub fn add_change_callback<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&[Change]) + 'static,
    {
        self.changes.add_callback(callback)
    }

    pub fn remove_change_callback(&mut self, id: CallbackId) -> bool {
        self.changes.remove_callback(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.index_of(id).map(|index| &self.entries[index])
    }

    pub fn index_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    pub fn prev_entry(&self, id: EntryId) -> Option<&Entry> {
        let index = self.index_of(id)?;
        index.checked_sub(1).map(|prev| &self.entries[prev])
    }

    pub fn next_entry(&self, id: EntryId) -> Option<&Entry> {
        let index = self.index_of(id)?;
        self.entries.get(index + 1)
    }

    pub fn synced_count(&self) -> usize {
        self.synced_count
    }

    pub fn synced_entries(&self) -> &[Entry] {
        &self.entries[..self.synced_count]
    }

    pub fn first_unsynced(&self) -> Option<&Entry> {
        self.entries.get(self.synced_count)
    }

    /// First synced entry whose times cannot be right: a negative time, an
    /// end before its start, or a start before the previous entry's start.
    pub fn first_invalid_timing(&self) -> Option<&Entry> {
        let mut prev_start = None;
        for entry in self.synced_entries() {
            if let (Some(start), Some(end)) = (entry.start_time, entry.end_time) {
                let out_of_order = prev_start.map_or(false, |prev| start < prev);
                if start < 0 || end < 0 || end < start || out_of_order {
                    return Some(entry);
                }
                prev_start = Some(start);
            }
        }
        None
    }

    pub fn needs_any_synced(&self) -> bool {
        self.synced_count < self.entries.len()
    }

    pub fn needs_any_transcribed(&self) -> bool {
        self.entries.iter().any(|e| e.content.trim().is_empty())
    }

    pub fn index_of_first_entry_after(&self, time: i64) -> Option<usize> {
        index::first_entry_after(self.synced_entries(), time)
    }

    pub fn entry_at_time(&self, time: i64) -> Option<&Entry> {
        index::entry_at(self.synced_entries(), time).map(|index| &self.entries[index])
    }

    pub fn entries_in_range(&self, start: i64, end: i64) -> &[Entry] {
        index::entries_in_range(self.synced_entries(), start, end)
    }

    pub fn serialize(&self) -> String {
        self.store.serialize()
    }

    /// Inserts an entry in front of `reference`, or at the end when it is
    /// `None`, timing it to fit between its neighbours.
    pub fn insert_before(
        &mut self,
        reference: Option<EntryId>,
        region: Option<Region>,
    ) -> Result<EntryId> {
        let id = self.place_before(reference, region)?;
        self.changes_done("Insert subtitle", None);
        Ok(id)
    }

    /// Like [`insert_before`](Self::insert_before), for an entry created only
    /// to be edited straight away. Until something else is committed the
    /// insert can be taken back with [`abandon_insert`](Self::abandon_insert).
    pub fn insert_for_editing(
        &mut self,
        reference: Option<EntryId>,
        region: Option<Region>,
    ) -> Result<EntryId> {
        let id = self.place_before(reference, region)?;
        self.changes_done("Insert subtitle", Some(&auto_insert_group(id)));
        Ok(id)
    }

    /// Rolls back an insert made by [`insert_for_editing`](Self::insert_for_editing)
    /// if it is still the latest undo step. The rollback leaves nothing to
    /// redo. Returns whether anything was rolled back.
    pub fn abandon_insert(&mut self, id: EntryId) -> Result<bool> {
        let group = auto_insert_group(id);
        if self.history.has_pending() || self.history.last_change_group() != Some(group.as_str())
        {
            return Ok(false);
        }
        self.undo()?;
        self.history.pop_redo();
        debug!("abandoned insert of {}", id);
        Ok(true)
    }

    fn place_before(
        &mut self,
        reference: Option<EntryId>,
        region: Option<Region>,
    ) -> Result<EntryId> {
        let index = match reference {
            Some(id) => self.require(id)?,
            None => self.entries.len(),
        };
        let prev = index.checked_sub(1).map(|i| &self.entries[i]);
        let timing = allocator::insert_before(
            prev,
            self.entries.get(index),
            self.config.default_duration,
        );

        if let Some(end) = timing.prev_end {
            self.update(index - 1, &EntryPatch::end_time(Some(end)))?;
        }
        if let Some(start) = timing.reference_start {
            self.update(index, &EntryPatch::start_time(Some(start)))?;
        }
        let attrs = EntryAttrs {
            start_time: timing.span.map(|s| s.start),
            end_time: timing.span.map(|s| s.end),
            region,
            ..EntryAttrs::default()
        };
        self.insert(index, attrs)
    }

    /// Splits an entry in two. The original keeps the first half of its time
    /// and `first_text`; the new entry after it gets the rest and
    /// `second_text`.
    pub fn split_subtitle(
        &mut self,
        id: EntryId,
        first_text: &str,
        second_text: &str,
    ) -> Result<EntryId> {
        let index = self.require(id)?;
        let original = &self.entries[index];
        let mut second = EntryAttrs::default()
            .with_content(second_text)
            .with_region(original.region);
        let mut first = EntryPatch::content(first_text);

        if let Some((head, tail)) = allocator::split(original) {
            first.end_time = Some(Some(head.end));
            second.start_time = Some(tail.start);
            second.end_time = Some(tail.end);
        }

        self.update(index, &first)?;
        let new_id = self.insert(index + 1, second)?;
        self.changes_done("Split subtitle", None);
        Ok(new_id)
    }

    /// Sets the times of one entry. The entry stays where it is: syncing
    /// an entry never moves it into the synced prefix. To keep that prefix
    /// contiguous, sync entries in list order, i.e. only ever give times to
    /// the entry at [`first_unsynced`](Self::first_unsynced), and clear
    /// times from the last synced entry first.
    pub fn update_time(
        &mut self,
        id: EntryId,
        start_time: Option<i64>,
        end_time: Option<i64>,
    ) -> Result<()> {
        let index = self.require(id)?;
        self.update(index, &EntryPatch::times(start_time, end_time))?;
        self.changes_done("Update time", None);
        Ok(())
    }

    /// Updates several entries' times as one edit. Every id is checked before
    /// anything changes. Like [`update_time`](Self::update_time), this never
    /// reorders entries, so the caller keeps synced entries in front.
    pub fn update_times(&mut self, changes: &[TimeChange], change_group: Option<&str>) -> Result<()> {
        let indices = changes
            .iter()
            .map(|change| self.require(change.id))
            .collect::<Result<Vec<usize>>>()?;
        for (index, change) in indices.into_iter().zip(changes) {
            self.update(index, &EntryPatch::times(change.start_time, change.end_time))?;
        }
        self.changes_done("Update times", change_group);
        Ok(())
    }

    pub fn update_content(
        &mut self,
        id: EntryId,
        content: &str,
        change_group: Option<&str>,
    ) -> Result<()> {
        let index = self.require(id)?;
        self.update(index, &EntryPatch::content(content))?;
        self.changes_done("Update subtitle", change_group);
        Ok(())
    }

    pub fn update_region(&mut self, id: EntryId, region: Option<Region>) -> Result<()> {
        let index = self.require(id)?;
        self.update(index, &EntryPatch::region(region))?;
        self.changes_done("Update region", None);
        Ok(())
    }

    pub fn update_paragraph_start(&mut self, id: EntryId, start_of_paragraph: bool) -> Result<()> {
        let index = self.require(id)?;
        self.update(index, &EntryPatch::start_of_paragraph(start_of_paragraph))?;
        self.changes_done("Update paragraph", None);
        Ok(())
    }

    pub fn remove_entry(&mut self, id: EntryId) -> Result<Entry> {
        let index = self.require(id)?;
        let entry = self.remove(index)?;
        self.changes_done("Remove subtitle", None);
        Ok(entry)
    }

    /// Opens a gap of `duration` at `pivot`, moving later entries forward.
    pub fn shift_forward(&mut self, pivot: i64, duration: i64) -> Result<()> {
        for (index, patch) in allocator::shift_forward(&self.entries, pivot, duration) {
            self.update(index, &patch)?;
        }
        self.changes_done("Shift subtitles forward", None);
        Ok(())
    }

    /// Cuts `[pivot, pivot + duration]` out of the timeline. Entries entirely
    /// inside the window are removed.
    pub fn shift_backward(&mut self, pivot: i64, duration: i64) -> Result<()> {
        let edits = allocator::shift_backward(&self.entries, pivot, duration);
        // Back to front so removals do not move the remaining indices.
        for edit in edits.into_iter().rev() {
            match edit {
                ShiftEdit::Update(index, patch) => self.update(index, &patch)?,
                ShiftEdit::Remove(index) => {
                    self.remove(index)?;
                }
            }
        }
        self.changes_done("Shift subtitles backward", None);
        Ok(())
    }

    pub fn clear_all_timings(&mut self) -> Result<()> {
        for index in 0..self.entries.len() {
            self.update(index, &EntryPatch::times(None, None))?;
        }
        self.changes_done("Clear timing", None);
        Ok(())
    }

    pub fn clear_all_text(&mut self) -> Result<()> {
        for index in 0..self.entries.len() {
            self.update(index, &EntryPatch::content(""))?;
        }
        self.changes_done("Clear text", None);
        Ok(())
    }

    pub fn draft(&self, id: EntryId) -> Result<Draft> {
        let index = self.require(id)?;
        Ok(self.entries[index].draft())
    }

    /// Writes back the fields of `draft` that differ from its entry.
    pub fn commit_draft(&mut self, draft: &Draft, change_group: Option<&str>) -> Result<()> {
        let index = self.require(draft.source())?;
        let patch = draft.patch_against(&self.entries[index]);
        self.update(index, &patch)?;
        self.changes_done("Update subtitle", change_group);
        Ok(())
    }
}

fn auto_insert_group(id: EntryId) -> String {
    format!("auto-insert{}", id)
}
