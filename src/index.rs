//! Time lookups over the synced prefix of a list.
//!
//! `synced` must be ordered by start time with non-decreasing end times, which
//! is what the list keeps in front of its unsynced entries.

use crate::entry::Entry;

/// Position of the first entry whose end lies after `time`, or `None` when
/// `time` is at or past the end of the last one.
pub fn first_entry_after(synced: &[Entry], time: i64) -> Option<usize> {
    let index = synced.partition_point(|e| e.end_time.map_or(false, |end| end <= time));
    if index < synced.len() {
        Some(index)
    } else {
        None
    }
}

/// Position of the entry showing at `time`.
pub fn entry_at(synced: &[Entry], time: i64) -> Option<usize> {
    let index = first_entry_after(synced, time)?;
    match synced[index].start_time {
        Some(start) if start <= time => Some(index),
        _ => None,
    }
}

/// Entries overlapping `[start, end)`.
pub fn entries_in_range(synced: &[Entry], start: i64, end: i64) -> &[Entry] {
    let first = match first_entry_after(synced, start) {
        Some(first) => first,
        None => return &[],
    };
    let count = synced[first..]
        .iter()
        .take_while(|e| e.start_time.map_or(false, |s| s < end))
        .count();
    &synced[first..first + count]
}
