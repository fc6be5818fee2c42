//! Time assignment for structural edits.
//!
//! Everything here is a pure function of the entries it is handed. The list
//! applies the results as ordinary updates so they take part in undo.

use crate::entry::{Entry, EntryPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    fn of(entry: &Entry) -> Option<Span> {
        match (entry.start_time, entry.end_time) {
            (Some(start), Some(end)) => Some(Span { start, end }),
            _ => None,
        }
    }

    fn midpoint(&self) -> i64 {
        midpoint(self.start, self.end)
    }
}

fn midpoint(a: i64, b: i64) -> i64 {
    a + (b - a) / 2
}

/// Result of placing a new entry in front of a reference entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertTiming {
    /// Times for the new entry, `None` when it stays unsynced.
    pub span: Option<Span>,
    /// New end time for the preceding entry when it has to shrink.
    pub prev_end: Option<i64>,
    /// New start time for the reference entry when it has to shrink.
    pub reference_start: Option<i64>,
}

/// Chooses times for an entry inserted immediately before `reference`.
///
/// `prev` is the entry currently in front of `reference`. Neither neighbour
/// is ever made longer than it was.
pub fn insert_before(
    prev: Option<&Entry>,
    reference: Option<&Entry>,
    default_duration: i64,
) -> InsertTiming {
    let reference = match reference.and_then(Span::of) {
        Some(span) => span,
        None => return InsertTiming::default(),
    };

    match prev {
        None => insert_at_head(reference, default_duration),
        Some(prev) => match Span::of(prev) {
            Some(prev) => insert_between(prev, reference, default_duration),
            None => InsertTiming::default(),
        },
    }
}

fn insert_at_head(reference: Span, default_duration: i64) -> InsertTiming {
    if reference.start >= default_duration {
        let start = (reference.start - default_duration) / 2;
        return InsertTiming {
            span: Some(Span::new(start, start + default_duration)),
            ..InsertTiming::default()
        };
    }

    // Not enough room in front: take it from the reference, but never more
    // than the first half of it.
    let end = default_duration.min(reference.midpoint());
    let reference_start = if end > reference.start {
        Some(end)
    } else {
        None
    };
    InsertTiming {
        span: Some(Span::new(0, end)),
        prev_end: None,
        reference_start,
    }
}

fn insert_between(prev: Span, reference: Span, default_duration: i64) -> InsertTiming {
    let gap = reference.start - prev.end;
    if gap > default_duration {
        let start = prev.end + (gap - default_duration) / 2;
        return InsertTiming {
            span: Some(Span::new(start, start + default_duration)),
            ..InsertTiming::default()
        };
    }

    let prev_end = (reference.start - default_duration)
        .max(midpoint(prev.start, reference.start))
        .min(prev.end);
    InsertTiming {
        span: Some(Span::new(prev_end, reference.start)),
        prev_end: if prev_end != prev.end {
            Some(prev_end)
        } else {
            None
        },
        reference_start: None,
    }
}

/// Halves a synced entry at its midpoint. Unsynced entries give `None`.
pub fn split(entry: &Entry) -> Option<(Span, Span)> {
    let span = Span::of(entry)?;
    let mid = span.midpoint();
    Some((Span::new(span.start, mid), Span::new(mid, span.end)))
}

/// Updates that open a gap of `duration` at `pivot`. Times saturate at the
/// ends of the `i64` range.
pub fn shift_forward(entries: &[Entry], pivot: i64, duration: i64) -> Vec<(usize, EntryPatch)> {
    synced(entries)
        .filter_map(|(index, span)| {
            if span.start >= pivot {
                Some((
                    index,
                    EntryPatch::times(
                        Some(span.start.saturating_add(duration)),
                        Some(span.end.saturating_add(duration)),
                    ),
                ))
            } else if pivot <= span.end {
                Some((index, EntryPatch::end_time(Some(span.end.saturating_add(duration)))))
            } else {
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShiftEdit {
    Update(usize, EntryPatch),
    Remove(usize),
}

/// Edits that cut the window `[pivot, pivot + duration]` out of the timeline.
/// Entries that collapse to nothing are removed. Edits come in ascending
/// index order.
pub fn shift_backward(entries: &[Entry], pivot: i64, duration: i64) -> Vec<ShiftEdit> {
    let adjust = |t: i64| {
        if t <= pivot {
            t
        } else if t <= pivot.saturating_add(duration) {
            pivot
        } else {
            t.saturating_sub(duration)
        }
    };

    synced(entries)
        .filter_map(|(index, span)| {
            let start = adjust(span.start);
            let end = adjust(span.end);
            if start == end {
                return Some(ShiftEdit::Remove(index));
            }
            let mut patch = EntryPatch::default();
            if start != span.start {
                patch.start_time = Some(Some(start));
            }
            if end != span.end {
                patch.end_time = Some(Some(end));
            }
            if patch.is_empty() {
                None
            } else {
                Some(ShiftEdit::Update(index, patch))
            }
        })
        .collect()
}

fn synced(entries: &[Entry]) -> impl Iterator<Item = (usize, Span)> + '_ {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| Span::of(entry).map(|span| (index, span)))
}
