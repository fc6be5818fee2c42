//! Undo/redo bookkeeping.
//!
//! Every primitive edit records its inverse on the rollback stack in execution
//! order. Committing reverses that stack so it can be applied front to back,
//! then either pushes it as a new undo step or, when the change group matches
//! the newest undo step, folds it into that step.
//!
//! # Invariants
//!
//! 1. `undo.len() <= max_depth` after every commit.
//! 2. The redo stack is emptied whenever a commit records anything.
//! 3. The operations of every stored step restore the state that preceded it
//!    when applied in order.

use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use crate::entry::{EntryAttrs, EntryId, EntryPatch};

/// A primitive list operation, as replayed by undo and redo.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// `id` restores the identity of a previously removed entry.
    Insert {
        index: usize,
        attrs: EntryAttrs,
        id: Option<EntryId>,
    },
    Remove {
        index: usize,
    },
    Update {
        index: usize,
        patch: EntryPatch,
    },
}

#[derive(Debug, Clone)]
pub struct Step {
    pub description: String,
    pub ops: Vec<Op>,
    pub change_group: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Nothing,
    Pushed,
    Merged,
}

#[derive(Debug)]
pub struct History {
    undo: VecDeque<Step>,
    redo: Vec<Step>,
    rollback: Vec<Op>,
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            rollback: Vec::new(),
            max_depth,
        }
    }

    /// Records the inverse of an operation that was just executed.
    pub fn record(&mut self, inverse: Op) {
        self.rollback.push(inverse);
    }

    pub fn has_pending(&self) -> bool {
        !self.rollback.is_empty()
    }

    /// Drains the rollback stack, oriented for replay.
    pub fn take_rollback(&mut self) -> Vec<Op> {
        let mut ops = std::mem::take(&mut self.rollback);
        ops.reverse();
        ops
    }

    pub fn commit(&mut self, description: &str, change_group: Option<&str>) -> Commit {
        if self.rollback.is_empty() {
            return Commit::Nothing;
        }
        let ops = self.take_rollback();
        self.redo.clear();

        if let (Some(group), Some(last)) = (change_group, self.undo.back_mut()) {
            if last.change_group.as_deref() == Some(group) {
                let older = std::mem::take(&mut last.ops);
                last.ops = merge(ops, older);
                debug!(
                    "merged '{}' into '{}' ({} ops)",
                    description,
                    last.description,
                    last.ops.len()
                );
                return Commit::Merged;
            }
        }

        debug!("recorded '{}' ({} ops)", description, ops.len());
        self.push_undo(Step {
            description: description.to_string(),
            ops,
            change_group: change_group.map(str::to_string),
        });
        Commit::Pushed
    }

    /// Pushes a step without touching the redo stack.
    pub fn push_undo(&mut self, step: Step) {
        self.undo.push_back(step);
        while self.undo.len() > self.max_depth {
            if let Some(evicted) = self.undo.pop_front() {
                warn!("undo history full, dropping '{}'", evicted.description);
            }
        }
    }

    pub fn push_redo(&mut self, step: Step) {
        self.redo.push(step);
    }

    pub fn pop_undo(&mut self) -> Option<Step> {
        self.undo.pop_back()
    }

    pub fn pop_redo(&mut self) -> Option<Step> {
        self.redo.pop()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.rollback.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo.back().map(|step| step.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo.last().map(|step| step.description.as_str())
    }

    pub fn last_change_group(&self) -> Option<&str> {
        self.undo.back().and_then(|step| step.change_group.as_deref())
    }
}

/// Combines the ops of a new step with those of the step it joins.
///
/// `newer` is applied first. Updates to the same index are folded into the
/// first one seen, with the values from the older step winning, so the
/// combined step still restores the state before the older step. Inserts and
/// removes shift positions, so they close every open fold.
fn merge(newer: Vec<Op>, older: Vec<Op>) -> Vec<Op> {
    let mut merged: Vec<Op> = Vec::with_capacity(newer.len() + older.len());
    let mut folds: HashMap<usize, usize> = HashMap::new();

    for op in newer.into_iter().chain(older) {
        match op {
            Op::Update { index, patch } => match folds.get(&index) {
                Some(&pos) => {
                    if let Op::Update { patch: target, .. } = &mut merged[pos] {
                        target.overlay(patch);
                    }
                }
                None => {
                    folds.insert(index, merged.len());
                    merged.push(Op::Update { index, patch });
                }
            },
            structural => {
                folds.clear();
                merged.push(structural);
            }
        }
    }
    merged
}
