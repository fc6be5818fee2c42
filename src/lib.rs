//! Timeline editing for time-coded subtitles.
//!
//! [`SubtitleList`] keeps an ordered list of entries on top of a
//! [`TimeCodeStore`], times new entries to fit between their neighbours, and
//! records every edit so it can be undone. Runs of related edits that share a
//! change group collapse into a single undo step.

pub mod allocator;
pub mod changes;
pub mod config;
pub mod entry;
pub mod error;
pub mod history;
pub mod index;
pub mod list;
pub mod parser;
pub mod serialiser;
pub mod store;

pub use crate::changes::{CallbackId, Change};
pub use crate::config::EditorConfig;
pub use crate::entry::{Draft, Entry, EntryAttrs, EntryId, EntryPatch, Region};
pub use crate::error::{Result, TimelineError};
pub use crate::history::Op;
pub use crate::list::{SubtitleList, TimeChange};
pub use crate::store::{NodeHandle, SrtStore, TimeCodeStore};
