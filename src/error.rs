use crate::entry::EntryId;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("{0}")]
    Parse(String),

    #[error("index {index} is out of range for a list of {len} entries")]
    InvalidIndex { index: usize, len: usize },

    #[error("no entry with id {0} in this list")]
    UnknownEntry(EntryId),

    #[error("nothing to undo")]
    UndoUnderflow,

    #[error("nothing to redo")]
    RedoUnderflow,
}

pub type Result<T> = std::result::Result<T, TimelineError>;
