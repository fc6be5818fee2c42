/// Tunables for an editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Length in milliseconds given to entries timed by the allocator.
    pub default_duration: i64,
    /// Number of undo steps kept before the oldest are discarded.
    pub max_undo_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_duration: 1000,
            max_undo_depth: 100,
        }
    }
}

impl EditorConfig {
    pub fn with_default_duration(mut self, default_duration: i64) -> Self {
        self.default_duration = default_duration;
        self
    }

    pub fn with_max_undo_depth(mut self, max_undo_depth: usize) -> Self {
        self.max_undo_depth = max_undo_depth;
        self
    }
}
