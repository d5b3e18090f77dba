//! # Undo/Redo History
//!
//! Snapshot-based, linear history over the block sequence.
//!
//! ## Design
//!
//! - Every distinct change appends a snapshot of the resulting sequence
//! - The first recorded change also seeds the pre-change sequence as entry 0
//! - `entries[..index]` is the undoable past, `entries[index + 1..]` the
//!   redoable future
//! - Recording while not at the tail discards the redo branch first
//! - A change producing an equal sequence records nothing
//!
//! Snapshots are vectors of `Arc<Block>`, so blocks a change did not touch
//! are shared between entries rather than copied.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = UndoStack::new();
//! let prev = doc.blocks().to_vec();
//! mutation.apply(&mut next, &ctx);
//! history.record("insert", &prev, &next);
//!
//! if let Some(snapshot) = history.undo() {
//!     doc.restore(snapshot);
//! }
//! ```

use crate::block::Block;
use crate::mutations::sequences_equal;
use std::sync::Arc;
use std::time::Instant;

/// One captured sequence state
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Name of the change that produced this state
    pub label: String,
    pub blocks: Vec<Arc<Block>>,
    pub timestamp: Instant,
}

/// Linear snapshot history
#[derive(Debug)]
pub struct UndoStack {
    entries: Vec<HistoryEntry>,

    /// Entry matching the current document; `None` until the first change
    index: Option<usize>,

    /// Maximum number of entries retained (0 = unlimited)
    max_entries: usize,
}

impl UndoStack {
    /// Create a history with the default depth (100)
    pub fn new() -> Self {
        Self::with_max_entries(100)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: None,
            max_entries,
        }
    }

    /// Record a change from `prev` to `next`.
    ///
    /// Returns false (and records nothing) when the sequences are equal.
    pub fn record(&mut self, label: &str, prev: &[Arc<Block>], next: &[Arc<Block>]) -> bool {
        if sequences_equal(prev, next) {
            tracing::debug!(label, "History push suppressed: no change");
            return false;
        }

        if let Some(index) = self.index {
            let dropped = self.entries.len() - (index + 1);
            if dropped > 0 {
                tracing::debug!(label, dropped, "Discarding redo branch");
            }
            self.entries.truncate(index + 1);
        }

        if self.entries.is_empty() {
            self.entries.push(HistoryEntry {
                label: "initial".to_string(),
                blocks: prev.to_vec(),
                timestamp: Instant::now(),
            });
        }

        self.entries.push(HistoryEntry {
            label: label.to_string(),
            blocks: next.to_vec(),
            timestamp: Instant::now(),
        });

        while self.max_entries > 0 && self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
        self.index = Some(self.entries.len() - 1);

        tracing::debug!(label, depth = self.entries.len(), "History entry pushed");
        true
    }

    /// Step back one entry. Returns the snapshot to restore, or `None` when
    /// already at the earliest entry.
    pub fn undo(&mut self) -> Option<Vec<Arc<Block>>> {
        let index = self.index.filter(|i| *i > 0)?;
        let label = self.entries[index].label.clone();

        self.index = Some(index - 1);
        tracing::debug!(label = %label, index = index - 1, "Undo");

        Some(self.entries[index - 1].blocks.clone())
    }

    /// Step forward one entry. Returns the snapshot to restore, or `None`
    /// when already at the latest entry.
    pub fn redo(&mut self) -> Option<Vec<Arc<Block>>> {
        let index = self.index.filter(|i| i + 1 < self.entries.len())?;

        self.index = Some(index + 1);
        let entry = &self.entries[index + 1];
        tracing::debug!(label = %entry.label, index = index + 1, "Redo");

        Some(entry.blocks.clone())
    }

    /// True when an undo would change the page. At the seed entry
    /// (`index == Some(0)`) there is nothing earlier to restore, so this is
    /// false even though a history exists.
    pub fn can_undo(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.index, Some(i) if i + 1 < self.entries.len())
    }

    /// Label of the change `undo` would revert
    pub fn undo_label(&self) -> Option<&str> {
        let index = self.index.filter(|i| *i > 0)?;
        Some(self.entries[index].label.as_str())
    }

    /// Label of the change `redo` would reapply
    pub fn redo_label(&self) -> Option<&str> {
        let index = self.index?;
        self.entries.get(index + 1).map(|e| e.label.as_str())
    }

    /// Number of retained entries (including the seed)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
        tracing::debug!("History cleared");
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(ids: &[&str]) -> Vec<Arc<Block>> {
        ids.iter()
            .map(|id| Arc::new(Block::new(*id, "Hero", "HeroModern")))
            .collect()
    }

    fn ids(blocks: &[Arc<Block>]) -> Vec<String> {
        blocks.iter().map(|b| b.id.to_string()).collect()
    }

    #[test]
    fn test_new_history_is_empty() {
        let stack = UndoStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.index(), None);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_first_record_seeds_previous_state() {
        let mut stack = UndoStack::new();
        assert!(stack.record("insert", &seq(&[]), &seq(&["a"])));

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.index(), Some(1));
        assert_eq!(stack.undo_label(), Some("insert"));

        let restored = stack.undo().unwrap();
        assert!(restored.is_empty());
        assert_eq!(stack.index(), Some(0));
        assert!(!stack.can_undo());
        assert!(stack.undo().is_none());

        let redone = stack.redo().unwrap();
        assert_eq!(ids(&redone), vec!["a"]);
        assert!(stack.redo().is_none());
    }

    #[test]
    fn test_equal_sequences_are_suppressed() {
        let mut stack = UndoStack::new();
        let blocks = seq(&["a"]);

        assert!(!stack.record("update-props", &blocks, &blocks.clone()));
        assert!(stack.is_empty());

        // Value-equal but not pointer-equal also counts as no change
        assert!(!stack.record("update-props", &seq(&["a"]), &seq(&["a"])));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_record_after_undo_truncates_redo() {
        let mut stack = UndoStack::new();
        stack.record("insert", &seq(&[]), &seq(&["a"]));
        stack.record("insert", &seq(&["a"]), &seq(&["a", "b"]));

        stack.undo();
        assert!(stack.can_redo());
        assert_eq!(stack.redo_label(), Some("insert"));

        stack.record("insert", &seq(&["a"]), &seq(&["a", "c"]));
        assert!(!stack.can_redo());
        assert_eq!(stack.len(), 3);
        assert_eq!(ids(&stack.entries()[2].blocks), vec!["a", "c"]);
    }

    #[test]
    fn test_max_entries_drops_oldest() {
        let mut stack = UndoStack::with_max_entries(3);
        stack.record("insert", &seq(&[]), &seq(&["a"]));
        stack.record("insert", &seq(&["a"]), &seq(&["a", "b"]));
        stack.record("insert", &seq(&["a", "b"]), &seq(&["a", "b", "c"]));

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.index(), Some(2));

        assert_eq!(ids(&stack.undo().unwrap()), vec!["a", "b"]);
        assert_eq!(ids(&stack.undo().unwrap()), vec!["a"]);
        assert!(stack.undo().is_none());
    }

    #[test]
    fn test_clear() {
        let mut stack = UndoStack::new();
        stack.record("insert", &seq(&[]), &seq(&["a"]));
        stack.clear();

        assert!(stack.is_empty());
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }
}
