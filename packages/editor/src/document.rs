//! # Page Document
//!
//! The ordered block sequence of the page being edited, plus the selection
//! cursors and the active theme.
//!
//! Order is significant: it is the render and publication order. Callers
//! read the sequence freely but change it only through `EditSession`, which
//! routes every change through the history.

use crate::block::{Block, BlockId};
use crate::mutations::position;
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A page-wide color theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub background: String,
    pub accent: String,
}

impl Theme {
    pub fn new(background: impl Into<String>, accent: impl Into<String>) -> Self {
        Self {
            background: background.into(),
            accent: accent.into(),
        }
    }
}

/// Editable page
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Arc<Block>>,
    selection: Selection,
    /// Last applied global theme. Session preference, not page content:
    /// it is not part of history snapshots.
    theme: Option<Theme>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks: blocks.into_iter().map(Arc::new).collect(),
            ..Self::default()
        }
    }

    pub fn blocks(&self) -> &[Arc<Block>] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id).map(|b| b.as_ref())
    }

    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        position(&self.blocks, id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.index_of(id).is_some()
    }

    /// Owned copy of the sequence (for persistence and service requests)
    pub fn to_blocks(&self) -> Vec<Block> {
        self.blocks.iter().map(|b| b.as_ref().clone()).collect()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn theme(&self) -> Option<&Theme> {
        self.theme.as_ref()
    }

    pub(crate) fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub(crate) fn set_theme(&mut self, theme: Theme) {
        self.theme = Some(theme);
    }

    /// Swap in a history snapshot
    pub(crate) fn restore(&mut self, blocks: Vec<Arc<Block>>) {
        self.blocks = blocks;
        self.selection.reconcile(&self.blocks);
    }
}
