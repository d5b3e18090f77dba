//! Two-level selection: a block, and optionally an element inside it.
//!
//! Element-keys come from the rendering layer; here they are opaque strings
//! that index a block's style and content overlays.

use crate::block::{Block, BlockId, ElementKey, StyleMap};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Selected block and element cursors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    selected_block_id: Option<BlockId>,
    selected_element_key: Option<ElementKey>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a block. Selecting a different block clears the element cursor.
    pub fn select_block(&mut self, id: BlockId) {
        if self.selected_block_id.as_ref() != Some(&id) {
            self.selected_element_key = None;
        }
        self.selected_block_id = Some(id);
    }

    /// Select an element inside a block (selects the block too)
    pub fn select_element(&mut self, block_id: BlockId, key: impl Into<ElementKey>) {
        self.select_block(block_id);
        self.selected_element_key = Some(key.into());
    }

    pub fn clear_element(&mut self) {
        self.selected_element_key = None;
    }

    /// Click on empty canvas: clears both cursors
    pub fn clear(&mut self) {
        self.selected_block_id = None;
        self.selected_element_key = None;
    }

    pub fn block_id(&self) -> Option<&BlockId> {
        self.selected_block_id.as_ref()
    }

    /// Selected element key. Only meaningful while a block is selected.
    pub fn element_key(&self) -> Option<&str> {
        self.selected_block_id.as_ref()?;
        self.selected_element_key.as_deref()
    }

    /// Address of the selected element, if both cursors are set
    pub fn element_address(&self) -> Option<ElementAddress> {
        let block_id = self.selected_block_id.clone()?;
        let element_key = self.selected_element_key.clone()?;
        Some(ElementAddress { block_id, element_key })
    }

    pub fn is_block_selected(&self, id: &BlockId) -> bool {
        self.selected_block_id.as_ref() == Some(id)
    }

    /// Clear the cursors if the selected block is no longer present.
    ///
    /// Returns true when the selection changed.
    pub fn reconcile(&mut self, blocks: &[Arc<Block>]) -> bool {
        match &self.selected_block_id {
            Some(id) if !blocks.iter().any(|b| &b.id == id) => {
                self.clear();
                true
            }
            _ => false,
        }
    }
}

/// A `(block, element)` pair addressing exactly one overlay entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAddress {
    pub block_id: BlockId,
    pub element_key: ElementKey,
}

impl ElementAddress {
    pub fn new(block_id: impl Into<BlockId>, element_key: impl Into<ElementKey>) -> Self {
        Self {
            block_id: block_id.into(),
            element_key: element_key.into(),
        }
    }

    /// Style override at this address; `None` means "no override"
    pub fn style<'a>(&self, blocks: &'a [Arc<Block>]) -> Option<&'a StyleMap> {
        self.block(blocks)?.element_style(&self.element_key)
    }

    /// Text override at this address; `None` means "no override"
    pub fn text<'a>(&self, blocks: &'a [Arc<Block>]) -> Option<&'a str> {
        self.block(blocks)?.element_text(&self.element_key)
    }

    fn block<'a>(&self, blocks: &'a [Arc<Block>]) -> Option<&'a Block> {
        blocks
            .iter()
            .find(|b| b.id == self.block_id)
            .map(|b| b.as_ref())
    }
}
