//! # Edit Session
//!
//! One builder session over one page: the document, its history, the
//! selection cursors and any pending AI preview.
//!
//! Every change goes through `apply`, which captures the sequence before
//! the mutation, applies it to a copy and hands both to the history. An
//! unchanged result records nothing. Direct edits, drops, enrichment
//! results and applied previews all take this same path, so the history is
//! a total order of every visible change.

use crate::ai_edit::{AiPreview, BulkEditRequest, EditType};
use crate::block::{Block, BlockId, ElementKey, Props, StyleMap};
use crate::config::EditorConfig;
use crate::document::{Document, Theme};
use crate::errors::EditorError;
use crate::ids::IdGenerator;
use crate::mutations::{Mutation, MutationContext, MutationOutcome};
use crate::persistence::{load_document, PageSource, PersistedPage};
use crate::undo_stack::UndoStack;
use serde_json::Value;

/// Single-user builder session
#[derive(Debug)]
pub struct EditSession {
    document: Document,
    history: UndoStack,
    config: EditorConfig,
    ids: IdGenerator,
    preview: Option<AiPreview>,
}

impl EditSession {
    /// Start a session on an empty page
    pub fn new(config: EditorConfig) -> Self {
        Self::with_document(Document::new(), config)
    }

    pub fn with_document(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            history: UndoStack::with_max_entries(config.max_history),
            config,
            ids: IdGenerator::from_clock(),
            preview: None,
        }
    }

    /// Open a session from a stored template or page.
    ///
    /// Malformed stored data opens an empty page.
    pub fn open(source: &PageSource, config: EditorConfig) -> Self {
        let mut ids = IdGenerator::from_clock();
        let document = load_document(source, &mut ids, &config);
        tracing::info!(blocks = document.len(), "Builder session opened");

        let mut session = Self::with_document(document, config);
        session.ids = ids;
        session
    }

    /// Replace the id generator (deterministic ids in tests and scripts)
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn blocks(&self) -> &[std::sync::Arc<Block>] {
        self.document.blocks()
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Mint an id not used by any block on the page
    pub fn new_block_id(&mut self) -> BlockId {
        let document = &self.document;
        self.ids.new_unique_id(|id| document.contains(id))
    }

    /// Apply a mutation and record it in the history.
    ///
    /// Returns true if the page changed.
    pub fn apply(&mut self, mutation: Mutation) -> bool {
        let prev = self.document.blocks().to_vec();
        let mut next = prev.clone();

        let ctx = MutationContext::new(&self.config).with_theme(self.document.theme());
        let outcome = mutation.apply(&mut next, &ctx);

        if let Mutation::ApplyGlobalTheme { theme } = &mutation {
            self.document.set_theme(theme.clone());
        }

        if let MutationOutcome::Noop(reason) = outcome {
            tracing::debug!(mutation = mutation.name(), ?reason, "Mutation was a no-op");
            return false;
        }

        if !self.history.record(mutation.name(), &prev, &next) {
            return false;
        }

        self.document.restore(next);
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.document.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.document.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn insert_at(&mut self, index: usize, block: Block) -> bool {
        self.apply(Mutation::InsertAt { index, block })
    }

    /// Insert a new block of `variant`, minting its id. The type is inferred
    /// from the variant when not given.
    pub fn insert_new(&mut self, index: usize, variant: &str, block_type: Option<&str>, props: Props) -> BlockId {
        let id = self.new_block_id();
        let block_type = block_type
            .map(str::to_string)
            .unwrap_or_else(|| self.config.infer_block_type(variant));
        self.insert_at(index, Block::new(id.clone(), block_type, variant).with_props(props));
        id
    }

    pub fn remove(&mut self, id: &BlockId) -> bool {
        self.apply(Mutation::RemoveById { id: id.clone() })
    }

    pub fn move_block(&mut self, id: &BlockId, to_index: usize) -> bool {
        self.apply(Mutation::MoveById {
            id: id.clone(),
            to_index,
        })
    }

    pub fn reorder(&mut self, active_id: &BlockId, over_id: &BlockId) -> bool {
        self.apply(Mutation::ReorderByIds {
            active_id: active_id.clone(),
            over_id: over_id.clone(),
        })
    }

    pub fn update_props(&mut self, id: &BlockId, props: Props) -> bool {
        self.apply(Mutation::UpdateProps { id: id.clone(), props })
    }

    pub fn update_element_style(&mut self, block_id: &BlockId, element_key: &str, style: StyleMap) -> bool {
        self.apply(Mutation::UpdateElementStyle {
            block_id: block_id.clone(),
            element_key: element_key.to_string(),
            style,
        })
    }

    pub fn update_element_content(&mut self, block_id: &BlockId, element_key: &str, text: &str) -> bool {
        self.apply(Mutation::UpdateElementContent {
            block_id: block_id.clone(),
            element_key: element_key.to_string(),
            text: text.to_string(),
        })
    }

    pub fn replace_variant(
        &mut self,
        id: &BlockId,
        block_type: &str,
        variant: &str,
        props: Option<Props>,
    ) -> bool {
        self.apply(Mutation::ReplaceVariant {
            id: id.clone(),
            block_type: block_type.to_string(),
            variant: variant.to_string(),
            props,
        })
    }

    pub fn apply_global_theme(&mut self, theme: Theme) -> bool {
        self.apply(Mutation::ApplyGlobalTheme { theme })
    }

    /// Select a block on the page. Unknown ids are ignored.
    pub fn select_block(&mut self, id: &BlockId) {
        if self.document.contains(id) {
            self.document.selection_mut().select_block(id.clone());
        }
    }

    /// Select an element inside a block on the page
    pub fn select_element(&mut self, block_id: &BlockId, element_key: impl Into<ElementKey>) {
        if self.document.contains(block_id) {
            self.document.selection_mut().select_element(block_id.clone(), element_key);
        }
    }

    /// Drop back from element to block selection
    pub fn clear_element_selection(&mut self) {
        self.document.selection_mut().clear_element();
    }

    /// Click on empty canvas
    pub fn clear_selection(&mut self) {
        self.document.selection_mut().clear();
    }

    /// Style edit addressed to the selected element
    pub fn style_selected_element(&mut self, style: StyleMap) -> bool {
        match self.document.selection().element_address() {
            Some(address) => self.update_element_style(&address.block_id, &address.element_key, style),
            None => false,
        }
    }

    /// Text edit addressed to the selected element
    pub fn edit_selected_element_text(&mut self, text: &str) -> bool {
        match self.document.selection().element_address() {
            Some(address) => self.update_element_content(&address.block_id, &address.element_key, text),
            None => false,
        }
    }

    /// Build a bulk edit request from the current page and selection
    pub fn bulk_edit_request(&self, prompt: &str, edit_type: EditType, edit_selected_only: bool) -> BulkEditRequest {
        BulkEditRequest {
            current_blocks: self.document.to_blocks(),
            prompt: prompt.to_string(),
            edit_type,
            target_block_id: self.document.selection().block_id().cloned(),
            edit_selected_only,
        }
    }

    /// Validate a bulk edit response and hold it as the pending preview.
    /// The document is not touched.
    pub fn stage_preview(&mut self, request: &BulkEditRequest, response: &Value) -> Result<(), EditorError> {
        let preview = AiPreview::from_response(request, response, &mut self.ids, &self.config)?;
        tracing::info!(edit_type = ?preview.edit_type, "Bulk edit preview staged");
        self.preview = Some(preview);
        Ok(())
    }

    pub fn preview(&self) -> Option<&AiPreview> {
        self.preview.as_ref()
    }

    /// Apply the pending preview as one history step
    pub fn apply_preview(&mut self) -> bool {
        let Some(preview) = self.preview.take() else {
            return false;
        };
        match preview.to_mutation(&self.document) {
            Some(mutation) => {
                let changed = self.apply(mutation);
                tracing::info!(edit_type = ?preview.edit_type, changed, "Bulk edit preview applied");
                changed
            }
            None => {
                tracing::info!("Bulk edit target no longer exists, preview dropped");
                false
            }
        }
    }

    /// Drop the pending preview
    pub fn discard_preview(&mut self) {
        if self.preview.take().is_some() {
            tracing::info!("Bulk edit preview discarded");
        }
    }

    /// Serialize the page as it is right now
    pub fn export_page(&self) -> PersistedPage {
        PersistedPage::from_document(&self.document)
    }
}
