//! Composition root: one edit session plus the async fill and drag/drop
//! machinery that feeds it.

use crate::ai_edit::{request_edit, BulkEditService, EditType};
use crate::block::BlockId;
use crate::drag_drop::{DragController, DragSource, DropAction, DropTarget};
use crate::enrichment::{ContentEnricher, FillCoordinator, FillSettlement, FillTicket};
use crate::errors::EditorError;
use crate::mutations::Mutation;
use crate::persistence::{PageStore, PersistedPage};
use crate::session::EditSession;
use std::sync::Arc;

/// Result of a completed drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropResult {
    /// A seeded block was inserted and is being enriched
    Inserted { ticket: FillTicket, block_id: BlockId },
    /// Existing blocks were rearranged; `changed` is false for a drop that
    /// left the order as it was
    Rearranged { changed: bool },
}

pub struct Builder {
    session: EditSession,
    fills: FillCoordinator,
    drag: DragController,
}

impl Builder {
    pub fn new(session: EditSession, enricher: Arc<dyn ContentEnricher>, project_description: impl Into<String>) -> Self {
        Self {
            session,
            fills: FillCoordinator::new(enricher, project_description),
            drag: DragController::new(),
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Run direct session edits, then refresh loading markers
    pub fn edit_session<R>(&mut self, edit: impl FnOnce(&mut EditSession) -> R) -> R {
        let result = edit(&mut self.session);
        self.fills.refresh_loading(self.session.document());
        result
    }

    pub fn fills(&self) -> &FillCoordinator {
        &self.fills
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Apply a mutation and refresh loading markers
    pub fn apply(&mut self, mutation: Mutation) -> bool {
        let changed = self.session.apply(mutation);
        self.fills.refresh_loading(self.session.document());
        changed
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.session.undo();
        self.fills.refresh_loading(self.session.document());
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.session.redo();
        self.fills.refresh_loading(self.session.document());
        changed
    }

    pub fn start_drag(&mut self, source: DragSource) {
        self.drag.start(source);
    }

    /// Finish a drag gesture. Palette drops start an enrichment, so this
    /// must run inside a Tokio runtime.
    pub fn drop_on(&mut self, target: Option<DropTarget>) -> Option<DropResult> {
        match self.drag.end(target, self.session.document())? {
            DropAction::InsertAndEnrich {
                index,
                variant,
                block_type,
                default_props,
            } => {
                let (ticket, block_id) = self.fills.begin(
                    &mut self.session,
                    index,
                    &variant,
                    block_type.as_deref(),
                    default_props,
                );
                Some(DropResult::Inserted { ticket, block_id })
            }
            DropAction::Apply(mutation) => Some(DropResult::Rearranged {
                changed: self.apply(mutation),
            }),
        }
    }

    /// Wait for the next enrichment to land
    pub async fn next_fill(&mut self) -> Option<FillSettlement> {
        let settled = self.fills.next_settled(&mut self.session).await;
        self.fills.refresh_loading(self.session.document());
        settled
    }

    /// Fold in enrichments that have already finished
    pub fn settle_ready_fills(&mut self) -> Vec<FillSettlement> {
        let settled = self.fills.settle_ready(&mut self.session);
        self.fills.refresh_loading(self.session.document());
        settled
    }

    /// Ask the bulk edit service for a preview of `prompt` applied to the
    /// page. The target is the selected block.
    pub async fn preview_bulk_edit(
        &mut self,
        service: &dyn BulkEditService,
        prompt: &str,
        edit_type: EditType,
        edit_selected_only: bool,
    ) -> Result<(), EditorError> {
        let request = self.session.bulk_edit_request(prompt, edit_type, edit_selected_only);
        let response = request_edit(service, &request).await?;
        self.session.stage_preview(&request, &response)
    }

    pub fn apply_preview(&mut self) -> bool {
        let changed = self.session.apply_preview();
        self.fills.refresh_loading(self.session.document());
        changed
    }

    pub fn discard_preview(&mut self) {
        self.session.discard_preview();
    }

    /// Save the page as it is now. Edits made while the store call is in
    /// flight belong to the next save.
    pub fn save(&self, store: Arc<dyn PageStore>) -> impl std::future::Future<Output = Result<(), EditorError>> {
        let page: PersistedPage = self.session.export_page();
        let sections = page.sections.len();
        async move {
            let result = store.save_page(page).await;
            match &result {
                Ok(()) => tracing::info!(sections, "Page saved"),
                Err(e) => tracing::warn!(error = %e, "Page save failed"),
            }
            result
        }
    }
}
