//! # Pagekit Editor
//!
//! Builder state and editing engine for block-based pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ drag_drop: gestures → drop actions          │
//! └─────────────────────────────────────────────┘
//!            ↓                       ↓
//! ┌──────────────────────┐ ┌────────────────────┐
//! │ enrichment: seeded   │ │ ai_edit: previews  │
//! │ insert, async fill   │ │ of bulk AI edits   │
//! └──────────────────────┘ └────────────────────┘
//!            ↓                       ↓
//! ┌─────────────────────────────────────────────┐
//! │ session: mutations → snapshot history       │
//! │  - Document (blocks, selection, theme)      │
//! │  - UndoStack (linear, no-op suppression)    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ persistence: stored section lists           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Blocks keep their identity**: ids never change, async results find
//!    their block by id wherever it has moved
//! 2. **One path for every change**: all edits are `Mutation`s applied by
//!    the session, so undo/redo covers them uniformly
//! 3. **Races are not errors**: a mutation naming a deleted block is a no-op
//! 4. **Previews stay outside**: AI output becomes page content only when
//!    applied
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagekit_editor::{EditSession, EditorConfig, Theme};
//!
//! let mut session = EditSession::new(EditorConfig::default());
//! let hero = session.insert_new(0, "HeroModern", None, Default::default());
//! session.update_element_content(&hero, "heading", "Fresh bread daily");
//! session.apply_global_theme(Theme::new("#111", "#f90"));
//!
//! session.undo();
//! session.redo();
//! ```

mod ai_edit;
mod block;
mod builder;
mod config;
mod document;
mod drag_drop;
mod enrichment;
mod errors;
mod ids;
mod mutations;
mod persistence;
mod selection;
mod session;
mod undo_stack;

pub use ai_edit::{
    request_edit, AiPreview, BlockPatch, BulkEditRequest, BulkEditService, EditType, PreviewCandidate,
};
pub use block::{props_from_value, Block, BlockId, ElementKey, Props, StyleMap};
pub use builder::{Builder, DropResult};
pub use config::{EditorConfig, ThemeKeys, DEFAULT_CONFIG_NAME};
pub use document::{Document, Theme};
pub use drag_drop::{DragController, DragPayload, DragSource, DragState, DropAction, DropTarget};
pub use enrichment::{ContentEnricher, EnrichmentRequest, FillCoordinator, FillSettlement, FillTicket};
pub use errors::EditorError;
pub use ids::IdGenerator;
pub use mutations::{sequences_equal, Mutation, MutationContext, MutationOutcome, NoopReason};
pub use persistence::{load_document, normalize_sections, PageSource, PageStore, PersistedPage};
pub use selection::{ElementAddress, Selection};
pub use session::EditSession;
pub use undo_stack::{HistoryEntry, UndoStack};
