//! # Drag and Drop
//!
//! Turns pointer gestures into page operations.
//!
//! ```text
//! Idle ──start(source)──▶ Dragging(source) ──end(target)──▶ Idle
//! ```
//!
//! | source   | target        | result                                   |
//! |----------|---------------|------------------------------------------|
//! | palette  | gap `k`       | insert + enrich at `k`                   |
//! | palette  | block body    | insert + enrich right after that block   |
//! | existing | gap `k`       | move, `k - 1` if the block started above |
//! | existing | block body    | reorder onto that block                  |
//! | any      | nothing       | no-op                                    |

use crate::block::{BlockId, Props};
use crate::document::Document;
use crate::mutations::Mutation;
use serde::{Deserialize, Serialize};

/// Payload announced by a palette drag source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DragPayload {
    #[serde(rename = "component-variant", rename_all = "camelCase")]
    ComponentVariant {
        variant: String,
        #[serde(default)]
        default_props: Props,
        #[serde(default, rename = "type")]
        block_type: Option<String>,
    },
}

/// What is being dragged
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    /// A block already on the canvas
    Existing { block_id: BlockId },
    /// A new block from the component palette
    Palette {
        variant: String,
        block_type: Option<String>,
        default_props: Props,
    },
}

impl From<DragPayload> for DragSource {
    fn from(payload: DragPayload) -> Self {
        match payload {
            DragPayload::ComponentVariant {
                variant,
                default_props,
                block_type,
            } => DragSource::Palette {
                variant,
                block_type,
                default_props,
            },
        }
    }
}

/// Where a drag ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Insertion gap before position `k`
    Gap(usize),
    /// Directly over another block's body
    Block(BlockId),
}

/// Operation resolved from a completed drop
#[derive(Debug, Clone, PartialEq)]
pub enum DropAction {
    /// Insert a seeded palette block and enrich it
    InsertAndEnrich {
        index: usize,
        variant: String,
        block_type: Option<String>,
        default_props: Props,
    },
    /// Rearrange existing blocks
    Apply(Mutation),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSource),
}

/// Drag gesture state machine
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, source: DragSource) {
        if let DragState::Dragging(previous) = &self.state {
            tracing::debug!(?previous, "Drag started while another was active, replacing it");
        }
        self.state = DragState::Dragging(source);
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Id of the canvas block being dragged, if any
    pub fn dragging_id(&self) -> Option<&BlockId> {
        match &self.state {
            DragState::Dragging(DragSource::Existing { block_id }) => Some(block_id),
            _ => None,
        }
    }

    /// Insertion gaps are shown for palette drags only; reordering uses
    /// on-block feedback instead
    pub fn shows_insertion_gaps(&self) -> bool {
        matches!(self.state, DragState::Dragging(DragSource::Palette { .. }))
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Finish the gesture. Always returns to `Idle`.
    pub fn end(&mut self, target: Option<DropTarget>, document: &Document) -> Option<DropAction> {
        let DragState::Dragging(source) = std::mem::take(&mut self.state) else {
            return None;
        };
        let target = target?;

        match source {
            DragSource::Palette {
                variant,
                block_type,
                default_props,
            } => {
                let index = match target {
                    DropTarget::Gap(k) => k.min(document.len()),
                    DropTarget::Block(over) => match document.index_of(&over) {
                        Some(i) => i + 1,
                        None => document.len(),
                    },
                };
                Some(DropAction::InsertAndEnrich {
                    index,
                    variant,
                    block_type,
                    default_props,
                })
            }

            DragSource::Existing { block_id } => match target {
                DropTarget::Gap(k) => {
                    let from = document.index_of(&block_id)?;
                    let to_index = if from < k { k - 1 } else { k };
                    Some(DropAction::Apply(Mutation::MoveById {
                        id: block_id,
                        to_index,
                    }))
                }
                DropTarget::Block(over) if over == block_id => None,
                DropTarget::Block(over) => Some(DropAction::Apply(Mutation::ReorderByIds {
                    active_id: block_id,
                    over_id: over,
                })),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;

    fn page(ids: &[&str]) -> Document {
        Document::from_blocks(ids.iter().map(|id| Block::new(*id, "Hero", "HeroModern")).collect())
    }

    fn existing(id: &str) -> DragSource {
        DragSource::Existing {
            block_id: BlockId::from(id),
        }
    }

    #[test]
    fn test_payload_decodes_palette_source() {
        let json = r#"{"kind": "component-variant", "variant": "PricingSimple", "defaultProps": {"title": "Plans"}}"#;
        let payload: DragPayload = serde_json::from_str(json).unwrap();
        let DragSource::Palette { variant, default_props, block_type } = DragSource::from(payload) else {
            panic!("expected palette source");
        };
        assert_eq!(variant, "PricingSimple");
        assert_eq!(default_props.get("title").and_then(|v| v.as_str()), Some("Plans"));
        assert!(block_type.is_none());

        let wrong = r#"{"kind": "file", "variant": "x"}"#;
        assert!(serde_json::from_str::<DragPayload>(wrong).is_err());
    }

    #[test]
    fn test_no_target_is_noop_and_resets() {
        let doc = page(&["a"]);
        let mut drag = DragController::new();
        drag.start(existing("a"));
        assert_eq!(drag.dragging_id(), Some(&BlockId::from("a")));
        assert!(!drag.shows_insertion_gaps());

        assert!(drag.end(None, &doc).is_none());
        assert_eq!(drag.state(), &DragState::Idle);
        assert!(drag.dragging_id().is_none());
    }

    #[test]
    fn test_gap_move_accounts_for_own_removal() {
        let doc = page(&["a", "b", "c"]);
        let mut drag = DragController::new();

        drag.start(existing("a"));
        assert_eq!(
            drag.end(Some(DropTarget::Gap(2)), &doc),
            Some(DropAction::Apply(Mutation::MoveById {
                id: BlockId::from("a"),
                to_index: 1
            }))
        );

        drag.start(existing("c"));
        assert_eq!(
            drag.end(Some(DropTarget::Gap(0)), &doc),
            Some(DropAction::Apply(Mutation::MoveById {
                id: BlockId::from("c"),
                to_index: 0
            }))
        );
    }

    #[test]
    fn test_existing_over_block_reorders() {
        let doc = page(&["a", "b"]);
        let mut drag = DragController::new();

        drag.start(existing("a"));
        assert_eq!(
            drag.end(Some(DropTarget::Block(BlockId::from("b"))), &doc),
            Some(DropAction::Apply(Mutation::ReorderByIds {
                active_id: BlockId::from("a"),
                over_id: BlockId::from("b"),
            }))
        );

        drag.start(existing("a"));
        assert!(drag.end(Some(DropTarget::Block(BlockId::from("a"))), &doc).is_none());
    }

    #[test]
    fn test_palette_over_block_inserts_after_it() {
        let doc = page(&["a", "b"]);
        let mut drag = DragController::new();
        let palette = DragSource::Palette {
            variant: "FooterSimple".to_string(),
            block_type: None,
            default_props: Props::new(),
        };

        drag.start(palette.clone());
        assert!(drag.shows_insertion_gaps());
        let Some(DropAction::InsertAndEnrich { index, .. }) =
            drag.end(Some(DropTarget::Block(BlockId::from("a"))), &doc)
        else {
            panic!("expected insert");
        };
        assert_eq!(index, 1);

        drag.start(palette);
        let Some(DropAction::InsertAndEnrich { index, .. }) = drag.end(Some(DropTarget::Gap(7)), &doc) else {
            panic!("expected insert");
        };
        assert_eq!(index, 2);
    }
}
