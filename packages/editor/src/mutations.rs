//! # Block Mutations
//!
//! The named operations that change a page's block sequence.
//!
//! ## Design Principles
//!
//! 1. **Pure over the sequence**: each mutation transforms the current block
//!    list into the next one; history is layered on top by the session
//! 2. **Tolerant**: a mutation that references a missing block is a no-op,
//!    not an error. Deletion racing a delayed async update is normal.
//! 3. **Copy-on-write**: only the touched block is cloned; untouched blocks
//!    stay shared with earlier history snapshots
//!
//! ## Mutation Semantics
//!
//! ### MoveById
//! - Removes the block, then inserts it at `to_index` of the *remaining*
//!   sequence. `[A,B,C]` moving A to 2 gives `[B,C,A]`.
//!
//! ### ReorderByIds
//! - Stable array move of `active` to the slot `over` currently holds
//!
//! ### UpdateProps / UpdateElementStyle
//! - Shallow merge; later keys win, nested values are replaced wholesale
//!
//! ### ReplaceVariant
//! - Keeps `id`, swaps `type`/`variant`, carries over only the configured
//!   universal prop keys, then overlays any explicit props

use crate::block::{Block, BlockId, ElementKey, Props, StyleMap};
use crate::config::EditorConfig;
use crate::document::Theme;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Operations on the block sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Mutation {
    /// Insert a block; index is clamped to `[0, len]`
    InsertAt { index: usize, block: Block },

    /// Remove a block by id
    RemoveById { id: BlockId },

    /// Remove then re-insert at `to_index` of the post-removal sequence
    #[serde(rename_all = "camelCase")]
    MoveById { id: BlockId, to_index: usize },

    /// Move `active_id` to where `over_id` currently sits
    #[serde(rename_all = "camelCase")]
    ReorderByIds { active_id: BlockId, over_id: BlockId },

    /// Shallow-merge props into a block
    UpdateProps { id: BlockId, props: Props },

    /// Shallow-merge a style override into one element overlay
    #[serde(rename_all = "camelCase")]
    UpdateElementStyle {
        block_id: BlockId,
        element_key: ElementKey,
        style: StyleMap,
    },

    /// Replace one element's text override
    #[serde(rename_all = "camelCase")]
    UpdateElementContent {
        block_id: BlockId,
        element_key: ElementKey,
        text: String,
    },

    /// Swap a block's type and variant, migrating universal props
    ReplaceVariant {
        id: BlockId,
        #[serde(rename = "newType")]
        block_type: String,
        #[serde(rename = "newVariant")]
        variant: String,
        #[serde(default, rename = "newProps")]
        props: Option<Props>,
    },

    /// Rewrite the theme prop keys on every block
    ApplyGlobalTheme { theme: Theme },

    /// Replace the whole sequence (applied AI previews, reloads)
    ReplaceBlocks { blocks: Vec<Block> },
}

/// Why a mutation left the sequence untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoopReason {
    BlockNotFound(BlockId),
    DuplicateId(BlockId),
    SamePosition,
}

/// Result of applying a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    Noop(NoopReason),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }
}

/// Session state a mutation may consult
#[derive(Debug, Clone, Copy)]
pub struct MutationContext<'a> {
    pub config: &'a EditorConfig,
    /// Active theme; newly inserted blocks pick it up
    pub theme: Option<&'a Theme>,
}

impl<'a> MutationContext<'a> {
    pub fn new(config: &'a EditorConfig) -> Self {
        Self { config, theme: None }
    }

    pub fn with_theme(mut self, theme: Option<&'a Theme>) -> Self {
        self.theme = theme;
        self
    }
}

impl Mutation {
    /// Short label used for history entries and logs
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertAt { .. } => "insert",
            Mutation::RemoveById { .. } => "remove",
            Mutation::MoveById { .. } => "move",
            Mutation::ReorderByIds { .. } => "reorder",
            Mutation::UpdateProps { .. } => "update-props",
            Mutation::UpdateElementStyle { .. } => "update-element-style",
            Mutation::UpdateElementContent { .. } => "update-element-content",
            Mutation::ReplaceVariant { .. } => "replace-variant",
            Mutation::ApplyGlobalTheme { .. } => "apply-theme",
            Mutation::ReplaceBlocks { .. } => "replace-blocks",
        }
    }

    /// Apply to the block sequence.
    ///
    /// The sequence is only touched when the outcome is `Applied`.
    pub fn apply(&self, blocks: &mut Vec<Arc<Block>>, ctx: &MutationContext<'_>) -> MutationOutcome {
        match self {
            Mutation::InsertAt { index, block } => Self::apply_insert(blocks, *index, block, ctx),

            Mutation::RemoveById { id } => match position(blocks, id) {
                Some(pos) => {
                    blocks.remove(pos);
                    MutationOutcome::Applied
                }
                None => not_found(id),
            },

            Mutation::MoveById { id, to_index } => Self::apply_move(blocks, id, *to_index),

            Mutation::ReorderByIds { active_id, over_id } => {
                Self::apply_reorder(blocks, active_id, over_id)
            }

            Mutation::UpdateProps { id, props } => {
                with_block(blocks, id, |block| block.merge_props(props))
            }

            Mutation::UpdateElementStyle {
                block_id,
                element_key,
                style,
            } => with_block(blocks, block_id, |block| {
                block.merge_element_style(element_key, style)
            }),

            Mutation::UpdateElementContent {
                block_id,
                element_key,
                text,
            } => with_block(blocks, block_id, |block| {
                block.set_element_text(element_key, text)
            }),

            Mutation::ReplaceVariant {
                id,
                block_type,
                variant,
                props,
            } => with_block(blocks, id, |block| {
                let mut migrated: Props = block
                    .props
                    .iter()
                    .filter(|(key, _)| ctx.config.is_universal_prop(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                if let Some(explicit) = props {
                    for (key, value) in explicit {
                        migrated.insert(key.clone(), value.clone());
                    }
                }

                block.block_type = block_type.clone();
                block.variant = variant.clone();
                block.props = migrated;
            }),

            Mutation::ApplyGlobalTheme { theme } => {
                let keys = &ctx.config.theme_keys;
                for block in blocks.iter_mut() {
                    let needs_update = block.prop(&keys.background) != Some(&Value::from(theme.background.as_str()))
                        || block.prop(&keys.accent) != Some(&Value::from(theme.accent.as_str()));
                    if needs_update {
                        let block = Arc::make_mut(block);
                        block
                            .props
                            .insert(keys.background.clone(), Value::from(theme.background.clone()));
                        block
                            .props
                            .insert(keys.accent.clone(), Value::from(theme.accent.clone()));
                    }
                }
                MutationOutcome::Applied
            }

            Mutation::ReplaceBlocks { blocks: replacement } => {
                let mut seen = HashSet::new();
                if let Some(dup) = replacement.iter().find(|b| !seen.insert(&b.id)) {
                    return MutationOutcome::Noop(NoopReason::DuplicateId(dup.id.clone()));
                }
                *blocks = replacement.iter().cloned().map(Arc::new).collect();
                MutationOutcome::Applied
            }
        }
    }

    fn apply_insert(
        blocks: &mut Vec<Arc<Block>>,
        index: usize,
        block: &Block,
        ctx: &MutationContext<'_>,
    ) -> MutationOutcome {
        if position(blocks, &block.id).is_some() {
            return MutationOutcome::Noop(NoopReason::DuplicateId(block.id.clone()));
        }

        let mut block = block.clone();
        if let Some(theme) = ctx.theme {
            let keys = &ctx.config.theme_keys;
            block
                .props
                .entry(keys.background.clone())
                .or_insert_with(|| Value::from(theme.background.clone()));
            block
                .props
                .entry(keys.accent.clone())
                .or_insert_with(|| Value::from(theme.accent.clone()));
        }

        let index = index.min(blocks.len());
        blocks.insert(index, Arc::new(block));
        MutationOutcome::Applied
    }

    fn apply_move(blocks: &mut Vec<Arc<Block>>, id: &BlockId, to_index: usize) -> MutationOutcome {
        let Some(from) = position(blocks, id) else {
            return not_found(id);
        };

        let block = blocks.remove(from);
        let to = to_index.min(blocks.len());
        blocks.insert(to, block);
        MutationOutcome::Applied
    }

    fn apply_reorder(blocks: &mut Vec<Arc<Block>>, active_id: &BlockId, over_id: &BlockId) -> MutationOutcome {
        let Some(from) = position(blocks, active_id) else {
            return not_found(active_id);
        };
        let Some(to) = position(blocks, over_id) else {
            return not_found(over_id);
        };
        if from == to {
            return MutationOutcome::Noop(NoopReason::SamePosition);
        }

        let block = blocks.remove(from);
        blocks.insert(to, block);
        MutationOutcome::Applied
    }
}

/// Index of the block with `id`
pub fn position(blocks: &[Arc<Block>], id: &BlockId) -> Option<usize> {
    blocks.iter().position(|b| &b.id == id)
}

/// Structural equality of two block sequences. Shared blocks compare by
/// pointer before falling back to value comparison.
pub fn sequences_equal(a: &[Arc<Block>], b: &[Arc<Block>]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| Arc::ptr_eq(x, y) || x.as_ref() == y.as_ref())
}

fn with_block(
    blocks: &mut [Arc<Block>],
    id: &BlockId,
    edit: impl FnOnce(&mut Block),
) -> MutationOutcome {
    match blocks.iter_mut().find(|b| &b.id == id) {
        Some(block) => {
            edit(Arc::make_mut(block));
            MutationOutcome::Applied
        }
        None => not_found(id),
    }
}

fn not_found(id: &BlockId) -> MutationOutcome {
    MutationOutcome::Noop(NoopReason::BlockNotFound(id.clone()))
}
