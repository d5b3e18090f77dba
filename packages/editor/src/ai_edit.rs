//! # AI Bulk Edits
//!
//! Prompt-driven edits arrive as a *preview*: a set of patches held outside
//! the document. Nothing reaches the document or its history until the
//! preview is applied; discarding it has no effect at all.
//!
//! Merging rules for a service response:
//! - response records pair with the request's blocks by position and are
//!   kept as patches keyed by that block's id
//! - a patch only overlays the fields the service supplied; `id`, `type`
//!   and `variant` are never touched
//! - extra records become new blocks; missing ones mark the trailing
//!   request blocks for removal
//! - single-block edits (`edit_selected_only`) patch the target by id
//!
//! Patches are resolved against the page as it is when the preview is
//! applied, so edits made while it was pending survive. Blocks deleted in
//! the meantime stay deleted and their patches are ignored.

use crate::block::{Block, BlockId, ElementKey, Props, StyleMap};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::errors::EditorError;
use crate::ids::IdGenerator;
use crate::mutations::Mutation;
use crate::persistence::{parse_records, SectionRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Kind of bulk edit requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditType {
    Structure,
    Content,
    Rewrite,
    Theme,
}

/// Request sent to the bulk edit service
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEditRequest {
    pub current_blocks: Vec<Block>,
    pub prompt: String,
    pub edit_type: EditType,
    pub target_block_id: Option<BlockId>,
    pub edit_selected_only: bool,
}

/// External prompt-to-blocks service. Returns the raw response, which is
/// validated here rather than trusted.
#[async_trait]
pub trait BulkEditService: Send + Sync {
    async fn edit(&self, request: &BulkEditRequest) -> Result<Value, EditorError>;
}

/// Fields a response supplied for one existing block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPatch {
    pub props: Option<Props>,
    pub element_styles: Option<BTreeMap<ElementKey, StyleMap>>,
    pub element_content: Option<BTreeMap<ElementKey, String>>,
}

impl BlockPatch {
    fn from_record(record: SectionRecord) -> Self {
        Self {
            props: record.props,
            element_styles: record.element_styles,
            element_content: record.element_content,
        }
    }

    /// Overlay onto `block`, keeping its identity and renderer
    pub fn apply_to(&self, block: &Block) -> Block {
        let mut block = block.clone();
        if let Some(props) = &self.props {
            block.merge_props(props);
        }
        if let Some(styles) = &self.element_styles {
            for (key, style) in styles {
                block.merge_element_style(key, style);
            }
        }
        if let Some(content) = &self.element_content {
            for (key, text) in content {
                block.set_element_text(key, text);
            }
        }
        block
    }
}

/// Candidate result awaiting apply or discard
#[derive(Debug, Clone, PartialEq)]
pub struct AiPreview {
    pub edit_type: EditType,
    pub prompt: String,
    pub candidate: PreviewCandidate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewCandidate {
    /// Whole-page edit
    Sequence {
        /// Patches keyed by the block that held the record's position at
        /// request time
        patches: Vec<(BlockId, BlockPatch)>,
        /// Request blocks the response left out
        dropped: Vec<BlockId>,
        /// New blocks, appended on apply
        added: Vec<Block>,
    },
    /// Single block edit
    Single { target: BlockId, patch: BlockPatch },
}

impl AiPreview {
    /// Validate a service response and turn it into patches.
    ///
    /// The whole response is rejected if any record is malformed.
    pub fn from_response(
        request: &BulkEditRequest,
        response: &Value,
        ids: &mut IdGenerator,
        config: &EditorConfig,
    ) -> Result<Self, EditorError> {
        let records = parse_records(response).map_err(EditorError::MalformedResponse)?;

        let candidate = if request.edit_selected_only {
            let target = request.target_block_id.clone().ok_or_else(|| {
                EditorError::BulkEdit("selected-only edit without a target block".to_string())
            })?;
            if !request.current_blocks.iter().any(|b| b.id == target) {
                return Err(EditorError::BulkEdit(format!("target block {} not in request", target)));
            }
            let record = records
                .into_iter()
                .next()
                .ok_or_else(|| EditorError::MalformedResponse("empty response".to_string()))?;

            PreviewCandidate::Single {
                target,
                patch: BlockPatch::from_record(record),
            }
        } else {
            plan_sequence(&request.current_blocks, records, ids, config)?
        };

        Ok(Self {
            edit_type: request.edit_type,
            prompt: request.prompt.clone(),
            candidate,
        })
    }

    /// The mutation applying this preview to `document` as it is now, or
    /// `None` when a single-block target has since been removed
    pub fn to_mutation(&self, document: &Document) -> Option<Mutation> {
        match &self.candidate {
            PreviewCandidate::Sequence { patches, dropped, added } => {
                let mut blocks: Vec<Block> = document
                    .blocks()
                    .iter()
                    .filter(|b| !dropped.contains(&b.id))
                    .map(|b| match patches.iter().find(|(id, _)| id == &b.id) {
                        Some((_, patch)) => patch.apply_to(b),
                        None => b.as_ref().clone(),
                    })
                    .collect();
                for block in added {
                    if !blocks.iter().any(|b| b.id == block.id) {
                        blocks.push(block.clone());
                    }
                }
                Some(Mutation::ReplaceBlocks { blocks })
            }
            PreviewCandidate::Single { target, patch } => {
                document.index_of(target)?;
                let blocks = document
                    .blocks()
                    .iter()
                    .map(|b| if &b.id == target { patch.apply_to(b) } else { b.as_ref().clone() })
                    .collect();
                Some(Mutation::ReplaceBlocks { blocks })
            }
        }
    }
}

/// Send a request and log failures; the error is returned for the caller
/// to surface as a dismissable message
pub async fn request_edit(service: &dyn BulkEditService, request: &BulkEditRequest) -> Result<Value, EditorError> {
    match service.edit(request).await {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(error = %e, edit_type = ?request.edit_type, "Bulk edit request failed");
            Err(e)
        }
    }
}

fn plan_sequence(
    originals: &[Block],
    records: Vec<SectionRecord>,
    ids: &mut IdGenerator,
    config: &EditorConfig,
) -> Result<PreviewCandidate, EditorError> {
    let mut used: HashSet<BlockId> = originals.iter().map(|b| b.id.clone()).collect();
    let mut patches = Vec::new();
    let mut added = Vec::new();

    for (i, record) in records.into_iter().enumerate() {
        match originals.get(i) {
            Some(original) => patches.push((original.id.clone(), BlockPatch::from_record(record))),
            None => {
                let variant = record.variant.clone().ok_or_else(|| {
                    EditorError::MalformedResponse(format!("new block {} has no variant", i))
                })?;
                let id = match record.id.clone() {
                    Some(id) if !used.contains(&id) => id,
                    _ => ids.new_unique_id(|candidate| used.contains(candidate)),
                };
                used.insert(id.clone());

                let block_type = record
                    .block_type
                    .clone()
                    .unwrap_or_else(|| config.infer_block_type(&variant));
                let mut block = Block::new(id, block_type, variant);
                block.props = record.props.unwrap_or_default();
                block.element_styles = record.element_styles.unwrap_or_default();
                block.element_content = record.element_content.unwrap_or_default();
                added.push(block);
            }
        }
    }

    let dropped = originals.iter().skip(patches.len()).map(|b| b.id.clone()).collect();
    Ok(PreviewCandidate::Sequence { patches, dropped, added })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::props_from_value;
    use serde_json::json;

    fn request(blocks: Vec<Block>, target: Option<&str>, selected_only: bool) -> BulkEditRequest {
        BulkEditRequest {
            current_blocks: blocks,
            prompt: "make it pop".to_string(),
            edit_type: EditType::Content,
            target_block_id: target.map(BlockId::from),
            edit_selected_only: selected_only,
        }
    }

    fn page() -> Vec<Block> {
        vec![
            Block::new("a", "Hero", "HeroModern").with_props(props_from_value(json!({"title": "Old", "subtitle": "Sub"}))),
            Block::new("b", "Footer", "FooterSimple"),
        ]
    }

    fn replacement(preview: &AiPreview, document: &Document) -> Vec<Block> {
        match preview.to_mutation(document) {
            Some(Mutation::ReplaceBlocks { blocks }) => blocks,
            other => panic!("expected replacement, got {:?}", other),
        }
    }

    #[test]
    fn test_position_merge_preserves_id_and_variant() {
        let mut ids = IdGenerator::new("ai");
        let config = EditorConfig::default();
        let response = json!([
            {"id": "bogus", "variant": "HeroSplit", "props": {"title": "New"}},
            {"props": {"copyright": "2026"}},
            {"variant": "CTABanner", "props": {"ctaText": "Go"}}
        ]);

        let preview = AiPreview::from_response(&request(page(), None, false), &response, &mut ids, &config).unwrap();
        let blocks = replacement(&preview, &Document::from_blocks(page()));

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].id.as_str(), "a");
        assert_eq!(blocks[0].variant, "HeroModern");
        assert_eq!(blocks[0].prop("title"), Some(&json!("New")));
        assert_eq!(blocks[0].prop("subtitle"), Some(&json!("Sub")));
        assert_eq!(blocks[1].id.as_str(), "b");
        assert_eq!(blocks[1].prop("copyright"), Some(&json!("2026")));
        assert_eq!(blocks[2].id.as_str(), "ai-1");
        assert_eq!(blocks[2].block_type, "CTA");
    }

    #[test]
    fn test_patches_resolve_against_current_page() {
        let mut ids = IdGenerator::new("ai");
        let config = EditorConfig::default();
        let response = json!([{"props": {"title": "A2"}}, {"props": {"title": "B2"}}]);
        let preview = AiPreview::from_response(&request(page(), None, false), &response, &mut ids, &config).unwrap();

        // Since the request: a deleted, b edited, c inserted
        let b = page()[1].clone().with_props(props_from_value(json!({"logo": "user"})));
        let c = Block::new("c", "CTA", "CTABanner");
        let blocks = replacement(&preview, &Document::from_blocks(vec![b, c]));

        let ids: Vec<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(blocks[0].prop("title"), Some(&json!("B2")));
        assert_eq!(blocks[0].prop("logo"), Some(&json!("user")));
        assert!(blocks[1].props.is_empty());
    }

    #[test]
    fn test_shorter_response_drops_trailing_blocks() {
        let mut ids = IdGenerator::new("ai");
        let config = EditorConfig::default();
        let response = json!([{"props": {"title": "Only"}}]);
        let preview = AiPreview::from_response(&request(page(), None, false), &response, &mut ids, &config).unwrap();

        let blocks = replacement(&preview, &Document::from_blocks(page()));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id.as_str(), "a");
    }

    #[test]
    fn test_single_edit_merges_by_target() {
        let mut ids = IdGenerator::new("ai");
        let config = EditorConfig::default();
        let response = json!([{"variant": "FooterFancy", "elementContent": {"legal": "All rights"}}]);

        let preview =
            AiPreview::from_response(&request(page(), Some("b"), true), &response, &mut ids, &config).unwrap();

        let document = Document::from_blocks(page());
        let Some(Mutation::ReplaceBlocks { blocks }) = preview.to_mutation(&document) else {
            panic!("expected replacement");
        };
        assert_eq!(blocks[0], page()[0]);
        assert_eq!(blocks[1].id.as_str(), "b");
        assert_eq!(blocks[1].variant, "FooterSimple");
        assert_eq!(blocks[1].element_text("legal"), Some("All rights"));

        // Interim edit to the target survives
        let edited = page()[1].clone().with_props(props_from_value(json!({"copyright": "mine"})));
        let blocks = replacement(&preview, &Document::from_blocks(vec![page()[0].clone(), edited]));
        assert_eq!(blocks[1].prop("copyright"), Some(&json!("mine")));
        assert_eq!(blocks[1].element_text("legal"), Some("All rights"));

        // Target removed before apply
        let emptied = Document::from_blocks(vec![page()[0].clone()]);
        assert!(preview.to_mutation(&emptied).is_none());
    }

    #[test]
    fn test_malformed_response_is_rejected_whole() {
        let mut ids = IdGenerator::new("ai");
        let config = EditorConfig::default();

        for response in [
            json!({"blocks": []}),
            json!([{"props": {}}, "oops"]),
            json!([{"props": {}}, {"props": {}}, {"props": {"title": "no variant"}}]),
            json!("not json at all"),
        ] {
            let result = AiPreview::from_response(&request(page(), None, false), &response, &mut ids, &config);
            assert!(result.is_err(), "accepted {}", response);
        }
    }

    #[test]
    fn test_selected_only_requires_target() {
        let mut ids = IdGenerator::new("ai");
        let config = EditorConfig::default();
        let response = json!([{"props": {}}]);

        let result = AiPreview::from_response(&request(page(), None, true), &response, &mut ids, &config);
        assert!(matches!(result, Err(EditorError::BulkEdit(_))));
    }
}
