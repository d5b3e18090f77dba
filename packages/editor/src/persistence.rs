//! # Page Persistence Boundary
//!
//! Converts between stored section lists and the in-memory block shape.
//!
//! Stored records are normalized on load:
//! - a missing `id` gets a freshly minted one (as does a duplicate)
//! - a missing `type` is inferred from the variant
//! - missing `props` / `elementStyles` / `elementContent` default to empty
//!
//! A list that does not parse as an array of block-shaped records is
//! rejected whole; `load_document` then falls back to an empty page rather
//! than applying part of it.

use crate::block::{Block, BlockId, ElementKey, Props, StyleMap};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::errors::EditorError;
use crate::ids::IdGenerator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Where a builder session's initial page comes from
#[derive(Debug, Clone)]
pub enum PageSource {
    /// Blank page
    Empty,
    /// A stored template's serialized block list
    Template(String),
    /// A stored project page's section list
    ProjectPage(Value),
}

/// Serialized page: the ordered section list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedPage {
    pub sections: Vec<Block>,
}

impl PersistedPage {
    pub fn from_document(document: &Document) -> Self {
        Self {
            sections: document.to_blocks(),
        }
    }

    pub fn to_json_string(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string_pretty(&self.sections)?)
    }
}

/// External page store
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn save_page(&self, page: PersistedPage) -> Result<(), EditorError>;
}

/// Stored section record; every field but `variant` may be absent
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SectionRecord {
    #[serde(default)]
    pub id: Option<BlockId>,
    #[serde(default, rename = "type")]
    pub block_type: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub props: Option<Props>,
    #[serde(default)]
    pub element_styles: Option<BTreeMap<ElementKey, StyleMap>>,
    #[serde(default)]
    pub element_content: Option<BTreeMap<ElementKey, String>>,
}

/// Parse a JSON value into section records.
///
/// Accepts an array, or a string holding a serialized array (templates
/// store their block list as text).
pub(crate) fn parse_records(value: &Value) -> Result<Vec<SectionRecord>, String> {
    match value {
        Value::String(text) => {
            let inner: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
            match inner {
                Value::String(_) => Err("doubly encoded section list".to_string()),
                other => parse_records(&other),
            }
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if !item.is_object() {
                    return Err(format!("section {} is not an object", i));
                }
                SectionRecord::deserialize(item).map_err(|e| format!("section {}: {}", i, e))
            })
            .collect(),
        other => Err(format!("expected an array of sections, found {}", json_kind(other))),
    }
}

/// Normalize stored sections into blocks
pub fn normalize_sections(
    value: &Value,
    ids: &mut IdGenerator,
    config: &EditorConfig,
) -> Result<Vec<Block>, EditorError> {
    let records = parse_records(value).map_err(EditorError::MalformedPage)?;

    let mut seen: HashSet<BlockId> = records.iter().filter_map(|r| r.id.clone()).collect();
    let mut used = HashSet::new();
    let mut blocks = Vec::with_capacity(records.len());

    for (i, record) in records.into_iter().enumerate() {
        let variant = record
            .variant
            .ok_or_else(|| EditorError::MalformedPage(format!("section {} has no variant", i)))?;

        let id = match record.id {
            Some(id) if used.insert(id.clone()) => id,
            _ => {
                let id = ids.new_unique_id(|candidate| seen.contains(candidate));
                seen.insert(id.clone());
                used.insert(id.clone());
                id
            }
        };

        let block_type = record
            .block_type
            .unwrap_or_else(|| config.infer_block_type(&variant));

        blocks.push(Block {
            id,
            block_type,
            variant,
            props: record.props.unwrap_or_default(),
            element_styles: record.element_styles.unwrap_or_default(),
            element_content: record.element_content.unwrap_or_default(),
        });
    }

    Ok(blocks)
}

/// Build the initial document for a session. Malformed stored data yields
/// an empty page.
pub fn load_document(source: &PageSource, ids: &mut IdGenerator, config: &EditorConfig) -> Document {
    let parsed = match source {
        PageSource::Empty => return Document::new(),
        PageSource::Template(text) => serde_json::from_str::<Value>(text)
            .map_err(EditorError::from)
            .and_then(|value| normalize_sections(&value, ids, config)),
        PageSource::ProjectPage(value) => normalize_sections(value, ids, config),
    };

    match parsed {
        Ok(blocks) => {
            tracing::info!(blocks = blocks.len(), "Loaded page");
            Document::from_blocks(blocks)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Stored page is malformed, starting empty");
            Document::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
