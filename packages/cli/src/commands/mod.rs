pub mod apply;
pub mod inspect;

pub use apply::{apply, ApplyArgs};
pub use inspect::{inspect, InspectArgs};

use anyhow::{Context, Result};
use pagekit_editor::{normalize_sections, Document, EditorConfig, IdGenerator};
use std::fs;
use std::path::Path;

/// Read and normalize a stored page. Unlike the builder, the CLI refuses
/// a malformed page instead of opening it empty.
pub(crate) fn read_page(path: &Path, config: &EditorConfig) -> Result<Document> {
    let source = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&source).with_context(|| format!("{} is not valid JSON", path.display()))?;
    let blocks = normalize_sections(&value, &mut IdGenerator::from_clock(), config)?;
    Ok(Document::from_blocks(blocks))
}
