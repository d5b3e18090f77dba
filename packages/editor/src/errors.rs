//! Error types for the editor
//!
//! Missing block ids are not errors: mutations that reference them are
//! no-ops (see `MutationOutcome`). Only genuine external failures surface
//! here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Malformed page data: {0}")]
    MalformedPage(String),

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    #[error("Content enrichment failed: {0}")]
    Enrichment(String),

    #[error("Bulk edit failed: {0}")]
    BulkEdit(String),

    #[error("Page store error: {0}")]
    Store(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
