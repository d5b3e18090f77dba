//! # Async Content Fill
//!
//! "Placeholder now, enrich later": a dropped palette block is inserted
//! immediately with its seeded props while a content service generates
//! contextual props in the background.
//!
//! ## Protocol
//!
//! 1. `begin` inserts the seeded block (one history step), marks the drop
//!    index as loading and spawns the service call
//! 2. The user keeps editing; nothing waits on the call
//! 3. `next_settled` / `settle_ready` fold finished calls back in with an
//!    ordinary `UpdateProps` keyed by block id (a second history step), so
//!    a moved block is still found and a deleted one absorbs the result as
//!    a no-op
//! 4. A failed call (error or panic) is logged and leaves the seeded block
//!    in place
//!
//! The enrichment result is a shallow merge and wins over any edits made
//! to the same keys while the call was in flight.

use crate::block::{Block, BlockId, Props};
use crate::document::Document;
use crate::errors::EditorError;
use crate::session::EditSession;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Request sent to the content service
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRequest {
    pub variant: String,
    pub project_description: String,
    /// Page as it was when the block was dropped
    pub existing_blocks: Vec<Block>,
}

/// External content generation service
#[async_trait]
pub trait ContentEnricher: Send + Sync {
    async fn enrich(&self, request: EnrichmentRequest) -> Result<Props, EditorError>;
}

/// Handle for one in-flight fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FillTicket(u64);

/// How a finished fill was folded back in
#[derive(Debug)]
pub enum FillSettlement {
    /// Props merged; `changed` is false when they matched what was there
    Enriched { block_id: BlockId, changed: bool },
    /// Block was deleted before the result arrived
    BlockGone { block_id: BlockId },
    /// Service failed; the seeded block stays as it is
    Failed { block_id: BlockId, error: EditorError },
}

#[derive(Debug)]
struct PendingFill {
    block_id: BlockId,
    /// Drop position shown as loading, until settled or superseded
    loading_index: Option<usize>,
    seeded: Props,
}

#[derive(Debug)]
struct FillResult {
    ticket: FillTicket,
    result: Result<Props, EditorError>,
}

/// Tracks seeded blocks awaiting enrichment
pub struct FillCoordinator {
    enricher: Arc<dyn ContentEnricher>,
    project_description: String,
    next_ticket: u64,
    pending: HashMap<FillTicket, PendingFill>,
    tx: mpsc::UnboundedSender<FillResult>,
    rx: mpsc::UnboundedReceiver<FillResult>,
}

impl FillCoordinator {
    pub fn new(enricher: Arc<dyn ContentEnricher>, project_description: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            enricher,
            project_description: project_description.into(),
            next_ticket: 0,
            pending: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Insert a seeded block at `index` and start enriching it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn begin(
        &mut self,
        session: &mut EditSession,
        index: usize,
        variant: &str,
        block_type: Option<&str>,
        seeded: Props,
    ) -> (FillTicket, BlockId) {
        let existing_blocks = session.document().to_blocks();
        let block_id = session.insert_new(index, variant, block_type, seeded.clone());
        let loading_index = session.document().index_of(&block_id);

        self.next_ticket += 1;
        let ticket = FillTicket(self.next_ticket);
        self.pending.insert(
            ticket,
            PendingFill {
                block_id: block_id.clone(),
                loading_index,
                seeded,
            },
        );

        let request = EnrichmentRequest {
            variant: variant.to_string(),
            project_description: self.project_description.clone(),
            existing_blocks,
        };
        let enricher = Arc::clone(&self.enricher);
        let tx = self.tx.clone();

        tracing::debug!(block_id = %block_id, variant, index, "Enrichment started");
        tokio::spawn(async move {
            // Run the call in its own task so a panic comes back as a JoinError
            // and the fill still settles
            let call = tokio::spawn(async move { enricher.enrich(request).await });
            let result = match call.await {
                Ok(result) => result,
                Err(e) => Err(EditorError::Enrichment(format!("enrichment task aborted: {}", e))),
            };
            // Receiver only goes away with the coordinator
            let _ = tx.send(FillResult { ticket, result });
        });

        (ticket, block_id)
    }

    /// Wait for the next fill to finish and fold it into the session.
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn next_settled(&mut self, session: &mut EditSession) -> Option<FillSettlement> {
        loop {
            if self.pending.is_empty() {
                return None;
            }
            let finished = self.rx.recv().await?;
            if let Some(settlement) = self.settle(session, finished) {
                return Some(settlement);
            }
        }
    }

    /// Fold in every fill that has already finished, without waiting
    pub fn settle_ready(&mut self, session: &mut EditSession) -> Vec<FillSettlement> {
        let mut settled = Vec::new();
        while let Ok(finished) = self.rx.try_recv() {
            settled.extend(self.settle(session, finished));
        }
        settled
    }

    fn settle(&mut self, session: &mut EditSession, finished: FillResult) -> Option<FillSettlement> {
        let pending = self.pending.remove(&finished.ticket)?;
        let block_id = pending.block_id;

        let props = match finished.result {
            Ok(props) => props,
            Err(error) => {
                tracing::warn!(block_id = %block_id, error = %error, "Enrichment failed, keeping seeded props");
                return Some(FillSettlement::Failed { block_id, error });
            }
        };

        let Some(current) = session.document().block(&block_id) else {
            tracing::debug!(block_id = %block_id, "Enriched block was removed, dropping result");
            return Some(FillSettlement::BlockGone { block_id });
        };

        let overwritten: Vec<&str> = props
            .keys()
            .filter(|key| current.props.get(*key) != pending.seeded.get(*key))
            .map(String::as_str)
            .collect();
        if !overwritten.is_empty() {
            tracing::debug!(block_id = %block_id, keys = ?overwritten, "Enrichment overwrites interim edits");
        }

        let changed = session.update_props(&block_id, props);
        tracing::debug!(block_id = %block_id, changed, "Enrichment applied");
        Some(FillSettlement::Enriched { block_id, changed })
    }

    /// Drop loading markers whose block was deleted or moved off the
    /// marked index
    pub fn refresh_loading(&mut self, document: &Document) {
        for pending in self.pending.values_mut() {
            if let Some(index) = pending.loading_index {
                if document.index_of(&pending.block_id) != Some(index) {
                    pending.loading_index = None;
                }
            }
        }
    }

    /// Indices currently showing a loading affordance, ascending
    pub fn loading_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.pending.values().filter_map(|p| p.loading_index).collect();
        indices.sort_unstable();
        indices
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, block_id: &BlockId) -> bool {
        self.pending.values().any(|p| &p.block_id == block_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::props_from_value;
    use crate::config::EditorConfig;
    use crate::ids::IdGenerator;
    use serde_json::json;

    struct FixedEnricher(Result<Props, String>);

    #[async_trait]
    impl ContentEnricher for FixedEnricher {
        async fn enrich(&self, _request: EnrichmentRequest) -> Result<Props, EditorError> {
            self.0.clone().map_err(EditorError::Enrichment)
        }
    }

    fn session() -> EditSession {
        EditSession::new(EditorConfig::default()).with_id_generator(IdGenerator::new("f"))
    }

    #[tokio::test]
    async fn test_success_adds_second_history_step() {
        let mut session = session();
        let enricher = Arc::new(FixedEnricher(Ok(props_from_value(json!({"title": "Generated"})))));
        let mut fills = FillCoordinator::new(enricher, "A bakery");

        let (_, id) = fills.begin(&mut session, 0, "HeroModern", None, props_from_value(json!({"title": "Title"})));
        assert_eq!(fills.loading_indices(), vec![0]);
        assert_eq!(session.history().undo_label(), Some("insert"));

        let settlement = fills.next_settled(&mut session).await.unwrap();
        assert!(matches!(settlement, FillSettlement::Enriched { changed: true, .. }));
        assert!(fills.loading_indices().is_empty());
        assert_eq!(session.document().block(&id).unwrap().prop("title"), Some(&json!("Generated")));

        session.undo();
        assert_eq!(session.document().block(&id).unwrap().prop("title"), Some(&json!("Title")));
        session.undo();
        assert!(session.document().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_seeded_block() {
        let mut session = session();
        let enricher = Arc::new(FixedEnricher(Err("quota exceeded".to_string())));
        let mut fills = FillCoordinator::new(enricher, "");

        let (_, id) = fills.begin(&mut session, 0, "PricingSimple", None, Props::new());
        let depth = session.history().len();

        let settlement = fills.next_settled(&mut session).await.unwrap();
        assert!(matches!(settlement, FillSettlement::Failed { .. }));
        assert!(session.document().contains(&id));
        assert_eq!(session.history().len(), depth);
        assert!(fills.next_settled(&mut session).await.is_none());
    }

    struct PanickingEnricher;

    #[async_trait]
    impl ContentEnricher for PanickingEnricher {
        async fn enrich(&self, _request: EnrichmentRequest) -> Result<Props, EditorError> {
            panic!("content service client crashed");
        }
    }

    #[tokio::test]
    async fn test_panicking_call_settles_as_failure() {
        let mut session = session();
        let mut fills = FillCoordinator::new(Arc::new(PanickingEnricher), "");

        let (_, id) = fills.begin(&mut session, 0, "HeroModern", None, props_from_value(json!({"title": "Seed"})));
        assert_eq!(fills.loading_indices(), vec![0]);

        let settled = tokio::time::timeout(std::time::Duration::from_secs(5), fills.next_settled(&mut session))
            .await
            .expect("fill never settled");
        assert!(matches!(settled, Some(FillSettlement::Failed { .. })));
        assert_eq!(fills.in_flight(), 0);
        assert!(fills.loading_indices().is_empty());
        assert_eq!(session.document().block(&id).unwrap().prop("title"), Some(&json!("Seed")));
    }

    #[tokio::test]
    async fn test_deleted_block_absorbs_result() {
        let mut session = session();
        let enricher = Arc::new(FixedEnricher(Ok(props_from_value(json!({"title": "late"})))));
        let mut fills = FillCoordinator::new(enricher, "");

        let (_, id) = fills.begin(&mut session, 0, "HeroModern", None, Props::new());
        session.remove(&id);
        fills.refresh_loading(session.document());
        assert!(fills.loading_indices().is_empty());
        assert!(fills.is_pending(&id));

        let depth = session.history().len();
        let settlement = fills.next_settled(&mut session).await.unwrap();
        assert!(matches!(settlement, FillSettlement::BlockGone { .. }));
        assert!(session.document().is_empty());
        assert_eq!(session.history().len(), depth);
    }
}
