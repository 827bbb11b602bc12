//! Trait interfaces between crates.
//!
//! - [`StructuralRanker`] — structural-importance solver (kudos-rank
//!   implements)
//! - [`SnapshotPublisher`] — durable persistence of finished batches
//!   (external collaborator implements; the engine never opens
//!   connections itself)

use async_trait::async_trait;

use crate::error::PublishError;
use crate::graph::GraphModel;
use crate::types::{BatchReputationResult, PublishReceipt, RankScores, RunMetadata};

/// Computes a per-node structural-importance score map over a snapshot.
///
/// Run once per computation run; the resulting [`RankScores`] are reused by
/// every per-user reputation call in that run.
pub trait StructuralRanker: Send + Sync {
    /// Run the solver over the snapshot.
    fn rank(&self, graph: &GraphModel) -> RankScores;

    /// Stable name of the method, recorded in run metadata.
    fn method(&self) -> &'static str;
}

/// Entire contact surface with any persistence/ledger system.
///
/// Receives finished batches for durable, provenance-tagged persistence.
#[async_trait]
pub trait SnapshotPublisher: Send + Sync {
    /// Persist a batch snapshot, returning its durable locator and
    /// transaction reference.
    async fn publish(
        &self,
        scores: &BatchReputationResult,
        metadata: &RunMetadata,
    ) -> Result<PublishReceipt, PublishError>;
}
