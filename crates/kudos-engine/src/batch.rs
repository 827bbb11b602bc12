//! Batch fan-out over the per-user analyzer.
//!
//! [`BatchReputationEngine`] runs the structural solver once at
//! construction, then serves batch requests with bounded parallelism: user
//! lists are split into `batch_size` chunks and at most `max_workers`
//! per-user computations are in flight at any moment. Every unit of work is
//! isolated; one user's failure is recorded and never aborts or delays a
//! sibling. Successes are written through to the shared cache.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use kudos_core::constants::CANCELLED_REASON;
use kudos_core::error::{ComputeError, PublishError};
use kudos_core::graph::GraphModel;
use kudos_core::traits::{SnapshotPublisher, StructuralRanker};
use kudos_core::types::{
    BatchReputationResult, Dimension, NodeId, PublishReceipt, RankScores, ReputationResult,
    RunMetadata,
};
use kudos_rank::{PageRank, TrustWeightedPageRank};

use crate::cache::ReputationCache;
use crate::config::{BatchConfig, EngineConfig};
use crate::reputation::ReputationAnalyzer;

/// Cooperative cancellation handle for a batch run.
///
/// Cancelling stops the scheduling of new per-user computations; in-flight
/// ones run to completion and unstarted users are marked failed with reason
/// `"cancelled"`. Per-user computations are independent, so cancellation
/// never leaves partial per-user state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Batch reputation processor over one immutable snapshot.
pub struct BatchReputationEngine {
    graph: Arc<GraphModel>,
    analyzer: Arc<ReputationAnalyzer>,
    cache: ReputationCache,
    batch: BatchConfig,
    method: &'static str,
}

impl BatchReputationEngine {
    /// Build an engine for one run, solving structural importance up front.
    ///
    /// The trust-weighted solver is used when `config.trust` is present.
    pub fn new(graph: Arc<GraphModel>, config: EngineConfig) -> Result<Self, ComputeError> {
        Self::with_run_time(graph, config, Utc::now())
    }

    /// Like [`Self::new`] with an explicit run timestamp, for reproducible
    /// runs and tests.
    pub fn with_run_time(
        graph: Arc<GraphModel>,
        config: EngineConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ComputeError> {
        let (structural, method) = match config.trust {
            Some(signals) => {
                let solver = TrustWeightedPageRank::new(config.rank, signals)?;
                let scores = solver.rank(&graph);
                (scores, solver.method())
            }
            None => {
                let solver = PageRank::new(config.rank)?;
                let scores = solver.rank(&graph);
                (scores, solver.method())
            }
        };
        if !structural.convergent {
            warn!(
                iterations = structural.iterations,
                "structural solver hit iteration cap; proceeding with last iterate"
            );
        }

        let analyzer = ReputationAnalyzer::new(Arc::clone(&graph), structural, config.weights, now)?;

        Ok(Self {
            graph,
            analyzer: Arc::new(analyzer),
            cache: ReputationCache::new(),
            batch: config.batch,
            method,
        })
    }

    /// Name of the structural solver backing this run.
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// The snapshot this engine computes over.
    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    /// Structural scores computed at construction.
    pub fn structural_scores(&self) -> &RankScores {
        self.analyzer.structural_scores()
    }

    /// Compute reputation for a list of users.
    pub async fn compute_batch(
        &self,
        users: &[NodeId],
        dimensions: Option<&[Dimension]>,
    ) -> BatchReputationResult {
        self.compute_batch_with_cancel(users, dimensions, &CancelToken::new())
            .await
    }

    /// Compute reputation for a list of users under a cancellation token.
    ///
    /// Invariant: `total_processed + total_failed` equals the requested
    /// list length, duplicates included.
    pub async fn compute_batch_with_cancel(
        &self,
        users: &[NodeId],
        dimensions: Option<&[Dimension]>,
        cancel: &CancelToken,
    ) -> BatchReputationResult {
        let started = Instant::now();
        let dims: Option<Arc<Vec<Dimension>>> = dimensions.map(|d| Arc::new(d.to_vec()));
        let semaphore = Arc::new(Semaphore::new(self.batch.max_workers.max(1)));

        let mut scores = HashMap::new();
        let mut failed = HashMap::new();
        let mut total_processed = 0usize;
        let mut total_failed = 0usize;

        for chunk in users.chunks(self.batch.batch_size.max(1)) {
            let mut tasks: JoinSet<(NodeId, Result<ReputationResult, ComputeError>)> =
                JoinSet::new();
            let mut task_users: HashMap<tokio::task::Id, NodeId> = HashMap::new();

            for user in chunk {
                if cancel.is_cancelled() {
                    failed.insert(user.clone(), CANCELLED_REASON.to_string());
                    total_failed += 1;
                    continue;
                }

                let permit = Arc::clone(&semaphore)
                    .acquire_owned()
                    .await
                    .expect("engine semaphore never closed");
                let analyzer = Arc::clone(&self.analyzer);
                let task_user = user.clone();
                let task_dims = dims.clone();
                let handle = tasks.spawn(async move {
                    let _permit = permit;
                    let selection = task_dims.as_deref().map(Vec::as_slice);
                    let result = analyzer.compute_user_reputation(&task_user, selection);
                    (task_user, result)
                });
                task_users.insert(handle.id(), user.clone());
            }

            while let Some(joined) = tasks.join_next_with_id().await {
                match joined {
                    Ok((_, (user, Ok(result)))) => {
                        self.cache.insert(result.clone(), Utc::now());
                        scores.insert(user, result);
                        total_processed += 1;
                    }
                    Ok((_, (user, Err(error)))) => {
                        debug!(%user, %error, "per-user computation failed");
                        failed.insert(user, error.to_string());
                        total_failed += 1;
                    }
                    Err(join_error) => {
                        // A panicking task still only takes its own user down.
                        let user = task_users
                            .get(&join_error.id())
                            .cloned()
                            .unwrap_or_default();
                        warn!(%user, %join_error, "per-user task aborted");
                        failed.insert(user, format!("task aborted: {join_error}"));
                        total_failed += 1;
                    }
                }
            }
        }

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            requested = users.len(),
            processed = total_processed,
            failed = total_failed,
            elapsed_ms = processing_time_ms,
            "batch reputation run complete"
        );

        BatchReputationResult {
            scores,
            failed,
            total_processed,
            total_failed,
            processing_time_ms,
        }
    }

    /// Recompute only a changed frontier of users against the current
    /// snapshot, evicting their cache entries first.
    ///
    /// Structural scores are global: this engine's were solved once at
    /// construction, so a frontier recompute reuses them and is therefore
    /// approximate for the structural dimension. When structural accuracy
    /// matters after edge mutations, rebuild the engine on a fresh snapshot
    /// instead.
    pub async fn compute_incremental(
        &self,
        changed: &[NodeId],
        dimensions: Option<&[Dimension]>,
    ) -> BatchReputationResult {
        for user in changed {
            self.cache.evict(user);
        }
        debug!(frontier = changed.len(), "incremental recompute over changed users");
        self.compute_batch(changed, dimensions).await
    }

    /// Cached result for `user` if it is at most `max_age_minutes` old.
    /// Stale-or-absent is always a miss, never an error.
    pub fn cached_reputation(&self, user: &str, max_age_minutes: i64) -> Option<ReputationResult> {
        self.cache.fresh(user, max_age_minutes, Utc::now())
    }

    /// Cached result under the engine's configured default max age.
    pub fn cached_reputation_default(&self, user: &str) -> Option<ReputationResult> {
        self.cached_reputation(user, self.batch.cache_max_age_minutes)
    }

    /// Number of cached results.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Hand a finished batch to the publisher collaborator together with
    /// run-level metadata. The engine itself never opens connections.
    pub async fn publish(
        &self,
        result: &BatchReputationResult,
        provenance: BTreeMap<String, String>,
        publisher: &dyn SnapshotPublisher,
    ) -> Result<PublishReceipt, PublishError> {
        let metadata = RunMetadata {
            computation_method: self.method.to_string(),
            timestamp: Utc::now(),
            provenance,
        };
        let receipt = publisher.publish(result, &metadata).await?;
        info!(locator = %receipt.locator, "snapshot published");
        Ok(receipt)
    }
}
