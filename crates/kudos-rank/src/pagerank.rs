//! Power-iteration solver over a graph snapshot.

use std::collections::HashMap;

use tracing::{debug, warn};

use kudos_core::constants::{DEFAULT_DAMPING_FACTOR, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use kudos_core::error::RankError;
use kudos_core::graph::GraphModel;
use kudos_core::traits::StructuralRanker;
use kudos_core::types::RankScores;

/// Solver parameters. Validated before use via [`RankConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankConfig {
    /// Damping factor `d`, domain (0, 1).
    pub damping_factor: f64,
    /// Hard iteration ceiling; hitting it yields `convergent = false`.
    pub max_iterations: usize,
    /// L1 distance between successive score vectors that counts as
    /// converged.
    pub tolerance: f64,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            damping_factor: DEFAULT_DAMPING_FACTOR,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl RankConfig {
    /// Check the parameter domains.
    pub fn validate(&self) -> Result<(), RankError> {
        if !self.damping_factor.is_finite()
            || self.damping_factor <= 0.0
            || self.damping_factor >= 1.0
        {
            return Err(RankError::InvalidDampingFactor(self.damping_factor));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(RankError::InvalidTolerance(self.tolerance));
        }
        if self.max_iterations == 0 {
            return Err(RankError::ZeroIterations);
        }
        Ok(())
    }
}

/// Structural-importance solver using raw edge weights.
#[derive(Debug, Clone)]
pub struct PageRank {
    config: RankConfig,
}

impl PageRank {
    /// Create a solver with a validated configuration.
    pub fn new(config: RankConfig) -> Result<Self, RankError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Solver with default parameters.
    pub fn with_defaults() -> Self {
        Self {
            config: RankConfig::default(),
        }
    }

    /// Run power iteration over the snapshot.
    ///
    /// Scores sum to ≈1 across the graph. A run that hits the iteration cap
    /// returns the last iteration's values with `convergent = false`; this
    /// is data, not an error.
    pub fn compute(&self, graph: &GraphModel) -> RankScores {
        let weights: Vec<f64> = graph.edges().map(|e| e.weight).collect();
        power_iterate(graph, &weights, &self.config)
    }
}

impl StructuralRanker for PageRank {
    fn rank(&self, graph: &GraphModel) -> RankScores {
        self.compute(graph)
    }

    fn method(&self) -> &'static str {
        "pagerank"
    }
}

/// Shared iteration core. `weights[e]` is the effective weight of the e-th
/// edge in snapshot insertion order; callers pre-scale for trust weighting.
///
/// Iteration rule per node `v`:
/// `next[v] = (1-d)/N + d * Σ_{u→v} score[u] * w(u→v)/out_sum(u) + d * dangling/N`
/// where `dangling` is the total prior-iteration score held by nodes without
/// out-edges. Self-loops participate in out-edge normalization like any
/// other edge.
pub(crate) fn power_iterate(
    graph: &GraphModel,
    weights: &[f64],
    config: &RankConfig,
) -> RankScores {
    let n = graph.node_count();
    if n == 0 {
        return RankScores::empty();
    }
    debug_assert_eq!(weights.len(), graph.edge_count());

    let nf = n as f64;
    let d = config.damping_factor;

    let ids: Vec<&str> = graph.node_ids().collect();
    let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    // Per-source out lists in edge insertion order, with summed out-weights.
    let mut out_sum = vec![0.0f64; n];
    let mut out_lists: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for (e, edge) in graph.edges().enumerate() {
        let s = index[edge.source.as_str()];
        let t = index[edge.target.as_str()];
        out_sum[s] += weights[e];
        out_lists[s].push((t, weights[e]));
    }

    let mut scores = vec![1.0 / nf; n];
    let mut iterations = 0;
    let mut convergent = false;

    for iter in 1..=config.max_iterations {
        iterations = iter;
        let mut next = vec![(1.0 - d) / nf; n];

        let dangling_mass: f64 = (0..n)
            .filter(|&i| out_lists[i].is_empty())
            .map(|i| scores[i])
            .sum();
        let dangling_share = d * dangling_mass / nf;
        for slot in next.iter_mut() {
            *slot += dangling_share;
        }

        for u in 0..n {
            if out_lists[u].is_empty() {
                continue;
            }
            let factor = d * scores[u] / out_sum[u];
            for &(t, w) in &out_lists[u] {
                next[t] += factor * w;
            }
        }

        let delta: f64 = next
            .iter()
            .zip(&scores)
            .map(|(a, b)| (a - b).abs())
            .sum();
        scores = next;

        if delta < config.tolerance {
            convergent = true;
            break;
        }
    }

    if convergent {
        debug!(nodes = n, iterations, "power iteration converged");
    } else {
        warn!(
            nodes = n,
            iterations, "power iteration hit cap without reaching tolerance"
        );
    }

    RankScores {
        scores: ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id.to_string(), scores[i]))
            .collect(),
        convergent,
        iterations,
    }
}
