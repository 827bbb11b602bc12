//! Per-node Sybil-risk detector.
//!
//! Four independent factor functions, each normalized to [0, 1]:
//! - **clustering**: neighbour-pair closure in excess of the random-graph
//!   density baseline, weighted against neighbour diversity
//! - **burstiness**: concentration of incident-edge timestamps inside a
//!   rolling window
//! - **economic mismatch**: high activity with near-zero funds
//! - **temporal anomaly**: high activity on a young account
//!
//! Combined as `risk = 0.4 * max(factors) + 0.6 * mean(factors)`: a single
//! extreme signal weighs heavily, while the mean keeps one noisy factor
//! from dominating outright. The combination rule is fixed, not tunable
//! per call.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use kudos_core::constants::{
    ACTIVITY_SATURATION_EDGES, BURST_WINDOW_SECS, FUNDS_SATURATION, MATURE_ACCOUNT_DAYS,
    MIN_BURST_SAMPLE, SYBIL_MEAN_WEIGHT, SYBIL_PEAK_WEIGHT,
};
use kudos_core::error::ComputeError;
use kudos_core::graph::GraphModel;
use kudos_core::types::{EdgeType, GraphNode};

const SECS_PER_DAY: f64 = 86_400.0;

/// Per-factor breakdown of a risk assessment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SybilFactors {
    pub clustering: f64,
    pub burstiness: f64,
    pub economic_mismatch: f64,
    pub temporal_anomaly: f64,
}

impl SybilFactors {
    fn as_array(&self) -> [f64; 4] {
        [
            self.clustering,
            self.burstiness,
            self.economic_mismatch,
            self.temporal_anomaly,
        ]
    }
}

/// Combined risk plus the factor breakdown it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SybilAssessment {
    /// Combined risk in [0, 1].
    pub risk: f64,
    pub factors: SybilFactors,
}

/// Heuristic per-node risk scorer. Stateless; reads only the snapshot.
#[derive(Debug, Clone, Default)]
pub struct SybilDetector;

impl SybilDetector {
    pub fn new() -> Self {
        Self
    }

    /// Score one user against the snapshot.
    ///
    /// `now` is injected by the caller so a run is reproducible.
    pub fn analyze_user(
        &self,
        user: &str,
        graph: &GraphModel,
        now: DateTime<Utc>,
    ) -> Result<SybilAssessment, ComputeError> {
        let node = graph
            .node(user)
            .ok_or_else(|| ComputeError::UnknownUser(user.to_string()))?;

        let factors = SybilFactors {
            clustering: clustering_factor(graph, user),
            burstiness: burstiness_factor(graph, user),
            economic_mismatch: economic_mismatch_factor(graph, node, user),
            temporal_anomaly: temporal_anomaly_factor(graph, node, user, now),
        };

        let values = factors.as_array();
        let peak = values.iter().copied().fold(0.0, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let risk = (SYBIL_PEAK_WEIGHT * peak + SYBIL_MEAN_WEIGHT * mean).clamp(0.0, 1.0);

        debug!(user, risk, peak, mean, "sybil analysis complete");

        Ok(SybilAssessment { risk, factors })
    }
}

/// Incident-edge count scaled into [0, 1].
fn activity_level(graph: &GraphModel, user: &str) -> f64 {
    (graph.degree(user) as f64 / ACTIVITY_SATURATION_EDGES).min(1.0)
}

/// Neighbour-pair closure in excess of the graph's random baseline,
/// discounted by neighbour diversity.
///
/// A tight cluster whose members all interact through one edge type and a
/// handful of counterparties scores high; a well-embedded node whose
/// neighbours happen to know each other scores much lower because its
/// incident edges are diverse.
fn clustering_factor(graph: &GraphModel, user: &str) -> f64 {
    let neighbors = graph.neighbors(user);
    let k = neighbors.len();
    if k < 2 {
        return 0.0;
    }

    let mut connected = 0usize;
    for i in 0..k {
        for j in (i + 1)..k {
            if graph.has_edge(neighbors[i], neighbors[j])
                || graph.has_edge(neighbors[j], neighbors[i])
            {
                connected += 1;
            }
        }
    }
    let pairs = k * (k - 1) / 2;
    let closure = connected as f64 / pairs as f64;

    // Probability a random unordered pair is connected, given the snapshot's
    // overall edge density.
    let n = graph.node_count() as f64;
    let baseline = if n > 1.0 {
        ((2.0 * graph.edge_count() as f64) / (n * (n - 1.0))).min(1.0)
    } else {
        0.0
    };
    let excess = if baseline < 1.0 {
        ((closure - baseline) / (1.0 - baseline)).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let incident: Vec<_> = graph.incident_edges(user).collect();
    if incident.is_empty() {
        return 0.0;
    }
    let type_count = incident
        .iter()
        .map(|e| e.edge_type)
        .collect::<HashSet<_>>()
        .len();
    let type_diversity = type_count as f64 / EdgeType::ALL.len() as f64;
    let counterparty_diversity = (k as f64 / incident.len() as f64).min(1.0);
    let diversity = 0.5 * type_diversity + 0.5 * counterparty_diversity;

    (excess * (1.0 - diversity)).clamp(0.0, 1.0)
}

/// Largest fraction of the user's incident-edge timestamps inside one
/// rolling [`BURST_WINDOW_SECS`] window. Too few edges to judge reads as 0.
fn burstiness_factor(graph: &GraphModel, user: &str) -> f64 {
    let mut timestamps: Vec<i64> = graph
        .incident_edges(user)
        .map(|e| e.timestamp.timestamp())
        .collect();
    let total = timestamps.len();
    if total < MIN_BURST_SAMPLE {
        return 0.0;
    }
    timestamps.sort_unstable();

    let mut max_in_window = 1usize;
    let mut lo = 0usize;
    for hi in 0..total {
        while timestamps[hi] - timestamps[lo] > BURST_WINDOW_SECS {
            lo += 1;
        }
        max_in_window = max_in_window.max(hi - lo + 1);
    }

    (max_in_window as f64 / total as f64).clamp(0.0, 1.0)
}

/// High edge count with near-zero `stake + paymentHistory` scores high;
/// well-funded accounts are damped toward 0 regardless of activity.
fn economic_mismatch_factor(graph: &GraphModel, node: &GraphNode, user: &str) -> f64 {
    let activity = activity_level(graph, user);
    let funded = ((node.stake() + node.payment_history()) / FUNDS_SATURATION).min(1.0);
    (activity * (1.0 - funded)).clamp(0.0, 1.0)
}

/// High edge count on a short-lived account scores high. Unknown creation
/// time contributes a half-strength signal rather than a verdict either way.
fn temporal_anomaly_factor(
    graph: &GraphModel,
    node: &GraphNode,
    user: &str,
    now: DateTime<Utc>,
) -> f64 {
    let activity = activity_level(graph, user);
    match node.created_at() {
        Some(created) => {
            let age_days = (now - created).num_seconds().max(0) as f64 / SECS_PER_DAY;
            let maturity = (age_days / MATURE_ACCOUNT_DAYS).min(1.0);
            (activity * (1.0 - maturity)).clamp(0.0, 1.0)
        }
        None => activity * 0.5,
    }
}
