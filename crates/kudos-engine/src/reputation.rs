//! Multi-dimensional reputation fusion for a single run.
//!
//! [`ReputationAnalyzer`] is built once per computation run from the
//! snapshot and the precomputed structural scores, then answers per-user
//! queries. It holds no mutable state and may be shared freely across
//! worker tasks.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use tracing::debug;

use kudos_core::constants::{
    ACCOUNT_LONGEVITY_HORIZON_DAYS, ACTIVITY_SATURATION_EDGES, ENGAGEMENT_RATE_SCALE,
    ENGAGEMENT_WEIGHT, LONGEVITY_WEIGHT, LOW_DEGREE_CONFIDENCE_FACTOR, LOW_DEGREE_THRESHOLD,
    META_PAYMENT_HISTORY, META_STAKE, NEUTRAL_SCORE, PAYMENT_WEIGHT, RECENCY_DECAY_PER_DAY,
    RECENCY_WEIGHT, RECIPROCITY_WEIGHT, STAKE_WEIGHT, SYBIL_SCORE_PENALTY,
};
use kudos_core::error::ComputeError;
use kudos_core::graph::GraphModel;
use kudos_core::types::{ComponentScores, Dimension, GraphNode, RankScores, ReputationResult};
use kudos_sybil::SybilDetector;

use crate::config::DimensionWeights;

const SECS_PER_DAY: f64 = 86_400.0;

/// Sybil risk above which the explanation mentions the penalty.
const EXPLAINED_RISK_THRESHOLD: f64 = 0.6;

/// Ratio to the top contribution at which a runner-up dimension is also
/// named in the explanation.
const CO_DOMINANT_RATIO: f64 = 0.8;

/// Per-run fusion of the five signal dimensions into one result per user.
pub struct ReputationAnalyzer {
    graph: Arc<GraphModel>,
    structural: RankScores,
    max_structural: f64,
    detector: SybilDetector,
    weights: DimensionWeights,
    now: DateTime<Utc>,
}

impl ReputationAnalyzer {
    /// Build an analyzer for one run.
    ///
    /// `structural` is the solver output for this snapshot; it is reused by
    /// every per-user call. `now` is injected so a run is reproducible.
    pub fn new(
        graph: Arc<GraphModel>,
        structural: RankScores,
        weights: DimensionWeights,
        now: DateTime<Utc>,
    ) -> Result<Self, ComputeError> {
        weights.validate()?;
        let max_structural = structural.max_score();
        Ok(Self {
            graph,
            structural,
            max_structural,
            detector: SybilDetector::new(),
            weights,
            now,
        })
    }

    /// The structural scores this analyzer fuses from.
    pub fn structural_scores(&self) -> &RankScores {
        &self.structural
    }

    /// Compute the fused reputation for one user.
    ///
    /// `dimensions` optionally restricts which of the five are computed;
    /// the rest stay at the neutral 0.5 and lower the confidence.
    pub fn compute_user_reputation(
        &self,
        user: &str,
        dimensions: Option<&[Dimension]>,
    ) -> Result<ReputationResult, ComputeError> {
        let node = self
            .graph
            .node(user)
            .ok_or_else(|| ComputeError::UnknownUser(user.to_string()))?;
        let active = dimensions.unwrap_or(&Dimension::ALL);

        let mut components = ComponentScores::default();
        let mut real_count = 0usize;
        for dim in Dimension::ALL {
            if !active.contains(&dim) {
                continue;
            }
            let (value, real) = match dim {
                Dimension::Structural => self.structural_dimension(user),
                Dimension::Behavioral => self.behavioral_dimension(user, node),
                Dimension::Content => content_dimension(node),
                Dimension::Economic => self.economic_dimension(node),
                Dimension::Temporal => self.temporal_dimension(user, node),
            };
            components.set(dim, value.clamp(0.0, 1.0));
            if real {
                real_count += 1;
            }
        }

        let sybil_risk = self.detector.analyze_user(user, &self.graph, self.now)?.risk;

        let fused: f64 = Dimension::ALL
            .iter()
            .map(|&dim| self.weights.weight(dim) * components.get(dim))
            .sum();
        let final_score = (fused * (1.0 - sybil_risk * SYBIL_SCORE_PENALTY)).clamp(0.0, 1.0);

        let mut confidence = real_count as f64 / Dimension::ALL.len() as f64;
        if self.graph.degree(user) < LOW_DEGREE_THRESHOLD {
            confidence *= LOW_DEGREE_CONFIDENCE_FACTOR;
        }

        let explanation = self.explain(&components, sybil_risk);

        debug!(user, final_score, sybil_risk, confidence, "reputation computed");

        Ok(ReputationResult {
            user_id: user.to_string(),
            final_score,
            component_scores: components,
            sybil_risk,
            confidence: confidence.clamp(0.0, 1.0),
            explanation,
            convergent: self.structural.convergent,
        })
    }

    /// Solver score rescaled into [0, 1] against the run maximum.
    fn structural_dimension(&self, user: &str) -> (f64, bool) {
        if self.max_structural <= 0.0 {
            return (0.0, false);
        }
        ((self.structural.score(user) / self.max_structural).clamp(0.0, 1.0), true)
    }

    /// Edge reciprocity blended with engagement rate.
    ///
    /// Reciprocity is the fraction of outgoing edges whose target has any
    /// edge back. Engagement is edges per day of account age; without a
    /// known age the incident-edge count stands in.
    fn behavioral_dimension(&self, user: &str, node: &GraphNode) -> (f64, bool) {
        let out_edges: Vec<_> = self.graph.out_edges(user).collect();
        let reciprocity = if out_edges.is_empty() {
            0.0
        } else {
            let reciprocal = out_edges
                .iter()
                .filter(|e| self.graph.has_edge(&e.target, user))
                .count();
            reciprocal as f64 / out_edges.len() as f64
        };

        let degree = self.graph.degree(user) as f64;
        let engagement = match node.created_at() {
            Some(created) => {
                let age_days =
                    ((self.now - created).num_seconds().max(0) as f64 / SECS_PER_DAY).max(1.0);
                ((degree / age_days) / ENGAGEMENT_RATE_SCALE).min(1.0)
            }
            None => (degree / ACTIVITY_SATURATION_EDGES).min(1.0),
        };

        (
            RECIPROCITY_WEIGHT * reciprocity + ENGAGEMENT_WEIGHT * engagement,
            true,
        )
    }

    /// Stake and payment history normalized against the graph maxima.
    fn economic_dimension(&self, node: &GraphNode) -> (f64, bool) {
        let has_signal = node.metadata.contains_key(META_STAKE)
            || node.metadata.contains_key(META_PAYMENT_HISTORY);
        let stake_part = if self.graph.max_stake() > 0.0 {
            node.stake() / self.graph.max_stake()
        } else {
            0.0
        };
        let payment_part = if self.graph.max_payment_history() > 0.0 {
            node.payment_history() / self.graph.max_payment_history()
        } else {
            0.0
        };
        (
            STAKE_WEIGHT * stake_part + PAYMENT_WEIGHT * payment_part,
            has_signal,
        )
    }

    /// Account longevity blended with contribution recency.
    ///
    /// Old accounts with recent activity score highest; very new or long
    /// stale ones decay toward the low end.
    fn temporal_dimension(&self, user: &str, node: &GraphNode) -> (f64, bool) {
        let Some(created) = node.created_at() else {
            return (NEUTRAL_SCORE, false);
        };
        let age_days = (self.now - created).num_seconds().max(0) as f64 / SECS_PER_DAY;
        let longevity = (age_days / ACCOUNT_LONGEVITY_HORIZON_DAYS).min(1.0);
        let recency = match self.graph.last_activity(user) {
            Some(last) => {
                let idle_days = (self.now - last).num_seconds().max(0) as f64 / SECS_PER_DAY;
                RECENCY_DECAY_PER_DAY.powf(idle_days)
            }
            None => 0.0,
        };
        (LONGEVITY_WEIGHT * longevity + RECENCY_WEIGHT * recency, true)
    }

    /// Short summary naming the one or two dominant weighted contributors.
    fn explain(&self, components: &ComponentScores, sybil_risk: f64) -> String {
        explain_with_weights(&self.weights, components, sybil_risk)
    }
}

/// Externally supplied quality signal normalized to [0, 1]; neutral when
/// absent.
fn content_dimension(node: &GraphNode) -> (f64, bool) {
    match node.content_quality() {
        Some(quality) => (quality / 100.0, true),
        None => (NEUTRAL_SCORE, false),
    }
}

/// Short summary naming the one or two dominant weighted contributors.
fn explain_with_weights(
    weights: &DimensionWeights,
    components: &ComponentScores,
    sybil_risk: f64,
) -> String {
    let mut contributions: Vec<(Dimension, f64)> = Dimension::ALL
        .iter()
        .map(|&dim| (dim, weights.weight(dim) * components.get(dim)))
        .collect();
    contributions.sort_by_key(|&(_, value)| Reverse(OrderedFloat(value)));

    let (top, top_value) = contributions[0];
    let mut text = match contributions.get(1) {
        Some(&(second, second_value))
            if top_value > 0.0 && second_value >= CO_DOMINANT_RATIO * top_value =>
        {
            format!(
                "driven primarily by {} and {} signals",
                top.name(),
                second.name()
            )
        }
        _ => format!("driven primarily by {} signals", top.name()),
    };
    if sybil_risk > EXPLAINED_RISK_THRESHOLD {
        text.push_str(", tempered by elevated sybil risk");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use kudos_core::types::{EdgeType, GraphEdge};
    use kudos_rank::{PageRank, RankConfig};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    /// alice: funded, quality-verified, long-lived, reciprocated edges.
    /// bob: unfunded but established. carol: bare node with one in-edge.
    fn fixture() -> Arc<GraphModel> {
        let mut alice = GraphNode::new("alice");
        alice.metadata.insert("stake".into(), json!(100.0));
        alice.metadata.insert("paymentHistory".into(), json!(50.0));
        alice.metadata.insert("contentQuality".into(), json!(80.0));
        alice.metadata.insert(
            "createdAt".into(),
            json!((now() - TimeDelta::days(400)).timestamp()),
        );

        let mut bob = GraphNode::new("bob");
        bob.metadata.insert(
            "createdAt".into(),
            json!((now() - TimeDelta::days(200)).timestamp()),
        );

        let carol = GraphNode::new("carol");

        let edges = vec![
            GraphEdge::new("alice", "bob", 1.0, EdgeType::Follow, now() - TimeDelta::days(10)),
            GraphEdge::new("bob", "alice", 1.0, EdgeType::Follow, now() - TimeDelta::days(9)),
            GraphEdge::new("alice", "carol", 1.0, EdgeType::Endorse, now() - TimeDelta::days(5)),
        ];
        Arc::new(GraphModel::build(vec![alice, bob, carol], edges).unwrap())
    }

    fn analyzer(graph: Arc<GraphModel>) -> ReputationAnalyzer {
        let structural = PageRank::with_defaults().compute(&graph);
        ReputationAnalyzer::new(graph, structural, DimensionWeights::default(), now()).unwrap()
    }

    #[test]
    fn unknown_user_rejected() {
        let analyzer = analyzer(fixture());
        let err = analyzer.compute_user_reputation("ghost", None).unwrap_err();
        assert_eq!(err, ComputeError::UnknownUser("ghost".into()));
    }

    #[test]
    fn all_outputs_bounded() {
        let analyzer = analyzer(fixture());
        for user in ["alice", "bob", "carol"] {
            let result = analyzer.compute_user_reputation(user, None).unwrap();
            assert!((0.0..=1.0).contains(&result.final_score), "{user} final");
            assert!((0.0..=1.0).contains(&result.sybil_risk), "{user} risk");
            assert!((0.0..=1.0).contains(&result.confidence), "{user} confidence");
            for dim in Dimension::ALL {
                let value = result.component_scores.get(dim);
                assert!((0.0..=1.0).contains(&value), "{user} {dim:?} = {value}");
            }
        }
    }

    #[test]
    fn full_metadata_yields_full_confidence() {
        let analyzer = analyzer(fixture());
        let result = analyzer.compute_user_reputation("alice", None).unwrap();
        // All five dimensions rest on real data and alice's degree is not low.
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn bare_node_confidence_reduced() {
        let analyzer = analyzer(fixture());
        let result = analyzer.compute_user_reputation("carol", None).unwrap();
        // Structural + behavioral are real; content/economic/temporal are
        // defaults, and the single incident edge triggers the low-degree cut.
        assert_eq!(result.confidence, 2.0 / 5.0 * LOW_DEGREE_CONFIDENCE_FACTOR);
        assert_eq!(result.component_scores.content, NEUTRAL_SCORE);
        assert_eq!(result.component_scores.temporal, NEUTRAL_SCORE);
    }

    #[test]
    fn restricting_dimensions_leaves_rest_neutral() {
        let analyzer = analyzer(fixture());
        let result = analyzer
            .compute_user_reputation("alice", Some(&[Dimension::Structural]))
            .unwrap();
        assert_eq!(result.component_scores.content, NEUTRAL_SCORE);
        assert_eq!(result.component_scores.economic, NEUTRAL_SCORE);
        assert_eq!(result.component_scores.behavioral, NEUTRAL_SCORE);
        assert_eq!(result.component_scores.temporal, NEUTRAL_SCORE);
        assert!(result.component_scores.structural > 0.0);
        assert_eq!(result.confidence, 1.0 / 5.0);
    }

    #[test]
    fn restriction_lowers_confidence_versus_full_run() {
        let analyzer = analyzer(fixture());
        let full = analyzer.compute_user_reputation("alice", None).unwrap();
        let restricted = analyzer
            .compute_user_reputation("alice", Some(&[Dimension::Economic]))
            .unwrap();
        assert!(restricted.confidence < full.confidence);
    }

    #[test]
    fn content_quality_feeds_content_dimension() {
        let analyzer = analyzer(fixture());
        let result = analyzer.compute_user_reputation("alice", None).unwrap();
        assert!((result.component_scores.content - 0.8).abs() < 1e-12);
    }

    #[test]
    fn reciprocated_edges_raise_behavioral() {
        let analyzer = analyzer(fixture());
        let alice = analyzer.compute_user_reputation("alice", None).unwrap();
        let carol = analyzer.compute_user_reputation("carol", None).unwrap();
        // Half of alice's out-edges are reciprocated; carol has none out.
        assert!(alice.component_scores.behavioral > carol.component_scores.behavioral);
    }

    #[test]
    fn economic_top_of_graph_scores_high() {
        let analyzer = analyzer(fixture());
        let result = analyzer.compute_user_reputation("alice", None).unwrap();
        // alice holds both graph maxima, so the economic dimension is full.
        assert!((result.component_scores.economic - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sybil_penalty_caps_at_half() {
        let analyzer = analyzer(fixture());
        let result = analyzer.compute_user_reputation("alice", None).unwrap();
        let fused: f64 = Dimension::ALL
            .iter()
            .map(|&d| DimensionWeights::default().weight(d) * result.component_scores.get(d))
            .sum();
        assert!(result.final_score >= fused * 0.5 - 1e-12);
        assert!(result.final_score <= fused + 1e-12);
    }

    #[test]
    fn explanation_names_a_dimension() {
        let analyzer = analyzer(fixture());
        let result = analyzer.compute_user_reputation("alice", None).unwrap();
        assert!(result.explanation.starts_with("driven primarily by"));
        assert!(
            Dimension::ALL
                .iter()
                .any(|d| result.explanation.contains(d.name())),
            "explanation should name a dimension: {}",
            result.explanation
        );
    }

    #[test]
    fn non_convergent_rank_propagates() {
        let graph = fixture();
        let config = RankConfig {
            max_iterations: 1,
            tolerance: 1e-15,
            ..RankConfig::default()
        };
        let structural = PageRank::new(config).unwrap().compute(&graph);
        assert!(!structural.convergent);
        let analyzer =
            ReputationAnalyzer::new(graph, structural, DimensionWeights::default(), now()).unwrap();
        let result = analyzer.compute_user_reputation("alice", None).unwrap();
        assert!(!result.convergent);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let analyzer = analyzer(fixture());
        let first = analyzer.compute_user_reputation("bob", None).unwrap();
        let second = analyzer.compute_user_reputation("bob", None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_weights_rejected_at_construction() {
        let graph = fixture();
        let structural = PageRank::with_defaults().compute(&graph);
        let weights = DimensionWeights {
            structural: 0.9,
            ..DimensionWeights::default()
        };
        assert!(ReputationAnalyzer::new(graph, structural, weights, now()).is_err());
    }
}
