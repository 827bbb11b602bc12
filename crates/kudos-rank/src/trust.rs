//! Trust-weighted variant of the power-iteration solver.
//!
//! Edge influence is rescaled by external signals about the *target* before
//! normalization: stake and prior reputation each contribute a boost capped
//! at [`STAKE_BOOST_CAP`] / [`REPUTATION_BOOST_CAP`], so no single boosted
//! edge exceeds a 1.95× multiplier. Everything after the rescale follows
//! [`crate::PageRank`]'s iteration exactly.

use std::collections::HashMap;

use kudos_core::constants::{REPUTATION_BOOST_CAP, STAKE_BOOST_CAP};
use kudos_core::error::RankError;
use kudos_core::graph::GraphModel;
use kudos_core::traits::StructuralRanker;
use kudos_core::types::{NodeId, RankScores};

use crate::pagerank::{RankConfig, power_iterate};

/// External trust signals, keyed by node id. Absent entries read as 0.
#[derive(Debug, Clone, Default)]
pub struct TrustSignals {
    pub stake: HashMap<NodeId, f64>,
    pub reputation: HashMap<NodeId, f64>,
}

impl TrustSignals {
    pub fn new(stake: HashMap<NodeId, f64>, reputation: HashMap<NodeId, f64>) -> Self {
        Self { stake, reputation }
    }

    fn max_of(map: &HashMap<NodeId, f64>) -> f64 {
        map.values()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

/// Signal value normalized against the graph-wide maximum, capped.
/// Returns 0 when the maximum is 0 (no signal anywhere).
fn boost(map: &HashMap<NodeId, f64>, id: &str, max: f64, cap: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    let value = map.get(id).copied().unwrap_or(0.0).max(0.0);
    (value / max).min(cap)
}

/// Power-iteration solver with trust-rescaled edge weights.
#[derive(Debug, Clone)]
pub struct TrustWeightedPageRank {
    config: RankConfig,
    signals: TrustSignals,
}

impl TrustWeightedPageRank {
    /// Create a solver with a validated configuration and trust signals.
    pub fn new(config: RankConfig, signals: TrustSignals) -> Result<Self, RankError> {
        config.validate()?;
        Ok(Self { config, signals })
    }

    /// Run power iteration with rescaled edge weights.
    ///
    /// `effective_weight = weight * (1 + stake_boost(target))
    ///                            * (1 + reputation_boost(target))`
    /// with each boost capped. Holding everything else fixed, raising a
    /// node's stake entry never lowers that node's score.
    pub fn compute(&self, graph: &GraphModel) -> RankScores {
        let max_stake = TrustSignals::max_of(&self.signals.stake);
        let max_reputation = TrustSignals::max_of(&self.signals.reputation);

        let weights: Vec<f64> = graph
            .edges()
            .map(|e| {
                let stake_boost = boost(&self.signals.stake, &e.target, max_stake, STAKE_BOOST_CAP);
                let reputation_boost = boost(
                    &self.signals.reputation,
                    &e.target,
                    max_reputation,
                    REPUTATION_BOOST_CAP,
                );
                e.weight * (1.0 + stake_boost) * (1.0 + reputation_boost)
            })
            .collect();

        power_iterate(graph, &weights, &self.config)
    }
}

impl StructuralRanker for TrustWeightedPageRank {
    fn rank(&self, graph: &GraphModel) -> RankScores {
        self.compute(graph)
    }

    fn method(&self) -> &'static str {
        "trust_weighted_pagerank"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use kudos_core::types::{EdgeType, GraphEdge, GraphNode};
    use proptest::prelude::*;

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge::new(source, target, 1.0, EdgeType::Endorse, DateTime::UNIX_EPOCH)
    }

    fn diamond() -> GraphModel {
        // a endorses both b and c; b and c both endorse d.
        let nodes = ["a", "b", "c", "d"].map(GraphNode::new).to_vec();
        let edges = vec![
            edge("a", "b"),
            edge("a", "c"),
            edge("b", "d"),
            edge("c", "d"),
            edge("d", "a"),
        ];
        GraphModel::build(nodes, edges).unwrap()
    }

    fn stakes(entries: &[(&str, f64)]) -> HashMap<NodeId, f64> {
        entries.iter().map(|(id, v)| (id.to_string(), *v)).collect()
    }

    // --- boost computation ---

    #[test]
    fn boost_zero_when_no_signal_anywhere() {
        let map = HashMap::new();
        assert_eq!(boost(&map, "x", 0.0, STAKE_BOOST_CAP), 0.0);
    }

    #[test]
    fn boost_capped_at_limit() {
        let map = stakes(&[("x", 100.0)]);
        assert_eq!(boost(&map, "x", 100.0, STAKE_BOOST_CAP), STAKE_BOOST_CAP);
    }

    #[test]
    fn boost_proportional_below_cap() {
        let map = stakes(&[("x", 25.0), ("y", 100.0)]);
        assert!((boost(&map, "x", 100.0, STAKE_BOOST_CAP) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn negative_signal_reads_as_zero() {
        let map = stakes(&[("x", -5.0), ("y", 100.0)]);
        assert_eq!(boost(&map, "x", 100.0, STAKE_BOOST_CAP), 0.0);
    }

    // --- solver behaviour ---

    #[test]
    fn no_signals_matches_plain_pagerank() {
        let graph = diamond();
        let plain = crate::PageRank::with_defaults().compute(&graph);
        let trust = TrustWeightedPageRank::new(RankConfig::default(), TrustSignals::default())
            .unwrap()
            .compute(&graph);
        assert_eq!(plain.scores, trust.scores);
    }

    #[test]
    fn staked_node_gains_over_unstaked_twin() {
        // b and c are structurally symmetric; staking b must break the tie
        // in b's favour.
        let graph = diamond();
        let signals = TrustSignals::new(stakes(&[("b", 50.0)]), HashMap::new());
        let result = TrustWeightedPageRank::new(RankConfig::default(), signals)
            .unwrap()
            .compute(&graph);
        assert!(
            result.score("b") > result.score("c"),
            "staked b should outrank c: {} vs {}",
            result.score("b"),
            result.score("c")
        );
    }

    #[test]
    fn raising_stake_never_lowers_own_score() {
        let graph = diamond();
        let mut previous = 0.0;
        for stake in [0.0, 10.0, 50.0, 200.0, 1000.0] {
            let signals = TrustSignals::new(stakes(&[("b", stake), ("c", 10.0)]), HashMap::new());
            let score = TrustWeightedPageRank::new(RankConfig::default(), signals)
                .unwrap()
                .compute(&graph)
                .score("b");
            assert!(
                score >= previous - 1e-12,
                "monotonicity violated at stake {stake}: {score} < {previous}"
            );
            previous = score;
        }
    }

    #[test]
    fn scores_still_sum_to_one_with_boosts() {
        let graph = diamond();
        let signals = TrustSignals::new(
            stakes(&[("a", 10.0), ("b", 90.0)]),
            stakes(&[("d", 7.0)]),
        );
        let result = TrustWeightedPageRank::new(RankConfig::default(), signals)
            .unwrap()
            .compute(&graph);
        let sum: f64 = result.scores.values().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = RankConfig {
            damping_factor: 2.0,
            ..RankConfig::default()
        };
        assert!(TrustWeightedPageRank::new(config, TrustSignals::default()).is_err());
    }

    // --- proptest ---

    proptest! {
        /// Monotonicity: raising one node's stake entry, all else equal,
        /// never decreases that node's resulting score.
        #[test]
        fn stake_monotonicity(
            base in 0.0f64..100.0,
            bump in 0.0f64..100.0,
            other in 0.0f64..100.0,
        ) {
            let graph = diamond();
            let lo = TrustSignals::new(stakes(&[("b", base), ("c", other)]), HashMap::new());
            let hi = TrustSignals::new(stakes(&[("b", base + bump), ("c", other)]), HashMap::new());
            let score_lo = TrustWeightedPageRank::new(RankConfig::default(), lo)
                .unwrap()
                .compute(&graph)
                .score("b");
            let score_hi = TrustWeightedPageRank::new(RankConfig::default(), hi)
                .unwrap()
                .compute(&graph)
                .score("b");
            prop_assert!(
                score_hi >= score_lo - 1e-9,
                "stake {} -> {} lowered score {} -> {}",
                base, base + bump, score_lo, score_hi
            );
        }
    }
}
