//! Core data types for graph snapshots and reputation results.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    META_CONTENT_QUALITY, META_CREATED_AT, META_PAYMENT_HISTORY, META_STAKE, NEUTRAL_SCORE,
};

/// Stable, unique actor identifier (DID, handle, or synthetic id).
pub type NodeId = String;

/// Typed relationship carried by a directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    Follow,
    Endorse,
    Collaborate,
    Transact,
}

impl EdgeType {
    /// All edge types, in wire order.
    pub const ALL: [EdgeType; 4] = [
        EdgeType::Follow,
        EdgeType::Endorse,
        EdgeType::Collaborate,
        EdgeType::Transact,
    ];
}

/// An actor in the social/contribution graph.
///
/// Nodes are immutable once a snapshot is built; a changed actor is
/// represented by re-ingesting into a new snapshot. The metadata map is
/// open-ended; the typed accessors below cover the recognized keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl GraphNode {
    /// Node with no metadata.
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Node with the given metadata map.
    pub fn with_metadata(id: impl Into<NodeId>, metadata: BTreeMap<String, Value>) -> Self {
        Self {
            id: id.into(),
            metadata,
        }
    }

    fn metadata_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(Value::as_f64)
    }

    /// Staked amount; absent or negative values read as 0.
    pub fn stake(&self) -> f64 {
        self.metadata_f64(META_STAKE).unwrap_or(0.0).max(0.0)
    }

    /// Cumulative payment history; absent or negative values read as 0.
    pub fn payment_history(&self) -> f64 {
        self.metadata_f64(META_PAYMENT_HISTORY)
            .unwrap_or(0.0)
            .max(0.0)
    }

    /// Externally supplied content-quality signal on a 0–100 scale, if any.
    pub fn content_quality(&self) -> Option<f64> {
        self.metadata_f64(META_CONTENT_QUALITY)
            .map(|q| q.clamp(0.0, 100.0))
    }

    /// Account creation time, parsed from an RFC 3339 string or integer
    /// epoch seconds. `None` if absent or unparseable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self.metadata.get(META_CREATED_AT)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            other => other.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }
    }
}

/// A directed, weighted, typed interaction between two actors.
///
/// Parallel edges between the same ordered pair are permitted and are never
/// coalesced; each contributes independently to weighted sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    pub edge_type: EdgeType,
    pub timestamp: DateTime<Utc>,
}

impl GraphEdge {
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        weight: f64,
        edge_type: EdgeType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
            edge_type,
            timestamp,
        }
    }
}

/// One of the five independent reputation signal families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Structural,
    Behavioral,
    Content,
    Economic,
    Temporal,
}

impl Dimension {
    /// All dimensions, in fusion order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Structural,
        Dimension::Behavioral,
        Dimension::Content,
        Dimension::Economic,
        Dimension::Temporal,
    ];

    /// Human-readable name used in explanations.
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Structural => "structural",
            Dimension::Behavioral => "behavioral",
            Dimension::Content => "content",
            Dimension::Economic => "economic",
            Dimension::Temporal => "temporal",
        }
    }
}

/// Output of a structural-importance solver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankScores {
    /// Per-node score. Sums to ≈1 across the graph.
    pub scores: HashMap<NodeId, f64>,
    /// `false` if the solver hit its iteration cap before reaching
    /// tolerance. Not an error; callers must inspect this.
    pub convergent: bool,
    /// Iterations actually performed.
    pub iterations: usize,
}

impl RankScores {
    /// Empty result for an empty graph.
    pub fn empty() -> Self {
        Self {
            scores: HashMap::new(),
            convergent: true,
            iterations: 0,
        }
    }

    /// Score for a node, 0 if unknown.
    pub fn score(&self, id: &str) -> f64 {
        self.scores.get(id).copied().unwrap_or(0.0)
    }

    /// Largest score in the run, 0 for an empty graph.
    pub fn max_score(&self) -> f64 {
        self.scores.values().copied().fold(0.0, f64::max)
    }
}

/// Per-dimension scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub structural: f64,
    pub behavioral: f64,
    pub content: f64,
    pub economic: f64,
    pub temporal: f64,
}

impl Default for ComponentScores {
    fn default() -> Self {
        Self {
            structural: NEUTRAL_SCORE,
            behavioral: NEUTRAL_SCORE,
            content: NEUTRAL_SCORE,
            economic: NEUTRAL_SCORE,
            temporal: NEUTRAL_SCORE,
        }
    }
}

impl ComponentScores {
    pub fn get(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Structural => self.structural,
            Dimension::Behavioral => self.behavioral,
            Dimension::Content => self.content,
            Dimension::Economic => self.economic,
            Dimension::Temporal => self.temporal,
        }
    }

    pub fn set(&mut self, dim: Dimension, value: f64) {
        match dim {
            Dimension::Structural => self.structural = value,
            Dimension::Behavioral => self.behavioral = value,
            Dimension::Content => self.content = value,
            Dimension::Economic => self.economic = value,
            Dimension::Temporal => self.temporal = value,
        }
    }
}

/// Fused reputation result for a single actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationResult {
    pub user_id: NodeId,
    /// Fused score in [0, 1] after the Sybil penalty.
    pub final_score: f64,
    pub component_scores: ComponentScores,
    /// Heuristic Sybil-risk estimate in [0, 1].
    pub sybil_risk: f64,
    /// Share of the result resting on real (non-default) data, in [0, 1].
    pub confidence: f64,
    /// Short summary naming the dominant contributing dimension(s).
    pub explanation: String,
    /// Whether the underlying structural solver reached tolerance.
    pub convergent: bool,
}

/// Outcome of a batch run over a requested user list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReputationResult {
    pub scores: HashMap<NodeId, ReputationResult>,
    /// Per-user failure reasons; failures never abort sibling work.
    pub failed: HashMap<NodeId, String>,
    pub total_processed: usize,
    pub total_failed: usize,
    pub processing_time_ms: u64,
}

/// Run-level metadata handed to the snapshot publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    /// Name of the structural solver used, e.g. `"trust_weighted_pagerank"`.
    pub computation_method: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provenance: BTreeMap<String, String>,
}

/// Receipt returned by the publisher collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    /// Durable locator of the published snapshot (UAL, URI, key…).
    pub locator: String,
    /// Ledger or store transaction reference.
    pub transaction_reference: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_with(key: &str, value: Value) -> GraphNode {
        let mut metadata = BTreeMap::new();
        metadata.insert(key.to_string(), value);
        GraphNode::with_metadata("n", metadata)
    }

    // --- metadata accessors ---

    #[test]
    fn stake_defaults_to_zero() {
        assert_eq!(GraphNode::new("n").stake(), 0.0);
    }

    #[test]
    fn stake_reads_number() {
        assert_eq!(node_with("stake", json!(42.5)).stake(), 42.5);
    }

    #[test]
    fn negative_stake_clamped_to_zero() {
        assert_eq!(node_with("stake", json!(-3.0)).stake(), 0.0);
    }

    #[test]
    fn content_quality_clamped_to_scale() {
        assert_eq!(node_with("contentQuality", json!(250.0)).content_quality(), Some(100.0));
        assert_eq!(node_with("contentQuality", json!(-5.0)).content_quality(), Some(0.0));
        assert_eq!(GraphNode::new("n").content_quality(), None);
    }

    #[test]
    fn created_at_parses_rfc3339() {
        let node = node_with("createdAt", json!("2024-03-01T12:00:00Z"));
        let ts = node.created_at().unwrap();
        assert_eq!(ts.timestamp(), 1_709_294_400);
    }

    #[test]
    fn created_at_parses_epoch_seconds() {
        let node = node_with("createdAt", json!(1_709_294_400));
        assert_eq!(node.created_at().unwrap().timestamp(), 1_709_294_400);
    }

    #[test]
    fn created_at_garbage_is_none() {
        assert!(node_with("createdAt", json!("not a date")).created_at().is_none());
        assert!(GraphNode::new("n").created_at().is_none());
    }

    // --- wire forms ---

    #[test]
    fn edge_type_wire_form_is_screaming() {
        assert_eq!(serde_json::to_string(&EdgeType::Follow).unwrap(), "\"FOLLOW\"");
        let parsed: EdgeType = serde_json::from_str("\"TRANSACT\"").unwrap();
        assert_eq!(parsed, EdgeType::Transact);
    }

    #[test]
    fn edge_uses_camel_case_keys() {
        let edge = GraphEdge::new("a", "b", 1.0, EdgeType::Endorse, DateTime::UNIX_EPOCH);
        let json = serde_json::to_value(&edge).unwrap();
        assert!(json.get("edgeType").is_some());
        assert!(json.get("edge_type").is_none());
    }

    // --- component scores ---

    #[test]
    fn component_scores_default_neutral() {
        let scores = ComponentScores::default();
        for dim in Dimension::ALL {
            assert_eq!(scores.get(dim), NEUTRAL_SCORE);
        }
    }

    #[test]
    fn component_scores_set_get_roundtrip() {
        let mut scores = ComponentScores::default();
        scores.set(Dimension::Economic, 0.9);
        assert_eq!(scores.get(Dimension::Economic), 0.9);
        assert_eq!(scores.get(Dimension::Structural), NEUTRAL_SCORE);
    }

    // --- rank scores ---

    #[test]
    fn rank_scores_empty_is_convergent() {
        let scores = RankScores::empty();
        assert!(scores.convergent);
        assert_eq!(scores.score("missing"), 0.0);
        assert_eq!(scores.max_score(), 0.0);
    }
}
