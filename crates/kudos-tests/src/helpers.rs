//! Shared helpers for scenario and property tests.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;

use kudos_core::graph::GraphModel;
use kudos_core::types::{EdgeType, GraphEdge, GraphNode, NodeId};

/// Fixed run timestamp so every test is reproducible.
pub fn run_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_750_000_000, 0).unwrap()
}

/// Owned id list from string literals.
pub fn ids(names: &[&str]) -> Vec<NodeId> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Bare node without metadata.
pub fn node(id: &str) -> GraphNode {
    GraphNode::new(id)
}

/// Node with the recognized metadata keys populated.
pub fn funded_node(id: &str, stake: f64, payment_history: f64, created_days_ago: i64) -> GraphNode {
    let mut node = GraphNode::new(id);
    node.metadata.insert("stake".into(), json!(stake));
    node.metadata
        .insert("paymentHistory".into(), json!(payment_history));
    node.metadata.insert(
        "createdAt".into(),
        json!((run_time() - TimeDelta::days(created_days_ago)).timestamp()),
    );
    node
}

/// Follow edge with weight 1, timestamped `days_ago` before [`run_time`].
pub fn follow(source: &str, target: &str, days_ago: i64) -> GraphEdge {
    GraphEdge::new(
        source,
        target,
        1.0,
        EdgeType::Follow,
        run_time() - TimeDelta::days(days_ago),
    )
}

/// Directed cycle over the given ids, one follow per consecutive pair.
pub fn cycle_graph(names: &[&str]) -> GraphModel {
    let nodes = names.iter().map(|&id| GraphNode::new(id)).collect();
    let edges = names
        .iter()
        .enumerate()
        .map(|(i, &id)| follow(id, names[(i + 1) % names.len()], 1))
        .collect();
    GraphModel::build(nodes, edges).unwrap()
}

/// Synthetic Sybil ring: `n` same-day-created, zero-stake accounts, every
/// ordered pair connected, all edges inside a ten-minute window. Optionally
/// embedded next to a sparse, long-lived background chain.
pub fn sybil_ring(n: usize, background: usize) -> GraphModel {
    let created = run_time() - TimeDelta::hours(3);
    let mut nodes: Vec<GraphNode> = (0..n)
        .map(|i| {
            let mut node = GraphNode::new(format!("ring{i}"));
            node.metadata
                .insert("createdAt".into(), json!(created.timestamp()));
            node.metadata.insert("stake".into(), json!(0.0));
            node
        })
        .collect();

    let mut edges = Vec::new();
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let ts =
                    run_time() - TimeDelta::minutes(10) + TimeDelta::seconds((i * n + j) as i64);
                edges.push(GraphEdge::new(
                    format!("ring{i}"),
                    format!("ring{j}"),
                    1.0,
                    EdgeType::Follow,
                    ts,
                ));
            }
        }
    }

    for b in 0..background {
        nodes.push(funded_node(&format!("bg{b}"), 250.0, 40.0, 600));
    }
    for b in 1..background {
        edges.push(GraphEdge::new(
            format!("bg{}", b - 1),
            format!("bg{b}"),
            1.0,
            EdgeType::Collaborate,
            run_time() - TimeDelta::days(b as i64 * 14),
        ));
    }

    GraphModel::build(nodes, edges).unwrap()
}
