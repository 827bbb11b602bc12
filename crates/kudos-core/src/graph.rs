//! Immutable graph snapshot for one computation run.
//!
//! [`GraphModel`] owns the node set and edge list, validated once at
//! construction. Every accessor is read-only; a snapshot may be shared
//! freely across worker threads without synchronization. Nodes and edges
//! keep their insertion order so all downstream computations are
//! deterministic on an unchanged snapshot.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::GraphError;
use crate::types::{GraphEdge, GraphNode, NodeId};

/// Validated, immutable snapshot of nodes and directed edges.
#[derive(Debug, Clone)]
pub struct GraphModel {
    nodes: Vec<GraphNode>,
    index: HashMap<NodeId, usize>,
    edges: Vec<GraphEdge>,
    /// Outgoing edge indices per node, in insertion order.
    out: Vec<Vec<usize>>,
    /// Incoming edge indices per node, in insertion order.
    inc: Vec<Vec<usize>>,
    max_stake: f64,
    max_payment_history: f64,
}

impl GraphModel {
    /// Build a snapshot, enforcing referential integrity.
    ///
    /// Fails on duplicate node ids, non-positive or non-finite edge
    /// weights, and edges referencing unknown nodes. A violation is fatal
    /// to the run; it is never silently dropped.
    pub fn build(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut out = vec![Vec::new(); nodes.len()];
        let mut inc = vec![Vec::new(); nodes.len()];
        for (e, edge) in edges.iter().enumerate() {
            if !edge.weight.is_finite() || edge.weight <= 0.0 {
                return Err(GraphError::InvalidWeight {
                    index: e,
                    weight: edge.weight,
                });
            }
            let s = *index.get(&edge.source).ok_or_else(|| GraphError::UnknownEndpoint {
                index: e,
                id: edge.source.clone(),
            })?;
            let t = *index.get(&edge.target).ok_or_else(|| GraphError::UnknownEndpoint {
                index: e,
                id: edge.target.clone(),
            })?;
            out[s].push(e);
            inc[t].push(e);
        }

        let max_stake = nodes.iter().map(GraphNode::stake).fold(0.0, f64::max);
        let max_payment_history = nodes
            .iter()
            .map(GraphNode::payment_history)
            .fold(0.0, f64::max);

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            "graph snapshot built"
        );

        Ok(Self {
            nodes,
            index,
            edges,
            out,
            inc,
            max_stake,
            max_payment_history,
        })
    }

    /// Number of nodes in the snapshot.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the snapshot (parallel edges counted).
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether a node id exists in the snapshot.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    /// All node ids, in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter()
    }

    /// Outgoing edges of a node, in insertion order. Empty for unknown ids.
    pub fn out_edges(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.index
            .get(id)
            .into_iter()
            .flat_map(move |&i| self.out[i].iter().map(move |&e| &self.edges[e]))
    }

    /// Incoming edges of a node, in insertion order. Empty for unknown ids.
    pub fn in_edges(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.index
            .get(id)
            .into_iter()
            .flat_map(move |&i| self.inc[i].iter().map(move |&e| &self.edges[e]))
    }

    /// Incident edges (outgoing then incoming). A self-loop appears twice.
    pub fn incident_edges(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.out_edges(id).chain(self.in_edges(id))
    }

    /// Outgoing edge count, parallel edges included.
    pub fn out_degree(&self, id: &str) -> usize {
        self.index.get(id).map_or(0, |&i| self.out[i].len())
    }

    /// Incoming edge count, parallel edges included.
    pub fn in_degree(&self, id: &str) -> usize {
        self.index.get(id).map_or(0, |&i| self.inc[i].len())
    }

    /// Total incident edge count (`out_degree + in_degree`).
    pub fn degree(&self, id: &str) -> usize {
        self.out_degree(id) + self.in_degree(id)
    }

    /// Distinct counterparties of a node (either direction, self excluded),
    /// in sorted order.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let mut set = BTreeSet::new();
        for edge in self.out_edges(id) {
            if edge.target != id {
                set.insert(edge.target.as_str());
            }
        }
        for edge in self.in_edges(id) {
            if edge.source != id {
                set.insert(edge.source.as_str());
            }
        }
        set.into_iter().collect()
    }

    /// Whether at least one directed edge `source -> target` exists.
    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.out_edges(source).any(|e| e.target == target)
    }

    /// Timestamp of the most recent edge incident to a node, if any.
    pub fn last_activity(&self, id: &str) -> Option<DateTime<Utc>> {
        self.incident_edges(id).map(|e| e.timestamp).max()
    }

    /// Largest `stake` across all nodes (0 if none carry stake).
    pub fn max_stake(&self) -> f64 {
        self.max_stake
    }

    /// Largest `paymentHistory` across all nodes.
    pub fn max_payment_history(&self) -> f64 {
        self.max_payment_history
    }
}
