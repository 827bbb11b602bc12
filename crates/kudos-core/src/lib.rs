//! # kudos-core
//! Foundation types and traits for the Kudos reputation engine.

pub mod constants;
pub mod error;
pub mod graph;
pub mod traits;
pub mod types;

pub use graph::GraphModel;
pub use types::{
    BatchReputationResult, ComponentScores, Dimension, EdgeType, GraphEdge, GraphNode, NodeId,
    PublishReceipt, RankScores, ReputationResult, RunMetadata,
};
