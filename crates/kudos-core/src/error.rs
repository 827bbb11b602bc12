//! Error types for the Kudos engine.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("duplicate node id: {0}")] DuplicateNode(String),
    #[error("edge {index} references unknown node: {id}")] UnknownEndpoint { index: usize, id: String },
    #[error("edge {index} has invalid weight: {weight}")] InvalidWeight { index: usize, weight: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
    #[error("damping factor outside (0, 1): {0}")] InvalidDampingFactor(f64),
    #[error("tolerance must be positive: {0}")] InvalidTolerance(f64),
    #[error("max iterations must be non-zero")] ZeroIterations,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("unknown user: {0}")] UnknownUser(String),
    #[error("dimension weights sum to {sum}, expected 1.0")] InvalidDimensionWeights { sum: f64 },
    #[error(transparent)] Rank(#[from] RankError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    #[error("snapshot rejected by publisher: {0}")] Rejected(String),
    #[error("publisher unavailable: {0}")] Unavailable(String),
}

#[derive(Error, Debug)]
pub enum KudosError {
    #[error(transparent)] Graph(#[from] GraphError),
    #[error(transparent)] Rank(#[from] RankError),
    #[error(transparent)] Compute(#[from] ComputeError),
    #[error(transparent)] Publish(#[from] PublishError),
}
