//! # kudos-rank — Structural-importance solvers.
//!
//! Power-iteration ranking over an immutable [`kudos_core::GraphModel`]:
//! - [`PageRank`]: row-stochastic transition built from normalized out-edge
//!   weights; dangling mass redistributed uniformly each iteration.
//! - [`TrustWeightedPageRank`]: rescales edge influence by external stake and
//!   prior-reputation signals (hard-capped boosts) before iterating.
//!
//! Both solvers are deterministic: node-index iteration order makes repeated
//! runs on an unchanged snapshot bit-identical.

pub mod pagerank;
pub mod trust;

pub use pagerank::{PageRank, RankConfig};
pub use trust::{TrustSignals, TrustWeightedPageRank};
