//! # kudos-engine — Reputation fusion and batch processing.
//!
//! Composes the structural solvers, the Sybil detector, and three further
//! signal extractors into one fused per-user result, then scales that out:
//! - [`ReputationAnalyzer`]: five-dimension score fusion with tunable
//!   weights, Sybil penalty, confidence, and a plain-language explanation.
//! - [`BatchReputationEngine`]: chunked, semaphore-bounded fan-out with
//!   per-user failure isolation, a time-boxed shared cache, cooperative
//!   cancellation, and the publisher hand-off.

pub mod batch;
pub mod cache;
pub mod config;
pub mod reputation;

pub use batch::{BatchReputationEngine, CancelToken};
pub use cache::ReputationCache;
pub use config::{BatchConfig, DimensionWeights, EngineConfig};
pub use reputation::ReputationAnalyzer;
