//! # kudos-sybil — Heuristic Sybil-risk scoring.
//!
//! Per-node risk estimation combining four independent factor families:
//! excess clustering, timestamp burstiness, economic mismatch, and temporal
//! anomaly. All factors are explicit, inspectable formulas over the graph
//! snapshot; nothing is learned.

pub mod detector;

pub use detector::{SybilAssessment, SybilDetector, SybilFactors};
