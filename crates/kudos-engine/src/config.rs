//! Engine configuration.
//!
//! All knobs are explicit constructor-supplied objects with validating
//! accessors; nothing is read from globals or the environment.

use kudos_core::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_BEHAVIORAL_WEIGHT, DEFAULT_CACHE_MAX_AGE_MINUTES,
    DEFAULT_CONTENT_WEIGHT, DEFAULT_ECONOMIC_WEIGHT, DEFAULT_MAX_WORKERS,
    DEFAULT_STRUCTURAL_WEIGHT, DEFAULT_TEMPORAL_WEIGHT,
};
use kudos_core::error::ComputeError;
use kudos_core::types::Dimension;
use kudos_rank::{RankConfig, TrustSignals};

/// Tolerance when checking that dimension weights sum to 1.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Fusion weights for the five reputation dimensions. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionWeights {
    pub structural: f64,
    pub behavioral: f64,
    pub content: f64,
    pub economic: f64,
    pub temporal: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            structural: DEFAULT_STRUCTURAL_WEIGHT,
            behavioral: DEFAULT_BEHAVIORAL_WEIGHT,
            content: DEFAULT_CONTENT_WEIGHT,
            economic: DEFAULT_ECONOMIC_WEIGHT,
            temporal: DEFAULT_TEMPORAL_WEIGHT,
        }
    }
}

impl DimensionWeights {
    /// Validated construction.
    pub fn new(
        structural: f64,
        behavioral: f64,
        content: f64,
        economic: f64,
        temporal: f64,
    ) -> Result<Self, ComputeError> {
        let weights = Self {
            structural,
            behavioral,
            content,
            economic,
            temporal,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Check that the weights sum to 1 (within tolerance).
    pub fn validate(&self) -> Result<(), ComputeError> {
        let sum = Dimension::ALL.iter().map(|&d| self.weight(d)).sum::<f64>();
        if !sum.is_finite() || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ComputeError::InvalidDimensionWeights { sum });
        }
        Ok(())
    }

    /// Weight of one dimension.
    pub fn weight(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Structural => self.structural,
            Dimension::Behavioral => self.behavioral,
            Dimension::Content => self.content,
            Dimension::Economic => self.economic,
            Dimension::Temporal => self.temporal,
        }
    }
}

/// Batch-processing knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchConfig {
    /// Users per processing chunk.
    pub batch_size: usize,
    /// Cap on concurrently in-flight per-user computations.
    pub max_workers: usize,
    /// Default maximum cache entry age, in minutes.
    pub cache_max_age_minutes: i64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            cache_max_age_minutes: DEFAULT_CACHE_MAX_AGE_MINUTES,
        }
    }
}

/// Full configuration for a [`crate::BatchReputationEngine`] run.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Structural solver parameters.
    pub rank: RankConfig,
    /// Fusion weights.
    pub weights: DimensionWeights,
    /// Batch-processing knobs.
    pub batch: BatchConfig,
    /// External trust signals; when present the trust-weighted solver is
    /// used instead of the plain one.
    pub trust: Option<TrustSignals>,
}
