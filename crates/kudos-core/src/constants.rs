//! Scoring constants. All tuning knobs live here as versioned defaults so the
//! heuristic formulas stay inspectable rather than scattered magic numbers.

/// Default damping factor for power iteration. Must lie in (0, 1).
pub const DEFAULT_DAMPING_FACTOR: f64 = 0.85;

/// Default iteration ceiling for power iteration.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default L1 convergence tolerance between successive score vectors.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Cap on the stake-derived edge boost in trust-weighted ranking.
///
/// Together with [`REPUTATION_BOOST_CAP`] this bounds any single edge's
/// multiplier at `(1 + 0.5) * (1 + 0.3) = 1.95×`, so one heavily staked
/// actor cannot monopolize probability flow.
pub const STAKE_BOOST_CAP: f64 = 0.5;

/// Cap on the prior-reputation edge boost in trust-weighted ranking.
pub const REPUTATION_BOOST_CAP: f64 = 0.3;

/// Weight of the single strongest Sybil factor in the combined risk score.
pub const SYBIL_PEAK_WEIGHT: f64 = 0.4;

/// Weight of the mean across all Sybil factors in the combined risk score.
pub const SYBIL_MEAN_WEIGHT: f64 = 0.6;

/// Fraction of the fused score that Sybil risk can remove at most.
///
/// `final_score *= 1 - risk * SYBIL_SCORE_PENALTY`: a maximally risky
/// account is halved, never zeroed. Scoring, not banning.
pub const SYBIL_SCORE_PENALTY: f64 = 0.5;

/// Default dimension weights for score fusion. Must sum to 1.0.
pub const DEFAULT_STRUCTURAL_WEIGHT: f64 = 0.25;
pub const DEFAULT_BEHAVIORAL_WEIGHT: f64 = 0.20;
pub const DEFAULT_CONTENT_WEIGHT: f64 = 0.20;
pub const DEFAULT_ECONOMIC_WEIGHT: f64 = 0.20;
pub const DEFAULT_TEMPORAL_WEIGHT: f64 = 0.15;

/// Neutral value substituted for dimensions that were not computed from
/// real data (restricted out, or missing metadata).
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Incident-edge degree below which structural signals are considered noisy
/// and confidence is reduced.
pub const LOW_DEGREE_THRESHOLD: usize = 3;

/// Confidence multiplier applied to low-degree nodes.
pub const LOW_DEGREE_CONFIDENCE_FACTOR: f64 = 0.5;

/// Relative weights of reciprocity vs. engagement rate inside the
/// behavioral dimension.
pub const RECIPROCITY_WEIGHT: f64 = 0.6;
pub const ENGAGEMENT_WEIGHT: f64 = 0.4;

/// Edges per day that earn full engagement marks.
pub const ENGAGEMENT_RATE_SCALE: f64 = 1.0;

/// Relative weights of stake vs. payment history inside the economic
/// dimension.
pub const STAKE_WEIGHT: f64 = 0.6;
pub const PAYMENT_WEIGHT: f64 = 0.4;

/// Relative weights of account longevity vs. contribution recency inside
/// the temporal dimension.
pub const LONGEVITY_WEIGHT: f64 = 0.5;
pub const RECENCY_WEIGHT: f64 = 0.5;

/// Account age (days) at which longevity saturates.
pub const ACCOUNT_LONGEVITY_HORIZON_DAYS: f64 = 365.0;

/// Per-day multiplicative decay of the recency signal.
pub const RECENCY_DECAY_PER_DAY: f64 = 0.95;

/// Rolling window for the burstiness factor, in seconds.
pub const BURST_WINDOW_SECS: i64 = 3600;

/// Minimum incident-edge count before burstiness is considered meaningful.
pub const MIN_BURST_SAMPLE: usize = 3;

/// Incident-edge count at which the activity signal saturates.
pub const ACTIVITY_SATURATION_EDGES: f64 = 10.0;

/// Combined `stake + paymentHistory` at which an account counts as fully
/// funded for the economic-mismatch factor.
pub const FUNDS_SATURATION: f64 = 100.0;

/// Account age (days) at which the temporal-anomaly factor stops treating
/// the account as new.
pub const MATURE_ACCOUNT_DAYS: f64 = 30.0;

/// Default number of users per processing chunk in batch runs.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default cap on concurrently in-flight per-user computations.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Default maximum cache entry age, in minutes.
pub const DEFAULT_CACHE_MAX_AGE_MINUTES: i64 = 30;

/// Failure reason recorded for users that were never scheduled because the
/// batch run was cancelled.
pub const CANCELLED_REASON: &str = "cancelled";

/// Recognized node metadata keys.
pub const META_STAKE: &str = "stake";
pub const META_PAYMENT_HISTORY: &str = "paymentHistory";
pub const META_CONTENT_QUALITY: &str = "contentQuality";
pub const META_CREATED_AT: &str = "createdAt";
