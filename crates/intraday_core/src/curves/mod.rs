//! Observations and their weighted combination into intraday curves.
//!
//! - `observation`: [`Observation`] and its [`Weight`]
//! - `weighter`: [`compute_curve`] producing a [`WeightedCurve`] plus an
//!   advisory [`WeightWarning`]
//! - `outliers`: median-based outlier detection and proposed weights

pub mod observation;
pub mod outliers;
pub mod weighter;

pub use observation::{Observation, Weight, DISTRIBUTION_TOLERANCE};
pub use outliers::{analyse_group, detect_outliers, even_weights, propose_weights};
pub use weighter::{
    compute_curve, total_weight, validate_weights, CurveOutcome, WeightWarning, WeightedCurve,
    TARGET_WEIGHT_TOTAL,
};
