//! Weighted combination of observations into one intraday curve.
//!
//! For every bucket the curve value is
//!
//! ```text
//! curve[b] = Σ observation.distribution[b] · observation.weight / 100
//! ```
//!
//! over the observations that are not flagged as outliers. The result
//! is never renormalised: when the active weights do not total 100 the
//! curve is scaled by whatever they do total and a [`WeightWarning`] is
//! returned alongside it, so the discrepancy stays visible.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::observation::Observation;
use crate::types::{BucketGrid, BucketMap, DistributionError, TimeBucket};

/// Weight total the active observations of a group are expected to reach.
pub const TARGET_WEIGHT_TOTAL: u32 = 100;

/// Normalised intraday curve for one grouping.
///
/// A derived view: recomputed from observations on every weight edit or
/// outlier toggle, never stored apart from its grouping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedCurve {
    values: BucketMap<f64>,
}

impl WeightedCurve {
    /// Wraps precomputed per-bucket fractions (e.g. a saved curve).
    pub fn new(values: BucketMap<f64>) -> Self {
        Self { values }
    }

    /// All-zero curve over the given buckets.
    pub fn zeros(buckets: impl IntoIterator<Item = TimeBucket>) -> Self {
        Self {
            values: buckets.into_iter().map(|b| (b, 0.0)).collect(),
        }
    }

    /// Value for one bucket, 0 when absent.
    pub fn get(&self, bucket: TimeBucket) -> f64 {
        self.values.get(&bucket).copied().unwrap_or(0.0)
    }

    /// Per-bucket values in bucket order.
    pub fn values(&self) -> &BucketMap<f64> {
        &self.values
    }

    /// Iterates `(bucket, value)` in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (TimeBucket, f64)> + '_ {
        self.values.iter().map(|(b, v)| (*b, *v))
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the curve has no buckets at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum over all buckets.
    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    /// True when empty or every value is zero.
    pub fn is_zero(&self) -> bool {
        self.values.values().all(|v| *v == 0.0)
    }

    /// Highest-demand bucket; the first one in bucket order wins ties.
    pub fn peak(&self) -> Option<(TimeBucket, f64)> {
        let mut peak: Option<(TimeBucket, f64)> = None;
        for (bucket, value) in self.iter() {
            match peak {
                Some((_, best)) if value <= best => {}
                _ => peak = Some((bucket, value)),
            }
        }
        peak
    }

    /// Curve laid out on `grid`: grid buckets missing here become 0,
    /// buckets outside the grid are dropped.
    pub fn on_grid(&self, grid: &BucketGrid) -> Self {
        Self {
            values: grid.iter().map(|b| (b, self.get(b))).collect(),
        }
    }
}

impl FromIterator<(TimeBucket, f64)> for WeightedCurve {
    fn from_iter<I: IntoIterator<Item = (TimeBucket, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Advisory warning: active weights do not total exactly 100.
///
/// # Examples
///
/// ```
/// use intraday_core::curves::WeightWarning;
///
/// let warning = WeightWarning { total: 97 };
/// assert_eq!(warning.delta(), -3);
/// assert_eq!(warning.to_string(), "total weight must be exactly 100%, got 97%");
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightWarning {
    /// Actual total of the active weights.
    pub total: u32,
}

impl WeightWarning {
    /// Expected total.
    pub fn expected(&self) -> u32 {
        TARGET_WEIGHT_TOTAL
    }

    /// Signed difference `total - 100`; negative is a deficit.
    pub fn delta(&self) -> i64 {
        i64::from(self.total) - i64::from(TARGET_WEIGHT_TOTAL)
    }
}

impl fmt::Display for WeightWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total weight must be exactly {}%, got {}%",
            TARGET_WEIGHT_TOTAL, self.total
        )
    }
}

/// Result of weighting one group of observations.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveOutcome {
    /// The weighted curve (all-zero when nothing could be weighted).
    pub curve: WeightedCurve,
    /// Set when the active weights do not total 100.
    pub weight_warning: Option<WeightWarning>,
    /// Number of observations that took part (not outliers).
    pub active_count: usize,
}

impl CurveOutcome {
    /// True when the curve is usable and the weights are exact.
    pub fn is_clean(&self) -> bool {
        self.weight_warning.is_none() && !self.curve.is_zero()
    }

    /// Hands the curve on for distribution, failing if it is all-zero.
    ///
    /// The weight warning does not block; callers that want stricter
    /// behaviour check [`CurveOutcome::weight_warning`] themselves.
    pub fn into_curve(self) -> Result<WeightedCurve, DistributionError> {
        if self.curve.is_zero() {
            return Err(DistributionError::NoCurveAvailable);
        }
        Ok(self.curve)
    }
}

/// Sum of weights over observations that are not outliers.
pub fn total_weight(observations: &[Observation]) -> u32 {
    observations
        .iter()
        .filter(|o| !o.is_outlier())
        .map(|o| o.weight().get())
        .sum()
}

/// Checks the active weight total, returning a warning when it is not 100.
pub fn validate_weights(observations: &[Observation]) -> Option<WeightWarning> {
    let total = total_weight(observations);
    (total != TARGET_WEIGHT_TOTAL).then_some(WeightWarning { total })
}

/// Combines observations of one grouping into a weighted curve.
///
/// The curve spans every bucket present in any observation, outliers
/// included, so the label set survives even when all are excluded.
/// An empty set, all outliers, or a zero weight total produce an
/// all-zero curve.
///
/// # Examples
///
/// ```
/// use intraday_core::curves::{compute_curve, Observation};
/// use intraday_core::types::{BucketMap, Date, TimeBucket};
///
/// let nine = TimeBucket::parse("09:00").unwrap();
/// let ten = TimeBucket::parse("10:00").unwrap();
/// let a = Observation::new(
///     Date::from_ymd(2024, 3, 4).unwrap(),
///     BucketMap::from([(nine, 0.2), (ten, 0.8)]),
/// ).unwrap().with_weight(60).unwrap();
/// let b = Observation::new(
///     Date::from_ymd(2024, 3, 11).unwrap(),
///     BucketMap::from([(nine, 0.6), (ten, 0.4)]),
/// ).unwrap().with_weight(40).unwrap();
///
/// let outcome = compute_curve(&[a, b]);
/// assert!(outcome.weight_warning.is_none());
/// assert!((outcome.curve.get(nine) - 0.36).abs() < 1e-12);
/// assert!((outcome.curve.get(ten) - 0.64).abs() < 1e-12);
/// ```
pub fn compute_curve(observations: &[Observation]) -> CurveOutcome {
    let mut values: BucketMap<f64> = observations
        .iter()
        .flat_map(|o| o.distribution().keys().copied())
        .map(|b| (b, 0.0))
        .collect();

    let mut active_count = 0;
    for observation in observations.iter().filter(|o| !o.is_outlier()) {
        active_count += 1;
        let share = observation.weight().fraction();
        if share == 0.0 {
            continue;
        }
        for (bucket, fraction) in observation.distribution() {
            if let Some(slot) = values.get_mut(bucket) {
                *slot += fraction * share;
            }
        }
    }

    let weight_warning = validate_weights(observations);
    debug!(
        observations = observations.len(),
        active = active_count,
        buckets = values.len(),
        weight_total = total_weight(observations),
        "weighted curve recomputed"
    );

    CurveOutcome {
        curve: WeightedCurve::new(values),
        weight_warning,
        active_count,
    }
}
