//! Outlier detection and proposed weights for a group of observations.
//!
//! Both work against a reference curve: the per-bucket median of the
//! observations involved. An observation's deviation is the mean squared
//! difference between its distribution and that reference.
//!
//! - [`detect_outliers`] flags observations whose deviation is above
//!   `Q3 + 1.5·IQR` of the group's deviations (needs at least four).
//! - [`propose_weights`] scores the remaining observations on similarity
//!   to the reference and on recency, and turns the scores into integer
//!   percentages totalling 100.

use tracing::debug;

use super::observation::Observation;
use crate::distribution::apportion::apportion;
use crate::types::{BucketMap, CurveError, TimeBucket};

/// Minimum group size before any outlier detection runs.
pub const MIN_OBSERVATIONS_FOR_REFERENCE: usize = 2;

/// Minimum group size before the IQR fence is applied.
pub const MIN_OBSERVATIONS_FOR_IQR: usize = 4;

/// Fence multiplier on the interquartile range.
pub const IQR_FENCE: f64 = 1.5;

/// Share of the score taken from similarity to the reference curve.
pub const SIMILARITY_SHARE: f64 = 0.6;

/// Share of the score taken from recency.
pub const RECENCY_SHARE: f64 = 0.4;

/// Flags, per observation, whether it is a distribution outlier.
///
/// The reference is the median of the observations that had activity.
/// Fewer than two observations, or none with activity, flag nothing.
///
/// # Examples
///
/// ```
/// use intraday_core::curves::{detect_outliers, Observation};
/// use intraday_core::types::{BucketMap, Date, TimeBucket};
///
/// let am = TimeBucket::parse("09:00").unwrap();
/// let pm = TimeBucket::parse("15:00").unwrap();
/// let mut group = Vec::new();
/// for day in [1, 8, 15, 22] {
///     let date = Date::from_ymd(2024, 4, day).unwrap();
///     group.push(Observation::new(date, BucketMap::from([(am, 0.6), (pm, 0.4)])).unwrap());
/// }
/// let odd = Date::from_ymd(2024, 4, 29).unwrap();
/// group.push(Observation::new(odd, BucketMap::from([(am, 0.0), (pm, 1.0)])).unwrap());
///
/// assert_eq!(detect_outliers(&group), vec![false, false, false, false, true]);
/// ```
pub fn detect_outliers(observations: &[Observation]) -> Vec<bool> {
    let mut flags = vec![false; observations.len()];
    if observations.len() < MIN_OBSERVATIONS_FOR_REFERENCE {
        return flags;
    }

    let buckets = bucket_union(observations.iter());
    let active: Vec<&Observation> = observations.iter().filter(|o| o.has_activity()).collect();
    let Some(reference) = median_curve(&active, &buckets) else {
        return flags;
    };

    let deviations: Vec<f64> = observations
        .iter()
        .map(|o| deviation(o, &reference))
        .collect();

    if deviations.len() >= MIN_OBSERVATIONS_FOR_IQR {
        let mut sorted = deviations.clone();
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);
        let fence = q3 + IQR_FENCE * (q3 - q1);
        for (flag, dev) in flags.iter_mut().zip(&deviations) {
            *flag = *dev > fence;
        }
    }
    flags
}

/// Integer percentages proposed for each observation, in input order.
///
/// Observations already flagged as outliers get 0. The rest are scored
/// `0.6 · similarity + 0.4 · recency` where similarity is
/// `1 - deviation / max_deviation` against their own median curve and
/// recency runs linearly from 0 (oldest) to 1 (most recent). Scores are
/// normalised to 100 and apportioned so the proposal totals exactly 100.
/// When every observation is an outlier, the weights are even.
pub fn propose_weights(observations: &[Observation]) -> Vec<u32> {
    let valid: Vec<usize> = (0..observations.len())
        .filter(|&i| !observations[i].is_outlier())
        .collect();

    if valid.is_empty() {
        return even_weights(observations.len());
    }

    let members: Vec<&Observation> = valid.iter().map(|&i| &observations[i]).collect();
    let buckets = bucket_union(members.iter().copied());
    let similarity = match median_curve(&members, &buckets) {
        Some(reference) => {
            let deviations: Vec<f64> = members.iter().map(|o| deviation(o, &reference)).collect();
            let max_dev = deviations.iter().copied().fold(0.0, f64::max);
            if max_dev > 0.0 {
                deviations.iter().map(|d| 1.0 - d / max_dev).collect()
            } else {
                vec![1.0; members.len()]
            }
        }
        None => vec![1.0; members.len()],
    };
    let recency = recency_scores(&members);

    let scores: Vec<f64> = similarity
        .iter()
        .zip(&recency)
        .map(|(s, r)| SIMILARITY_SHARE * s + RECENCY_SHARE * r)
        .collect();
    let total: f64 = scores.iter().sum();

    let shares: Vec<f64> = if total > 0.0 {
        scores.iter().map(|s| s / total).collect()
    } else {
        vec![1.0 / members.len() as f64; members.len()]
    };

    let mut weights = vec![0; observations.len()];
    for (index, weight) in valid.iter().zip(apportion(&shares, 100)) {
        weights[*index] = weight as u32;
    }
    weights
}

/// Even default weights: `round(100 / n)` each.
///
/// The total is only approximately 100 (three instances get 33 each);
/// the shortfall surfaces as a weight warning like any other.
///
/// ```
/// use intraday_core::curves::even_weights;
///
/// assert_eq!(even_weights(4), vec![25, 25, 25, 25]);
/// assert_eq!(even_weights(3), vec![33, 33, 33]);
/// assert!(even_weights(0).is_empty());
/// ```
pub fn even_weights(count: usize) -> Vec<u32> {
    if count == 0 {
        return Vec::new();
    }
    let each = (100.0 / count as f64).round() as u32;
    vec![each; count]
}

/// Runs outlier detection, then proposes weights, returning the updated group.
pub fn analyse_group(observations: &[Observation]) -> Result<Vec<Observation>, CurveError> {
    let flags = detect_outliers(observations);
    let flagged: Vec<Observation> = observations
        .iter()
        .zip(&flags)
        .map(|(o, flag)| o.clone().with_outlier(*flag))
        .collect();

    let weights = propose_weights(&flagged);
    debug!(
        observations = flagged.len(),
        outliers = flags.iter().filter(|f| **f).count(),
        "group analysed"
    );

    flagged
        .into_iter()
        .zip(weights)
        .map(|(o, w)| o.with_weight(w))
        .collect()
}

fn bucket_union<'a>(observations: impl Iterator<Item = &'a Observation>) -> Vec<TimeBucket> {
    let mut buckets: Vec<TimeBucket> = observations
        .flat_map(|o| o.distribution().keys().copied())
        .collect();
    buckets.sort();
    buckets.dedup();
    buckets
}

fn median_curve(observations: &[&Observation], buckets: &[TimeBucket]) -> Option<BucketMap<f64>> {
    if observations.is_empty() {
        return None;
    }
    let curve = buckets
        .iter()
        .map(|&bucket| {
            let mut column: Vec<f64> = observations.iter().map(|o| o.fraction(bucket)).collect();
            column.sort_by(f64::total_cmp);
            (bucket, quantile(&column, 0.5))
        })
        .collect();
    Some(curve)
}

/// Mean squared difference from the reference over the reference's buckets.
fn deviation(observation: &Observation, reference: &BucketMap<f64>) -> f64 {
    if reference.is_empty() {
        return 0.0;
    }
    let sum: f64 = reference
        .iter()
        .map(|(bucket, r)| (observation.fraction(*bucket) - r).powi(2))
        .sum();
    sum / reference.len() as f64
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

fn recency_scores(members: &[&Observation]) -> Vec<f64> {
    if members.len() == 1 {
        return vec![1.0];
    }
    let mut order: Vec<usize> = (0..members.len()).collect();
    order.sort_by_key(|&i| members[i].date());

    let span = (members.len() - 1) as f64;
    let mut scores = vec![0.0; members.len()];
    for (rank, index) in order.into_iter().enumerate() {
        scores[index] = rank as f64 / span;
    }
    scores
}
