//! Historical observations of intraday demand.
//!
//! An [`Observation`] is one calendar day's demand spread across time
//! buckets, as fractions of that day's total. Each carries a
//! user-assigned [`Weight`] and an outlier flag; both are edited
//! interactively and fed back through
//! [`compute_curve`](super::weighter::compute_curve).

use serde::{Deserialize, Serialize};

use crate::types::{BucketMap, CurveError, Date, TimeBucket, Weekday};

/// Tolerance when checking that an active day's fractions sum to 1.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-3;

/// Integer percentage weight in `0..=100`.
///
/// # Examples
///
/// ```
/// use intraday_core::curves::Weight;
///
/// assert_eq!(Weight::new(40).unwrap().get(), 40);
/// assert!(Weight::new(101).is_err());
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Weight(u8);

impl Weight {
    /// Upper bound of a single weight.
    pub const MAX: u32 = 100;

    /// Validates and wraps a percentage.
    pub fn new(weight: u32) -> Result<Self, CurveError> {
        if weight > Self::MAX {
            return Err(CurveError::WeightOutOfRange { weight });
        }
        Ok(Weight(weight as u8))
    }

    /// Wraps a percentage, capping it at [`Weight::MAX`].
    pub fn clamped(weight: u32) -> Self {
        Weight(weight.min(Self::MAX) as u8)
    }

    /// The percentage value.
    pub fn get(self) -> u32 {
        u32::from(self.0)
    }

    /// The weight as a fraction of 100.
    pub fn fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl TryFrom<u32> for Weight {
    type Error = CurveError;

    fn try_from(weight: u32) -> Result<Self, Self::Error> {
        Weight::new(weight)
    }
}

impl From<Weight> for u32 {
    fn from(weight: Weight) -> Self {
        weight.get()
    }
}

/// One historical instance of intraday demand.
///
/// # Invariants
///
/// - every fraction is finite and in `[0, 1]`
/// - fractions sum to 1 (within [`DISTRIBUTION_TOLERANCE`]) or the day
///   had no activity and they are all 0
///
/// Deserialisation goes through the same validation as [`Observation::new`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObservationRecord")]
pub struct Observation {
    date: Date,
    distribution: BucketMap<f64>,
    is_outlier: bool,
    weight: Weight,
    #[serde(skip_serializing_if = "Option::is_none")]
    holiday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_volume: Option<f64>,
}

#[derive(Deserialize)]
struct ObservationRecord {
    date: Date,
    distribution: BucketMap<f64>,
    #[serde(default)]
    is_outlier: bool,
    #[serde(default)]
    weight: Weight,
    #[serde(default)]
    holiday: Option<String>,
    #[serde(default)]
    total_volume: Option<f64>,
}

impl TryFrom<ObservationRecord> for Observation {
    type Error = CurveError;

    fn try_from(record: ObservationRecord) -> Result<Self, Self::Error> {
        let mut observation = Observation::new(record.date, record.distribution)?;
        observation.is_outlier = record.is_outlier;
        observation.weight = record.weight;
        observation.holiday = record.holiday;
        observation.total_volume = record.total_volume;
        Ok(observation)
    }
}

impl Observation {
    /// Creates an observation from per-bucket fractions.
    ///
    /// The weight starts at 0 and the outlier flag cleared.
    pub fn new(date: Date, distribution: BucketMap<f64>) -> Result<Self, CurveError> {
        for (bucket, value) in &distribution {
            if !value.is_finite() || *value < 0.0 || *value > 1.0 + DISTRIBUTION_TOLERANCE {
                return Err(CurveError::InvalidFraction {
                    bucket: *bucket,
                    value: *value,
                });
            }
        }

        let sum: f64 = distribution.values().sum();
        if sum != 0.0 && (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(CurveError::NotNormalised {
                date: date.to_string(),
                sum,
            });
        }

        Ok(Self {
            date,
            distribution,
            is_outlier: false,
            weight: Weight::default(),
            holiday: None,
            total_volume: None,
        })
    }

    /// Creates an observation from raw per-bucket counts (e.g. calls offered).
    ///
    /// A day with zero total activity yields an all-zero distribution.
    ///
    /// # Examples
    ///
    /// ```
    /// use intraday_core::curves::Observation;
    /// use intraday_core::types::{BucketMap, Date, TimeBucket};
    ///
    /// let mut counts = BucketMap::new();
    /// counts.insert(TimeBucket::parse("09:00").unwrap(), 30.0);
    /// counts.insert(TimeBucket::parse("09:30").unwrap(), 10.0);
    ///
    /// let obs = Observation::from_counts(Date::from_ymd(2024, 3, 4).unwrap(), counts).unwrap();
    /// assert_eq!(obs.fraction(TimeBucket::parse("09:00").unwrap()), 0.75);
    /// assert_eq!(obs.total_volume(), Some(40.0));
    /// ```
    pub fn from_counts(date: Date, counts: BucketMap<f64>) -> Result<Self, CurveError> {
        for (bucket, value) in &counts {
            if !value.is_finite() || *value < 0.0 {
                return Err(CurveError::InvalidCount {
                    bucket: *bucket,
                    value: *value,
                });
            }
        }

        let total: f64 = counts.values().sum();
        let distribution = counts
            .into_iter()
            .map(|(bucket, count)| {
                let fraction = if total > 0.0 { count / total } else { 0.0 };
                (bucket, fraction)
            })
            .collect();

        let mut observation = Self::new(date, distribution)?;
        observation.total_volume = Some(total);
        Ok(observation)
    }

    /// Sets the weight, builder style.
    pub fn with_weight(mut self, weight: u32) -> Result<Self, CurveError> {
        self.set_weight(weight)?;
        Ok(self)
    }

    /// Sets an already validated weight, builder style.
    pub fn with_weight_of(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the outlier flag, builder style.
    pub fn with_outlier(mut self, is_outlier: bool) -> Self {
        self.is_outlier = is_outlier;
        self
    }

    /// Tags the observation with a holiday name, builder style.
    pub fn with_holiday(mut self, name: impl Into<String>) -> Self {
        self.holiday = Some(name.into());
        self
    }

    /// Replaces the weight.
    pub fn set_weight(&mut self, weight: u32) -> Result<(), CurveError> {
        self.weight = Weight::new(weight)?;
        Ok(())
    }

    /// Flags or re-includes the observation.
    pub fn set_outlier(&mut self, is_outlier: bool) {
        self.is_outlier = is_outlier;
    }

    /// Calendar date of the observation.
    pub fn date(&self) -> Date {
        self.date
    }

    /// Day of week of the observation.
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// Per-bucket fractions.
    pub fn distribution(&self) -> &BucketMap<f64> {
        &self.distribution
    }

    /// Fraction for one bucket, 0 when absent.
    pub fn fraction(&self, bucket: TimeBucket) -> f64 {
        self.distribution.get(&bucket).copied().unwrap_or(0.0)
    }

    /// Sum of all fractions (≈1, or 0 for an inactive day).
    pub fn distribution_sum(&self) -> f64 {
        self.distribution.values().sum()
    }

    /// True when the day had any activity.
    pub fn has_activity(&self) -> bool {
        self.distribution.values().any(|v| *v > 0.0)
    }

    /// Current weight.
    pub fn weight(&self) -> Weight {
        self.weight
    }

    /// True when excluded from weighting.
    pub fn is_outlier(&self) -> bool {
        self.is_outlier
    }

    /// Holiday name, if the day is a tagged holiday instance.
    pub fn holiday(&self) -> Option<&str> {
        self.holiday.as_deref()
    }

    /// Raw total volume, when built from counts.
    pub fn total_volume(&self) -> Option<f64> {
        self.total_volume
    }
}
