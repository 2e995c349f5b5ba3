//! Saved curve sets and distributions.
//!
//! [`CurveStore`] is a caller-owned, in-memory store for the two
//! persisted shapes. Curve sets are upserted by `(segment_id, name)`.
//! Deleting a curve set never deletes the distributions generated from
//! it; those become orphans, which [`CurveStore::orphaned_distributions`]
//! reports but nothing repairs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::calendar::ExpectedVolumes;
use crate::curves::WeightedCurve;
use crate::distribution::{DistributionRow, RowType};
use crate::export::{ScenarioReport, SkipReason};
use crate::grouping::Grouping;
use crate::types::{BucketGrid, DateRange, DistributionError, StoreError, Weekday};

/// Daily volume used when none is supplied for a date.
pub const DEFAULT_DAILY_VOLUME: u64 = 1000;

/// A named set of weekday curves for one segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedCurve {
    /// Store identifier
    pub id: u64,
    /// Owning segment
    pub segment_id: u64,
    /// Name, unique within the segment
    pub name: String,
    /// One curve per weekday that has one
    pub curves_by_day: BTreeMap<Weekday, WeightedCurve>,
    /// Bucket labels the curves were built on
    pub time_labels: BucketGrid,
    /// Number of weeks of history analysed
    #[serde(default)]
    pub weeks_analyzed: Option<u32>,
    /// History period analysed
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

impl SavedCurve {
    /// Curve for a weekday, if the set has one.
    pub fn curve_for_day(&self, day: Weekday) -> Option<&WeightedCurve> {
        self.curves_by_day.get(&day)
    }

    /// Expected volume rows for every date in `range`.
    ///
    /// Each date uses its weekday's curve and the volume from `volumes`,
    /// falling back to `default_volume`. Dates whose weekday has no
    /// usable curve are reported as skipped. Rows are tagged `N` and
    /// laid out on the saved labels.
    pub fn expected_rows(
        &self,
        range: DateRange,
        volumes: &ExpectedVolumes,
        default_volume: u64,
    ) -> ScenarioReport {
        let mut report = ScenarioReport::default();

        for date in range.days() {
            let day = date.weekday();
            let grouping = Grouping::Weekday(day);
            let volume = volumes.get(date).unwrap_or(default_volume);

            let row = self
                .curve_for_day(day)
                .ok_or_else(|| DistributionError::MissingCurve {
                    grouping: grouping.to_string(),
                })
                .and_then(|curve| DistributionRow::distribute(date, RowType::Normal, curve, volume));

            match row {
                Ok(mut row) => {
                    row.fill_grid(&self.time_labels);
                    report.rows.push(row);
                }
                Err(e) => report.skip(date.to_string(), Some(grouping), SkipReason::Distribution(e)),
            }
        }
        report.sort_rows();
        report
    }
}

/// A stored batch of distributed rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedDistribution {
    /// Store identifier
    pub id: u64,
    /// Owning segment
    pub segment_id: u64,
    /// Distributed rows
    pub rows: Vec<DistributionRow>,
    /// Bucket labels of the rows
    pub time_labels: BucketGrid,
    /// Curve set the rows were generated from, if any
    #[serde(default)]
    pub curve_id: Option<u64>,
}

/// Input of [`CurveStore::save_curve`].
#[derive(Clone, Debug, PartialEq)]
pub struct NewCurveSet {
    /// Owning segment
    pub segment_id: u64,
    /// Name, unique within the segment
    pub name: String,
    /// Curves to store; days left out keep a previous version's curve
    pub curves_by_day: BTreeMap<Weekday, WeightedCurve>,
    /// Bucket labels
    pub time_labels: BucketGrid,
    /// Number of weeks analysed
    pub weeks_analyzed: Option<u32>,
    /// History period analysed
    pub date_range: Option<DateRange>,
}

/// In-memory store of curve sets and distributions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveStore {
    next_id: u64,
    curves: BTreeMap<u64, SavedCurve>,
    distributions: BTreeMap<u64, SavedDistribution>,
}

impl CurveStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Saves a curve set, updating the one with the same segment and name.
    ///
    /// Returns the id of the stored set.
    pub fn save_curve(&mut self, new: NewCurveSet) -> u64 {
        let existing = self
            .curves
            .values_mut()
            .find(|c| c.segment_id == new.segment_id && c.name == new.name);

        if let Some(curve) = existing {
            curve.curves_by_day.extend(new.curves_by_day);
            curve.time_labels = new.time_labels;
            curve.weeks_analyzed = new.weeks_analyzed;
            curve.date_range = new.date_range;
            info!(id = curve.id, name = %curve.name, "curve set updated");
            return curve.id;
        }

        let id = self.allocate_id();
        info!(id, name = %new.name, segment_id = new.segment_id, "curve set saved");
        self.curves.insert(
            id,
            SavedCurve {
                id,
                segment_id: new.segment_id,
                name: new.name,
                curves_by_day: new.curves_by_day,
                time_labels: new.time_labels,
                weeks_analyzed: new.weeks_analyzed,
                date_range: new.date_range,
            },
        );
        id
    }

    /// Curve set by id.
    pub fn curve(&self, id: u64) -> Result<&SavedCurve, StoreError> {
        self.curves.get(&id).ok_or(StoreError::CurveNotFound { id })
    }

    /// Curve sets of a segment, newest first.
    pub fn curves_for_segment(&self, segment_id: u64) -> Vec<&SavedCurve> {
        self.curves
            .values()
            .rev()
            .filter(|c| c.segment_id == segment_id)
            .collect()
    }

    /// Deletes a curve set. Linked distributions are kept and become orphans.
    pub fn delete_curve(&mut self, id: u64) -> Result<SavedCurve, StoreError> {
        let removed = self
            .curves
            .remove(&id)
            .ok_or(StoreError::CurveNotFound { id })?;
        let orphans = self
            .distributions
            .values()
            .filter(|d| d.curve_id == Some(id))
            .count();
        if orphans > 0 {
            warn!(id, orphans, "curve set deleted with linked distributions");
        } else {
            info!(id, "curve set deleted");
        }
        Ok(removed)
    }

    /// Stores distributed rows, optionally linked to an existing curve set.
    pub fn save_distribution(
        &mut self,
        segment_id: u64,
        rows: Vec<DistributionRow>,
        time_labels: BucketGrid,
        curve_id: Option<u64>,
    ) -> Result<u64, StoreError> {
        if let Some(curve_id) = curve_id {
            self.curve(curve_id)?;
        }
        let id = self.allocate_id();
        info!(id, segment_id, rows = rows.len(), "distribution saved");
        self.distributions.insert(
            id,
            SavedDistribution {
                id,
                segment_id,
                rows,
                time_labels,
                curve_id,
            },
        );
        Ok(id)
    }

    /// Distribution by id.
    pub fn distribution(&self, id: u64) -> Result<&SavedDistribution, StoreError> {
        self.distributions
            .get(&id)
            .ok_or(StoreError::DistributionNotFound { id })
    }

    /// Distributions of a segment, newest first.
    pub fn distributions_for_segment(&self, segment_id: u64) -> Vec<&SavedDistribution> {
        self.distributions
            .values()
            .rev()
            .filter(|d| d.segment_id == segment_id)
            .collect()
    }

    /// Deletes a distribution; its curve set is left alone.
    pub fn delete_distribution(&mut self, id: u64) -> Result<SavedDistribution, StoreError> {
        let removed = self
            .distributions
            .remove(&id)
            .ok_or(StoreError::DistributionNotFound { id })?;
        info!(id, "distribution deleted");
        Ok(removed)
    }

    /// True when the distribution names a curve set that no longer exists.
    pub fn is_orphan(&self, distribution: &SavedDistribution) -> bool {
        distribution
            .curve_id
            .is_some_and(|id| !self.curves.contains_key(&id))
    }

    /// Distributions whose linked curve set has been deleted.
    pub fn orphaned_distributions(&self) -> Vec<&SavedDistribution> {
        self.distributions
            .values()
            .filter(|d| self.is_orphan(d))
            .collect()
    }

    /// Serialises the whole store.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores a store written by [`CurveStore::to_json`].
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Date, TimeBucket};

    fn bucket(label: &str) -> TimeBucket {
        TimeBucket::parse(label).unwrap()
    }

    fn grid() -> BucketGrid {
        BucketGrid::from_labels(["09:00", "09:30", "10:00"]).unwrap()
    }

    fn curve(peak: &str) -> WeightedCurve {
        [(bucket("09:00"), 0.25), (bucket(peak), 0.75)].into_iter().collect()
    }

    fn curve_set(name: &str, days: &[Weekday]) -> NewCurveSet {
        NewCurveSet {
            segment_id: 7,
            name: name.to_string(),
            curves_by_day: days.iter().map(|d| (*d, curve("10:00"))).collect(),
            time_labels: grid(),
            weeks_analyzed: Some(4),
            date_range: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_save_curve_upserts_by_segment_and_name() {
        let mut store = CurveStore::new();
        let first = store.save_curve(curve_set("Q1", &[Weekday::Monday]));
        let mut update = curve_set("Q1", &[Weekday::Tuesday]);
        update.weeks_analyzed = Some(8);
        let second = store.save_curve(update);

        assert_eq!(first, second);
        let saved = store.curve(first).unwrap();
        assert_eq!(saved.curves_by_day.len(), 2);
        assert_eq!(saved.weeks_analyzed, Some(8));

        let other = store.save_curve(curve_set("Q2", &[Weekday::Monday]));
        assert_ne!(other, first);
        let names: Vec<&str> = store
            .curves_for_segment(7)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Q2", "Q1"]);
    }

    #[test]
    fn test_delete_curve_does_not_cascade() {
        let mut store = CurveStore::new();
        let curve_id = store.save_curve(curve_set("Q1", &[Weekday::Monday]));
        let dist_id = store
            .save_distribution(7, Vec::new(), grid(), Some(curve_id))
            .unwrap();
        assert!(store.orphaned_distributions().is_empty());

        store.delete_curve(curve_id).unwrap();

        let dist = store.distribution(dist_id).unwrap();
        assert_eq!(dist.curve_id, Some(curve_id));
        assert!(store.is_orphan(dist));
        assert_eq!(store.orphaned_distributions().len(), 1);
        assert_eq!(
            store.delete_curve(curve_id),
            Err(StoreError::CurveNotFound { id: curve_id })
        );
    }

    #[test]
    fn test_delete_distribution_keeps_curve() {
        let mut store = CurveStore::new();
        let curve_id = store.save_curve(curve_set("Q1", &[Weekday::Monday]));
        let dist_id = store
            .save_distribution(7, Vec::new(), grid(), Some(curve_id))
            .unwrap();
        store.delete_distribution(dist_id).unwrap();
        assert!(store.curve(curve_id).is_ok());
        assert!(store.distribution(dist_id).is_err());
    }

    #[test]
    fn test_distribution_needs_existing_curve() {
        let mut store = CurveStore::new();
        assert_eq!(
            store.save_distribution(7, Vec::new(), grid(), Some(99)),
            Err(StoreError::CurveNotFound { id: 99 })
        );
        let unlinked = store.save_distribution(7, Vec::new(), grid(), None).unwrap();
        assert!(!store.is_orphan(store.distribution(unlinked).unwrap()));
    }

    #[test]
    fn test_expected_rows_skip_days_without_curve() {
        let mut store = CurveStore::new();
        let id = store.save_curve(curve_set("Q1", &[Weekday::Monday, Weekday::Tuesday]));
        let saved = store.curve(id).unwrap();

        let mut volumes = ExpectedVolumes::new();
        volumes.insert(date(2024, 3, 12), 200);
        // Monday 11th .. Wednesday 13th
        let range = DateRange::new(date(2024, 3, 11), date(2024, 3, 13));
        let report = saved.expected_rows(range, &volumes, DEFAULT_DAILY_VOLUME);

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].total(), 1000);
        assert_eq!(report.rows[1].total(), 200);
        assert_eq!(report.rows[0].values.len(), 3);
        assert_eq!(report.rows[0].get(bucket("09:30")), 0);
        assert_eq!(report.skipped_dates.len(), 1);
        assert_eq!(report.skipped_dates[0].input, "2024-03-13");
    }

    #[test]
    fn test_store_json_round_trip() {
        let mut store = CurveStore::new();
        let curve_id = store.save_curve(curve_set("Q1", &[Weekday::Friday]));
        store
            .save_distribution(7, Vec::new(), grid(), Some(curve_id))
            .unwrap();

        let json = store.to_json().unwrap();
        let restored = CurveStore::from_json(&json).unwrap();
        assert_eq!(restored, store);
        assert!(CurveStore::from_json("{not json").is_err());
    }
}
