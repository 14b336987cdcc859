//! Snapshots and snapshot-indexed time series.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single point of the optimisation horizon.
pub type Snapshot = NaiveDateTime;

/// Builds `count` hourly snapshots starting at `start`.
pub fn hourly_snapshots(start: Snapshot, count: usize) -> Vec<Snapshot> {
    (0..count)
        .map(|i| start + Duration::hours(i as i64))
        .collect()
}

/// Midnight, 1 January 2015.
pub fn default_start() -> Snapshot {
    NaiveDate::from_ymd_opt(2015, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Time series of `f64` values keyed by snapshot, iterated in time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series(BTreeMap<Snapshot, f64>);

impl Series {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Zip snapshots with values; extra entries on either side are dropped.
    pub fn from_values(snapshots: &[Snapshot], values: &[f64]) -> Self {
        Self(
            snapshots
                .iter()
                .copied()
                .zip(values.iter().copied())
                .collect(),
        )
    }

    #[inline]
    pub fn get(&self, snapshot: &Snapshot) -> Option<f64> {
        self.0.get(snapshot).copied()
    }

    pub fn insert(&mut self, snapshot: Snapshot, value: f64) {
        self.0.insert(snapshot, value);
    }

    pub fn contains(&self, snapshot: &Snapshot) -> bool {
        self.0.contains_key(snapshot)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Snapshot, &f64)> {
        self.0.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.values().copied()
    }

    /// Element-wise product with a scalar.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|(k, v)| (*k, v * factor)).collect())
    }

    /// Sum over the given snapshots, treating missing entries as zero.
    pub fn sum_over(&self, snapshots: &[Snapshot]) -> f64 {
        snapshots.iter().filter_map(|s| self.get(s)).sum()
    }
}

impl FromIterator<(Snapshot, f64)> for Series {
    fn from_iter<I: IntoIterator<Item = (Snapshot, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
