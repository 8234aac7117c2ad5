//! Time-bucketed averages over a selectable set of parameters.
//!
//! Parameter names are resolved against the [`Parameter`] allow-list before
//! anything reaches the store, and the store is only ever asked for a range
//! scan. Grouping and averaging happen here, in process.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::AggregationError;
use crate::models::{start_of_day, AggregatedRow, Interval, Measurement, Parameter};
use crate::store::MeasurementStore;

// ---

pub struct Aggregator {
    store: Arc<dyn MeasurementStore>,
}

impl Aggregator {
    pub fn new(store: Arc<dyn MeasurementStore>) -> Self {
        Self { store }
    }

    /// One averaged row per non-empty bucket between `start` and `end`.
    ///
    /// Both bounds are widened to whole days (see [`widen_range`]); unknown
    /// parameter names are dropped and an all-unknown request is rejected.
    pub async fn aggregate<S: AsRef<str>>(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        requested: &[S],
        interval: Interval,
    ) -> Result<Vec<AggregatedRow>, AggregationError> {
        // ---
        let parameters = Parameter::filter_allowed(requested.iter().map(|s| s.as_ref()));
        if parameters.is_empty() {
            return Err(AggregationError::NoValidParameters);
        }

        let (start, end) = widen_range(start, end)?;
        let measurements = self.store.range_scan(start, end).await?;

        Ok(bucket_means(&measurements, &parameters, interval))
    }
}

/// Widen `[start, end]` to `[00:00 of start's day, 00:00 of the day after end's day)`.
///
/// Callers usually pass calendar dates, so the final day must be covered in
/// full whatever the bucket size.
pub fn widen_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AggregationError> {
    // ---
    if start > end {
        return Err(AggregationError::InvalidRange(format!(
            "start {start} is after end {end}"
        )));
    }

    let lo = start_of_day(start);
    let hi = start_of_day(end)
        .checked_add_signed(TimeDelta::days(1))
        .ok_or_else(|| AggregationError::InvalidRange(format!("end {end} out of range")))?;

    Ok((lo, hi))
}

/// Group `measurements` by bucket and average each parameter per bucket.
///
/// Rows come out ascending by bucket. Buckets with no measurements produce
/// no row, and a parameter with nothing to average is left out of its row.
pub fn bucket_means(
    measurements: &[Measurement],
    parameters: &[Parameter],
    interval: Interval,
) -> Vec<AggregatedRow> {
    // ---
    let mut buckets: BTreeMap<DateTime<Utc>, Vec<Mean>> = BTreeMap::new();

    for m in measurements {
        let means = buckets
            .entry(interval.truncate(m.timestamp))
            .or_insert_with(|| vec![Mean::default(); parameters.len()]);
        for (mean, &p) in means.iter_mut().zip(parameters) {
            mean.add(m.value(p));
        }
    }

    buckets
        .into_iter()
        .map(|(bucket, means)| AggregatedRow {
            bucket,
            values: parameters
                .iter()
                .zip(means)
                .filter_map(|(&p, mean)| mean.get().map(|v| (p, v)))
                .collect(),
        })
        .collect()
}

/// Running arithmetic mean.
#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    fn add(&mut self, value: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
    }

    fn get(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}
