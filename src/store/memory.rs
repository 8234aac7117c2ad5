//! In-process store backed by a sorted, immutable snapshot.
//!
//! Writers build the next generation outside the lock and swap it in under
//! the write half of the `RwLock`; readers clone the current `Arc` under the
//! read half and never hold the lock while they scan.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{Measurement, Page, Parameter, ParameterPoint};

use super::MeasurementStore;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<Arc<Vec<Measurement>>>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse any replace larger than `capacity` rows.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    async fn snapshot(&self) -> Arc<Vec<Measurement>> {
        Arc::clone(&*self.data.read().await)
    }
}

#[async_trait]
impl MeasurementStore for MemoryStore {
    async fn replace_all(&self, mut measurements: Vec<Measurement>) -> Result<u64, StoreError> {
        // ---
        if let Some(cap) = self.capacity {
            if measurements.len() > cap {
                return Err(StoreError::Capacity(format!(
                    "{} measurements exceed limit of {}",
                    measurements.len(),
                    cap
                )));
            }
        }

        // Stable: equal timestamps keep source order.
        measurements.sort_by_key(|m| m.timestamp);
        let count = measurements.len() as u64;
        let next = Arc::new(measurements);

        *self.data.write().await = next;
        Ok(count)
    }

    async fn range_scan(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, StoreError> {
        // ---
        if start >= end {
            return Ok(Vec::new());
        }
        let data = self.snapshot().await;
        let lo = data.partition_point(|m| m.timestamp < start);
        let hi = data.partition_point(|m| m.timestamp < end);
        Ok(data[lo..hi].to_vec())
    }

    async fn project_parameter(
        &self,
        parameter: Parameter,
    ) -> Result<Vec<ParameterPoint>, StoreError> {
        // ---
        let data = self.snapshot().await;
        Ok(data
            .iter()
            .map(|m| ParameterPoint {
                timestamp: m.timestamp,
                value: m.value(parameter),
            })
            .collect())
    }

    async fn page(&self, offset: u64, limit: u64) -> Result<Page, StoreError> {
        // ---
        let data = self.snapshot().await;
        let page = data
            .iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(Page {
            data: page,
            total: data.len() as u64,
        })
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.snapshot().await.len() as u64)
    }
}
