//! Measurement store contract and its implementations.
//!
//! The store is an ordered-by-time collection with a replace-all write path.
//! Every read observes one complete generation of data, never a mix of the
//! old and new contents of an in-flight replace.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{Measurement, Page, Parameter, ParameterPoint};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ---

#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Atomically substitute the whole contents. Returns the number stored.
    async fn replace_all(&self, measurements: Vec<Measurement>) -> Result<u64, StoreError>;

    /// Measurements in `[start, end)`, ascending by timestamp.
    async fn range_scan(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, StoreError>;

    /// Every `(timestamp, value)` pair of one parameter, ascending.
    async fn project_parameter(
        &self,
        parameter: Parameter,
    ) -> Result<Vec<ParameterPoint>, StoreError>;

    /// One page of the timestamp-ordered listing and the total row count,
    /// read from the same snapshot.
    async fn page(&self, offset: u64, limit: u64) -> Result<Page, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}
