//! Query façade handed to the transport layer.
//!
//! Normalizes external arguments (defaults, date strings, comma-separated
//! parameter lists) and delegates to the store, the ingestor and the
//! aggregation engine. It holds no state of its own beyond those.

use std::io;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::aggregate::{widen_range, Aggregator};
use crate::error::{AggregationError, ServiceError};
use crate::ingest::{read_csv, IngestReport, Ingestor};
use crate::models::{AggregatedRow, Interval, Measurement, Page, Parameter, ParameterPoint};
use crate::store::MeasurementStore;

/// Paging defaults applied when the caller leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLimits {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 1000,
        }
    }
}

// ---

pub struct AirQualityService {
    store: Arc<dyn MeasurementStore>,
    ingestor: Ingestor,
    aggregator: Aggregator,
    limits: ListingLimits,
}

impl AirQualityService {
    pub fn new(store: Arc<dyn MeasurementStore>, limits: ListingLimits) -> Self {
        // ---
        Self {
            ingestor: Ingestor::new(Arc::clone(&store)),
            aggregator: Aggregator::new(Arc::clone(&store)),
            store,
            limits,
        }
    }

    /// Replace all data with the contents of a `;`-delimited file.
    pub async fn ingest_csv<R>(&self, reader: R) -> Result<IngestReport, ServiceError>
    where
        R: io::Read + Send + 'static,
    {
        Ok(self.ingestor.ingest(read_csv(reader)).await?)
    }

    /// Timestamp-ordered listing; `offset` defaults to 0, `limit` to the
    /// configured default and is clamped to the configured maximum.
    pub async fn list(&self, offset: Option<u64>, limit: Option<u64>) -> Result<Page, ServiceError> {
        // ---
        let offset = offset.unwrap_or(0);
        let limit = limit.unwrap_or(self.limits.default_limit);
        if limit == 0 {
            return Err(ServiceError::InvalidArgument(
                "limit must be greater than zero".into(),
            ));
        }
        let limit = limit.min(self.limits.max_limit);

        Ok(self.store.page(offset, limit).await?)
    }

    /// All samples of one allow-listed parameter.
    pub async fn project(&self, parameter: &str) -> Result<Vec<ParameterPoint>, ServiceError> {
        // ---
        let parameter = Parameter::from_name(parameter.trim()).ok_or_else(|| {
            ServiceError::InvalidArgument(format!("unknown parameter '{parameter}'"))
        })?;
        Ok(self.store.project_parameter(parameter).await?)
    }

    /// Raw measurements between two dates, both days included in full.
    pub async fn scan(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<Measurement>, ServiceError> {
        // ---
        let start = require_date("startDate", start).map_err(ServiceError::InvalidArgument)?;
        let end = require_date("endDate", end).map_err(ServiceError::InvalidArgument)?;
        let (start, end) = widen_range(start, end).map_err(|e| match e {
            AggregationError::InvalidRange(msg) => ServiceError::InvalidArgument(msg),
            other => other.into(),
        })?;

        Ok(self.store.range_scan(start, end).await?)
    }

    /// Bucketed averages; `parameters` is a comma-separated list.
    pub async fn aggregate(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        parameters: Option<&str>,
        interval: Option<&str>,
    ) -> Result<Vec<AggregatedRow>, ServiceError> {
        // ---
        let start = require_date("startDate", start).map_err(AggregationError::InvalidRange)?;
        let end = require_date("endDate", end).map_err(AggregationError::InvalidRange)?;
        let names: Vec<&str> = parameters
            .map(|p| p.split(',').map(str::trim).collect())
            .unwrap_or_default();

        Ok(self
            .aggregator
            .aggregate(start, end, &names, Interval::parse(interval))
            .await?)
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 instant.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    // ---
    let value = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(day.and_time(NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn require_date(name: &str, value: Option<&str>) -> Result<DateTime<Utc>, String> {
    // ---
    let value = value.ok_or_else(|| format!("{name} is required"))?;
    parse_date(value).ok_or_else(|| format!("{name} '{value}' is not a valid date"))
}
