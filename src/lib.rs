//! Air-quality sensor ingestion and time-bucketed aggregation.
//!
//! Data flows one way on the write path:
//! raw `;`-delimited rows → [`parser`] → [`ingest`] → [`store`] (replace-all),
//! and one way on the read path:
//! request → [`service`] → [`aggregate`] → [`store`] (range scan) → bucketed means.
//!
//! The store is passed in explicitly; [`store::MemoryStore`] and
//! [`store::PgStore`] both satisfy [`store::MeasurementStore`].

pub mod aggregate;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod parser;
pub mod routes;
pub mod schema;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{AggregationError, IngestionError, ParseError, ServiceError, StoreError};
pub use models::{AggregatedRow, Interval, Measurement, Page, Parameter, ParameterPoint};
pub use service::{AirQualityService, ListingLimits};
