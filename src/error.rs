//! Error taxonomy for the ingestion and aggregation core.
//!
//! Row-level problems surface as [`ParseError`]; the ingestion pipeline wraps
//! the first fatal one in [`IngestionError`] together with the row position.
//! Store failures propagate unchanged as [`StoreError`].

use thiserror::Error;

/// Why a single raw row could not become a `Measurement`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `Date` or `Time` missing or blank. Ingestion drops these rows.
    #[error("row is missing its Date or Time field")]
    IncompleteRow,

    #[error("invalid date '{0}', expected DD/MM/YYYY")]
    InvalidDate(String),

    #[error("invalid time '{0}', expected HH.MM.SS")]
    InvalidTime(String),

    #[error("invalid number '{value}' in field {field}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Failure of the storage collaborator. Always fatal to the calling operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store capacity exceeded: {0}")]
    Capacity(String),
}

#[derive(Debug, Error)]
pub enum IngestionError {
    /// The header line lacks required columns; no row was read.
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),

    /// Row numbers are 1-based and count source lines after the header.
    #[error("row {row}: {source}")]
    Parse {
        row: u64,
        #[source]
        source: ParseError,
    },

    #[error("row {row}: unreadable input: {source}")]
    Read {
        row: u64,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("ingestion worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("No valid parameters provided")]
    NoValidParameters,

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the query façade on top of the core taxonomy.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// True when the caller sent something unusable, as opposed to a backend fault.
    pub fn is_client_error(&self) -> bool {
        // ---
        match self {
            Self::InvalidArgument(_) => true,
            Self::Ingestion(IngestionError::Store(_) | IngestionError::Worker(_)) => false,
            Self::Ingestion(_) => true,
            Self::Aggregation(AggregationError::Store(_)) => false,
            Self::Aggregation(_) => true,
            Self::Store(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_ingestion_error_carries_row_and_field() {
        // ---
        let err = IngestionError::Parse {
            row: 7,
            source: ParseError::InvalidNumber {
                field: "T",
                value: "abc".to_string(),
            },
        };
        assert_eq!(err.to_string(), "row 7: invalid number 'abc' in field T");
    }

    #[test]
    fn test_missing_columns_is_client_error() {
        // ---
        let err = IngestionError::MissingColumns(vec!["Date", "T"]);
        assert_eq!(err.to_string(), "missing columns: Date, T");
        assert!(ServiceError::from(err).is_client_error());
    }

    #[test]
    fn test_client_error_classification() {
        // ---
        assert!(ServiceError::from(AggregationError::NoValidParameters).is_client_error());
        assert!(ServiceError::InvalidArgument("limit".into()).is_client_error());

        let store = StoreError::Capacity("full".into());
        assert!(!ServiceError::from(AggregationError::Store(store)).is_client_error());
        assert!(!ServiceError::Store(StoreError::Capacity("full".into())).is_client_error());
    }
}
