//! Batch ingestion: raw rows in, one atomic replace of the store out.
//!
//! Rows are pulled one at a time from a single-pass iterator and parsed
//! without touching the store. Only once the whole source has been read and
//! validated is the writer gate taken and the batch committed, so a failed
//! ingestion never disturbs the existing contents.

use std::io;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task;
use tracing::debug;

use crate::error::{IngestionError, ParseError};
use crate::models::{Measurement, Parameter};
use crate::parser::{parse_record, RawRecord, DATE_FIELD, TIME_FIELD};
use crate::store::MeasurementStore;

/// Field delimiter of the source files.
pub const DELIMITER: u8 = b';';

// ---

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct IngestReport {
    /// Measurements now in the store.
    pub committed: u64,
    /// Rows dropped for lacking a date or time.
    pub skipped: u64,
}

/// A fully validated set of measurements, ready to commit.
#[derive(Debug, Default)]
pub struct Batch {
    pub measurements: Vec<Measurement>,
    pub skipped: u64,
}

/// One data row and its position in the source.
///
/// `row` is 1-based and counts source lines after the header, blank lines
/// included, so it points at the line a user sees in an editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub row: u64,
    pub record: RawRecord,
}

/// Parse every row of `rows`, stopping at the first fatal error.
///
/// Incomplete rows are counted and dropped.
pub fn collect_batch<I>(rows: I) -> Result<Batch, IngestionError>
where
    I: IntoIterator<Item = Result<SourceRow, IngestionError>>,
{
    // ---
    let mut batch = Batch::default();

    for item in rows {
        let SourceRow { row, record } = item?;

        match parse_record(&record) {
            Ok(m) => batch.measurements.push(m),
            Err(ParseError::IncompleteRow) => batch.skipped += 1,
            Err(source) => return Err(IngestionError::Parse { row, source }),
        }
    }

    Ok(batch)
}

/// Required header names absent from `headers`, in source-file order.
pub fn missing_columns(headers: &csv::StringRecord) -> Vec<&'static str> {
    // ---
    [DATE_FIELD, TIME_FIELD]
        .into_iter()
        .chain(Parameter::ALL.iter().map(|p| p.header()))
        .filter(|&name| !headers.iter().any(|h| h == name))
        .collect()
}

// ---

/// Single-writer ingestion front for a store.
pub struct Ingestor {
    store: Arc<dyn MeasurementStore>,
    writer: Mutex<()>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn MeasurementStore>) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
        }
    }

    /// Replace the store's contents with the rows of `rows`.
    ///
    /// Reading and parsing run on the blocking pool; only the commit is
    /// async. Concurrent calls queue on the writer gate and commits never
    /// interleave.
    pub async fn ingest<I>(&self, rows: I) -> Result<IngestReport, IngestionError>
    where
        I: IntoIterator<Item = Result<SourceRow, IngestionError>> + Send + 'static,
    {
        // ---
        let batch = task::spawn_blocking(move || collect_batch(rows)).await??;
        debug!(
            rows = batch.measurements.len(),
            skipped = batch.skipped,
            "batch parsed"
        );

        let _writer = self.writer.lock().await;
        let committed = self.store.replace_all(batch.measurements).await?;

        Ok(IngestReport {
            committed,
            skipped: batch.skipped,
        })
    }
}

// ---

/// Lazily read `;`-delimited rows with a header line from `reader`.
pub fn read_csv<R: io::Read>(reader: R) -> CsvRows<R> {
    // ---
    let reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    CsvRows {
        reader,
        headers: None,
        header_line: 1,
        last_row: 0,
        record: csv::StringRecord::new(),
        done: false,
    }
}

/// Single-pass iterator over the data rows of a delimited source.
///
/// The header is checked on the first call: a source lacking any required
/// column yields [`IngestionError::MissingColumns`] and nothing else. Blank
/// header cells (trailing delimiters) are ignored. The iterator ends after
/// the first error.
pub struct CsvRows<R> {
    reader: csv::Reader<R>,
    headers: Option<csv::StringRecord>,
    header_line: u64,
    last_row: u64,
    record: csv::StringRecord,
    done: bool,
}

impl<R: io::Read> CsvRows<R> {
    fn row_of(&self, position: Option<&csv::Position>) -> u64 {
        position
            .map(|p| p.line().saturating_sub(self.header_line))
            .unwrap_or(self.last_row + 1)
    }

    fn fail(&mut self, err: IngestionError) -> Option<Result<SourceRow, IngestionError>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: io::Read> Iterator for CsvRows<R> {
    type Item = Result<SourceRow, IngestionError>;

    fn next(&mut self) -> Option<Self::Item> {
        // ---
        if self.done {
            return None;
        }

        if self.headers.is_none() {
            // A header that cannot be read is reported as row 0
            let headers = match self.reader.headers().cloned() {
                Ok(h) => h,
                Err(source) => return self.fail(IngestionError::Read { row: 0, source }),
            };
            let missing = missing_columns(&headers);
            if !missing.is_empty() {
                return self.fail(IngestionError::MissingColumns(missing));
            }
            if let Some(pos) = headers.position() {
                self.header_line = pos.line();
            }
            self.headers = Some(headers);
        }

        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                let row = self.row_of(self.record.position());
                self.last_row = row;
                let headers = self.headers.as_ref()?;
                let record: RawRecord = headers
                    .iter()
                    .zip(self.record.iter())
                    .filter(|(name, _)| !name.is_empty())
                    .collect();
                Some(Ok(SourceRow { row, record }))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(source) => {
                let row = self.row_of(source.position());
                self.fail(IngestionError::Read { row, source })
            }
        }
    }
}
