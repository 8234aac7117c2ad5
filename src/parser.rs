//! Record parser: one raw text row in, one [`Measurement`] out.
//!
//! Source rows carry the date as `DD/MM/YYYY`, the time as `HH.MM.SS` and
//! decimal values with a comma separator (`12,5`). Parsing is pure.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::ParseError;
use crate::models::{Measurement, Parameter, ParameterKind};

pub const DATE_FIELD: &str = "Date";
pub const TIME_FIELD: &str = "Time";

// ---

/// One source row as a header name → raw text mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Trimmed value of a field; blank cells read as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---

/// Convert a raw row into a validated measurement.
///
/// Returns [`ParseError::IncompleteRow`] when `Date` or `Time` is missing;
/// callers treat that as "skip this row". Every other error means the row
/// is present but corrupt.
pub fn parse_record(raw: &RawRecord) -> Result<Measurement, ParseError> {
    // ---
    let (Some(date), Some(time)) = (raw.get(DATE_FIELD), raw.get(TIME_FIELD)) else {
        return Err(ParseError::IncompleteRow);
    };

    let date = parse_date(date)?;
    let time = parse_time(time)?;
    let timestamp = Utc.from_utc_datetime(&date.and_time(time));

    let int = |p: Parameter| parse_integer(p, raw.get(p.header()));
    let dec = |p: Parameter| parse_decimal(p, raw.get(p.header()));

    Ok(Measurement {
        timestamp,
        co_gt: dec(Parameter::CoGt)?,
        pt08_s1_co: int(Parameter::Pt08S1Co)?,
        nmhc_gt: int(Parameter::NmhcGt)?,
        c6h6_gt: dec(Parameter::C6h6Gt)?,
        pt08_s2_nmhc: int(Parameter::Pt08S2Nmhc)?,
        nox_gt: int(Parameter::NoxGt)?,
        pt08_s3_nox: int(Parameter::Pt08S3Nox)?,
        no2_gt: int(Parameter::No2Gt)?,
        pt08_s4_no2: int(Parameter::Pt08S4No2)?,
        pt08_s5_o3: int(Parameter::Pt08S5O3)?,
        t: dec(Parameter::T)?,
        rh: dec(Parameter::Rh)?,
        ah: dec(Parameter::Ah)?,
    })
}

/// `DD/MM/YYYY` → calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ParseError> {
    // ---
    let invalid = || ParseError::InvalidDate(value.to_string());

    let parts: Vec<&str> = value.split('/').collect();
    let [day, month, year] = parts[..] else {
        return Err(invalid());
    };
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !(numeric(day) && numeric(month) && numeric(year)) {
        return Err(invalid());
    }

    let day: u32 = day.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// `HH.MM.SS` → time of day.
pub fn parse_time(value: &str) -> Result<NaiveTime, ParseError> {
    // ---
    let normalized = value.replace('.', ":");
    NaiveTime::parse_from_str(&normalized, "%H:%M:%S")
        .map_err(|_| ParseError::InvalidTime(value.to_string()))
}

fn parse_integer(parameter: Parameter, value: Option<&str>) -> Result<i32, ParseError> {
    // ---
    debug_assert_eq!(parameter.kind(), ParameterKind::Integer);
    value
        .and_then(|v| v.parse::<i32>().ok())
        .ok_or_else(|| invalid_number(parameter, value))
}

fn parse_decimal(parameter: Parameter, value: Option<&str>) -> Result<f64, ParseError> {
    // ---
    debug_assert_eq!(parameter.kind(), ParameterKind::Decimal);
    value
        .and_then(|v| v.replace(',', ".").parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid_number(parameter, value))
}

fn invalid_number(parameter: Parameter, value: Option<&str>) -> ParseError {
    ParseError::InvalidNumber {
        field: parameter.header(),
        value: value.unwrap_or_default().to_string(),
    }
}
