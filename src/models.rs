//! Data model for the air-quality pipeline.
//!
//! [`Parameter`] is the allow-list: every measured column the service knows
//! about, with its CSV header, its numeric kind and its storage column. Any
//! name that does not resolve to a `Parameter` is never used in a query.

use std::fmt;

use chrono::{DateTime, NaiveTime, TimeDelta, Timelike, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

// ---

/// Numeric shape of a parameter in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Sensor index channels, plain base-10 integers.
    Integer,
    /// Comma-decimal values such as `12,5`.
    Decimal,
}

/// One measured parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    CoGt,
    Pt08S1Co,
    NmhcGt,
    C6h6Gt,
    Pt08S2Nmhc,
    NoxGt,
    Pt08S3Nox,
    No2Gt,
    Pt08S4No2,
    Pt08S5O3,
    T,
    Rh,
    Ah,
}

impl Parameter {
    /// The allow-list, in its canonical order.
    pub const ALL: [Parameter; 13] = [
        Parameter::CoGt,
        Parameter::Pt08S1Co,
        Parameter::NmhcGt,
        Parameter::C6h6Gt,
        Parameter::Pt08S2Nmhc,
        Parameter::NoxGt,
        Parameter::Pt08S3Nox,
        Parameter::No2Gt,
        Parameter::Pt08S4No2,
        Parameter::Pt08S5O3,
        Parameter::T,
        Parameter::Rh,
        Parameter::Ah,
    ];

    /// External name; also the storage column name.
    pub const fn name(self) -> &'static str {
        // ---
        match self {
            Parameter::CoGt => "co_gt",
            Parameter::Pt08S1Co => "pt08_s1_co",
            Parameter::NmhcGt => "nmhc_gt",
            Parameter::C6h6Gt => "c6h6_gt",
            Parameter::Pt08S2Nmhc => "pt08_s2_nmhc",
            Parameter::NoxGt => "nox_gt",
            Parameter::Pt08S3Nox => "pt08_s3_nox",
            Parameter::No2Gt => "no2_gt",
            Parameter::Pt08S4No2 => "pt08_s4_no2",
            Parameter::Pt08S5O3 => "pt08_s5_o3",
            Parameter::T => "t",
            Parameter::Rh => "rh",
            Parameter::Ah => "ah",
        }
    }

    /// Column header in the semicolon-delimited source file.
    pub const fn header(self) -> &'static str {
        // ---
        match self {
            Parameter::CoGt => "CO(GT)",
            Parameter::Pt08S1Co => "PT08.S1(CO)",
            Parameter::NmhcGt => "NMHC(GT)",
            Parameter::C6h6Gt => "C6H6(GT)",
            Parameter::Pt08S2Nmhc => "PT08.S2(NMHC)",
            Parameter::NoxGt => "NOx(GT)",
            Parameter::Pt08S3Nox => "PT08.S3(NOx)",
            Parameter::No2Gt => "NO2(GT)",
            Parameter::Pt08S4No2 => "PT08.S4(NO2)",
            Parameter::Pt08S5O3 => "PT08.S5(O3)",
            Parameter::T => "T",
            Parameter::Rh => "RH",
            Parameter::Ah => "AH",
        }
    }

    pub const fn kind(self) -> ParameterKind {
        // ---
        match self {
            Parameter::CoGt | Parameter::C6h6Gt | Parameter::T | Parameter::Rh | Parameter::Ah => {
                ParameterKind::Decimal
            }
            _ => ParameterKind::Integer,
        }
    }

    /// Resolve an externally supplied name. Exact, case-sensitive match only.
    pub fn from_name(name: &str) -> Option<Self> {
        // ---
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Filter caller-supplied names against the allow-list.
    ///
    /// Names must match exactly; anything else is dropped silently. The
    /// caller's order is kept and repeated names keep their first position.
    pub fn filter_allowed<'a, I>(requested: I) -> Vec<Parameter>
    where
        I: IntoIterator<Item = &'a str>,
    {
        // ---
        let mut out = Vec::new();
        for p in requested.into_iter().filter_map(Self::from_name) {
            if !out.contains(&p) {
                out.push(p);
            }
        }
        out
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Parameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

// ---

/// One timestamped sensor reading.
#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow)]
pub struct Measurement {
    // ---
    pub timestamp: DateTime<Utc>,
    pub co_gt: f64,
    pub pt08_s1_co: i32,
    pub nmhc_gt: i32,
    pub c6h6_gt: f64,
    pub pt08_s2_nmhc: i32,
    pub nox_gt: i32,
    pub pt08_s3_nox: i32,
    pub no2_gt: i32,
    pub pt08_s4_no2: i32,
    pub pt08_s5_o3: i32,
    pub t: f64,
    pub rh: f64,
    pub ah: f64,
}

impl Measurement {
    /// Typed accessor for one parameter, widened to `f64`.
    pub fn value(&self, parameter: Parameter) -> f64 {
        // ---
        match parameter {
            Parameter::CoGt => self.co_gt,
            Parameter::Pt08S1Co => f64::from(self.pt08_s1_co),
            Parameter::NmhcGt => f64::from(self.nmhc_gt),
            Parameter::C6h6Gt => self.c6h6_gt,
            Parameter::Pt08S2Nmhc => f64::from(self.pt08_s2_nmhc),
            Parameter::NoxGt => f64::from(self.nox_gt),
            Parameter::Pt08S3Nox => f64::from(self.pt08_s3_nox),
            Parameter::No2Gt => f64::from(self.no2_gt),
            Parameter::Pt08S4No2 => f64::from(self.pt08_s4_no2),
            Parameter::Pt08S5O3 => f64::from(self.pt08_s5_o3),
            Parameter::T => self.t,
            Parameter::Rh => self.rh,
            Parameter::Ah => self.ah,
        }
    }
}

// ---

/// Aggregation bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    #[default]
    Hourly,
    Daily,
}

impl Interval {
    /// Anything other than `daily` (including no value) means hourly.
    pub fn parse(value: Option<&str>) -> Self {
        // ---
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("daily") => Interval::Daily,
            _ => Interval::Hourly,
        }
    }

    /// Truncate a timestamp to the start of its bucket.
    pub fn truncate(self, ts: DateTime<Utc>) -> DateTime<Utc> {
        // ---
        let day = start_of_day(ts);
        match self {
            Interval::Daily => day,
            Interval::Hourly => day + TimeDelta::hours(i64::from(ts.hour())),
        }
    }
}

/// 00:00:00 UTC of the timestamp's calendar day.
pub fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

// ---

/// One bucket of averaged values, ordered as requested.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub bucket: DateTime<Utc>,
    pub values: Vec<(Parameter, f64)>,
}

impl AggregatedRow {
    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        self.values
            .iter()
            .find(|(p, _)| *p == parameter)
            .map(|(_, v)| *v)
    }
}

/// Serialized flat: `{"timestamp": ..., "t": 15.0, ...}`.
impl Serialize for AggregatedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // ---
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("timestamp", &self.bucket)?;
        for (parameter, value) in &self.values {
            map.serialize_entry(parameter.name(), value)?;
        }
        map.end()
    }
}

/// A single-parameter sample.
#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow)]
pub struct ParameterPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One page of the time-ordered listing plus the table's total size.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Page {
    pub data: Vec<Measurement>,
    pub total: u64,
}

#[cfg(test)]
pub(crate) mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    /// Measurement with every parameter zeroed except `t`.
    pub(crate) fn measurement_at(ts: DateTime<Utc>, t: f64) -> Measurement {
        // ---
        Measurement {
            timestamp: ts,
            co_gt: 0.0,
            pt08_s1_co: 0,
            nmhc_gt: 0,
            c6h6_gt: 0.0,
            pt08_s2_nmhc: 0,
            nox_gt: 0,
            pt08_s3_nox: 0,
            no2_gt: 0,
            pt08_s4_no2: 0,
            pt08_s5_o3: 0,
            t,
            rh: 0.0,
            ah: 0.0,
        }
    }

    #[test]
    fn test_allow_list_names_resolve() {
        // ---
        for p in Parameter::ALL {
            assert_eq!(Parameter::from_name(p.name()), Some(p));
        }
        assert_eq!(Parameter::from_name("T"), None);
        assert_eq!(Parameter::from_name("t; DROP TABLE air_quality"), None);
    }

    #[test]
    fn test_filter_keeps_caller_order() {
        // ---
        let got = Parameter::filter_allowed(["rh", "bogus", "co_gt", "rh", "t"]);
        assert_eq!(got, vec![Parameter::Rh, Parameter::CoGt, Parameter::T]);
    }

    #[test]
    fn test_filter_requires_exact_names() {
        // ---
        let got = Parameter::filter_allowed([" t ", "T", "rh "]);
        assert!(got.is_empty());
    }

    #[test]
    fn test_interval_defaults_to_hourly() {
        // ---
        assert_eq!(Interval::parse(None), Interval::Hourly);
        assert_eq!(Interval::parse(Some("weekly")), Interval::Hourly);
        assert_eq!(Interval::parse(Some("hourly")), Interval::Hourly);
        assert_eq!(Interval::parse(Some("daily")), Interval::Daily);
    }

    #[test]
    fn test_truncation() {
        // ---
        let ts = Utc.with_ymd_and_hms(2023, 1, 1, 10, 45, 12).unwrap();
        assert_eq!(
            Interval::Hourly.truncate(ts),
            Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(
            Interval::Daily.truncate(ts),
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_integer_values_widen() {
        // ---
        let mut m = measurement_at(Utc.with_ymd_and_hms(2004, 3, 10, 18, 0, 0).unwrap(), 13.6);
        m.nox_gt = -200;
        assert_eq!(m.value(Parameter::NoxGt), -200.0);
        assert_eq!(m.value(Parameter::T), 13.6);
    }

    #[test]
    fn test_aggregated_row_serializes_flat_in_order() {
        // ---
        let row = AggregatedRow {
            bucket: Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap(),
            values: vec![(Parameter::T, 15.0), (Parameter::CoGt, 2.5)],
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2023-01-01T10:00:00Z","t":15.0,"co_gt":2.5}"#
        );
    }
}
