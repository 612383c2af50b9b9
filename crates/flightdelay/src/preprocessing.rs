//! Feature builder: turns raw flight records into a pinned feature table.
//!
//! The output columns are driven by a `FeatureSchema`, an ordered list of
//! column specs compiled once. Every row is encoded spec by spec, so the
//! resulting table always has exactly the schema's columns in the schema's
//! order: categories that never occur produce all-zero indicator columns,
//! and a column whose source field is absent from a record is an error
//! rather than a silent zero.
//!
//! Label derivation compares the scheduled (`Fecha-I`) and actual
//! (`Fecha-O`) departure timestamps; a flight is delayed when it left more
//! than 15 minutes late.

use std::f32::consts::PI;
use std::fmt;
use std::sync::OnceLock;

use chrono::{NaiveDateTime, Timelike};
use rayon::prelude::*;

use crate::config::FeatureSet;
use crate::data_handling::{FeatureTable, FlightRecord, FlightType};
use crate::error::FeatureError;
use crate::math::Array2;

/// Exact layout of the scheduled and actual departure timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A departure later than this many minutes counts as delayed.
pub const DELAY_THRESHOLD_MINUTES: f64 = 15.0;

/// Name of the derived label column.
pub const LABEL_COLUMN: &str = "delay";

const SCHEDULED_FIELD: &str = "Fecha-I";
const ACTUAL_FIELD: &str = "Fecha-O";

/// Categorical source fields that can be one-hot encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceField {
    Airline,
    FlightType,
    Month,
    DayName,
    Destination,
}

impl SourceField {
    pub fn name(&self) -> &'static str {
        match self {
            SourceField::Airline => "OPERA",
            SourceField::FlightType => "TIPOVUELO",
            SourceField::Month => "MES",
            SourceField::DayName => "DIANOM",
            SourceField::Destination => "SIGLADES",
        }
    }
}

/// Periodic source values that get a sine/cosine encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodicField {
    /// Scheduled departure as minutes since midnight.
    MinuteOfDay,
    DayOfWeek,
    Month,
    DayOfMonth,
}

impl PeriodicField {
    pub fn name(&self) -> &'static str {
        match self {
            PeriodicField::MinuteOfDay => "MINUTO",
            PeriodicField::DayOfWeek => "DIANOM",
            PeriodicField::Month => "MES",
            PeriodicField::DayOfMonth => "DIA",
        }
    }

    pub fn period(&self) -> u32 {
        match self {
            PeriodicField::MinuteOfDay => 1440,
            PeriodicField::DayOfWeek => 7,
            PeriodicField::Month => 12,
            PeriodicField::DayOfMonth => 31,
        }
    }

    fn source(&self) -> &'static str {
        match self {
            PeriodicField::MinuteOfDay => SCHEDULED_FIELD,
            PeriodicField::DayOfWeek => "DIANOM",
            PeriodicField::Month => "MES",
            PeriodicField::DayOfMonth => "DIA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Sin,
    Cos,
}

/// One output column of the feature table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnSpec {
    /// 1.0 when `field` equals `value`, else 0.0.
    Indicator { field: SourceField, value: String },
    /// Sine or cosine of the field's position within its period.
    Cyclical {
        field: PeriodicField,
        component: Component,
    },
}

impl ColumnSpec {
    pub fn indicator(field: SourceField, value: impl Into<String>) -> Self {
        ColumnSpec::Indicator {
            field,
            value: value.into(),
        }
    }

    pub fn sin(field: PeriodicField) -> Self {
        ColumnSpec::Cyclical {
            field,
            component: Component::Sin,
        }
    }

    pub fn cos(field: PeriodicField) -> Self {
        ColumnSpec::Cyclical {
            field,
            component: Component::Cos,
        }
    }

    /// Column name, e.g. `OPERA_Grupo LATAM` or `MES_sin`.
    pub fn name(&self) -> String {
        self.to_string()
    }

    fn value(&self, row: usize, record: &FlightRecord) -> Result<f32, FeatureError> {
        match self {
            ColumnSpec::Indicator { field, value } => {
                let hit = match field {
                    SourceField::Airline => record.airline == *value,
                    SourceField::FlightType => record.flight_type.code() == value.as_str(),
                    SourceField::Month => value.parse::<u32>().ok() == Some(record.month),
                    SourceField::DayName => {
                        let day_name = record.day_name.as_deref();
                        required(row, field.name(), day_name, self)? == value.as_str()
                    }
                    SourceField::Destination => {
                        let destination = record.destination.as_deref();
                        required(row, field.name(), destination, self)? == value.as_str()
                    }
                };
                Ok(if hit { 1.0 } else { 0.0 })
            }
            ColumnSpec::Cyclical { field, component } => {
                let position = periodic_position(row, *field, record, self)?;
                let angle = 2.0 * PI * (position % field.period()) as f32 / field.period() as f32;
                Ok(match component {
                    Component::Sin => angle.sin(),
                    Component::Cos => angle.cos(),
                })
            }
        }
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSpec::Indicator { field, value } => write!(f, "{}_{}", field.name(), value),
            ColumnSpec::Cyclical { field, component } => {
                let suffix = match component {
                    Component::Sin => "sin",
                    Component::Cos => "cos",
                };
                write!(f, "{}_{}", field.name(), suffix)
            }
        }
    }
}

/// Ordered, pinned list of output columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    specs: Vec<ColumnSpec>,
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(specs: Vec<ColumnSpec>) -> Self {
        let names = specs.iter().map(ColumnSpec::name).collect();
        FeatureSchema { specs, names }
    }

    /// The ten most important indicator columns from offline
    /// feature-importance analysis, in importance order.
    pub fn top_ten() -> &'static FeatureSchema {
        static SCHEMA: OnceLock<FeatureSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| FeatureSchema::new(top_ten_specs()))
    }

    /// Top ten plus day-name/destination indicators and cyclical encodings.
    pub fn extended() -> &'static FeatureSchema {
        static SCHEMA: OnceLock<FeatureSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            let mut specs = top_ten_specs();
            specs.extend([
                ColumnSpec::indicator(SourceField::DayName, "Viernes"),
                ColumnSpec::indicator(SourceField::DayName, "Domingo"),
                ColumnSpec::indicator(SourceField::Destination, "Buenos Aires"),
                ColumnSpec::indicator(SourceField::Destination, "Lima"),
            ]);
            for field in [
                PeriodicField::Month,
                PeriodicField::DayOfMonth,
                PeriodicField::DayOfWeek,
                PeriodicField::MinuteOfDay,
            ] {
                specs.push(ColumnSpec::sin(field));
                specs.push(ColumnSpec::cos(field));
            }
            FeatureSchema::new(specs)
        })
    }

    pub fn for_set(set: FeatureSet) -> &'static FeatureSchema {
        match set {
            FeatureSet::TopTen => Self::top_ten(),
            FeatureSet::Extended => Self::extended(),
        }
    }

    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn top_ten_specs() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::indicator(SourceField::Airline, "Latin American Wings"),
        ColumnSpec::indicator(SourceField::Month, "7"),
        ColumnSpec::indicator(SourceField::Month, "10"),
        ColumnSpec::indicator(SourceField::Airline, "Grupo LATAM"),
        ColumnSpec::indicator(SourceField::Month, "12"),
        ColumnSpec::indicator(SourceField::FlightType, FlightType::International.code()),
        ColumnSpec::indicator(SourceField::Month, "4"),
        ColumnSpec::indicator(SourceField::Month, "11"),
        ColumnSpec::indicator(SourceField::Airline, "Sky Airline"),
        ColumnSpec::indicator(SourceField::Airline, "Copa Air"),
    ]
}

/// Derive the feature table for `records` under `schema`.
///
/// # Errors
///
/// * `FeatureError::InvalidValue` if a month is outside 1..=12, or a day
///   value needed by a cyclical column is out of range.
/// * `FeatureError::MissingField` if a schema column needs a field the
///   record does not carry.
/// * `FeatureError::Parse` if a scheduled timestamp needed for the
///   time-of-day encoding is not in `TIMESTAMP_FORMAT`.
pub fn preprocess(
    records: &[FlightRecord],
    schema: &FeatureSchema,
) -> Result<FeatureTable, FeatureError> {
    let rows: Vec<Result<Vec<f32>, FeatureError>> = records
        .par_iter()
        .enumerate()
        .map(|(row, record)| encode_row(row, record, schema))
        .collect();

    // Report the first failing row, independent of thread scheduling.
    let mut data = Vec::with_capacity(records.len() * schema.len());
    for encoded in rows {
        data.extend(encoded?);
    }

    log::debug!(
        "Derived {} feature rows x {} columns",
        records.len(),
        schema.len()
    );

    let values = Array2::from_raw(records.len(), schema.len(), data);
    Ok(FeatureTable::from_schema(schema, values))
}

fn encode_row(
    row: usize,
    record: &FlightRecord,
    schema: &FeatureSchema,
) -> Result<Vec<f32>, FeatureError> {
    if !(1..=12).contains(&record.month) {
        return Err(FeatureError::InvalidValue {
            row,
            field: SourceField::Month.name(),
            value: record.month.to_string(),
        });
    }
    schema
        .specs()
        .iter()
        .map(|spec| spec.value(row, record))
        .collect()
}

/// Derive the feature table and the row-aligned delay labels.
pub fn preprocess_with_labels(
    records: &[FlightRecord],
    schema: &FeatureSchema,
) -> Result<(FeatureTable, Vec<i32>), FeatureError> {
    let features = preprocess(records, schema)?;
    let labels = derive_labels(records)?;
    Ok((features, labels))
}

/// Compute `1` for every record that departed more than 15 minutes late,
/// `0` otherwise (including early departures).
pub fn derive_labels(records: &[FlightRecord]) -> Result<Vec<i32>, FeatureError> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let minutes = record_delay_minutes(row, record)?;
            Ok(delay_label(minutes))
        })
        .collect()
}

/// Minutes between the scheduled and actual departure of one record.
pub fn record_delay_minutes(row: usize, record: &FlightRecord) -> Result<f64, FeatureError> {
    let scheduled = required_timestamp(row, SCHEDULED_FIELD, record.scheduled.as_deref())?;
    let actual = required_timestamp(row, ACTUAL_FIELD, record.actual.as_deref())?;
    Ok(delay_minutes(scheduled, actual))
}

pub fn delay_minutes(scheduled: NaiveDateTime, actual: NaiveDateTime) -> f64 {
    (actual - scheduled).num_seconds() as f64 / 60.0
}

pub fn delay_label(minutes: f64) -> i32 {
    if minutes > DELAY_THRESHOLD_MINUTES {
        1
    } else {
        0
    }
}

/// Parse a timestamp in exactly `TIMESTAMP_FORMAT`.
pub fn parse_timestamp(
    row: usize,
    field: &'static str,
    value: &str,
) -> Result<NaiveDateTime, FeatureError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|source| FeatureError::Parse {
        row,
        field,
        value: value.to_string(),
        source,
    })
}

/// Day-of-week index (Monday = 0) for a Spanish day name.
pub fn day_of_week(name: &str) -> Option<u32> {
    match name {
        "Lunes" => Some(0),
        "Martes" => Some(1),
        "Miercoles" | "Miércoles" => Some(2),
        "Jueves" => Some(3),
        "Viernes" => Some(4),
        "Sabado" | "Sábado" => Some(5),
        "Domingo" => Some(6),
        _ => None,
    }
}

fn required_timestamp(
    row: usize,
    field: &'static str,
    value: Option<&str>,
) -> Result<NaiveDateTime, FeatureError> {
    let value = value.ok_or_else(|| FeatureError::MissingField {
        row,
        field,
        column: LABEL_COLUMN.to_string(),
    })?;
    parse_timestamp(row, field, value)
}

fn required<T>(
    row: usize,
    field: &'static str,
    value: Option<T>,
    spec: &ColumnSpec,
) -> Result<T, FeatureError> {
    value.ok_or_else(|| FeatureError::MissingField {
        row,
        field,
        column: spec.name(),
    })
}

fn periodic_position(
    row: usize,
    field: PeriodicField,
    record: &FlightRecord,
    spec: &ColumnSpec,
) -> Result<u32, FeatureError> {
    match field {
        PeriodicField::Month => Ok(record.month),
        PeriodicField::DayOfMonth => {
            let day = required(row, field.source(), record.day, spec)?;
            if !(1..=31).contains(&day) {
                return Err(FeatureError::InvalidValue {
                    row,
                    field: field.source(),
                    value: day.to_string(),
                });
            }
            Ok(day)
        }
        PeriodicField::DayOfWeek => {
            let name = required(row, field.source(), record.day_name.as_deref(), spec)?;
            day_of_week(name).ok_or_else(|| FeatureError::InvalidValue {
                row,
                field: field.source(),
                value: name.to_string(),
            })
        }
        PeriodicField::MinuteOfDay => {
            let raw = required(row, field.source(), record.scheduled.as_deref(), spec)?;
            let scheduled = parse_timestamp(row, SCHEDULED_FIELD, raw)?;
            Ok(scheduled.hour() * 60 + scheduled.minute())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn column_names_follow_field_value_pattern() {
        assert_eq!(
            ColumnSpec::indicator(SourceField::Airline, "Grupo LATAM").name(),
            "OPERA_Grupo LATAM"
        );
        assert_eq!(ColumnSpec::sin(PeriodicField::Month).name(), "MES_sin");
        assert_eq!(ColumnSpec::cos(PeriodicField::MinuteOfDay).name(), "MINUTO_cos");
    }

    #[test]
    fn extended_schema_starts_with_top_ten_and_has_unique_names() {
        let top = FeatureSchema::top_ten().column_names();
        let ext = FeatureSchema::extended().column_names();
        assert_eq!(&ext[..top.len()], top);
        let mut sorted = ext.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ext.len());
    }

    #[test]
    fn delay_label_is_strictly_greater_than_threshold() {
        assert_eq!(delay_label(15.0), 0);
        assert_eq!(delay_label(15.01), 1);
        assert_eq!(delay_label(-30.0), 0);
    }

    #[test]
    fn delay_minutes_crosses_midnight() {
        let minutes = delay_minutes(ts("2017-01-01 23:55:00"), ts("2017-01-02 00:20:00"));
        assert!((minutes - 25.0).abs() < 1e-9);
    }

    #[test]
    fn parse_timestamp_rejects_other_layouts() {
        assert!(parse_timestamp(0, "Fecha-I", "2017-01-01 23:30:00").is_ok());
        for bad in ["2017-01-01T23:30:00", "2017-01-01 23:30", "01/01/2017 23:30:00", ""] {
            let err = parse_timestamp(3, "Fecha-I", bad).unwrap_err();
            assert!(matches!(err, FeatureError::Parse { row: 3, .. }), "{bad}");
        }
    }

    #[test]
    fn december_and_january_are_adjacent_in_cyclical_month() {
        let spec_sin = ColumnSpec::sin(PeriodicField::Month);
        let spec_cos = ColumnSpec::cos(PeriodicField::Month);
        let dec = FlightRecord::new("Grupo LATAM", FlightType::Domestic, 12);
        let jan = FlightRecord::new("Grupo LATAM", FlightType::Domestic, 1);
        let jun = FlightRecord::new("Grupo LATAM", FlightType::Domestic, 6);
        let point = |r: &FlightRecord| {
            (
                spec_sin.value(0, r).unwrap(),
                spec_cos.value(0, r).unwrap(),
            )
        };
        let dist =
            |a: (f32, f32), b: (f32, f32)| ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
        assert!(dist(point(&dec), point(&jan)) < dist(point(&dec), point(&jun)));
    }

    #[test]
    fn day_names_accept_accents() {
        assert_eq!(day_of_week("Miércoles"), Some(2));
        assert_eq!(day_of_week("Sabado"), Some(5));
        assert_eq!(day_of_week("Monday"), None);
    }
}
