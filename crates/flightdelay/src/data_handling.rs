//! Data structures for raw flight records and derived feature tables.
//!
//! `FlightRecord` mirrors one row of the flight dataset (column names match
//! the CSV headers). `FeatureTable` is the named, ordered numeric matrix
//! handed to the classifier, and `holdout_split` produces the seeded
//! train/validation partition used by the training entry point.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::math::{Array2, ShapeError};
use crate::preprocessing::FeatureSchema;

/// International ("I") or domestic ("N") flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightType {
    #[serde(rename = "I")]
    International,
    #[serde(rename = "N")]
    Domestic,
}

impl FlightType {
    pub fn code(&self) -> &'static str {
        match self {
            FlightType::International => "I",
            FlightType::Domestic => "N",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "I" => Some(FlightType::International),
            "N" => Some(FlightType::Domestic),
            _ => None,
        }
    }
}

/// One observed flight.
///
/// Only airline, flight type and month are always present; the remaining
/// fields are needed by the extended feature set and for label derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Operating airline
    #[serde(rename = "OPERA")]
    pub airline: String,
    #[serde(rename = "TIPOVUELO")]
    pub flight_type: FlightType,
    /// Month of operation, 1..=12
    #[serde(rename = "MES")]
    pub month: u32,
    /// Day of month
    #[serde(rename = "DIA", default)]
    pub day: Option<u32>,
    /// Spanish day name (Lunes..Domingo)
    #[serde(rename = "DIANOM", default)]
    pub day_name: Option<String>,
    /// Scheduled departure, `%Y-%m-%d %H:%M:%S`
    #[serde(rename = "Fecha-I", default)]
    pub scheduled: Option<String>,
    /// Actual departure, `%Y-%m-%d %H:%M:%S`
    #[serde(rename = "Fecha-O", default)]
    pub actual: Option<String>,
    /// Destination city
    #[serde(rename = "SIGLADES", default)]
    pub destination: Option<String>,
}

impl FlightRecord {
    /// A record with only the fields the serving boundary receives.
    pub fn new(airline: impl Into<String>, flight_type: FlightType, month: u32) -> Self {
        FlightRecord {
            airline: airline.into(),
            flight_type,
            month,
            day: None,
            day_name: None,
            scheduled: None,
            actual: None,
            destination: None,
        }
    }

    pub fn with_schedule(
        mut self,
        scheduled: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        self.scheduled = Some(scheduled.into());
        self.actual = Some(actual.into());
        self
    }

    pub fn with_calendar(mut self, day: u32, day_name: impl Into<String>) -> Self {
        self.day = Some(day);
        self.day_name = Some(day_name.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// Named feature columns over a row-major `f32` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    values: Array2<f32>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, values: Array2<f32>) -> Result<Self, ShapeError> {
        if columns.len() != values.ncols() {
            return Err(ShapeError::column_count(values.nrows(), columns.len(), values.ncols()));
        }
        Ok(FeatureTable { columns, values })
    }

    /// Pair a matrix built column by column with the schema's column names.
    pub(crate) fn from_schema(schema: &FeatureSchema, values: Array2<f32>) -> Self {
        debug_assert_eq!(schema.len(), values.ncols());
        FeatureTable {
            columns: schema.column_names().to_vec(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, name: &str) -> Option<f32> {
        self.column_index(name).map(|idx| self.values[(row, idx)])
    }

    pub fn select_rows(&self, indices: &[usize]) -> FeatureTable {
        FeatureTable {
            columns: self.columns.clone(),
            values: self.values.select_rows(indices),
        }
    }

    /// Keep only the named columns, in the given order. Returns `None` when
    /// a requested column does not exist.
    pub fn select_columns(&self, names: &[&str]) -> Option<FeatureTable> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Option<Vec<_>>>()?;
        Some(FeatureTable {
            columns: names.iter().map(|n| n.to_string()).collect(),
            values: self.values.select_columns(&indices),
        })
    }
}

/// Partition row indices into (train, validation) sets.
///
/// `fraction` is the share of rows held out for validation. The shuffle is
/// seeded, so the same `seed` always yields the same partition. Both index
/// lists are returned sorted to keep rows in their input order.
pub fn holdout_split(n_rows: usize, fraction: f32, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n_rows).collect();
    let fraction = fraction.clamp(0.0, 1.0);
    let n_validation = (n_rows as f32 * fraction).round() as usize;
    if n_validation == 0 {
        return (indices, Vec::new());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut validation = indices.split_off(n_rows - n_validation);
    indices.sort_unstable();
    validation.sort_unstable();
    (indices, validation)
}
