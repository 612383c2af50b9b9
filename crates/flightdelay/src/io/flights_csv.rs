//! CSV reader for flight records and writer for batch predictions.
//!
//! Input files carry the dataset headers (`OPERA`, `TIPOVUELO`, `MES`,
//! `Fecha-I`, ...). Columns the record does not know about are ignored and
//! empty cells in optional columns read as absent. Files ending in `.tsv`
//! are read tab-delimited.
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::data_handling::FlightRecord;
use crate::error::DataError;

/// One line of a batch prediction file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub row: usize,
    pub predict: i32,
    pub probability: f32,
}

/// Read every flight record from a CSV (or TSV) file.
pub fn read_flights_csv<P: AsRef<Path>>(path: P) -> Result<Vec<FlightRecord>, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = read_flights(file, delimiter_for(path)).map_err(|source| DataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Read {} flight records from {}", records.len(), path.display());
    Ok(records)
}

/// Deserialize flight records from any reader with a header row.
pub fn read_flights<R: Read>(reader: R, delimiter: u8) -> Result<Vec<FlightRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    reader.deserialize::<FlightRecord>().collect()
}

/// Pair predictions with their probabilities, numbering rows from 0.
pub fn prediction_rows(
    predictions: &[i32],
    probabilities: &[f32],
) -> Result<Vec<PredictionRow>, DataError> {
    if predictions.len() != probabilities.len() {
        return Err(DataError::LengthMismatch {
            predictions: predictions.len(),
            probabilities: probabilities.len(),
        });
    }
    Ok(predictions
        .iter()
        .zip(probabilities)
        .enumerate()
        .map(|(row, (&predict, &probability))| PredictionRow {
            row,
            predict,
            probability,
        })
        .collect())
}

/// Write `row,predict,probability` lines, one per input row.
pub fn write_predictions_csv<P: AsRef<Path>>(
    path: P,
    predictions: &[i32],
    probabilities: &[f32],
) -> Result<(), DataError> {
    let path = path.as_ref();
    let rows = prediction_rows(predictions, probabilities)?;
    let file = File::create(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_predictions(file, &rows).map_err(|source| DataError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {} predictions to {}", rows.len(), path.display());
    Ok(())
}

/// Write prediction rows with a header to any writer.
pub fn write_predictions<W: Write>(writer: W, rows: &[PredictionRow]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}
