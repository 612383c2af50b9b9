pub mod flights_csv;

pub use flights_csv::{
    prediction_rows, read_flights, read_flights_csv, write_predictions, write_predictions_csv,
    PredictionRow,
};
