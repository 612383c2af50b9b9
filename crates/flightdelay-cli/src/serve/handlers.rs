use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use flightdelay::data_handling::{FlightRecord, FlightType};
use flightdelay::preprocessing::{preprocess, FeatureSchema};

use super::error::{Result, ServerError, Violation};
use super::AppState;

/// Airlines accepted by `POST /predict`.
pub const KNOWN_AIRLINES: [&str; 23] = [
    "American Airlines",
    "Air Canada",
    "Air France",
    "Aeromexico",
    "Aerolineas Argentinas",
    "Austral",
    "Avianca",
    "Alitalia",
    "British Airways",
    "Copa Air",
    "Delta Air",
    "Gol Trans",
    "Iberia",
    "K.L.M.",
    "Qantas Airways",
    "United Airlines",
    "Grupo LATAM",
    "Sky Airline",
    "Latin American Wings",
    "Plus Ultra Lineas Aereas",
    "JetSmart SPA",
    "Oceanair Linhas Aereas",
    "Lacsa",
];

/// A flight as received over HTTP, before validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlightInput {
    #[serde(rename = "OPERA")]
    pub airline: String,
    #[serde(rename = "TIPOVUELO")]
    pub flight_type: String,
    #[serde(rename = "MES")]
    pub month: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictRequest {
    pub flights: Vec<FlightInput>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictResponse {
    pub predict: Vec<i32>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>> {
    let records = validate_flights(&request.flights)?;
    let model = Arc::clone(&state.model);

    // Loading the artifact and scoring are blocking, CPU-bound work.
    let predictions = tokio::task::spawn_blocking(move || -> Result<Vec<i32>> {
        let features = preprocess(&records, FeatureSchema::top_ten())?;
        Ok(model.predict(&features)?)
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    log::debug!("Predicted {} flights", predictions.len());
    Ok(Json(PredictResponse {
        predict: predictions,
    }))
}

/// Check every flight against the closed airline set, the flight type
/// codes and the month range, collecting one violation per bad field.
pub fn validate_flights(flights: &[FlightInput]) -> Result<Vec<FlightRecord>> {
    let mut records = Vec::with_capacity(flights.len());
    let mut violations = Vec::new();

    for (index, flight) in flights.iter().enumerate() {
        if !KNOWN_AIRLINES.contains(&flight.airline.as_str()) {
            violations.push(Violation {
                index,
                field: "OPERA",
                message: format!("unknown airline {:?}", flight.airline),
            });
        }

        let flight_type = FlightType::from_code(&flight.flight_type);
        if flight_type.is_none() {
            violations.push(Violation {
                index,
                field: "TIPOVUELO",
                message: format!("must be \"I\" or \"N\", got {:?}", flight.flight_type),
            });
        }

        let month = u32::try_from(flight.month)
            .ok()
            .filter(|m| (1..=12).contains(m));
        if month.is_none() {
            violations.push(Violation {
                index,
                field: "MES",
                message: format!("must be between 1 and 12, got {}", flight.month),
            });
        }

        if let (Some(flight_type), Some(month)) = (flight_type, month) {
            records.push(FlightRecord::new(flight.airline.clone(), flight_type, month));
        }
    }

    if violations.is_empty() {
        Ok(records)
    } else {
        Err(ServerError::Validation { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(airline: &str, flight_type: &str, month: i64) -> FlightInput {
        FlightInput {
            airline: airline.to_string(),
            flight_type: flight_type.to_string(),
            month,
        }
    }

    #[test]
    fn valid_flights_become_records() {
        let records = validate_flights(&[flight("Grupo LATAM", "I", 7)]).unwrap();
        assert_eq!(
            records,
            vec![FlightRecord::new("Grupo LATAM", FlightType::International, 7)]
        );
    }

    #[test]
    fn every_bad_field_is_reported() {
        let err = validate_flights(&[
            flight("Aerolineas Argentinas", "N", 3),
            flight("Argentinas", "O", 13),
        ])
        .unwrap_err();
        match err {
            ServerError::Validation { violations } => {
                let fields: Vec<(usize, &str)> =
                    violations.iter().map(|v| (v.index, v.field)).collect();
                assert_eq!(fields, vec![(1, "OPERA"), (1, "TIPOVUELO"), (1, "MES")]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn negative_month_is_out_of_range() {
        assert!(validate_flights(&[flight("Sky Airline", "N", -1)]).is_err());
        assert!(validate_flights(&[flight("Sky Airline", "N", 0)]).is_err());
    }
}
