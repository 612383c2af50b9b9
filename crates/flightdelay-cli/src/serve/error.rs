use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use flightdelay::error::{FeatureError, ModelError};

/// One rejected field of one flight in a prediction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub index: usize,
    pub field: &'static str,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{} invalid field(s) in request", violations.len())]
    Validation { violations: Vec<Violation> },

    #[error("feature derivation failed: {0}")]
    Feature(#[from] FeatureError),

    #[error("prediction failed: {0}")]
    Model(#[from] ModelError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Validation { violations } => {
                let detail = violations
                    .iter()
                    .map(|v| format!("flights[{}].{}: {}", v.index, v.field, v.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "detail": detail,
                        "violations": violations,
                    })),
                )
                    .into_response()
            }
            other => {
                log::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": other.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
