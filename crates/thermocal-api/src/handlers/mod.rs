//! API request handlers

pub mod feedback;
pub mod health;
pub mod offset;

use axum::{extract::rejection::JsonRejection, Json};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, Result};

pub(crate) const NO_DATA: &str = "No data received";

/// Decode a JSON object body.
///
/// A missing, unparseable, non-object or empty body is reported as
/// "No data received"; an object whose fields have the wrong types is
/// reported with the decoder's message.
pub(crate) fn decode_body<T: DeserializeOwned>(
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<T> {
    let Json(value) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::bad_request(NO_DATA)
    })?;

    match &value {
        Value::Object(fields) if !fields.is_empty() => {}
        _ => return Err(ApiError::bad_request(NO_DATA)),
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
}
