//! Offset prediction endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use super::decode_body;
use crate::{
    error::{ApiError, Result},
    models::*,
    AppState,
};

#[utoipa::path(
    post,
    path = "/predict_offset",
    request_body = PredictOffsetRequest,
    responses(
        (status = 200, description = "Offset computed", body = PredictOffsetResponse),
        (status = 400, description = "Missing body or currentTemp", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "calibration"
)]
pub async fn predict_offset(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictOffsetResponse>> {
    let req: PredictOffsetRequest = decode_body(payload)?;

    // Validated for the contract only; the offset is derived from history
    let Some(_current_temp) = req.current_temp else {
        return Err(ApiError::bad_request("currentTemp is required"));
    };

    let user_id = req.user_id.unwrap_or_else(|| ANONYMOUS_USER.to_string());
    let result = state.calibrator.calibrate(&user_id).await;

    Ok(Json(PredictOffsetResponse {
        user_id: result.user_id,
        temperature_offset: result.offset,
    }))
}
