//! Feedback submission endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use thermocal_core::FeedbackEvent;

use super::decode_body;
use crate::{
    error::{ApiError, Result},
    models::*,
    AppState,
};

const MISSING_FIELDS: &str = "Missing required fields";

#[utoipa::path(
    post,
    path = "/feedback",
    request_body = SubmitFeedbackRequest,
    responses(
        (status = 200, description = "Feedback recorded", body = SubmitFeedbackResponse),
        (status = 400, description = "Missing fields or unknown feedback label", body = ErrorResponse),
        (status = 500, description = "Feedback store could not be written", body = ErrorResponse)
    ),
    tag = "feedback"
)]
pub async fn submit_feedback(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitFeedbackResponse>> {
    let req: SubmitFeedbackRequest = decode_body(payload)?;

    let (Some(user_id), Some(temp), Some(offset), Some(feedback)) =
        (req.user_id, req.temp, req.offset, req.feedback)
    else {
        return Err(ApiError::bad_request(MISSING_FIELDS));
    };
    if user_id.is_empty() || feedback.is_empty() {
        return Err(ApiError::bad_request(MISSING_FIELDS));
    }

    let event = FeedbackEvent::now(user_id, feedback).with_reading(temp, offset);
    state.calibrator.record(event).await?;

    Ok(Json(SubmitFeedbackResponse {
        message: "Feedback recorded successfully".to_string(),
    }))
}
