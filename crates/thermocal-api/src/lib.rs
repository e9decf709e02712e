//! thermocal REST API Server
//!
//! HTTP/JSON boundary around the calibration core.
//!
//! # Endpoints
//!
//! - `POST /predict_offset`: `{userId?, currentTemp}` → `{userId, temperatureOffset}`
//! - `POST /feedback`: `{userId, temp, offset, feedback}` → `{message}`
//! - `GET /health`
//! - `GET /api-docs/openapi.json`

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use thermocal_core::Calibrator;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use utoipa::OpenApi;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod shutdown;

pub use config::{AllowedOrigins, ServerConfig};
pub use error::ApiError;
pub use shutdown::{serve_until, serve_with_shutdown, GracefulShutdown, ShutdownSignal};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub calibrator: Arc<Calibrator>,
}

impl AppState {
    pub fn new(calibrator: Arc<Calibrator>) -> Self {
        Self { calibrator }
    }
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState, origins: &AllowedOrigins) -> Router {
    Router::new()
        .route("/predict_offset", post(handlers::offset::predict_offset))
        .route("/feedback", post(handlers::feedback::submit_feedback))
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(handlers::health::openapi_json))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(origins.cors_layer())
}

/// Turn a handler panic into a 500 so the server keeps serving
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown internal error".to_string()
    };

    tracing::error!(panic = %message, "Handler panicked");
    ApiError::Internal(message).into_response()
}

/// OpenAPI specification
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::offset::predict_offset,
        handlers::feedback::submit_feedback,
        handlers::health::health_check,
    ),
    components(schemas(
        models::PredictOffsetRequest,
        models::PredictOffsetResponse,
        models::SubmitFeedbackRequest,
        models::SubmitFeedbackResponse,
        models::ErrorResponse,
        models::HealthResponse,
    )),
    tags(
        (name = "calibration", description = "Per-user temperature offsets"),
        (name = "feedback", description = "Feedback collection"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
