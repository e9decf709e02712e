//! Calibration Service
//!
//! Ties the feedback store to the estimator. Each call reads the whole
//! history again; nothing is cached between calls, so results depend only on
//! what the store holds.

use crate::{
    config::EstimatorConfig,
    error::{CoreError, Result},
    estimator::{CalibrationResult, OffsetEstimator},
    event::FeedbackEvent,
    store::FeedbackStore,
};
use std::sync::Arc;

pub struct Calibrator {
    store: Arc<dyn FeedbackStore>,
    estimator: OffsetEstimator,
}

impl Calibrator {
    pub fn new(store: Arc<dyn FeedbackStore>, config: Arc<EstimatorConfig>) -> Self {
        Self {
            store,
            estimator: OffsetEstimator::new(config),
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        self.estimator.config()
    }

    /// Current offset for a user
    pub async fn calibrate(&self, user_id: &str) -> CalibrationResult {
        let events = self.store.load_all().await;
        self.estimator.calibrate(user_id, &events)
    }

    /// Store a new feedback event; the label must be in the score table
    pub async fn record(&self, event: FeedbackEvent) -> Result<()> {
        if !self.config().is_known_label(&event.feedback) {
            return Err(CoreError::UnknownFeedback(event.feedback));
        }
        self.store.append(event).await
    }
}
