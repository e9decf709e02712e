//! Offset Estimator
//!
//! Folds one user's feedback history into a single bounded offset.
//!
//! ## Algorithm
//! 1. Keep only the requested user's events
//! 2. Stable-sort them by ascending timestamp
//! 3. Map each label to its target score (unknown labels score 0.0)
//! 4. Seed the running offset according to the `SeedPolicy`
//! 5. For each event: `offset += learning_rate * (target - offset)`
//! 6. Clamp to `[min_offset, max_offset]` and round to two decimals
//!
//! Each step is a convex combination of the previous estimate and the target,
//! so repeated feedback of one polarity approaches its target score without
//! overshooting it.
//!
//! ## Example
//! With the default configuration (rate 0.2, bounds ±3.0, zero start), two
//! "cold" events yield `0 → -0.6 → -1.08`.

use crate::config::{EstimatorConfig, SeedPolicy};
use crate::event::FeedbackEvent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Offset computed for one user, valid for a single request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationResult {
    pub user_id: String,
    pub offset: f64,
    /// Number of events folded into `offset`
    pub event_count: usize,
}

impl CalibrationResult {
    /// Result for a user with no recorded feedback
    pub fn uncalibrated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            offset: 0.0,
            event_count: 0,
        }
    }
}

/// Stateless estimator; every call recomputes from the events it is given
#[derive(Debug, Clone)]
pub struct OffsetEstimator {
    config: Arc<EstimatorConfig>,
}

impl OffsetEstimator {
    pub fn new(config: Arc<EstimatorConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Offset for `user_id` given the full event list
    pub fn estimate(&self, user_id: &str, events: &[FeedbackEvent]) -> f64 {
        self.calibrate(user_id, events).offset
    }

    /// Same as [`estimate`](Self::estimate) but also reports how many events
    /// were folded
    pub fn calibrate(&self, user_id: &str, events: &[FeedbackEvent]) -> CalibrationResult {
        let history = user_history(user_id, events);
        if history.is_empty() {
            return CalibrationResult::uncalibrated(user_id);
        }

        let offset = self.present(self.fold(&history));

        info!(
            user_id = %user_id,
            events = history.len(),
            offset = offset,
            "Calibrated offset"
        );

        CalibrationResult {
            user_id: user_id.to_string(),
            offset,
            event_count: history.len(),
        }
    }

    /// Run the recurrence over a time-ordered history, without clamping
    fn fold(&self, history: &[&FeedbackEvent]) -> f64 {
        let rate = self.config.learning_rate;
        let mut targets = history
            .iter()
            .map(|event| self.config.score_for(&event.feedback));

        let seed = match self.config.seed_policy {
            SeedPolicy::ZeroStart => 0.0,
            SeedPolicy::FirstEvent => targets.next().map_or(0.0, |t| t * rate),
        };

        targets.fold(seed, |offset, target| offset + rate * (target - offset))
    }

    /// Clamp, then round to hundredths
    fn present(&self, raw: f64) -> f64 {
        let rounded = round_hundredths(self.clamp(raw));
        // Rounding can step past a bound that is not itself a multiple of 0.01
        let bounded = self.clamp(rounded);
        if bounded == 0.0 {
            0.0
        } else {
            bounded
        }
    }

    fn clamp(&self, value: f64) -> f64 {
        value.max(self.config.min_offset).min(self.config.max_offset)
    }
}

/// Events belonging to `user_id`, ordered by timestamp; ties keep input order
pub fn user_history<'a>(user_id: &str, events: &'a [FeedbackEvent]) -> Vec<&'a FeedbackEvent> {
    let mut history: Vec<&FeedbackEvent> =
        events.iter().filter(|e| e.user_id == user_id).collect();
    history.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    history
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
