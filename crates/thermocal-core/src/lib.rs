//! thermocal core
//!
//! Per-user temperature calibration. A user's "too hot / just right / too
//! cold" feedback history is folded into a bounded offset that a front end
//! adds to the measured temperature before picking recommendations.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use thermocal_core::{Calibrator, EstimatorConfig, JsonFileStore};
//!
//! let store = Arc::new(JsonFileStore::new("feedback_db.json"));
//! let calibrator = Calibrator::new(store, Arc::new(EstimatorConfig::default()));
//!
//! let result = calibrator.calibrate("cold_sensitive_user").await;
//! println!("{} -> {:+.2}", result.user_id, result.offset);
//! ```

pub mod calibration;
pub mod config;
pub mod error;
pub mod estimator;
pub mod event;
pub mod store;

pub use calibration::Calibrator;
pub use config::{EstimatorConfig, SeedPolicy};
pub use error::{CoreError, Result};
pub use estimator::{CalibrationResult, OffsetEstimator};
pub use event::FeedbackEvent;
pub use store::{FeedbackStore, JsonFileStore, MemoryFeedbackStore};
