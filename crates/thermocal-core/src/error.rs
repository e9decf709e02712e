//! Error Types for thermocal
//!
//! ## Error Categories
//!
//! ### Store Errors
//! - `Io`: the feedback file could not be read or written
//! - `Json`: the feedback file exists but is not a JSON array of events
//! - `Persist`: the atomic replace of the feedback file failed
//!
//! ### Configuration Errors
//! - `InvalidConfig`: estimator parameters violate their bounds
//! - `ConfigParse`: the TOML configuration file is malformed
//!
//! ### Input Errors
//! - `UnknownFeedback`: a submitted label has no entry in the score table
//!
//! The estimator itself never fails; only the store and the configuration
//! loader produce these errors. The store's infallible `load_all` path logs
//! them and degrades to an empty history.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to replace feedback store: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Unknown feedback label: {0}")]
    UnknownFeedback(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
