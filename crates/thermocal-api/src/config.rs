//! Server configuration
//!
//! # Environment Variables
//!
//! - `THERMOCAL_PORT`: HTTP port (default: 5000)
//! - `FEEDBACK_DB_PATH`: feedback JSON file (default: ./feedback_db.json)
//! - `CORS_ALLOWED_ORIGINS`: comma-separated origins, or `*` (default: http://localhost:3000)
//! - `CALIBRATION_CONFIG`: optional TOML file with estimator parameters
//! - `LEARNING_RATE`, `MIN_OFFSET`, `MAX_OFFSET`, `SEED_POLICY`: override single
//!   estimator parameters on top of the file
//! - `SHUTDOWN_TIMEOUT_SECS`: grace period for in-flight requests (default: 30)

use axum::http::{header, HeaderValue, Method};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thermocal_core::{CoreError, EstimatorConfig, Result, SeedPolicy};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_FEEDBACK_DB_PATH: &str = "./feedback_db.json";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Origins allowed to call the API from a browser
#[derive(Debug, Clone, PartialEq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

impl AllowedOrigins {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim() == "*" {
            return Ok(AllowedOrigins::Any);
        }

        let origins = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| {
                HeaderValue::from_str(o).map_err(|_| {
                    CoreError::InvalidConfig(format!("invalid CORS origin '{}'", o))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if origins.is_empty() {
            return Err(CoreError::InvalidConfig(
                "CORS_ALLOWED_ORIGINS is empty".to_string(),
            ));
        }
        Ok(AllowedOrigins::List(origins))
    }

    pub fn cors_layer(&self) -> CorsLayer {
        match self {
            AllowedOrigins::Any => CorsLayer::permissive(),
            AllowedOrigins::List(origins) => CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins.clone()))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        }
    }
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        AllowedOrigins::List(vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN)])
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub feedback_db_path: PathBuf,
    pub allowed_origins: AllowedOrigins,
    pub estimator: EstimatorConfig,
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            feedback_db_path: PathBuf::from(DEFAULT_FEEDBACK_DB_PATH),
            allowed_origins: AllowedOrigins::default(),
            estimator: EstimatorConfig::default(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Build from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_var(&lookup, "THERMOCAL_PORT")?.unwrap_or(defaults.port);

        let feedback_db_path = lookup("FEEDBACK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.feedback_db_path);

        let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) => AllowedOrigins::parse(&raw)?,
            None => defaults.allowed_origins,
        };

        let shutdown_timeout = parse_var::<u64, _>(&lookup, "SHUTDOWN_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.shutdown_timeout);

        let mut estimator = match lookup("CALIBRATION_CONFIG") {
            Some(path) => EstimatorConfig::from_file(&path)?,
            None => defaults.estimator,
        };

        if let Some(rate) = parse_var(&lookup, "LEARNING_RATE")? {
            estimator.learning_rate = rate;
        }
        if let Some(min) = parse_var(&lookup, "MIN_OFFSET")? {
            estimator.min_offset = min;
        }
        if let Some(max) = parse_var(&lookup, "MAX_OFFSET")? {
            estimator.max_offset = max;
        }
        if let Some(policy) = parse_var::<SeedPolicy, _>(&lookup, "SEED_POLICY")? {
            estimator.seed_policy = policy;
        }
        estimator.validate()?;

        Ok(Self {
            port,
            feedback_db_path,
            allowed_origins,
            estimator,
            shutdown_timeout,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            CoreError::InvalidConfig(format!("{} has an invalid value: '{}'", key, raw))
        }),
    }
}
