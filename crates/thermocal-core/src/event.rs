//! Feedback Event
//!
//! A `FeedbackEvent` is one recorded reaction of a user to the temperature
//! they were shown: "hot", "just_right" or "cold". Events are appended to the
//! feedback store and never edited afterwards.
//!
//! ## Wire Format
//! Events are stored as camelCase JSON objects inside a single array:
//!
//! ```json
//! [
//!   { "userId": "u1", "temp": 21.5, "offset": 0.0, "feedback": "cold", "timestamp": 1700000000000 }
//! ]
//! ```
//!
//! Only `userId` is mandatory when reading. A missing, `null` or non-string
//! `feedback` reads as an empty label (neutral score) and a missing
//! `timestamp` reads as `0`, so such events sort before every stamped event.

use serde::{Deserialize, Deserializer, Serialize};

/// Label for "it feels too warm".
pub const HOT: &str = "hot";
/// Label for "it feels right".
pub const JUST_RIGHT: &str = "just_right";
/// Label for "it feels too cold".
pub const COLD: &str = "cold";

/// A single feedback record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub user_id: String,

    #[serde(default, deserialize_with = "lenient_label")]
    pub feedback: String,

    /// Event time, milliseconds since epoch for events written by this crate
    #[serde(default)]
    pub timestamp: f64,

    /// Ambient reading the user reacted to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,

    /// Offset that was applied when the feedback was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
}

impl FeedbackEvent {
    pub fn new(user_id: impl Into<String>, feedback: impl Into<String>, timestamp: f64) -> Self {
        Self {
            user_id: user_id.into(),
            feedback: feedback.into(),
            timestamp,
            temp: None,
            offset: None,
        }
    }

    /// Attach the reading and offset the user was looking at
    pub fn with_reading(mut self, temp: f64, offset: f64) -> Self {
        self.temp = Some(temp);
        self.offset = Some(offset);
        self
    }

    /// Stamp a new event with the current wall-clock time
    pub fn now(user_id: impl Into<String>, feedback: impl Into<String>) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        Self::new(user_id, feedback, millis as f64)
    }
}

/// Any JSON value is accepted; only strings carry a label
fn lenient_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(label) => Ok(label),
        _ => Ok(String::new()),
    }
}
