//! Calendar data models.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A user's calendar for one day, as submitted to `PUT /push`.
///
/// Missing fields decode to their zero values. `uuid` is assigned server side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Calendar {
    pub uuid: String,
    #[validate(length(min = 1, message = "invalid user token"))]
    pub user_token: String,
    /// Seconds since the epoch; floored to the start of its UTC day on push
    pub date: i64,
    pub events: Vec<Event>,
}

/// A single calendar event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub uuid: String,
    #[serde(rename = "calender_uuid")]
    pub calendar_uuid: String,
    pub title: String,
    pub start_time: i64,
    pub end_time: i64,
}

impl Event {
    pub fn new(title: impl Into<String>, start_time: i64, end_time: i64) -> Self {
        Self {
            title: title.into(),
            start_time,
            end_time,
            ..Default::default()
        }
    }
}

/// Result of a successful push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    /// Calendar the events were stored under
    pub calendar_uuid: String,
    /// Whether the calendar row was created by this push
    pub created: bool,
    /// Normalized day
    pub date: i64,
    /// Number of events now stored for the day
    pub event_count: usize,
}
