use chrono::{DateTime, FixedOffset, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Milliseconds in one day, used for whole-day gap arithmetic.
pub const MILLIS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

/// A single blood-pressure measurement.
///
/// `ai_recommendation` is the cached advice for this reading. It may be
/// empty or hold a placeholder left over from a failed generation; see
/// `advice::sentinel` for how that is detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub id: Uuid,
    pub owner_id: String,
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: i32,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub ai_recommendation: Option<String>,
}

impl Reading {
    /// New reading with a fresh id and no cached advice.
    pub fn new(owner_id: &str, systolic: i32, diastolic: i32, pulse: i32, timestamp_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            systolic,
            diastolic,
            pulse,
            timestamp_ms,
            ai_recommendation: None,
        }
    }

    /// Hour of day (0-23) of the measurement in the given offset.
    ///
    /// Timestamps outside chrono's representable range fall back to hour 0.
    pub fn hour_of_day(&self, offset: &FixedOffset) -> u32 {
        offset
            .timestamp_millis_opt(self.timestamp_ms)
            .single()
            .map(|dt| dt.hour())
            .unwrap_or(0)
    }

    /// Measurement time as a UTC datetime, if representable.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms).single()
    }
}
