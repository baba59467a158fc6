//! Collaborator boundaries of the engine.
//!
//! Three traits define what the engine needs from the outside world:
//! - ReadingStore: keyed reading storage with the cached advice column
//! - NotificationSink: where derived alerts go
//! - ReminderConfig: where a suggested reminder time is recorded
//!
//! The AI text generator lives with the advice cache (`advice::AiAdvisor`).

use uuid::Uuid;

use crate::analytics::Priority;
use crate::db::DatabaseError;
use crate::models::{Reading, ReminderSetting};

/// Keyed reading storage.
pub trait ReadingStore: Send + Sync {
    /// Persist a newly ingested reading.
    fn insert_reading(&self, reading: &Reading) -> Result<(), DatabaseError>;

    /// Most recent readings of an owner, ordered by timestamp descending.
    fn get_recent(&self, owner_id: &str, limit: usize) -> Result<Vec<Reading>, DatabaseError>;

    /// A single reading by id.
    fn get_reading(&self, id: &Uuid) -> Result<Option<Reading>, DatabaseError>;

    /// Overwrite the cached advice of a reading.
    fn write_advice(&self, reading_id: &Uuid, text: &str) -> Result<(), DatabaseError>;

    /// Null out every placeholder advice. Returns rows updated.
    fn purge_sentinel_advice(&self) -> Result<u64, DatabaseError>;

    /// Bulk-delete the readings of one owner. Returns rows deleted.
    fn clear_readings(&self, owner_id: &str) -> Result<u64, DatabaseError>;
}

/// Delivery endpoint for alerts and reminders.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, title: &str, message: &str, priority: Priority);
}

/// Per-owner reminder time storage.
pub trait ReminderConfig: Send + Sync {
    fn set_reminder(&self, owner_id: &str, hour: u32, minute: u32) -> Result<(), DatabaseError>;

    fn get_reminder(&self, owner_id: &str) -> Result<Option<ReminderSetting>, DatabaseError>;
}
