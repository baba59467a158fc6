//! SQLite-backed implementation of the store collaborators.
//!
//! A single `rusqlite::Connection` guarded by a mutex. The connection is
//! not `Sync`, so every trait call takes the lock for its duration.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use uuid::Uuid;

use super::repository;
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::{Reading, ReminderSetting};
use crate::traits::{ReadingStore, ReminderConfig};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (and migrate) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_database(path)?))
    }

    /// Fresh in-memory database.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl ReadingStore for SqliteStore {
    fn insert_reading(&self, reading: &Reading) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        repository::insert_reading(&conn, reading)
    }

    fn get_recent(&self, owner_id: &str, limit: usize) -> Result<Vec<Reading>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_recent_readings(&conn, owner_id, limit)
    }

    fn get_reading(&self, id: &Uuid) -> Result<Option<Reading>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_reading(&conn, id)
    }

    fn write_advice(&self, reading_id: &Uuid, text: &str) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        repository::update_reading_recommendation(&conn, reading_id, text)
    }

    fn purge_sentinel_advice(&self) -> Result<u64, DatabaseError> {
        let conn = self.conn()?;
        let cleared = repository::clear_invalid_recommendations(&conn)?;
        if cleared > 0 {
            tracing::info!(cleared, "Cleared placeholder advice records");
        }
        Ok(cleared)
    }

    fn clear_readings(&self, owner_id: &str) -> Result<u64, DatabaseError> {
        let conn = self.conn()?;
        repository::delete_readings_for_owner(&conn, owner_id)
    }
}

impl ReminderConfig for SqliteStore {
    fn set_reminder(&self, owner_id: &str, hour: u32, minute: u32) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        repository::upsert_reminder(&conn, owner_id, hour, minute)
    }

    fn get_reminder(&self, owner_id: &str) -> Result<Option<ReminderSetting>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_reminder(&conn, owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteStore>();
    }

    #[test]
    fn trait_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let r = Reading::new("ana", 132, 84, 72, 5_000);
        store.insert_reading(&r).unwrap();
        store.write_advice(&r.id, "Reduce la sal.").unwrap();

        let recent = store.get_recent("ana", 5).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].ai_recommendation.as_deref(), Some("Reduce la sal."));
    }

    #[test]
    fn reminder_through_trait() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_reminder("ana", 7, 0).unwrap();
        let setting = store.get_reminder("ana").unwrap().unwrap();
        assert_eq!((setting.hour, setting.minute), (7, 0));
    }

    #[test]
    fn purge_and_clear_through_trait() {
        let store = SqliteStore::in_memory().unwrap();
        let mut stuck = Reading::new("ana", 120, 80, 70, 1_000);
        stuck.ai_recommendation = Some("Configura tu clave en ajustes.".into());
        store.insert_reading(&stuck).unwrap();
        store.insert_reading(&Reading::new("ana", 125, 82, 71, 2_000)).unwrap();
        store.insert_reading(&Reading::new("luis", 140, 90, 75, 3_000)).unwrap();

        assert_eq!(store.purge_sentinel_advice().unwrap(), 1);
        assert!(store.get_reading(&stuck.id).unwrap().unwrap().ai_recommendation.is_none());

        assert_eq!(store.clear_readings("ana").unwrap(), 2);
        assert!(store.get_reading(&stuck.id).unwrap().is_none());
        assert_eq!(store.get_recent("luis", 10).unwrap().len(), 1);
    }
}
