use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::ReminderSetting;

/// Insert or replace the reminder for an owner (enabled).
pub fn upsert_reminder(
    conn: &Connection,
    owner_id: &str,
    hour: u32,
    minute: u32,
) -> Result<(), DatabaseError> {
    if hour > 23 || minute > 59 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "reminder time out of range: {hour:02}:{minute:02}"
        )));
    }
    conn.execute(
        "INSERT INTO reminder_settings (owner_id, hour, minute, enabled, updated_at)
         VALUES (?1, ?2, ?3, 1, datetime('now'))
         ON CONFLICT(owner_id) DO UPDATE SET
           hour = excluded.hour,
           minute = excluded.minute,
           enabled = 1,
           updated_at = excluded.updated_at",
        params![owner_id, hour, minute],
    )?;
    Ok(())
}

/// Get the reminder for an owner. Returns None if never set.
pub fn get_reminder(
    conn: &Connection,
    owner_id: &str,
) -> Result<Option<ReminderSetting>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT hour, minute, enabled FROM reminder_settings WHERE owner_id = ?1",
    )?;
    match stmt.query_row(params![owner_id], |row| {
        Ok(ReminderSetting {
            hour: row.get(0)?,
            minute: row.get(1)?,
            enabled: row.get::<_, i64>(2)? != 0,
        })
    }) {
        Ok(setting) => Ok(Some(setting)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::from(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn missing_reminder_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_reminder(&conn, "ana").unwrap().is_none());
    }

    #[test]
    fn upsert_replaces_time() {
        let conn = open_memory_database().unwrap();
        upsert_reminder(&conn, "ana", 8, 30).unwrap();
        upsert_reminder(&conn, "ana", 19, 0).unwrap();

        let setting = get_reminder(&conn, "ana").unwrap().unwrap();
        assert_eq!(setting, ReminderSetting { hour: 19, minute: 0, enabled: true });
    }

    #[test]
    fn out_of_range_rejected() {
        let conn = open_memory_database().unwrap();
        let result = upsert_reminder(&conn, "ana", 24, 0);
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }
}
