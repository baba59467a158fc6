use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::advice::sentinel::is_stale;
use crate::db::DatabaseError;
use crate::models::Reading;

const READING_COLUMNS: &str =
    "id, owner_id, systolic, diastolic, pulse, timestamp_ms, ai_recommendation";

/// Insert a blood-pressure reading.
pub fn insert_reading(conn: &Connection, r: &Reading) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO blood_pressure_readings (id, owner_id, systolic, diastolic, pulse, timestamp_ms, ai_recommendation)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            r.id.to_string(),
            r.owner_id,
            r.systolic,
            r.diastolic,
            r.pulse,
            r.timestamp_ms,
            r.ai_recommendation,
        ],
    )?;
    Ok(())
}

/// Most recent readings for an owner, newest first.
pub fn get_recent_readings(
    conn: &Connection,
    owner_id: &str,
    limit: usize,
) -> Result<Vec<Reading>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {READING_COLUMNS}
         FROM blood_pressure_readings
         WHERE owner_id = ?1
         ORDER BY timestamp_ms DESC
         LIMIT ?2"
    ))?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![owner_id, limit], row_to_reading)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Fetch a single reading by ID.
pub fn get_reading(conn: &Connection, id: &Uuid) -> Result<Option<Reading>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {READING_COLUMNS} FROM blood_pressure_readings WHERE id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![id.to_string()], row_to_reading)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Overwrite the cached advice of one reading.
pub fn update_reading_recommendation(
    conn: &Connection,
    id: &Uuid,
    recommendation: &str,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE blood_pressure_readings SET ai_recommendation = ?1 WHERE id = ?2",
        params![recommendation, id.to_string()],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "blood_pressure_reading".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Null out every stored advice that is empty or a placeholder.
///
/// Matching uses the same predicate as the cache (`is_stale`), so a purged
/// record is exactly one the cache would regenerate. Returns rows updated.
pub fn clear_invalid_recommendations(conn: &Connection) -> Result<u64, DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let stale_ids: Vec<String> = {
        let mut stmt = tx.prepare(
            "SELECT id, ai_recommendation FROM blood_pressure_readings
             WHERE ai_recommendation IS NOT NULL",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut ids = Vec::new();
        for row in rows {
            let (id, text) = row?;
            if is_stale(Some(&text)) {
                ids.push(id);
            }
        }
        ids
    };

    for id in &stale_ids {
        tx.execute(
            "UPDATE blood_pressure_readings SET ai_recommendation = NULL WHERE id = ?1",
            params![id],
        )?;
    }
    tx.commit()?;

    Ok(stale_ids.len() as u64)
}

/// Delete all readings of one owner. Returns rows deleted.
pub fn delete_readings_for_owner(conn: &Connection, owner_id: &str) -> Result<u64, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM blood_pressure_readings WHERE owner_id = ?1",
        params![owner_id],
    )?;
    Ok(affected as u64)
}

fn row_to_reading(row: &rusqlite::Row) -> Result<Reading, rusqlite::Error> {
    let id_str: String = row.get(0)?;

    Ok(Reading {
        id: Uuid::parse_str(&id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        owner_id: row.get(1)?,
        systolic: row.get(2)?,
        diastolic: row.get(3)?,
        pulse: row.get(4)?,
        timestamp_ms: row.get(5)?,
        ai_recommendation: row.get(6)?,
    })
}
