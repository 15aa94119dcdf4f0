use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::db::{
    helpers::{format_datetime, from_json, parse_datetime, to_json},
    Database,
};
use crate::models::{PausedSessionSnapshot, SnapshotHeader, StoredSnapshot};

impl Database {
    /// Replaces the stored snapshot; there is only ever one.
    pub fn upsert_paused_snapshot(&self, snapshot: &PausedSessionSnapshot) -> Result<()> {
        let record = snapshot.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO paused_session (slot, format_version, session_id, routine_id, snapshot_json, saved_at)
                 VALUES (1, ?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(slot) DO UPDATE SET
                     format_version = excluded.format_version,
                     session_id = excluded.session_id,
                     routine_id = excluded.routine_id,
                     snapshot_json = excluded.snapshot_json,
                     saved_at = excluded.saved_at",
                params![
                    record.format_version,
                    record.session_id,
                    record.routine_id,
                    to_json(&record, "paused session snapshot")?,
                    format_datetime(&record.saved_at),
                ],
            )
            .with_context(|| "failed to write paused session snapshot")?;
            Ok(())
        })
    }

    /// Reads the slot. A body that no longer parses comes back as
    /// `StoredSnapshot::Unreadable` so the caller can still offer to discard it.
    pub fn get_paused_snapshot(&self) -> Result<Option<StoredSnapshot>> {
        self.execute(|conn| {
            let row = conn
                .query_row(
                    "SELECT format_version, routine_id, snapshot_json, saved_at FROM paused_session WHERE slot = 1",
                    [],
                    |row| {
                        Ok((
                            row.get::<_, u32>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;

            let Some((format_version, routine_id, snapshot_json, saved_at)) = row else {
                return Ok(None);
            };
            let saved_at = parse_datetime(&saved_at, "saved_at")?;

            match from_json::<PausedSessionSnapshot>(&snapshot_json, "paused session snapshot") {
                Ok(mut snapshot) => {
                    // The columns are authoritative for the stored format.
                    snapshot.format_version = format_version;
                    snapshot.saved_at = saved_at;
                    Ok(Some(StoredSnapshot::Readable(snapshot)))
                }
                Err(err) => {
                    log::warn!("Paused session snapshot (format {format_version}) is unreadable: {err:#}");
                    Ok(Some(StoredSnapshot::Unreadable(SnapshotHeader {
                        format_version,
                        routine_id,
                        saved_at,
                    })))
                }
            }
        })
    }

    pub fn delete_paused_snapshot(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM paused_session WHERE slot = 1", [])
                .with_context(|| "failed to clear paused session snapshot")?;
            Ok(())
        })
    }
}
