use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    helpers::{format_datetime, from_json, to_i64, to_json},
    Database,
};
use crate::models::{PerformanceSummary, SavedWorkoutLog, WorkoutLog};

fn row_to_saved_log(row: &Row) -> Result<SavedWorkoutLog> {
    let id: String = row.get("id")?;
    let log_json: String = row.get("log_json")?;
    let log: WorkoutLog = from_json(&log_json, "workout log")
        .with_context(|| format!("workout log {id} is corrupt"))?;
    Ok(SavedWorkoutLog { id, log })
}

fn collect_logs(rows: &mut rusqlite::Rows<'_>) -> Result<Vec<SavedWorkoutLog>> {
    let mut logs = Vec::new();
    while let Some(row) = rows.next()? {
        logs.push(row_to_saved_log(row)?);
    }
    Ok(logs)
}

fn sql_limit(limit: Option<usize>) -> i64 {
    limit
        .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}

impl Database {
    /// Stores a finished log under a fresh id, with one index row per
    /// exercise it contains.
    pub fn insert_workout_log(&self, log: &WorkoutLog) -> Result<SavedWorkoutLog> {
        let saved = SavedWorkoutLog {
            id: Uuid::new_v4().to_string(),
            log: log.clone(),
        };
        let record = saved.clone();
        self.execute(move |conn| {
            let log = &record.log;
            let performed_at = log.ended_at.or(log.started_at).as_ref().map(format_datetime);
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO workout_logs (id, routine_id, started_at, ended_at, duration_seconds, effort_rating, log_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    log.routine_id,
                    log.started_at.as_ref().map(format_datetime),
                    log.ended_at.as_ref().map(format_datetime),
                    to_i64(log.duration_seconds)?,
                    log.effort_rating,
                    to_json(log, "workout log")?,
                    format_datetime(&Utc::now()),
                ],
            )
            .with_context(|| "failed to insert workout log")?;

            for exercise in &log.exercises {
                tx.execute(
                    "INSERT OR IGNORE INTO workout_log_exercises (log_id, exercise_id, performed_at)
                     VALUES (?1, ?2, ?3)",
                    params![record.id, exercise.exercise_id, performed_at],
                )
                .with_context(|| "failed to index workout log exercise")?;
            }

            tx.commit()?;
            Ok(())
        })?;
        Ok(saved)
    }

    pub fn get_workout_log(&self, log_id: &str) -> Result<Option<SavedWorkoutLog>> {
        let log_id = log_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT id, log_json FROM workout_logs WHERE id = ?1")?;
            let saved = stmt
                .query_row(params![log_id], |row| Ok(row_to_saved_log(row)))
                .optional()?
                .transpose()?;
            Ok(saved)
        })
    }

    /// Newest first.
    pub fn list_logs_for_routine(
        &self,
        routine_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SavedWorkoutLog>> {
        let routine_id = routine_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, log_json FROM workout_logs
                 WHERE routine_id = ?1
                 ORDER BY COALESCE(ended_at, created_at) DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let mut rows = stmt.query(params![routine_id, sql_limit(limit)])?;
            collect_logs(&mut rows)
        })
    }

    /// Newest first.
    pub fn list_logs_with_exercise(
        &self,
        exercise_id: &str,
        limit: usize,
    ) -> Result<Vec<SavedWorkoutLog>> {
        let exercise_id = exercise_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT workout_logs.id AS id, workout_logs.log_json AS log_json
                 FROM workout_log_exercises
                 JOIN workout_logs ON workout_logs.id = workout_log_exercises.log_id
                 WHERE workout_log_exercises.exercise_id = ?1
                 ORDER BY workout_log_exercises.performed_at DESC, workout_logs.rowid DESC
                 LIMIT ?2",
            )?;
            let mut rows = stmt.query(params![exercise_id, sql_limit(Some(limit))])?;
            collect_logs(&mut rows)
        })
    }

    pub fn get_last_performance(&self, exercise_id: &str) -> Result<Option<PerformanceSummary>> {
        let latest = self.list_logs_with_exercise(exercise_id, 1)?;
        Ok(latest.into_iter().next().and_then(|saved| {
            let performed_at = saved.log.ended_at.or(saved.log.started_at);
            saved
                .log
                .exercise_by_catalog_id(exercise_id)
                .map(|exercise| PerformanceSummary::from_logged(exercise, performed_at))
        }))
    }

    pub fn count_workout_logs(&self) -> Result<usize> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM workout_logs", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }
}
