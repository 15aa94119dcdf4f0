use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::{
    helpers::{format_datetime, from_json, to_json},
    Database,
};
use crate::models::Plan;

impl Database {
    /// Inserts or replaces the routine `routine_id`.
    pub fn save_routine(&self, routine_id: &str, plan: &Plan) -> Result<()> {
        let routine_id = routine_id.to_string();
        let mut plan = plan.clone();
        plan.routine_id = Some(routine_id.clone());
        self.execute(move |conn| {
            let now = format_datetime(&Utc::now());
            conn.execute(
                "INSERT INTO routines (id, name, plan_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     plan_json = excluded.plan_json,
                     updated_at = excluded.updated_at",
                params![routine_id, plan.name, to_json(&plan, "routine")?, now],
            )
            .with_context(|| format!("failed to save routine {routine_id}"))?;
            Ok(())
        })
    }

    pub fn get_routine(&self, routine_id: &str) -> Result<Option<Plan>> {
        let routine_id = routine_id.to_string();
        self.execute(move |conn| {
            let plan_json: Option<String> = conn
                .query_row(
                    "SELECT plan_json FROM routines WHERE id = ?1",
                    params![routine_id],
                    |row| row.get(0),
                )
                .optional()?;
            plan_json
                .map(|raw| from_json::<Plan>(&raw, "routine"))
                .transpose()
        })
    }

    pub fn delete_routine(&self, routine_id: &str) -> Result<bool> {
        let routine_id = routine_id.to_string();
        self.execute(move |conn| {
            let deleted = conn.execute("DELETE FROM routines WHERE id = ?1", params![routine_id])?;
            Ok(deleted > 0)
        })
    }
}
