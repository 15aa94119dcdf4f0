mod paused_sessions;
mod routines;
mod workout_logs;

use anyhow::Result;

use crate::db::Database;
use crate::models::{
    PausedSessionSnapshot, PerformanceSummary, Plan, SavedWorkoutLog, StoredSnapshot, WorkoutLog,
};
use crate::providers::{HistorySource, RoutineSource, SessionStore};

impl SessionStore for Database {
    fn save_log(&self, log: &WorkoutLog) -> Result<SavedWorkoutLog> {
        self.insert_workout_log(log)
    }

    fn save_paused_snapshot(&self, snapshot: &PausedSessionSnapshot) -> Result<()> {
        self.upsert_paused_snapshot(snapshot)
    }

    fn load_paused_snapshot(&self) -> Result<Option<StoredSnapshot>> {
        self.get_paused_snapshot()
    }

    fn clear_paused_snapshot(&self) -> Result<()> {
        self.delete_paused_snapshot()
    }
}

impl HistorySource for Database {
    fn last_performance(&self, exercise_id: &str) -> Result<Option<PerformanceSummary>> {
        self.get_last_performance(exercise_id)
    }

    fn logs_for_routine(
        &self,
        routine_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SavedWorkoutLog>> {
        self.list_logs_for_routine(routine_id, limit)
    }

    fn recent_logs_with_exercise(
        &self,
        exercise_id: &str,
        limit: usize,
    ) -> Result<Vec<SavedWorkoutLog>> {
        self.list_logs_with_exercise(exercise_id, limit)
    }
}

impl RoutineSource for Database {
    fn load_routine(&self, routine_id: &str) -> Result<Option<Plan>> {
        self.get_routine(routine_id)
    }
}
