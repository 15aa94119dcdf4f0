//! Live session data models.
//!
//! `Session` is an immutable value: every user action produces a new one and
//! the controller swaps it in wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::completion::InputBuffer;
use crate::timer::TimerRegistry;

use super::{logged_set_ref, LoggedSet, Plan, PlannedSet, SetKey, WorkoutLog};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Loading,
    Playing,
    Paused,
    Ended,
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Loading => "Loading",
            SessionStatus::Playing => "Playing",
            SessionStatus::Paused => "Paused",
            SessionStatus::Ended => "Ended",
            SessionStatus::Error => "Error",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Playing | SessionStatus::Paused)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub routine_id: Option<String>,
    pub status: SessionStatus,
    pub plan: Plan,
    /// Plan as loaded, before overload, prefill and intensity adjustments.
    pub original_plan: Plan,
    pub log: WorkoutLog,
    pub inputs: InputBuffer,
    pub timers: TimerRegistry,
    pub started_at: DateTime<Utc>,
    pub accumulated_paused_seconds: u64,
    pub paused_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        id: String,
        plan: Plan,
        original_plan: Plan,
        inputs: InputBuffer,
        started_at: DateTime<Utc>,
    ) -> Self {
        let log = WorkoutLog {
            routine_id: plan.routine_id.clone(),
            routine_name: plan.name.clone(),
            started_at: Some(started_at),
            ..WorkoutLog::default()
        };
        Self {
            id,
            routine_id: plan.routine_id.clone(),
            status: SessionStatus::Playing,
            plan,
            original_plan,
            log,
            inputs,
            timers: TimerRegistry::default(),
            started_at,
            accumulated_paused_seconds: 0,
            paused_at: None,
        }
    }

    /// Seconds of training time, excluding every paused span.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        let wall = (now - self.started_at).num_seconds().max(0) as u64;
        let current_pause = self
            .paused_at
            .map(|paused_at| (now - paused_at).num_seconds().max(0) as u64)
            .unwrap_or(0);
        wall.saturating_sub(self.accumulated_paused_seconds)
            .saturating_sub(current_pause)
    }

    pub fn planned_set(&self, key: &SetKey) -> Option<&PlannedSet> {
        self.plan.planned_set(&key.instance_id, key.set_index)
    }

    /// Reference the log uses for this set, unique per round for supersets.
    pub fn logged_ref(&self, key: &SetKey) -> Option<String> {
        let exercise = self.plan.exercise(&key.instance_id)?;
        let planned = exercise.sets.get(key.set_index)?;
        let round = exercise.superset_id.as_ref().map(|_| key.set_index);
        Some(logged_set_ref(&planned.id, round))
    }

    pub fn logged_set(&self, key: &SetKey) -> Option<&LoggedSet> {
        let reference = self.logged_ref(key)?;
        self.log.logged_set(&key.instance_id, &reference)
    }

    pub fn is_completed(&self, key: &SetKey) -> bool {
        self.logged_set(key).is_some()
    }

    pub fn summary(&self, now: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            exercise_count: self.log.exercises.len(),
            set_count: self.log.set_count(),
            total_volume: self.log.total_volume(),
            elapsed_seconds: self.elapsed_seconds(now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub exercise_count: usize,
    pub set_count: usize,
    pub total_volume: f64,
    pub elapsed_seconds: u64,
}
