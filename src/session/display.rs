//! Read-only view of a session for rendering. Recomputed from the `Session`
//! value on demand, never stored.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    LoggedSet, MetricValues, PlannedSet, Session, SessionStatus, SetKey,
};
use crate::timer::{TimerKind, TimerState};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTimer {
    pub kind: TimerKind,
    pub key: SetKey,
    pub remaining_seconds: u32,
    pub duration_seconds: u32,
    pub running: bool,
}

impl DisplayTimer {
    fn new(key: &SetKey, timer: &TimerState, now: DateTime<Utc>) -> Self {
        Self {
            kind: timer.kind,
            key: key.clone(),
            remaining_seconds: timer.remaining_seconds(now),
            duration_seconds: timer.duration_seconds,
            running: timer.is_running(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySet {
    pub key: SetKey,
    pub planned: PlannedSet,
    pub input: MetricValues,
    pub logged: Option<LoggedSet>,
    pub timer: Option<DisplayTimer>,
}

impl DisplaySet {
    pub fn is_completed(&self) -> bool {
        self.logged.is_some()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayExercise {
    pub instance_id: String,
    pub name: String,
    pub superset_id: Option<String>,
    pub sets: Vec<DisplaySet>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPlan {
    pub routine_name: Option<String>,
    pub status: SessionStatus,
    pub elapsed_seconds: u64,
    pub exercises: Vec<DisplayExercise>,
    pub rest: Option<DisplayTimer>,
    pub round_timers: Vec<DisplayTimer>,
}

pub fn derive_display_plan(session: &Session, now: DateTime<Utc>) -> DisplayPlan {
    let exercises = session
        .plan
        .exercises
        .iter()
        .map(|exercise| DisplayExercise {
            instance_id: exercise.instance_id.clone(),
            name: exercise.display_name().to_string(),
            superset_id: exercise.superset_id.clone(),
            sets: exercise
                .sets
                .iter()
                .enumerate()
                .map(|(index, planned)| {
                    let key = SetKey::new(exercise.instance_id.clone(), index);
                    DisplaySet {
                        planned: planned.clone(),
                        input: session.inputs.values(&key),
                        logged: session.logged_set(&key).cloned(),
                        timer: session
                            .timers
                            .get_kind(&key, TimerKind::Set)
                            .map(|timer| DisplayTimer::new(&key, timer, now)),
                        key,
                    }
                })
                .collect(),
        })
        .collect();

    let round_timers = session
        .timers
        .iter()
        .filter(|active| active.timer.kind == TimerKind::Round)
        .map(|active| DisplayTimer::new(&active.key, &active.timer, now))
        .collect();

    DisplayPlan {
        routine_name: session.plan.name.clone(),
        status: session.status,
        elapsed_seconds: session.elapsed_seconds(now),
        exercises,
        rest: session
            .timers
            .rest()
            .map(|active| DisplayTimer::new(&active.key, &active.timer, now)),
        round_timers,
    }
}
