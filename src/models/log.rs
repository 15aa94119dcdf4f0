//! Performance record data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::{MetricField, PlannedSet, SetKind, Target};

/// Performed values for one set. Also used as the transient input buffer entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricValues {
    pub reps: Option<f64>,
    pub weight: Option<f64>,
    pub duration: Option<f64>,
    pub distance: Option<f64>,
}

impl MetricValues {
    pub fn get(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::Reps => self.reps,
            MetricField::Weight => self.weight,
            MetricField::Duration => self.duration,
            MetricField::Distance => self.distance,
            MetricField::Rest | MetricField::Tempo => None,
        }
    }

    pub fn set(&mut self, field: MetricField, value: Option<f64>) {
        match field {
            MetricField::Reps => self.reps = value,
            MetricField::Weight => self.weight = value,
            MetricField::Duration => self.duration = value,
            MetricField::Distance => self.distance = value,
            MetricField::Rest | MetricField::Tempo => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_none()
            && self.weight.is_none()
            && self.duration.is_none()
            && self.distance.is_none()
    }
}

/// Planned targets copied onto a logged set so history can be judged later
/// without the plan it was performed against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SetTargets {
    pub reps: Option<Target>,
    pub weight: Option<Target>,
    pub duration: Option<Target>,
    pub distance: Option<Target>,
    #[serde(default)]
    pub field_order: Vec<MetricField>,
}

impl SetTargets {
    pub fn target(&self, field: MetricField) -> Option<&Target> {
        match field {
            MetricField::Reps => self.reps.as_ref(),
            MetricField::Weight => self.weight.as_ref(),
            MetricField::Duration => self.duration.as_ref(),
            MetricField::Distance => self.distance.as_ref(),
            MetricField::Rest | MetricField::Tempo => None,
        }
    }

    pub fn is_active(&self, field: MetricField) -> bool {
        self.field_order.contains(&field)
    }
}

impl From<&PlannedSet> for SetTargets {
    fn from(set: &PlannedSet) -> Self {
        Self {
            reps: set.reps,
            weight: set.weight,
            duration: set.duration,
            distance: set.distance,
            field_order: set.field_order.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggedSet {
    pub id: String,
    /// Planned set id, or `{plannedSetId}-round-{roundIndex}` for superset rounds.
    pub planned_set_id: String,
    pub set_index: usize,
    #[serde(default)]
    pub kind: SetKind,
    pub values: MetricValues,
    pub targets: SetTargets,
    pub rest_seconds: Option<u32>,
    pub actual_rest_seconds: Option<u32>,
    pub tempo: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl LoggedSet {
    pub fn volume(&self) -> f64 {
        self.values.reps.unwrap_or(0.0) * self.values.weight.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggedExercise {
    pub instance_id: String,
    pub exercise_id: String,
    pub name: Option<String>,
    pub superset_id: Option<String>,
    pub sets: Vec<LoggedSet>,
}

impl LoggedExercise {
    pub fn logged_set(&self, planned_set_id: &str) -> Option<&LoggedSet> {
        self.sets
            .iter()
            .find(|set| set.planned_set_id == planned_set_id)
    }
}

/// Planned set reference for a logged set: plain for standard exercises,
/// suffixed with the round for superset members.
pub fn logged_set_ref(planned_set_id: &str, superset_round: Option<usize>) -> String {
    match superset_round {
        Some(round) => format!("{planned_set_id}-round-{round}"),
        None => planned_set_id.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLog {
    pub routine_id: Option<String>,
    pub routine_name: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub exercises: Vec<LoggedExercise>,
    /// Subjective effort, 1 (easy) to 10 (maximal).
    pub effort_rating: Option<u8>,
    pub notes: Option<String>,
}

impl WorkoutLog {
    pub fn exercise(&self, instance_id: &str) -> Option<&LoggedExercise> {
        self.exercises
            .iter()
            .find(|exercise| exercise.instance_id == instance_id)
    }

    pub fn exercise_by_catalog_id(&self, exercise_id: &str) -> Option<&LoggedExercise> {
        self.exercises
            .iter()
            .find(|exercise| exercise.exercise_id == exercise_id)
    }

    pub fn logged_set(&self, instance_id: &str, planned_set_id: &str) -> Option<&LoggedSet> {
        self.exercise(instance_id)
            .and_then(|exercise| exercise.logged_set(planned_set_id))
    }

    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|exercise| exercise.sets.len()).sum()
    }

    pub fn total_volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|exercise| exercise.sets.iter())
            .map(LoggedSet::volume)
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedWorkoutLog {
    pub id: String,
    pub log: WorkoutLog,
}

/// Last recorded values of one exercise, indexed by set position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub exercise_id: String,
    pub performed_at: Option<DateTime<Utc>>,
    pub sets: Vec<MetricValues>,
}

impl PerformanceSummary {
    pub fn from_logged(exercise: &LoggedExercise, performed_at: Option<DateTime<Utc>>) -> Self {
        let mut sets: Vec<&LoggedSet> = exercise.sets.iter().collect();
        sets.sort_by_key(|set| set.set_index);
        Self {
            exercise_id: exercise.exercise_id.clone(),
            performed_at,
            sets: sets.into_iter().map(|set| set.values.clone()).collect(),
        }
    }
}
