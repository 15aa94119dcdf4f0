//! Routine plan data models.
//!
//! A `Plan` is the snapshot of a routine a session runs against. Targets are
//! typed so qualitative schemes (AMRAP, to failure, bodyweight) survive the
//! round trip through the snapshot and history.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MetricField {
    Reps,
    Weight,
    Duration,
    Distance,
    Rest,
    Tempo,
}

impl MetricField {
    /// Metrics that carry a performed value and are validated on completion.
    pub const PERFORMANCE: [MetricField; 4] = [
        MetricField::Reps,
        MetricField::Weight,
        MetricField::Duration,
        MetricField::Distance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::Reps => "reps",
            MetricField::Weight => "weight",
            MetricField::Duration => "duration",
            MetricField::Distance => "distance",
            MetricField::Rest => "rest",
            MetricField::Tempo => "tempo",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TargetScheme {
    Amrap,
    Max,
    ToFailure,
    Bodyweight,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Target {
    Exact { value: f64 },
    Range { min: f64, max: f64 },
    Scheme { scheme: TargetScheme },
}

impl Target {
    pub fn exact(value: f64) -> Self {
        Target::Exact { value }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Target::Range { min, max }
    }

    pub fn scheme(scheme: TargetScheme) -> Self {
        Target::Scheme { scheme }
    }

    pub fn exact_value(&self) -> Option<f64> {
        match self {
            Target::Exact { value } => Some(*value),
            _ => None,
        }
    }

    pub fn is_bodyweight(&self) -> bool {
        matches!(
            self,
            Target::Scheme {
                scheme: TargetScheme::Bodyweight
            }
        )
    }

    /// Applies `f` to every numeric bound, leaving schemes untouched.
    pub fn map_numeric(&self, f: impl Fn(f64) -> f64) -> Self {
        match *self {
            Target::Exact { value } => Target::Exact { value: f(value) },
            Target::Range { min, max } => Target::Range {
                min: f(min),
                max: f(max),
            },
            Target::Scheme { scheme } => Target::Scheme { scheme },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SetKind {
    #[default]
    Normal,
    WarmUp,
    Drop,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSet {
    pub id: String,
    #[serde(default)]
    pub kind: SetKind,
    pub reps: Option<Target>,
    pub weight: Option<Target>,
    /// Seconds.
    pub duration: Option<Target>,
    pub distance: Option<Target>,
    /// Seconds.
    pub rest: Option<Target>,
    pub tempo: Option<String>,
    #[serde(default)]
    pub field_order: Vec<MetricField>,
}

impl PlannedSet {
    pub fn is_active(&self, field: MetricField) -> bool {
        self.field_order.contains(&field)
    }

    pub fn is_warm_up(&self) -> bool {
        self.kind == SetKind::WarmUp
    }

    /// Target for a performance metric, regardless of whether it is active.
    pub fn target(&self, field: MetricField) -> Option<&Target> {
        match field {
            MetricField::Reps => self.reps.as_ref(),
            MetricField::Weight => self.weight.as_ref(),
            MetricField::Duration => self.duration.as_ref(),
            MetricField::Distance => self.distance.as_ref(),
            MetricField::Rest => self.rest.as_ref(),
            MetricField::Tempo => None,
        }
    }

    pub fn target_mut(&mut self, field: MetricField) -> Option<&mut Option<Target>> {
        match field {
            MetricField::Reps => Some(&mut self.reps),
            MetricField::Weight => Some(&mut self.weight),
            MetricField::Duration => Some(&mut self.duration),
            MetricField::Distance => Some(&mut self.distance),
            MetricField::Rest => Some(&mut self.rest),
            MetricField::Tempo => None,
        }
    }

    /// Configured rest in whole seconds; zero when rest is inactive.
    pub fn rest_seconds(&self) -> u32 {
        if !self.is_active(MetricField::Rest) {
            return 0;
        }
        match self.rest {
            Some(Target::Exact { value }) => value.max(0.0).round() as u32,
            Some(Target::Range { min, .. }) => min.max(0.0).round() as u32,
            _ => 0,
        }
    }

    /// Planned duration in whole seconds when it is a concrete number.
    pub fn duration_seconds(&self) -> Option<u32> {
        match self.duration {
            Some(Target::Exact { value }) => Some(value.max(0.0).round() as u32),
            Some(Target::Range { max, .. }) => Some(max.max(0.0).round() as u32),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SupersetMode {
    #[default]
    Standard,
    TimedRound,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OverloadStrategy {
    IncreaseWeight,
    IncreaseReps,
}

impl OverloadStrategy {
    pub fn field(&self) -> MetricField {
        match self {
            OverloadStrategy::IncreaseWeight => MetricField::Weight,
            OverloadStrategy::IncreaseReps => MetricField::Reps,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverloadRule {
    pub enabled: bool,
    pub strategy: Option<OverloadStrategy>,
    pub increment: f64,
    pub streak_length: Option<u32>,
}

impl Default for OverloadRule {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: None,
            increment: 0.0,
            streak_length: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlanExercise {
    pub instance_id: String,
    pub exercise_id: String,
    pub name: Option<String>,
    pub sets: Vec<PlannedSet>,
    pub superset_id: Option<String>,
    pub superset_order: Option<u32>,
    pub superset_mode: Option<SupersetMode>,
    pub round_duration_seconds: Option<u32>,
    pub overload: Option<OverloadRule>,
}

impl PlanExercise {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.exercise_id)
    }

    pub fn is_timed_round(&self) -> bool {
        self.superset_id.is_some() && self.superset_mode == Some(SupersetMode::TimedRound)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub routine_id: Option<String>,
    pub name: Option<String>,
    pub exercises: Vec<PlanExercise>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.exercises.iter().all(|exercise| exercise.sets.is_empty())
    }

    pub fn exercise(&self, instance_id: &str) -> Option<&PlanExercise> {
        self.exercises
            .iter()
            .find(|exercise| exercise.instance_id == instance_id)
    }

    pub fn planned_set(&self, instance_id: &str, set_index: usize) -> Option<&PlannedSet> {
        self.exercise(instance_id)
            .and_then(|exercise| exercise.sets.get(set_index))
    }

    /// Members of a superset group ordered by `superset_order`.
    pub fn superset_members(&self, superset_id: &str) -> Vec<&PlanExercise> {
        let mut members: Vec<&PlanExercise> = self
            .exercises
            .iter()
            .filter(|exercise| exercise.superset_id.as_deref() == Some(superset_id))
            .collect();
        members.sort_by_key(|exercise| exercise.superset_order.unwrap_or(u32::MAX));
        members
    }

    pub fn round_count(&self, superset_id: &str) -> usize {
        self.superset_members(superset_id)
            .iter()
            .map(|exercise| exercise.sets.len())
            .min()
            .unwrap_or(0)
    }
}
