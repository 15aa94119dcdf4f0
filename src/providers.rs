//! Seams to the collaborators the engine does not own: routine and catalog
//! lookup, history, persistence, user decisions and notifications.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::ValidationError;
use crate::models::{
    PausedSessionSnapshot, PerformanceSummary, Plan, SavedWorkoutLog, SessionSummary,
    StoredSnapshot, WorkoutLog,
};

pub trait RoutineSource: Send + Sync {
    fn load_routine(&self, routine_id: &str) -> Result<Option<Plan>>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseInfo {
    pub id: String,
    pub name: String,
}

pub trait ExerciseCatalog: Send + Sync {
    fn exercise(&self, exercise_id: &str) -> Option<ExerciseInfo>;
}

pub trait HistorySource: Send + Sync {
    fn last_performance(&self, exercise_id: &str) -> Result<Option<PerformanceSummary>>;

    /// Logs for a routine, newest first.
    fn logs_for_routine(&self, routine_id: &str, limit: Option<usize>)
        -> Result<Vec<SavedWorkoutLog>>;

    /// Most recent logs that contain the exercise, newest first.
    fn recent_logs_with_exercise(
        &self,
        exercise_id: &str,
        limit: usize,
    ) -> Result<Vec<SavedWorkoutLog>>;
}

pub trait SessionStore: Send + Sync {
    fn save_log(&self, log: &WorkoutLog) -> Result<SavedWorkoutLog>;
    fn save_paused_snapshot(&self, snapshot: &PausedSessionSnapshot) -> Result<()>;
    fn load_paused_snapshot(&self) -> Result<Option<StoredSnapshot>>;
    fn clear_paused_snapshot(&self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResumeConflict {
    VersionMismatch { found: u32, expected: u32 },
    RoutineMismatch {
        found: Option<String>,
        requested: Option<String>,
    },
    /// The body no longer parses; it can only be discarded.
    Unreadable { format_version: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResumePrompt {
    pub conflict: ResumeConflict,
    pub saved_at: DateTime<Utc>,
    pub logged_sets: usize,
    /// False when only discarding is possible.
    pub resumable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeChoice {
    Resume,
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PrefillSource {
    #[default]
    Original,
    LastSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityDirection {
    Increase,
    Decrease,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntensityPrompt {
    pub previous_effort: u8,
    pub direction: IntensityDirection,
    /// Signed percentage the engine suggests, e.g. `-10.0`.
    pub suggested_percent: f64,
}

/// Every method returns `None` when the user dismisses the prompt; the engine
/// then takes the least destructive path.
pub trait DecisionMaker: Send + Sync {
    fn resume_or_discard(&self, prompt: &ResumePrompt) -> Option<ResumeChoice>;
    fn prefill_source(&self, exercises_with_history: &[String]) -> Option<PrefillSource>;
    /// Signed percentage to scale the whole session by.
    fn intensity_adjustment(&self, prompt: &IntensityPrompt) -> Option<f64>;
    fn confirm_finish(&self, summary: &SessionSummary) -> Option<bool>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    OverloadApplied {
        instance_id: String,
        description: String,
    },
    RoundRemoved {
        superset_id: String,
        round: usize,
    },
    ValidationFailed(ValidationError),
    RestFinished {
        instance_id: String,
        set_index: usize,
    },
    ExerciseSkipped {
        instance_id: String,
        exercise_id: String,
    },
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Decision maker for headless use: keeps the original plan, skips intensity
/// changes, leaves mismatched snapshots alone and confirms finishing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl DecisionMaker for NonInteractive {
    fn resume_or_discard(&self, _prompt: &ResumePrompt) -> Option<ResumeChoice> {
        None
    }

    fn prefill_source(&self, _exercises_with_history: &[String]) -> Option<PrefillSource> {
        None
    }

    fn intensity_adjustment(&self, _prompt: &IntensityPrompt) -> Option<f64> {
        None
    }

    fn confirm_finish(&self, _summary: &SessionSummary) -> Option<bool> {
        Some(true)
    }
}

/// Notifier that forwards notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        log::info!("notice: {notice:?}");
    }
}

/// Catalog that knows every exercise id.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCatalog;

impl ExerciseCatalog for OpenCatalog {
    fn exercise(&self, exercise_id: &str) -> Option<ExerciseInfo> {
        Some(ExerciseInfo {
            id: exercise_id.to_string(),
            name: exercise_id.to_string(),
        })
    }
}

/// Everything a session controller talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub routines: Arc<dyn RoutineSource>,
    pub catalog: Arc<dyn ExerciseCatalog>,
    pub history: Arc<dyn HistorySource>,
    pub store: Arc<dyn SessionStore>,
    pub decisions: Arc<dyn DecisionMaker>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Wires a store that also serves routines and history, with the system
    /// clock and non-interactive defaults for the rest.
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: SessionStore + HistorySource + RoutineSource + 'static,
    {
        Self {
            routines: store.clone(),
            catalog: Arc::new(OpenCatalog),
            history: store.clone(),
            store,
            decisions: Arc::new(NonInteractive),
            notifier: Arc::new(LogNotifier),
            clock: Arc::new(SystemClock),
        }
    }
}
