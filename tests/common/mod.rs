#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use chrono::{DateTime, TimeZone, Utc};

use liftlog::clock::ManualClock;
use liftlog::models::{
    LoggedExercise, LoggedSet, MetricField, MetricValues, PausedSessionSnapshot,
    PerformanceSummary, Plan, PlanExercise, PlannedSet, SavedWorkoutLog, SessionSummary,
    SetTargets, StoredSnapshot, SupersetMode, Target, WorkoutLog,
};
use liftlog::providers::{
    Collaborators, DecisionMaker, HistorySource, IntensityPrompt, Notice, Notifier, OpenCatalog,
    PrefillSource, ResumeChoice, ResumePrompt, RoutineSource, SessionStore,
};
use liftlog::{EngineSettings, SessionController};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap()
}

#[derive(Default)]
pub struct MemoryStore {
    /// Oldest first.
    logs: Mutex<Vec<SavedWorkoutLog>>,
    snapshot: Mutex<Option<StoredSnapshot>>,
    routines: Mutex<HashMap<String, Plan>>,
    pub fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn push_log(&self, log: WorkoutLog) {
        let mut logs = self.logs.lock().unwrap();
        let id = format!("log-{}", logs.len());
        logs.push(SavedWorkoutLog { id, log });
    }

    pub fn logs(&self) -> Vec<SavedWorkoutLog> {
        self.logs.lock().unwrap().clone()
    }

    pub fn snapshot(&self) -> Option<PausedSessionSnapshot> {
        match self.snapshot.lock().unwrap().clone() {
            Some(StoredSnapshot::Readable(snapshot)) => Some(snapshot),
            _ => None,
        }
    }

    pub fn stored_snapshot(&self) -> Option<StoredSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn put_snapshot(&self, snapshot: PausedSessionSnapshot) {
        self.put_stored_snapshot(StoredSnapshot::Readable(snapshot));
    }

    pub fn put_stored_snapshot(&self, stored: StoredSnapshot) {
        *self.snapshot.lock().unwrap() = Some(stored);
    }

    pub fn put_routine(&self, routine_id: &str, plan: Plan) {
        self.routines
            .lock()
            .unwrap()
            .insert(routine_id.to_string(), plan);
    }

    fn newest_first(&self) -> Vec<SavedWorkoutLog> {
        let mut logs = self.logs();
        logs.reverse();
        logs
    }
}

impl SessionStore for MemoryStore {
    fn save_log(&self, log: &WorkoutLog) -> Result<SavedWorkoutLog> {
        if self.fail_saves.load(Ordering::SeqCst) {
            bail!("disk full");
        }
        self.push_log(log.clone());
        Ok(self.logs().last().cloned().unwrap())
    }

    fn save_paused_snapshot(&self, snapshot: &PausedSessionSnapshot) -> Result<()> {
        self.put_snapshot(snapshot.clone());
        Ok(())
    }

    fn load_paused_snapshot(&self) -> Result<Option<StoredSnapshot>> {
        Ok(self.stored_snapshot())
    }

    fn clear_paused_snapshot(&self) -> Result<()> {
        *self.snapshot.lock().unwrap() = None;
        Ok(())
    }
}

impl HistorySource for MemoryStore {
    fn last_performance(&self, exercise_id: &str) -> Result<Option<PerformanceSummary>> {
        Ok(self.newest_first().into_iter().find_map(|saved| {
            saved
                .log
                .exercise_by_catalog_id(exercise_id)
                .map(|exercise| PerformanceSummary::from_logged(exercise, saved.log.ended_at))
        }))
    }

    fn logs_for_routine(
        &self,
        routine_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SavedWorkoutLog>> {
        Ok(self
            .newest_first()
            .into_iter()
            .filter(|saved| saved.log.routine_id.as_deref() == Some(routine_id))
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    fn recent_logs_with_exercise(
        &self,
        exercise_id: &str,
        limit: usize,
    ) -> Result<Vec<SavedWorkoutLog>> {
        Ok(self
            .newest_first()
            .into_iter()
            .filter(|saved| saved.log.exercise_by_catalog_id(exercise_id).is_some())
            .take(limit)
            .collect())
    }
}

impl RoutineSource for MemoryStore {
    fn load_routine(&self, routine_id: &str) -> Result<Option<Plan>> {
        Ok(self.routines.lock().unwrap().get(routine_id).cloned())
    }
}

#[derive(Default)]
pub struct ScriptedDecisions {
    pub resume: Mutex<Option<ResumeChoice>>,
    pub prefill: Mutex<Option<PrefillSource>>,
    pub intensity: Mutex<Option<f64>>,
    pub confirm: Mutex<Option<bool>>,
    pub resume_prompts: Mutex<Vec<ResumePrompt>>,
    pub prefill_prompts: Mutex<Vec<Vec<String>>>,
    pub intensity_prompts: Mutex<Vec<IntensityPrompt>>,
}

impl DecisionMaker for ScriptedDecisions {
    fn resume_or_discard(&self, prompt: &ResumePrompt) -> Option<ResumeChoice> {
        self.resume_prompts.lock().unwrap().push(prompt.clone());
        *self.resume.lock().unwrap()
    }

    fn prefill_source(&self, exercises_with_history: &[String]) -> Option<PrefillSource> {
        self.prefill_prompts
            .lock()
            .unwrap()
            .push(exercises_with_history.to_vec());
        *self.prefill.lock().unwrap()
    }

    fn intensity_adjustment(&self, prompt: &IntensityPrompt) -> Option<f64> {
        self.intensity_prompts.lock().unwrap().push(prompt.clone());
        *self.intensity.lock().unwrap()
    }

    fn confirm_finish(&self, _summary: &SessionSummary) -> Option<bool> {
        *self.confirm.lock().unwrap()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub decisions: Arc<ScriptedDecisions>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            decisions: Arc::new(ScriptedDecisions::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            clock: Arc::new(ManualClock::new(t0())),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            routines: self.store.clone(),
            catalog: Arc::new(OpenCatalog),
            history: self.store.clone(),
            store: self.store.clone(),
            decisions: self.decisions.clone(),
            notifier: self.notifier.clone(),
            clock: self.clock.clone(),
        }
    }

    pub fn controller(&self) -> SessionController {
        self.controller_with(EngineSettings::default())
    }

    pub fn controller_with(&self, settings: EngineSettings) -> SessionController {
        SessionController::new(self.collaborators(), settings)
    }
}

pub fn strength_set(id: &str, reps: f64, weight: f64, rest_seconds: f64) -> PlannedSet {
    PlannedSet {
        id: id.into(),
        reps: Some(Target::exact(reps)),
        weight: Some(Target::exact(weight)),
        rest: Some(Target::exact(rest_seconds)),
        field_order: vec![MetricField::Reps, MetricField::Weight, MetricField::Rest],
        ..PlannedSet::default()
    }
}

pub fn timed_set(id: &str, seconds: f64) -> PlannedSet {
    PlannedSet {
        id: id.into(),
        duration: Some(Target::exact(seconds)),
        field_order: vec![MetricField::Duration],
        ..PlannedSet::default()
    }
}

pub fn reps_set(id: &str, reps: f64) -> PlannedSet {
    PlannedSet {
        id: id.into(),
        reps: Some(Target::exact(reps)),
        field_order: vec![MetricField::Reps],
        ..PlannedSet::default()
    }
}

pub fn exercise(instance_id: &str, exercise_id: &str, name: &str, sets: Vec<PlannedSet>) -> PlanExercise {
    PlanExercise {
        instance_id: instance_id.into(),
        exercise_id: exercise_id.into(),
        name: Some(name.into()),
        sets,
        ..PlanExercise::default()
    }
}

pub fn in_superset(
    mut exercise: PlanExercise,
    superset_id: &str,
    order: u32,
    mode: SupersetMode,
    round_seconds: Option<u32>,
) -> PlanExercise {
    exercise.superset_id = Some(superset_id.into());
    exercise.superset_order = Some(order);
    exercise.superset_mode = Some(mode);
    exercise.round_duration_seconds = round_seconds;
    exercise
}

pub fn plan(routine_id: &str, exercises: Vec<PlanExercise>) -> Plan {
    Plan {
        routine_id: Some(routine_id.into()),
        name: Some(routine_id.into()),
        exercises,
    }
}

/// A finished log where every set of `exercise` hit its planned targets.
pub fn log_matching(
    routine_id: &str,
    exercise: &PlanExercise,
    effort: Option<u8>,
    ended_at: DateTime<Utc>,
) -> WorkoutLog {
    let sets = exercise
        .sets
        .iter()
        .enumerate()
        .map(|(index, planned)| LoggedSet {
            id: format!("{}-{index}", exercise.instance_id),
            planned_set_id: planned.id.clone(),
            set_index: index,
            kind: planned.kind,
            values: MetricValues {
                reps: planned.reps.and_then(|target| target.exact_value()),
                weight: planned.weight.and_then(|target| target.exact_value()),
                ..MetricValues::default()
            },
            targets: SetTargets::from(planned),
            rest_seconds: None,
            actual_rest_seconds: None,
            tempo: None,
            completed_at: ended_at,
        })
        .collect();

    WorkoutLog {
        routine_id: Some(routine_id.into()),
        routine_name: None,
        started_at: Some(ended_at),
        ended_at: Some(ended_at),
        duration_seconds: 0,
        exercises: vec![LoggedExercise {
            instance_id: exercise.instance_id.clone(),
            exercise_id: exercise.exercise_id.clone(),
            name: exercise.name.clone(),
            superset_id: None,
            sets,
        }],
        effort_rating: effort,
        notes: None,
    }
}
