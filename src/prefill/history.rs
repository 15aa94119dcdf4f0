use std::collections::HashMap;

use crate::models::{MetricField, PerformanceSummary, Plan, PlanExercise, Target, WorkoutLog};
use crate::providers::{Collaborators, Notice};
use crate::settings::EngineSettings;

use super::overload::eligible_rule;

/// What the history collaborators know about one catalog exercise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseHistory {
    /// Newest first.
    pub recent_logs: Vec<WorkoutLog>,
    pub last_performance: Option<PerformanceSummary>,
}

/// Everything the prefill passes read, gathered up front so the passes
/// themselves stay pure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefillHistory {
    /// Keyed by catalog exercise id.
    pub exercises: HashMap<String, ExerciseHistory>,
    /// Instance ids of exercises missing from the catalog.
    pub unknown: Vec<String>,
    /// Effort rating of the latest session of the same routine.
    pub previous_effort: Option<u8>,
}

impl PrefillHistory {
    pub fn for_exercise(&self, exercise_id: &str) -> Option<&ExerciseHistory> {
        self.exercises.get(exercise_id)
    }

    pub fn is_unknown(&self, instance_id: &str) -> bool {
        self.unknown.iter().any(|unknown| unknown == instance_id)
    }

    /// Asks the catalog and history collaborators about every exercise in
    /// `plan`. History failures are logged and treated as missing history.
    pub fn gather(plan: &Plan, collaborators: &Collaborators, settings: &EngineSettings) -> Self {
        let mut history = PrefillHistory::default();
        // One fetch per catalog exercise, deep enough for the longest streak
        // any of its instances asks for.
        let mut streak_lengths: Vec<(String, usize)> = Vec::new();

        for exercise in &plan.exercises {
            if collaborators.catalog.exercise(&exercise.exercise_id).is_none() {
                log::warn!(
                    "Exercise {} ({}) is not in the catalog; keeping its planned targets",
                    exercise.exercise_id,
                    exercise.instance_id
                );
                collaborators.notifier.notify(&Notice::ExerciseSkipped {
                    instance_id: exercise.instance_id.clone(),
                    exercise_id: exercise.exercise_id.clone(),
                });
                history.unknown.push(exercise.instance_id.clone());
                continue;
            }

            let streak_length = eligible_rule(exercise, &settings.default_overload)
                .map(|rule| rule.streak_length)
                .unwrap_or(0);
            match streak_lengths
                .iter_mut()
                .find(|(exercise_id, _)| *exercise_id == exercise.exercise_id)
            {
                Some((_, longest)) => *longest = (*longest).max(streak_length),
                None => streak_lengths.push((exercise.exercise_id.clone(), streak_length)),
            }
        }

        for (exercise_id, streak_length) in streak_lengths {
            let recent_logs = if streak_length > 0 {
                collaborators
                    .history
                    .recent_logs_with_exercise(&exercise_id, streak_length)
                    .map(|saved| saved.into_iter().map(|saved| saved.log).collect())
                    .unwrap_or_else(|err| {
                        log::warn!("Failed to load recent logs for {exercise_id}: {err:#}");
                        Vec::new()
                    })
            } else {
                Vec::new()
            };

            let last_performance = collaborators
                .history
                .last_performance(&exercise_id)
                .unwrap_or_else(|err| {
                    log::warn!("Failed to load last performance for {exercise_id}: {err:#}");
                    None
                });

            history.exercises.insert(
                exercise_id,
                ExerciseHistory {
                    recent_logs,
                    last_performance,
                },
            );
        }

        if let Some(routine_id) = &plan.routine_id {
            match collaborators.history.logs_for_routine(routine_id, Some(1)) {
                Ok(logs) => {
                    history.previous_effort = logs.first().and_then(|saved| saved.log.effort_rating);
                }
                Err(err) => log::warn!("Failed to load previous session of {routine_id}: {err:#}"),
            }
        }

        history
    }
}

/// Whether last-session values exist that could replace this exercise's
/// targets.
pub fn has_usable_history(exercise: &PlanExercise, history: &PrefillHistory) -> bool {
    history
        .for_exercise(&exercise.exercise_id)
        .and_then(|entry| entry.last_performance.as_ref())
        .map(|summary| !summary.sets.is_empty())
        .unwrap_or(false)
}

/// Replaces numeric targets of active metrics with what was performed last
/// time at the same set position. Schemes are kept.
pub fn apply_last_performance(exercise: &mut PlanExercise, summary: &PerformanceSummary) -> bool {
    let mut changed = false;
    for (set, performed) in exercise.sets.iter_mut().zip(summary.sets.iter()) {
        for field in MetricField::PERFORMANCE {
            if !set.is_active(field) {
                continue;
            }
            let Some(value) = performed.get(field) else {
                continue;
            };
            let Some(slot) = set.target_mut(field) else {
                continue;
            };
            if matches!(slot, Some(Target::Scheme { .. })) {
                continue;
            }
            *slot = Some(Target::exact(value));
            changed = true;
        }
    }
    changed
}
