//! Plan adjustments applied once, right before a session starts.
//!
//! The passes run in a fixed order: progressive overload, last-session
//! prefill for everything not overloaded, then a session-wide intensity
//! scale. Given the same plan, history, settings and choices the result is
//! always the same; only `prepare` talks to collaborators.

mod history;
mod intensity;
mod overload;
mod seed;

pub use history::{apply_last_performance, has_usable_history, ExerciseHistory, PrefillHistory};
pub use intensity::{intensity_prompt, scale_exercise};
pub use overload::{
    apply_overload, eligible_rule, log_meets_targets, set_met_targets, streak_met, EligibleRule,
};
pub use seed::seed_inputs;

use crate::models::Plan;
use crate::providers::{Collaborators, Notice, PrefillSource};
use crate::settings::EngineSettings;

/// Answers to the prompts raised while preparing a plan.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PrefillChoices {
    pub source: PrefillSource,
    /// Signed percentage; `None` keeps targets as they are.
    pub intensity_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedOverload {
    pub instance_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefillResult {
    pub plan: Plan,
    pub overloads: Vec<AppliedOverload>,
    /// Instance ids whose targets came from the last session.
    pub prefilled: Vec<String>,
    /// Instance ids left untouched because the catalog does not know them.
    pub skipped: Vec<String>,
    pub intensity_percent: Option<f64>,
}

impl PrefillResult {
    fn is_overloaded(&self, instance_id: &str) -> bool {
        self.overloads
            .iter()
            .any(|applied| applied.instance_id == instance_id)
    }
}

fn overload_pass(plan: &Plan, history: &PrefillHistory, settings: &EngineSettings) -> PrefillResult {
    let mut adjusted = plan.clone();
    let mut overloads = Vec::new();

    for exercise in &mut adjusted.exercises {
        if history.is_unknown(&exercise.instance_id) {
            continue;
        }
        let Some(rule) = eligible_rule(exercise, &settings.default_overload) else {
            continue;
        };
        let logs = history
            .for_exercise(&exercise.exercise_id)
            .map(|entry| entry.recent_logs.as_slice())
            .unwrap_or(&[]);
        if !streak_met(exercise, &rule, logs) {
            continue;
        }
        if let Some(description) = apply_overload(exercise, &rule) {
            overloads.push(AppliedOverload {
                instance_id: exercise.instance_id.clone(),
                description,
            });
        }
    }

    PrefillResult {
        plan: adjusted,
        overloads,
        prefilled: Vec::new(),
        skipped: history.unknown.clone(),
        intensity_percent: None,
    }
}

/// Exercises that would take last-session values if the user agrees,
/// identified by display name.
fn history_candidates(result: &PrefillResult, history: &PrefillHistory) -> Vec<String> {
    result
        .plan
        .exercises
        .iter()
        .filter(|exercise| {
            !history.is_unknown(&exercise.instance_id)
                && !result.is_overloaded(&exercise.instance_id)
                && has_usable_history(exercise, history)
        })
        .map(|exercise| exercise.display_name().to_string())
        .collect()
}

fn finishing_passes(result: &mut PrefillResult, history: &PrefillHistory, choices: &PrefillChoices) {
    if choices.source == PrefillSource::LastSession {
        for index in 0..result.plan.exercises.len() {
            let instance_id = result.plan.exercises[index].instance_id.clone();
            if history.is_unknown(&instance_id) || result.is_overloaded(&instance_id) {
                continue;
            }
            let exercise_id = result.plan.exercises[index].exercise_id.clone();
            let Some(summary) = history
                .for_exercise(&exercise_id)
                .and_then(|entry| entry.last_performance.as_ref())
            else {
                continue;
            };
            if apply_last_performance(&mut result.plan.exercises[index], summary) {
                result.prefilled.push(instance_id);
            }
        }
    }

    if let Some(percent) = choices.intensity_percent.filter(|percent| *percent != 0.0) {
        for exercise in &mut result.plan.exercises {
            if !history.is_unknown(&exercise.instance_id) {
                scale_exercise(exercise, percent);
            }
        }
        result.intensity_percent = Some(percent);
    }
}

/// Runs every pass with known answers. Pure.
pub fn adjust_plan(
    plan: &Plan,
    history: &PrefillHistory,
    settings: &EngineSettings,
    choices: &PrefillChoices,
) -> PrefillResult {
    let mut result = overload_pass(plan, history, settings);
    finishing_passes(&mut result, history, choices);
    result
}

/// Gathers history, asks the decision collaborator what it needs to know and
/// runs the passes. Overloads are announced through the notifier.
pub fn prepare(plan: &Plan, collaborators: &Collaborators, settings: &EngineSettings) -> PrefillResult {
    let history = PrefillHistory::gather(plan, collaborators, settings);
    let mut result = overload_pass(plan, &history, settings);

    let candidates = history_candidates(&result, &history);
    let source = if candidates.is_empty() {
        PrefillSource::Original
    } else {
        collaborators
            .decisions
            .prefill_source(&candidates)
            .unwrap_or_default()
    };
    let intensity_percent = intensity_prompt(history.previous_effort, &settings.intensity)
        .and_then(|prompt| collaborators.decisions.intensity_adjustment(&prompt));

    finishing_passes(
        &mut result,
        &history,
        &PrefillChoices {
            source,
            intensity_percent,
        },
    );

    for applied in &result.overloads {
        log::info!(
            "Overload applied to {}: {}",
            applied.instance_id,
            applied.description
        );
        collaborators.notifier.notify(&Notice::OverloadApplied {
            instance_id: applied.instance_id.clone(),
            description: applied.description.clone(),
        });
    }

    result
}
