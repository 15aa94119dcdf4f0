use crate::models::{MetricField, PlanExercise};
use crate::providers::{IntensityDirection, IntensityPrompt};
use crate::settings::IntensitySettings;

/// A prompt is only raised after a session that felt very hard or very easy.
pub fn intensity_prompt(
    previous_effort: Option<u8>,
    settings: &IntensitySettings,
) -> Option<IntensityPrompt> {
    let effort = previous_effort?;
    let step = settings.suggested_step_percent.abs();
    if effort >= settings.high_effort_threshold {
        Some(IntensityPrompt {
            previous_effort: effort,
            direction: IntensityDirection::Decrease,
            suggested_percent: -step,
        })
    } else if effort <= settings.low_effort_threshold {
        Some(IntensityPrompt {
            previous_effort: effort,
            direction: IntensityDirection::Increase,
            suggested_percent: step,
        })
    } else {
        None
    }
}

fn round_for(field: MetricField, value: f64) -> f64 {
    match field {
        MetricField::Weight => ((value * 4.0).round() / 4.0).max(0.0),
        MetricField::Reps => value.round().max(1.0),
        MetricField::Duration => value.round().max(0.0),
        MetricField::Distance => ((value * 100.0).round() / 100.0).max(0.0),
        MetricField::Rest | MetricField::Tempo => value,
    }
}

/// Scales every numeric performance target by `percent` (e.g. `-10.0`).
pub fn scale_exercise(exercise: &mut PlanExercise, percent: f64) {
    let factor = 1.0 + percent / 100.0;
    for set in &mut exercise.sets {
        for field in MetricField::PERFORMANCE {
            let Some(slot) = set.target_mut(field) else {
                continue;
            };
            if let Some(target) = *slot {
                *slot = Some(target.map_numeric(|value| round_for(field, value * factor)));
            }
        }
    }
}
