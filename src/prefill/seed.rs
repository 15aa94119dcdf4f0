use crate::completion::{planned_value, InputBuffer};
use crate::models::{MetricField, MetricValues, Plan, SetKey};

/// Builds the input buffer a session starts with: one entry per planned set,
/// holding the value each active metric would be logged with untouched.
/// Qualitative targets stay empty so they must be typed in.
pub fn seed_inputs(plan: &Plan) -> InputBuffer {
    let mut inputs = InputBuffer::default();
    for exercise in &plan.exercises {
        for (index, set) in exercise.sets.iter().enumerate() {
            let mut values = MetricValues::default();
            for field in MetricField::PERFORMANCE {
                if set.is_active(field) {
                    values.set(field, planned_value(field, set.target(field)));
                }
            }
            inputs.seed(&SetKey::new(exercise.instance_id.clone(), index), values);
        }
    }
    inputs
}
