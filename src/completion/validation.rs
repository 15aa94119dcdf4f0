use crate::error::ValidationError;
use crate::models::{MetricField, MetricValues, PlannedSet, SetKey, Target, TargetScheme};

use super::InputEntry;

/// Resolves the values a set is logged with, field by field:
/// override, then user input, then plan target, then zero.
///
/// Only fields listed in the set's `field_order` are resolved. Qualitative rep
/// targets and schemes other than bodyweight never fall back silently.
pub fn resolve_values(
    key: &SetKey,
    planned: &PlannedSet,
    input: Option<&InputEntry>,
    overrides: &MetricValues,
) -> Result<MetricValues, ValidationError> {
    let mut resolved = MetricValues::default();

    for field in MetricField::PERFORMANCE {
        if !planned.is_active(field) {
            continue;
        }

        let explicit = overrides
            .get(field)
            .or_else(|| input.and_then(|entry| entry.values.get(field)));
        let target = planned.target(field);

        let value = match explicit {
            Some(value) => value,
            None => target_fallback(key, field, target)?,
        };

        if field == MetricField::Weight
            && value == 0.0
            && !target.map(Target::is_bodyweight).unwrap_or(false)
        {
            return Err(ValidationError::ZeroWeight {
                instance_id: key.instance_id.clone(),
                set_index: key.set_index,
            });
        }

        resolved.set(field, Some(value));
    }

    Ok(resolved)
}

fn target_fallback(
    key: &SetKey,
    field: MetricField,
    target: Option<&Target>,
) -> Result<f64, ValidationError> {
    planned_value(field, target).ok_or_else(|| ValidationError::UnresolvedTarget {
        instance_id: key.instance_id.clone(),
        set_index: key.set_index,
        field,
    })
}

/// Value a set is logged with when the user enters nothing. `None` when the
/// target is qualitative and must be performed to be known.
pub fn planned_value(field: MetricField, target: Option<&Target>) -> Option<f64> {
    match target {
        None => Some(0.0),
        Some(Target::Exact { value }) => Some(*value),
        Some(Target::Range { .. }) if field == MetricField::Reps => None,
        Some(Target::Range { min, .. }) => Some(*min),
        Some(Target::Scheme {
            scheme: TargetScheme::Bodyweight,
        }) if field == MetricField::Weight => Some(0.0),
        Some(Target::Scheme { .. }) => None,
    }
}
