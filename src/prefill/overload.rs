use crate::models::{
    LoggedSet, MetricField, OverloadRule, OverloadStrategy, PlanExercise, SetKind, Target,
    WorkoutLog,
};

/// An overload rule that passed the eligibility check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibleRule {
    pub strategy: OverloadStrategy,
    pub increment: f64,
    pub streak_length: usize,
}

/// The exercise's own rule wins over the configured default.
pub fn eligible_rule(exercise: &PlanExercise, default_rule: &OverloadRule) -> Option<EligibleRule> {
    let rule = exercise.overload.as_ref().unwrap_or(default_rule);
    if !rule.enabled {
        return None;
    }
    let strategy = rule.strategy?;
    let streak_length = rule.streak_length.filter(|length| *length > 0)? as usize;
    Some(EligibleRule {
        strategy,
        increment: rule.increment,
        streak_length,
    })
}

fn working_sets(sets: &[LoggedSet]) -> impl Iterator<Item = &LoggedSet> {
    sets.iter().filter(|set| set.kind != SetKind::WarmUp)
}

/// A logged set meets its targets when every active numeric target was
/// reached. Ranges count only at their upper bound.
pub fn set_met_targets(set: &LoggedSet) -> bool {
    MetricField::PERFORMANCE.iter().all(|field| {
        if !set.targets.is_active(*field) {
            return true;
        }
        let performed = set.values.get(*field).unwrap_or(0.0);
        match set.targets.target(*field) {
            Some(Target::Exact { value }) => performed >= *value,
            Some(Target::Range { max, .. }) => performed >= *max,
            Some(Target::Scheme { .. }) | None => true,
        }
    })
}

/// Whether `log` counts towards a streak for `exercise`: it must hold at least
/// as many working sets as planned now, each of them on target.
pub fn log_meets_targets(log: &WorkoutLog, exercise: &PlanExercise) -> bool {
    let Some(logged) = log.exercise_by_catalog_id(&exercise.exercise_id) else {
        return false;
    };
    let planned_working = exercise
        .sets
        .iter()
        .filter(|set| !set.is_warm_up())
        .count();

    working_sets(&logged.sets).count() >= planned_working
        && working_sets(&logged.sets).all(set_met_targets)
}

/// `logs` must be newest first. Fewer logs than the streak length never pass.
pub fn streak_met(exercise: &PlanExercise, rule: &EligibleRule, logs: &[WorkoutLog]) -> bool {
    logs.len() >= rule.streak_length
        && logs
            .iter()
            .take(rule.streak_length)
            .all(|log| log_meets_targets(log, exercise))
}

/// Raises the overloaded metric of every working set and returns a short
/// description of the change, or `None` when no set had a numeric target.
pub fn apply_overload(exercise: &mut PlanExercise, rule: &EligibleRule) -> Option<String> {
    let field = rule.strategy.field();
    let mut before = None;
    let mut after = None;
    let mut changed = 0usize;

    for set in exercise.sets.iter_mut().filter(|set| !set.is_warm_up()) {
        let Some(slot) = set.target_mut(field) else {
            continue;
        };
        let Some(target) = *slot else {
            continue;
        };
        if matches!(target, Target::Scheme { .. }) {
            continue;
        }
        let raised = target.map_numeric(|value| value + rule.increment);
        before.get_or_insert(describe_target(&target));
        after.get_or_insert(describe_target(&raised));
        *slot = Some(raised);
        changed += 1;
    }

    if changed == 0 {
        return None;
    }
    Some(format!(
        "{} {} -> {} ({}{} on {} set{})",
        field.as_str(),
        before.unwrap_or_default(),
        after.unwrap_or_default(),
        if rule.increment >= 0.0 { "+" } else { "" },
        format_number(rule.increment),
        changed,
        if changed == 1 { "" } else { "s" },
    ))
}

fn describe_target(target: &Target) -> String {
    match target {
        Target::Exact { value } => format_number(*value),
        Target::Range { min, max } => format!("{}-{}", format_number(*min), format_number(*max)),
        Target::Scheme { scheme } => format!("{scheme:?}"),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let formatted = format!("{value:.2}");
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoggedExercise, MetricValues, PlannedSet, SetTargets};
    use chrono::Utc;

    fn bench_set(id: &str, kind: SetKind) -> PlannedSet {
        PlannedSet {
            id: id.into(),
            kind,
            reps: Some(Target::exact(5.0)),
            weight: Some(Target::exact(80.0)),
            field_order: vec![MetricField::Reps, MetricField::Weight],
            ..PlannedSet::default()
        }
    }

    fn bench() -> PlanExercise {
        PlanExercise {
            instance_id: "bench-1".into(),
            exercise_id: "bench".into(),
            sets: vec![
                bench_set("w", SetKind::WarmUp),
                bench_set("s1", SetKind::Normal),
                bench_set("s2", SetKind::Normal),
            ],
            ..PlanExercise::default()
        }
    }

    fn logged(kind: SetKind, index: usize, reps: f64, weight: f64, targets: SetTargets) -> LoggedSet {
        LoggedSet {
            id: format!("l{index}"),
            planned_set_id: format!("p{index}"),
            set_index: index,
            kind,
            values: MetricValues {
                reps: Some(reps),
                weight: Some(weight),
                ..MetricValues::default()
            },
            targets,
            rest_seconds: None,
            actual_rest_seconds: None,
            tempo: None,
            completed_at: Utc::now(),
        }
    }

    fn log_with(sets: Vec<LoggedSet>) -> WorkoutLog {
        WorkoutLog {
            exercises: vec![LoggedExercise {
                instance_id: "old".into(),
                exercise_id: "bench".into(),
                name: None,
                superset_id: None,
                sets,
            }],
            ..WorkoutLog::default()
        }
    }

    fn rule(streak_length: usize) -> EligibleRule {
        EligibleRule {
            strategy: OverloadStrategy::IncreaseWeight,
            increment: 2.5,
            streak_length,
        }
    }

    #[test]
    fn eligibility_needs_strategy_and_streak() {
        let mut exercise = bench();
        let mut default_rule = OverloadRule {
            enabled: true,
            strategy: Some(OverloadStrategy::IncreaseReps),
            increment: 1.0,
            streak_length: None,
        };
        assert!(eligible_rule(&exercise, &default_rule).is_none());

        default_rule.streak_length = Some(3);
        assert_eq!(
            eligible_rule(&exercise, &default_rule).map(|rule| rule.streak_length),
            Some(3)
        );

        exercise.overload = Some(OverloadRule {
            enabled: false,
            ..default_rule.clone()
        });
        assert!(eligible_rule(&exercise, &default_rule).is_none());
    }

    #[test]
    fn ranges_count_only_at_upper_bound() {
        let targets = SetTargets {
            reps: Some(Target::range(8.0, 12.0)),
            field_order: vec![MetricField::Reps],
            ..SetTargets::default()
        };
        assert!(!set_met_targets(&logged(SetKind::Normal, 0, 10.0, 0.0, targets.clone())));
        assert!(set_met_targets(&logged(SetKind::Normal, 0, 12.0, 0.0, targets)));
    }

    #[test]
    fn warm_up_sets_do_not_break_a_streak() {
        let exercise = bench();
        let targets = SetTargets::from(&exercise.sets[1]);
        let passing = log_with(vec![
            logged(SetKind::WarmUp, 0, 1.0, 20.0, targets.clone()),
            logged(SetKind::Normal, 1, 5.0, 80.0, targets.clone()),
            logged(SetKind::Normal, 2, 6.0, 80.0, targets.clone()),
        ]);
        let short = log_with(vec![logged(SetKind::Normal, 1, 5.0, 80.0, targets)]);

        assert!(streak_met(&exercise, &rule(2), &[passing.clone(), passing.clone()]));
        assert!(!streak_met(&exercise, &rule(2), &[passing.clone()]));
        assert!(!streak_met(&exercise, &rule(2), &[passing, short]));
    }

    #[test]
    fn overload_skips_warm_up_and_describes_change() {
        let mut exercise = bench();
        let description = apply_overload(&mut exercise, &rule(2)).unwrap();

        assert_eq!(exercise.sets[0].weight, Some(Target::exact(80.0)));
        assert_eq!(exercise.sets[1].weight, Some(Target::exact(82.5)));
        assert_eq!(exercise.sets[2].weight, Some(Target::exact(82.5)));
        assert_eq!(description, "weight 80 -> 82.5 (+2.5 on 2 sets)");
    }
}
