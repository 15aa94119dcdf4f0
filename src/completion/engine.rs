//! Set and round completion.
//!
//! Every operation takes the current `Session` by reference and returns the
//! next one; on error the caller keeps the value it already had, so a failed
//! toggle never leaves partial state behind.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{
    LoggedExercise, LoggedSet, MetricField, MetricValues, Plan, PlanExercise, Session, SetKey,
    SetTargets, WorkoutLog,
};
use crate::timer::{TimerKind, TimerState};

use super::validation::resolve_values;

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Completed {
        logged: LoggedSet,
        /// Rest seconds started by this completion.
        rest_started: Option<u32>,
    },
    Uncompleted {
        removed: LoggedSet,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    Completed {
        logged: Vec<LoggedSet>,
        rest_started: Option<u32>,
    },
    Removed {
        removed: Vec<LoggedSet>,
    },
}

pub fn toggle_completion(
    session: &Session,
    key: &SetKey,
    now: DateTime<Utc>,
) -> Result<(Session, ToggleOutcome), ValidationError> {
    lookup(session, key)?;
    if session.is_completed(key) {
        let (next, removed) = remove_logged(session, key)?;
        return Ok((next, ToggleOutcome::Uncompleted { removed }));
    }
    complete_set(session, key, &MetricValues::default(), now)
}

/// Logs a set. `overrides` take precedence over the input buffer; timers use
/// them to supply the measured duration.
pub fn complete_set(
    session: &Session,
    key: &SetKey,
    overrides: &MetricValues,
    now: DateTime<Utc>,
) -> Result<(Session, ToggleOutcome), ValidationError> {
    let (exercise, reference) = lookup(session, key)?;
    if let Some(existing) = session.log.logged_set(&key.instance_id, &reference) {
        return Ok((
            session.clone(),
            ToggleOutcome::Completed {
                logged: existing.clone(),
                rest_started: None,
            },
        ));
    }

    let planned = &exercise.sets[key.set_index];
    let values = resolve_values(key, planned, session.inputs.get(key), overrides)?;
    let rest_seconds = planned.rest_seconds();

    let logged = LoggedSet {
        id: Uuid::new_v4().to_string(),
        planned_set_id: reference,
        set_index: key.set_index,
        kind: planned.kind,
        values,
        targets: SetTargets::from(planned),
        rest_seconds: (rest_seconds > 0).then_some(rest_seconds),
        actual_rest_seconds: None,
        tempo: planned
            .is_active(MetricField::Tempo)
            .then(|| planned.tempo.clone())
            .flatten(),
        completed_at: now,
    };

    let mut next = session.clone();
    insert_logged(&mut next.log, &session.plan, exercise, logged.clone());
    next.timers.cancel_kind(key, TimerKind::Set);

    let rest_started = schedule_after_completion(&mut next, exercise, key, rest_seconds, now);
    Ok((next, ToggleOutcome::Completed { logged, rest_started }))
}

/// Rest follows a standard set directly, and a superset only once its round
/// is complete. Timed rounds never rest; their round timer moves on instead.
fn schedule_after_completion(
    session: &mut Session,
    exercise: &PlanExercise,
    key: &SetKey,
    rest_seconds: u32,
    now: DateTime<Utc>,
) -> Option<u32> {
    if let Some(superset_id) = &exercise.superset_id {
        if !is_round_completed(session, superset_id, key.set_index) {
            return None;
        }
        if exercise.is_timed_round() {
            let round_key = round_key(session, superset_id, key.set_index)?;
            if let Some(timer) = session.timers.cancel_kind(&round_key, TimerKind::Round) {
                advance_round_timer(session, superset_id, key.set_index, timer.duration_seconds, now);
            }
            return None;
        }
    }

    if rest_seconds == 0 {
        return None;
    }
    session
        .timers
        .start(key.clone(), TimerState::rest(now, rest_seconds));
    Some(rest_seconds)
}

fn remove_logged(
    session: &Session,
    key: &SetKey,
) -> Result<(Session, LoggedSet), ValidationError> {
    let (exercise, reference) = lookup(session, key)?;
    // A superset rest belongs to the whole round, whichever member closed it.
    let rest_owners: Vec<SetKey> = match &exercise.superset_id {
        Some(superset_id) => session
            .plan
            .superset_members(superset_id)
            .iter()
            .map(|member| SetKey::new(member.instance_id.clone(), key.set_index))
            .collect(),
        None => vec![key.clone()],
    };
    let mut next = session.clone();

    let exercise_pos = next
        .log
        .exercises
        .iter()
        .position(|exercise| exercise.instance_id == key.instance_id)
        .ok_or_else(|| unknown_set(key))?;
    let set_pos = next.log.exercises[exercise_pos]
        .sets
        .iter()
        .position(|set| set.planned_set_id == reference)
        .ok_or_else(|| unknown_set(key))?;

    let removed = next.log.exercises[exercise_pos].sets.remove(set_pos);
    if next.log.exercises[exercise_pos].sets.is_empty() {
        next.log.exercises.remove(exercise_pos);
    }

    next.inputs.restore(key, &removed.values);
    for owner in &rest_owners {
        next.timers.cancel_kind(owner, TimerKind::Rest);
    }
    next.timers.cancel_kind(key, TimerKind::Set);
    Ok((next, removed))
}

/// Keeps the log in plan order: exercises by their position in the plan, sets
/// by index. Completion order lives in the timestamps.
fn insert_logged(log: &mut WorkoutLog, plan: &Plan, exercise: &PlanExercise, logged: LoggedSet) {
    if let Some(existing) = log
        .exercises
        .iter_mut()
        .find(|logged_exercise| logged_exercise.instance_id == exercise.instance_id)
    {
        let at = existing
            .sets
            .iter()
            .position(|set| set.set_index > logged.set_index)
            .unwrap_or(existing.sets.len());
        existing.sets.insert(at, logged);
        return;
    }

    let plan_position = |instance_id: &str| {
        plan.exercises
            .iter()
            .position(|planned| planned.instance_id == instance_id)
            .unwrap_or(usize::MAX)
    };
    let own = plan_position(&exercise.instance_id);
    let at = log
        .exercises
        .iter()
        .position(|logged_exercise| plan_position(&logged_exercise.instance_id) > own)
        .unwrap_or(log.exercises.len());
    log.exercises.insert(
        at,
        LoggedExercise {
            instance_id: exercise.instance_id.clone(),
            exercise_id: exercise.exercise_id.clone(),
            name: exercise.name.clone(),
            superset_id: exercise.superset_id.clone(),
            sets: vec![logged],
        },
    );
}

fn lookup<'a>(
    session: &'a Session,
    key: &SetKey,
) -> Result<(&'a PlanExercise, String), ValidationError> {
    let exercise = session
        .plan
        .exercise(&key.instance_id)
        .ok_or_else(|| ValidationError::UnknownExercise {
            instance_id: key.instance_id.clone(),
        })?;
    if key.set_index >= exercise.sets.len() {
        return Err(unknown_set(key));
    }
    let reference = session.logged_ref(key).ok_or_else(|| unknown_set(key))?;
    Ok((exercise, reference))
}

fn unknown_set(key: &SetKey) -> ValidationError {
    ValidationError::UnknownSet {
        instance_id: key.instance_id.clone(),
        set_index: key.set_index,
    }
}

pub fn is_round_completed(session: &Session, superset_id: &str, round: usize) -> bool {
    let members = session.plan.superset_members(superset_id);
    !members.is_empty()
        && members
            .iter()
            .all(|member| session.is_completed(&SetKey::new(member.instance_id.clone(), round)))
}

fn round_members(
    session: &Session,
    superset_id: &str,
    round: usize,
) -> Result<Vec<SetKey>, ValidationError> {
    let members = session.plan.superset_members(superset_id);
    if members.is_empty() || round >= session.plan.round_count(superset_id) {
        return Err(ValidationError::UnknownRound {
            superset_id: superset_id.to_string(),
            round,
        });
    }
    Ok(members
        .iter()
        .map(|member| SetKey::new(member.instance_id.clone(), round))
        .collect())
}

/// Completes or removes a whole superset round. Completing validates every
/// member before anything is logged; a single failure aborts the round.
pub fn toggle_round(
    session: &Session,
    superset_id: &str,
    round: usize,
    now: DateTime<Utc>,
) -> Result<(Session, RoundOutcome), ValidationError> {
    let keys = round_members(session, superset_id, round)?;

    if is_round_completed(session, superset_id, round) {
        let mut next = session.clone();
        let mut removed = Vec::with_capacity(keys.len());
        for key in &keys {
            let (after, set) = remove_logged(&next, key)?;
            next = after;
            removed.push(set);
        }
        return Ok((next, RoundOutcome::Removed { removed }));
    }

    let mut next = session.clone();
    let mut logged = Vec::new();
    let mut rest_started = None;
    for key in &keys {
        if next.is_completed(key) {
            continue;
        }
        let (after, outcome) = complete_set(&next, key, &MetricValues::default(), now)?;
        next = after;
        if let ToggleOutcome::Completed {
            logged: set,
            rest_started: rest,
        } = outcome
        {
            logged.push(set);
            rest_started = rest.or(rest_started);
        }
    }
    Ok((next, RoundOutcome::Completed { logged, rest_started }))
}

/// Completes every member that can be completed and reports the ones that
/// failed validation. Used when a timed round runs out.
pub fn complete_round_lenient(
    session: &Session,
    superset_id: &str,
    round: usize,
    now: DateTime<Utc>,
) -> (Session, Vec<LoggedSet>, Vec<ValidationError>) {
    let keys = match round_members(session, superset_id, round) {
        Ok(keys) => keys,
        Err(err) => return (session.clone(), Vec::new(), vec![err]),
    };

    let mut next = session.clone();
    let mut logged = Vec::new();
    let mut failures = Vec::new();
    for key in &keys {
        if next.is_completed(key) {
            continue;
        }
        match complete_set(&next, key, &MetricValues::default(), now) {
            Ok((after, ToggleOutcome::Completed { logged: set, .. })) => {
                next = after;
                logged.push(set);
            }
            Ok((after, ToggleOutcome::Uncompleted { .. })) => next = after,
            Err(err) => failures.push(err),
        }
    }
    (next, logged, failures)
}

/// Round timers are registered under the first member of the group.
pub fn round_key(session: &Session, superset_id: &str, round: usize) -> Option<SetKey> {
    session
        .plan
        .superset_members(superset_id)
        .first()
        .map(|member| SetKey::new(member.instance_id.clone(), round))
}

pub fn start_round_timer(
    session: &Session,
    superset_id: &str,
    round: usize,
    default_round_seconds: u32,
    now: DateTime<Utc>,
) -> Result<Session, ValidationError> {
    round_members(session, superset_id, round)?;
    let duration = session
        .plan
        .superset_members(superset_id)
        .first()
        .and_then(|member| member.round_duration_seconds)
        .unwrap_or(default_round_seconds);

    let mut next = session.clone();
    if let Some(existing) = next.timers.round_timer(superset_id).map(|active| active.key.clone()) {
        next.timers.cancel(&existing);
    }
    if let Some(key) = round_key(&next, superset_id, round) {
        next.timers.start(
            key,
            TimerState::round(superset_id.to_string(), now, duration),
        );
    }
    Ok(next)
}

/// Starts the next round's countdown when there is a next round.
pub fn advance_round_timer(
    session: &mut Session,
    superset_id: &str,
    finished_round: usize,
    duration_seconds: u32,
    now: DateTime<Utc>,
) -> Option<usize> {
    let next_round = finished_round + 1;
    if next_round >= session.plan.round_count(superset_id) {
        return None;
    }
    let key = round_key(session, superset_id, next_round)?;
    session.timers.start(
        key,
        TimerState::round(superset_id.to_string(), now, duration_seconds),
    );
    Some(next_round)
}

/// Starts a countdown for a timed set, using the entered duration or the
/// planned one.
pub fn start_set_timer(
    session: &Session,
    key: &SetKey,
    now: DateTime<Utc>,
) -> Result<Session, ValidationError> {
    let (exercise, _) = lookup(session, key)?;
    if session.is_completed(key) {
        return Ok(session.clone());
    }
    let planned = &exercise.sets[key.set_index];
    let duration = session
        .inputs
        .get(key)
        .and_then(|entry| entry.values.duration)
        .map(|seconds| seconds.max(0.0).round() as u32)
        .or_else(|| planned.duration_seconds())
        .filter(|seconds| *seconds > 0)
        .ok_or_else(|| ValidationError::MissingDuration {
            instance_id: key.instance_id.clone(),
            set_index: key.set_index,
        })?;

    let mut next = session.clone();
    next.timers.start(key.clone(), TimerState::set(now, duration));
    Ok(next)
}

/// Completes a timed set from its timer. The logged duration is the time spent
/// under the timer unless the user typed a duration, which wins.
pub fn complete_timed_set(
    session: &Session,
    key: &SetKey,
    timer: &TimerState,
    now: DateTime<Utc>,
) -> Result<(Session, ToggleOutcome), ValidationError> {
    let mut overrides = MetricValues::default();
    if !session.inputs.is_manual(key, MetricField::Duration) {
        let under_timer = timer
            .duration_seconds
            .saturating_sub(timer.remaining_seconds(now));
        overrides.duration = Some(under_timer as f64);
    }
    complete_set(session, key, &overrides, now)
}

/// Records how long the rest after a set actually lasted. This is the only
/// correction ever applied to an existing logged set.
pub fn record_actual_rest(session: &Session, key: &SetKey, seconds: u32) -> Session {
    let mut next = session.clone();
    let Some(reference) = next.logged_ref(key) else {
        return next;
    };
    if let Some(set) = next
        .log
        .exercises
        .iter_mut()
        .filter(|exercise| exercise.instance_id == key.instance_id)
        .flat_map(|exercise| exercise.sets.iter_mut())
        .find(|set| set.planned_set_id == reference)
    {
        set.actual_rest_seconds = Some(seconds);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Plan, PlannedSet, SupersetMode, Target, TargetScheme};
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap()
    }

    fn strength_set(id: &str, reps: f64, weight: f64, rest: f64) -> PlannedSet {
        PlannedSet {
            id: id.into(),
            reps: Some(Target::exact(reps)),
            weight: Some(Target::exact(weight)),
            rest: Some(Target::exact(rest)),
            field_order: vec![MetricField::Reps, MetricField::Weight, MetricField::Rest],
            ..PlannedSet::default()
        }
    }

    fn exercise(instance_id: &str, sets: Vec<PlannedSet>) -> PlanExercise {
        PlanExercise {
            instance_id: instance_id.into(),
            exercise_id: format!("cat-{instance_id}"),
            sets,
            ..PlanExercise::default()
        }
    }

    fn superset_member(instance_id: &str, order: u32, mode: SupersetMode) -> PlanExercise {
        PlanExercise {
            superset_id: Some("ss1".into()),
            superset_order: Some(order),
            superset_mode: Some(mode),
            round_duration_seconds: Some(60),
            ..exercise(
                instance_id,
                (0..3)
                    .map(|i| strength_set(&format!("{instance_id}-{i}"), 10.0, 20.0, 90.0))
                    .collect(),
            )
        }
    }

    fn session_for(plan: Plan) -> Session {
        let inputs = crate::prefill::seed_inputs(&plan);
        Session::new("session".into(), plan.clone(), plan, inputs, t0())
    }

    #[test]
    fn completing_then_uncompleting_restores_log_and_inputs() {
        let plan = Plan {
            exercises: vec![exercise(
                "squat",
                (0..3)
                    .map(|i| strength_set(&format!("sq-{i}"), 8.0, 50.0, 60.0))
                    .collect(),
            )],
            ..Plan::default()
        };
        let session = session_for(plan);
        let key = SetKey::new("squat", 0);

        let (done, outcome) = toggle_completion(&session, &key, t0()).unwrap();
        assert_matches!(
            outcome,
            ToggleOutcome::Completed {
                rest_started: Some(60),
                ..
            }
        );
        assert!(done.is_completed(&key));
        assert!(done.timers.rest().is_some());

        let (undone, outcome) = toggle_completion(&done, &key, t0()).unwrap();
        assert_matches!(outcome, ToggleOutcome::Uncompleted { .. });
        assert_eq!(undone.log, session.log);
        assert_eq!(undone.inputs, session.inputs);
        assert!(undone.timers.is_empty());
    }

    #[test]
    fn uncompleting_returns_logged_values_to_inputs() {
        let plan = Plan {
            exercises: vec![exercise("row", vec![strength_set("r0", 8.0, 40.0, 0.0)])],
            ..Plan::default()
        };
        let session = session_for(plan);
        let key = SetKey::new("row", 0);
        let mut edited = session.clone();
        edited.inputs.set_manual(&key, MetricField::Reps, Some(11.0));

        let (done, _) = toggle_completion(&edited, &key, t0()).unwrap();
        assert_eq!(done.logged_set(&key).unwrap().values.reps, Some(11.0));
        assert!(done.timers.is_empty());

        let mut cleared = done.clone();
        cleared.inputs.set_manual(&key, MetricField::Reps, None);
        let (undone, _) = toggle_completion(&cleared, &key, t0()).unwrap();
        assert_eq!(undone.inputs.values(&key).reps, Some(11.0));
    }

    #[test]
    fn failed_validation_leaves_session_untouched() {
        let mut set = strength_set("p0", 0.0, 0.0, 60.0);
        set.reps = Some(Target::scheme(TargetScheme::Amrap));
        let plan = Plan {
            exercises: vec![exercise("pullup", vec![set])],
            ..Plan::default()
        };
        let session = session_for(plan);
        let key = SetKey::new("pullup", 0);

        let err = toggle_completion(&session, &key, t0()).unwrap_err();
        assert_matches!(err, ValidationError::UnresolvedTarget { .. });
        assert!(!session.is_completed(&key));
    }

    #[test]
    fn superset_round_completes_only_with_every_member() {
        let plan = Plan {
            exercises: vec![
                superset_member("a", 0, SupersetMode::Standard),
                superset_member("b", 1, SupersetMode::Standard),
            ],
            ..Plan::default()
        };
        let session = session_for(plan);

        let (after_a, outcome) =
            toggle_completion(&session, &SetKey::new("a", 0), t0()).unwrap();
        assert_matches!(outcome, ToggleOutcome::Completed { rest_started: None, .. });
        assert!(!is_round_completed(&after_a, "ss1", 0));

        let (after_b, outcome) =
            toggle_completion(&after_a, &SetKey::new("b", 0), t0()).unwrap();
        assert_matches!(outcome, ToggleOutcome::Completed { rest_started: Some(90), .. });
        assert!(is_round_completed(&after_b, "ss1", 0));
        assert_eq!(
            after_b.logged_set(&SetKey::new("a", 0)).unwrap().planned_set_id,
            "a-0-round-0"
        );

        let (partial, _) = toggle_completion(&after_b, &SetKey::new("a", 0), t0()).unwrap();
        assert!(!is_round_completed(&partial, "ss1", 0));
    }

    fn log_shape(session: &Session) -> Vec<(String, Vec<String>)> {
        session
            .log
            .exercises
            .iter()
            .map(|exercise| {
                (
                    exercise.instance_id.clone(),
                    exercise
                        .sets
                        .iter()
                        .map(|set| set.planned_set_id.clone())
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn retoggling_an_earlier_set_keeps_log_order() {
        let plan = Plan {
            exercises: vec![
                exercise(
                    "a",
                    vec![
                        strength_set("a0", 5.0, 60.0, 0.0),
                        strength_set("a1", 5.0, 60.0, 0.0),
                    ],
                ),
                exercise("b", vec![strength_set("b0", 8.0, 30.0, 0.0)]),
            ],
            ..Plan::default()
        };
        let mut session = session_for(plan);
        for key in [SetKey::new("a", 0), SetKey::new("a", 1), SetKey::new("b", 0)] {
            session = toggle_completion(&session, &key, t0()).unwrap().0;
        }
        let before = log_shape(&session);

        let later = t0() + Duration::seconds(30);
        let (undone, _) = toggle_completion(&session, &SetKey::new("a", 0), later).unwrap();
        let (redone, _) = toggle_completion(&undone, &SetKey::new("a", 0), later).unwrap();
        assert_eq!(log_shape(&redone), before);

        let mut only_b = session.clone();
        for key in [SetKey::new("a", 0), SetKey::new("a", 1)] {
            only_b = toggle_completion(&only_b, &key, later).unwrap().0;
        }
        assert_eq!(only_b.log.exercises.len(), 1);
        let (back, _) = toggle_completion(&only_b, &SetKey::new("a", 1), later).unwrap();
        assert_eq!(
            log_shape(&back),
            vec![
                ("a".to_string(), vec!["a1".to_string()]),
                ("b".to_string(), vec!["b0".to_string()]),
            ]
        );
    }

    #[test]
    fn uncompleting_any_member_cancels_the_round_rest() {
        let plan = Plan {
            exercises: vec![
                superset_member("a", 0, SupersetMode::Standard),
                superset_member("b", 1, SupersetMode::Standard),
            ],
            ..Plan::default()
        };
        let mut session = session_for(plan);
        for key in [SetKey::new("a", 0), SetKey::new("b", 0)] {
            session = toggle_completion(&session, &key, t0()).unwrap().0;
        }
        assert_eq!(
            session.timers.rest().map(|active| active.key.clone()),
            Some(SetKey::new("b", 0))
        );

        let (partial, _) = toggle_completion(&session, &SetKey::new("a", 0), t0()).unwrap();
        assert!(!is_round_completed(&partial, "ss1", 0));
        assert!(partial.timers.rest().is_none());
    }

    #[test]
    fn round_toggle_is_all_or_nothing() {
        let mut b = superset_member("b", 1, SupersetMode::Standard);
        b.sets[1].reps = Some(Target::scheme(TargetScheme::ToFailure));
        let plan = Plan {
            exercises: vec![superset_member("a", 0, SupersetMode::Standard), b],
            ..Plan::default()
        };
        let session = session_for(plan);

        let (done, outcome) = toggle_round(&session, "ss1", 0, t0()).unwrap();
        assert_matches!(outcome, RoundOutcome::Completed { ref logged, .. } if logged.len() == 2);
        assert!(is_round_completed(&done, "ss1", 0));

        assert!(toggle_round(&session, "ss1", 1, t0()).is_err());

        let (cleared, outcome) = toggle_round(&done, "ss1", 0, t0()).unwrap();
        assert_matches!(outcome, RoundOutcome::Removed { ref removed } if removed.len() == 2);
        assert_eq!(cleared.log, session.log);

        assert_matches!(
            toggle_round(&session, "ss1", 7, t0()),
            Err(ValidationError::UnknownRound { .. })
        );
    }

    #[test]
    fn timed_round_completion_moves_round_timer_on() {
        let plan = Plan {
            exercises: vec![
                superset_member("a", 0, SupersetMode::TimedRound),
                superset_member("b", 1, SupersetMode::TimedRound),
            ],
            ..Plan::default()
        };
        let session = session_for(plan);
        let running = start_round_timer(&session, "ss1", 0, 60, t0()).unwrap();
        assert_eq!(
            running.timers.round_timer("ss1").map(|active| active.key.clone()),
            Some(SetKey::new("a", 0))
        );

        let later = t0() + Duration::seconds(40);
        let (done, outcome) = toggle_round(&running, "ss1", 0, later).unwrap();
        assert_matches!(outcome, RoundOutcome::Completed { rest_started: None, .. });
        let active = done.timers.round_timer("ss1").unwrap();
        assert_eq!(active.key, SetKey::new("a", 1));
        assert_eq!(active.timer.remaining_seconds(later), 60);
        assert!(done.timers.rest().is_none());
    }

    #[test]
    fn timed_set_logs_time_under_timer_unless_typed() {
        let set = PlannedSet {
            id: "plank-0".into(),
            duration: Some(Target::exact(60.0)),
            field_order: vec![MetricField::Duration],
            ..PlannedSet::default()
        };
        let plan = Plan {
            exercises: vec![exercise("plank", vec![set])],
            ..Plan::default()
        };
        let session = session_for(plan);
        let key = SetKey::new("plank", 0);

        let running = start_set_timer(&session, &key, t0()).unwrap();
        let timer = running.timers.get_kind(&key, TimerKind::Set).unwrap().clone();
        let stopped_at = t0() + Duration::seconds(45);
        let (done, _) = complete_timed_set(&running, &key, &timer, stopped_at).unwrap();
        assert_eq!(done.logged_set(&key).unwrap().values.duration, Some(45.0));
        assert!(done.timers.get_kind(&key, TimerKind::Set).is_none());

        let mut typed = running.clone();
        typed.inputs.set_manual(&key, MetricField::Duration, Some(50.0));
        let (done, _) = complete_timed_set(&typed, &key, &timer, stopped_at).unwrap();
        assert_eq!(done.logged_set(&key).unwrap().values.duration, Some(50.0));
    }

    #[test]
    fn set_timer_needs_a_duration() {
        let plan = Plan {
            exercises: vec![exercise("bench", vec![strength_set("b0", 5.0, 80.0, 0.0)])],
            ..Plan::default()
        };
        let session = session_for(plan);
        assert_matches!(
            start_set_timer(&session, &SetKey::new("bench", 0), t0()),
            Err(ValidationError::MissingDuration { .. })
        );
    }

    #[test]
    fn actual_rest_is_recorded_on_the_logged_set() {
        let plan = Plan {
            exercises: vec![exercise("dl", vec![strength_set("d0", 5.0, 100.0, 120.0)])],
            ..Plan::default()
        };
        let key = SetKey::new("dl", 0);
        let (done, _) = toggle_completion(&session_for(plan), &key, t0()).unwrap();
        let corrected = record_actual_rest(&done, &key, 95);
        assert_eq!(corrected.logged_set(&key).unwrap().actual_rest_seconds, Some(95));
        assert_eq!(
            corrected.logged_set(&key).unwrap().completed_at,
            done.logged_set(&key).unwrap().completed_at
        );
    }

    #[test]
    fn unknown_exercise_is_rejected() {
        let session = session_for(Plan::default());
        assert_matches!(
            toggle_completion(&session, &SetKey::new("ghost", 0), t0()),
            Err(ValidationError::UnknownExercise { .. })
        );
    }
}
