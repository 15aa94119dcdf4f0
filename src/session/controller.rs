use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::{
    completion::{self, RoundOutcome, ToggleOutcome},
    error::{SessionError, ValidationError},
    models::{
        LoggedSet, MetricField, PausedSessionSnapshot, Plan, SavedWorkoutLog, Session,
        SessionStatus, SessionSummary, SetKey, StoredSnapshot, SNAPSHOT_FORMAT_VERSION,
    },
    prefill::{self, PrefillResult},
    providers::{Collaborators, Notice, ResumeChoice, ResumeConflict, ResumePrompt},
    settings::{EngineSettings, RestTimerMode},
    timer::{Tick, Ticker, TimerKind},
};

use super::display::{derive_display_plan, DisplayPlan};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Ready(Plan),
    /// The routine source has no such routine; a plan must be authored first.
    NeedsAuthoring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    NoSnapshot,
    /// The snapshot conflicted and the user made no choice. It is left as is.
    Deferred,
    Discarded,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinishOptions {
    pub effort_rating: Option<u8>,
    pub notes: Option<String>,
    /// Skip the confirmation prompt.
    pub confirmed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinishOutcome {
    Saved(SavedWorkoutLog),
    /// Confirmation was declined or dismissed; the session keeps going.
    Cancelled,
}

/// Side effects of reconciling timers on a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    RestFinished {
        key: SetKey,
        actual_rest_seconds: u32,
    },
    SetCompleted {
        key: SetKey,
        logged: LoggedSet,
    },
    SetFailed {
        key: SetKey,
        error: ValidationError,
    },
    RoundCompleted {
        superset_id: String,
        round: usize,
        logged: Vec<LoggedSet>,
        failures: Vec<ValidationError>,
    },
    RoundStarted {
        superset_id: String,
        round: usize,
    },
}

/// Owns the single live session. Every mutation builds the next `Session`
/// value, writes the paused-session snapshot and swaps the value in.
pub struct SessionController {
    collaborators: Collaborators,
    settings: EngineSettings,
    status: SessionStatus,
    session: Option<Session>,
    prefill: Option<PrefillResult>,
    ticker: Option<Ticker>,
}

impl SessionController {
    pub fn new(collaborators: Collaborators, settings: EngineSettings) -> Self {
        Self {
            collaborators,
            settings,
            status: SessionStatus::Loading,
            session: None,
            prefill: None,
            ticker: None,
        }
    }

    /// Background ticks are delivered to `sink`; the owner calls `tick` for
    /// each one it receives.
    pub fn attach_ticker(&mut self, sink: UnboundedSender<Tick>) {
        let interval = StdDuration::from_millis(self.settings.tick_interval_ms.max(1));
        self.ticker = Some(Ticker::new(interval, sink));
        self.sync_ticker();
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker
            .as_ref()
            .map(Ticker::is_running)
            .unwrap_or(false)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Adjustments made to the plan when the current session started.
    pub fn prefill_result(&self) -> Option<&PrefillResult> {
        self.prefill.as_ref()
    }

    fn now(&self) -> DateTime<Utc> {
        self.collaborators.clock.now()
    }

    pub fn load(&mut self, routine_id: &str) -> Result<LoadOutcome, SessionError> {
        match self.collaborators.routines.load_routine(routine_id) {
            Ok(Some(plan)) => Ok(LoadOutcome::Ready(plan)),
            Ok(None) => {
                log::info!("Routine {routine_id} not found; plan needs authoring");
                Ok(LoadOutcome::NeedsAuthoring)
            }
            Err(err) => {
                log::error!("Failed to load routine {routine_id}: {err:#}");
                self.status = SessionStatus::Error;
                Err(SessionError::Source(err))
            }
        }
    }

    pub fn start(&mut self, plan: Plan) -> Result<&Session, SessionError> {
        if self.status.is_active() {
            return Err(SessionError::InvalidState(self.status));
        }
        if plan.is_empty() {
            self.status = SessionStatus::Error;
            return Err(SessionError::EmptyPlan);
        }

        let result = prefill::prepare(&plan, &self.collaborators, &self.settings);
        let inputs = prefill::seed_inputs(&result.plan);
        let session = Session::new(
            Uuid::new_v4().to_string(),
            result.plan.clone(),
            plan,
            inputs,
            self.now(),
        );
        log::info!(
            "Session {} started with {} exercises",
            session.id,
            session.plan.exercises.len()
        );

        self.prefill = Some(result);
        self.commit(session);
        self.session.as_ref().ok_or(SessionError::NoSession)
    }

    fn current(&self) -> Result<&Session, SessionError> {
        self.session.as_ref().ok_or(SessionError::NoSession)
    }

    fn playing(&self) -> Result<&Session, SessionError> {
        let session = self.current()?;
        if session.status != SessionStatus::Playing {
            return Err(SessionError::InvalidState(session.status));
        }
        Ok(session)
    }

    fn active(&self) -> Result<&Session, SessionError> {
        let session = self.current()?;
        if !session.status.is_active() {
            return Err(SessionError::InvalidState(session.status));
        }
        Ok(session)
    }

    /// Returns `false` when there was nothing to pause.
    pub fn pause(&mut self) -> bool {
        let now = self.now();
        let Some(current) = self.session.as_ref() else {
            return false;
        };
        if current.status != SessionStatus::Playing {
            log_info!("pause ignored while {}", current.status.as_str());
            return false;
        }

        let mut next = current.clone();
        next.status = SessionStatus::Paused;
        next.paused_at = Some(now);
        next.timers.pause_all(now, self.settings.rest_timer_mode);
        self.commit(next);
        true
    }

    /// Returns `false` when there was nothing to resume.
    pub fn resume(&mut self) -> bool {
        let now = self.now();
        let Some(current) = self.session.as_ref() else {
            return false;
        };
        if current.status != SessionStatus::Paused {
            log_info!("resume ignored while {}", current.status.as_str());
            return false;
        }

        let mut next = current.clone();
        if let Some(paused_at) = next.paused_at.take() {
            let paused = (now - paused_at).num_seconds().max(0) as u64;
            next.accumulated_paused_seconds = next.accumulated_paused_seconds.saturating_add(paused);
        }
        next.status = SessionStatus::Playing;
        next.timers.resume_all(now);
        if self.settings.rest_timer_mode == RestTimerMode::WallClock {
            next.timers
                .realign_rest(|key| current.logged_set(key).map(|set| set.completed_at));
        }
        self.commit(next);
        true
    }

    pub fn finish(&mut self, options: FinishOptions) -> Result<FinishOutcome, SessionError> {
        let now = self.now();
        let current = self.active()?;
        if current.log.set_count() == 0 {
            return Err(SessionError::NoLoggedSets);
        }

        if !options.confirmed {
            let summary = current.summary(now);
            if self.collaborators.decisions.confirm_finish(&summary) != Some(true) {
                log_info!("finish not confirmed");
                return Ok(FinishOutcome::Cancelled);
            }
        }

        let mut log = current.log.clone();
        log.ended_at = Some(now);
        log.duration_seconds = current.elapsed_seconds(now);
        log.effort_rating = options.effort_rating.map(|rating| rating.clamp(1, 10));
        log.notes = options.notes.filter(|notes| !notes.trim().is_empty());

        let saved = self.collaborators.store.save_log(&log).map_err(|err| {
            log::error!("Failed to save workout log for session {}: {err:#}", current.id);
            SessionError::Persistence(err)
        })?;

        let mut next = current.clone();
        next.log = log;
        next.timers.clear();
        next.inputs.clear();
        next.paused_at = None;
        next.status = SessionStatus::Ended;
        self.clear_snapshot();
        log::info!("Session {} finished as log {}", next.id, saved.id);
        self.commit(next);

        Ok(FinishOutcome::Saved(saved))
    }

    /// Abandons the session without saving a log.
    pub fn discard(&mut self) -> Result<(), SessionError> {
        let current = self.current()?;
        if current.status == SessionStatus::Ended {
            return Ok(());
        }

        let mut next = current.clone();
        next.timers.clear();
        next.inputs.clear();
        next.status = SessionStatus::Ended;
        self.clear_snapshot();
        log::info!("Session {} discarded", next.id);
        self.commit(next);
        Ok(())
    }

    /// Brings back a session from the paused snapshot. Any conflict with the
    /// stored format or the requested routine goes to the decision maker.
    pub fn restore(
        &mut self,
        requested_routine_id: Option<&str>,
    ) -> Result<RestoreOutcome, SessionError> {
        if self.status.is_active() {
            return Err(SessionError::InvalidState(self.status));
        }

        let stored = match self.collaborators.store.load_paused_snapshot() {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(RestoreOutcome::NoSnapshot),
            Err(err) => {
                log::error!("Failed to load paused session: {err:#}");
                return Err(SessionError::Source(err));
            }
        };

        if let Some(conflict) = restore_conflict(&stored, requested_routine_id) {
            let prompt = match &stored {
                StoredSnapshot::Readable(snapshot) => ResumePrompt {
                    conflict,
                    saved_at: snapshot.saved_at,
                    logged_sets: snapshot.log.set_count(),
                    resumable: true,
                },
                StoredSnapshot::Unreadable(header) => ResumePrompt {
                    conflict,
                    saved_at: header.saved_at,
                    logged_sets: 0,
                    resumable: false,
                },
            };
            match self.collaborators.decisions.resume_or_discard(&prompt) {
                Some(ResumeChoice::Resume) if prompt.resumable => {}
                Some(ResumeChoice::Discard) => {
                    self.clear_snapshot();
                    return Ok(RestoreOutcome::Discarded);
                }
                _ => {
                    log_info!("restore deferred: {:?}", prompt.conflict);
                    return Ok(RestoreOutcome::Deferred);
                }
            }
        }

        let StoredSnapshot::Readable(snapshot) = stored else {
            return Ok(RestoreOutcome::Deferred);
        };
        let mut session = snapshot.into_session();
        if let Some(paused_at) = session.paused_at {
            session.timers.pause_all(paused_at, self.settings.rest_timer_mode);
        }
        log::info!(
            "Restored session {} with {} logged sets",
            session.id,
            session.log.set_count()
        );
        self.prefill = None;
        self.status = session.status;
        self.session = Some(session);
        self.sync_ticker();
        Ok(RestoreOutcome::Restored)
    }

    pub fn toggle_completion(&mut self, key: &SetKey) -> Result<ToggleOutcome, SessionError> {
        let now = self.now();
        let current = self.playing()?;
        match completion::toggle_completion(current, key, now) {
            Ok((next, outcome)) => {
                self.commit(next);
                Ok(outcome)
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    pub fn toggle_round(
        &mut self,
        superset_id: &str,
        round: usize,
    ) -> Result<RoundOutcome, SessionError> {
        let now = self.now();
        let current = self.playing()?;
        match completion::toggle_round(current, superset_id, round, now) {
            Ok((next, outcome)) => {
                if matches!(outcome, RoundOutcome::Removed { .. }) {
                    self.collaborators.notifier.notify(&Notice::RoundRemoved {
                        superset_id: superset_id.to_string(),
                        round,
                    });
                }
                self.commit(next);
                Ok(outcome)
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    pub fn is_round_completed(&self, superset_id: &str, round: usize) -> bool {
        self.session
            .as_ref()
            .map(|session| completion::is_round_completed(session, superset_id, round))
            .unwrap_or(false)
    }

    /// Records a value typed by the user. `None` clears the field.
    pub fn set_input(
        &mut self,
        key: &SetKey,
        field: MetricField,
        value: Option<f64>,
    ) -> Result<(), SessionError> {
        let current = self.active()?;
        if current.planned_set(key).is_none() {
            return Err(SessionError::Validation(ValidationError::UnknownSet {
                instance_id: key.instance_id.clone(),
                set_index: key.set_index,
            }));
        }
        if !MetricField::PERFORMANCE.contains(&field) {
            log_warn!("ignoring input for non-performance field {}", field.as_str());
            return Ok(());
        }

        let mut next = current.clone();
        next.inputs.set_manual(key, field, value);
        self.commit(next);
        Ok(())
    }

    pub fn start_set_timer(&mut self, key: &SetKey) -> Result<(), SessionError> {
        let now = self.now();
        let current = self.playing()?;
        match completion::start_set_timer(current, key, now) {
            Ok(next) => {
                self.commit(next);
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    pub fn pause_set_timer(&mut self, key: &SetKey) -> Result<bool, SessionError> {
        let now = self.now();
        let mut next = self.playing()?.clone();
        let Some(timer) = next.timers.get_kind_mut(key, TimerKind::Set) else {
            return Ok(false);
        };
        if !timer.is_running() {
            return Ok(false);
        }
        timer.pause(now);
        self.commit(next);
        Ok(true)
    }

    pub fn resume_set_timer(&mut self, key: &SetKey) -> Result<bool, SessionError> {
        let now = self.now();
        let mut next = self.playing()?.clone();
        let Some(timer) = next.timers.get_kind_mut(key, TimerKind::Set) else {
            return Ok(false);
        };
        if timer.is_running() {
            return Ok(false);
        }
        timer.resume(now);
        self.commit(next);
        Ok(true)
    }

    /// Stops a running set timer early and logs the time spent under it.
    pub fn stop_set_timer(&mut self, key: &SetKey) -> Result<Option<ToggleOutcome>, SessionError> {
        let now = self.now();
        let current = self.playing()?;
        let Some(timer) = current.timers.get_kind(key, TimerKind::Set).cloned() else {
            return Ok(None);
        };
        match completion::complete_timed_set(current, key, &timer, now) {
            Ok((next, outcome)) => {
                self.commit(next);
                Ok(Some(outcome))
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    pub fn cancel_set_timer(&mut self, key: &SetKey) -> Result<bool, SessionError> {
        let mut next = self.active()?.clone();
        if next.timers.cancel_kind(key, TimerKind::Set).is_none() {
            return Ok(false);
        }
        self.commit(next);
        Ok(true)
    }

    pub fn start_round_timer(&mut self, superset_id: &str, round: usize) -> Result<(), SessionError> {
        let now = self.now();
        let current = self.playing()?;
        match completion::start_round_timer(
            current,
            superset_id,
            round,
            self.settings.default_round_seconds,
            now,
        ) {
            Ok(next) => {
                self.commit(next);
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Ends the running rest early. Returns the rest actually taken.
    pub fn skip_rest(&mut self) -> Result<Option<u32>, SessionError> {
        let now = self.now();
        let current = self.active()?;
        let Some(rest) = current.timers.rest().cloned() else {
            return Ok(None);
        };

        let taken = rest.timer.elapsed_seconds(now).min(rest.timer.duration_seconds);
        let mut next = completion::record_actual_rest(current, &rest.key, taken);
        next.timers.cancel_kind(&rest.key, TimerKind::Rest);
        self.commit(next);
        Ok(Some(taken))
    }

    /// Adds (or with a negative delta removes) rest time. Returns the new
    /// remaining seconds.
    pub fn adjust_rest(&mut self, delta_seconds: i64) -> Result<Option<u32>, SessionError> {
        let now = self.now();
        let mut next = self.active()?.clone();
        let Some(key) = next.timers.rest().map(|active| active.key.clone()) else {
            return Ok(None);
        };
        let Some(timer) = next.timers.get_kind_mut(&key, TimerKind::Rest) else {
            return Ok(None);
        };
        timer.adjust(delta_seconds, now);
        let remaining = timer.remaining_seconds(now);
        self.commit(next);
        Ok(Some(remaining))
    }

    /// Reconciles every timer against the clock and applies what expired.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        let now = self.now();
        let Some(current) = self.session.as_ref().filter(|session| session.status.is_active())
        else {
            return Vec::new();
        };

        let mut next = current.clone();
        let expired = next.timers.reconcile(now);
        if expired.is_empty() {
            return Vec::new();
        }

        let mut events = Vec::new();
        for expiry in expired {
            match expiry.timer.kind {
                TimerKind::Rest => {
                    let actual = expiry.timer.duration_seconds;
                    next = completion::record_actual_rest(&next, &expiry.key, actual);
                    self.collaborators.notifier.notify(&Notice::RestFinished {
                        instance_id: expiry.key.instance_id.clone(),
                        set_index: expiry.key.set_index,
                    });
                    events.push(TimerEvent::RestFinished {
                        key: expiry.key,
                        actual_rest_seconds: actual,
                    });
                }
                TimerKind::Set => {
                    match completion::complete_timed_set(&next, &expiry.key, &expiry.timer, now) {
                        Ok((after, ToggleOutcome::Completed { logged, .. })) => {
                            next = after;
                            events.push(TimerEvent::SetCompleted {
                                key: expiry.key,
                                logged,
                            });
                        }
                        Ok((after, ToggleOutcome::Uncompleted { .. })) => next = after,
                        Err(error) => {
                            self.collaborators
                                .notifier
                                .notify(&Notice::ValidationFailed(error.clone()));
                            events.push(TimerEvent::SetFailed {
                                key: expiry.key,
                                error,
                            });
                        }
                    }
                }
                TimerKind::Round => {
                    let Some(superset_id) = expiry.timer.superset_id.clone() else {
                        continue;
                    };
                    let round = expiry.key.set_index;
                    let (after, logged, failures) =
                        completion::complete_round_lenient(&next, &superset_id, round, now);
                    next = after;
                    for failure in &failures {
                        self.collaborators
                            .notifier
                            .notify(&Notice::ValidationFailed(failure.clone()));
                    }
                    // A completing member may already have moved the countdown on.
                    let advanced = if next.timers.round_timer(&superset_id).is_some() {
                        None
                    } else {
                        completion::advance_round_timer(
                            &mut next,
                            &superset_id,
                            round,
                            expiry.timer.duration_seconds,
                            now,
                        )
                    };
                    events.push(TimerEvent::RoundCompleted {
                        superset_id: superset_id.clone(),
                        round,
                        logged,
                        failures,
                    });
                    if let Some(next_round) = advanced {
                        events.push(TimerEvent::RoundStarted {
                            superset_id,
                            round: next_round,
                        });
                    }
                }
            }
        }

        self.commit(next);
        events
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.session
            .as_ref()
            .map(|session| session.elapsed_seconds(self.now()))
            .unwrap_or(0)
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        self.session
            .as_ref()
            .map(|session| session.summary(self.now()))
    }

    pub fn display(&self) -> Option<DisplayPlan> {
        self.session
            .as_ref()
            .map(|session| derive_display_plan(session, self.now()))
    }

    /// The snapshot that would be written for the current session.
    pub fn snapshot(&self) -> Option<PausedSessionSnapshot> {
        self.session
            .as_ref()
            .filter(|session| session.status.is_active())
            .map(|session| PausedSessionSnapshot::capture(session, self.now()))
    }

    fn reject(&self, err: ValidationError) -> SessionError {
        log_info!("rejected: {err}");
        self.collaborators
            .notifier
            .notify(&Notice::ValidationFailed(err.clone()));
        SessionError::Validation(err)
    }

    /// Swaps in `next`. A snapshot write failure is logged and does not undo
    /// the change.
    fn commit(&mut self, next: Session) {
        if next.status.is_active() {
            let snapshot = PausedSessionSnapshot::capture(&next, self.now());
            if let Err(err) = self.collaborators.store.save_paused_snapshot(&snapshot) {
                log::error!("Failed to write paused session snapshot: {err:#}");
            }
        }
        self.status = next.status;
        self.session = Some(next);
        self.sync_ticker();
    }

    fn clear_snapshot(&self) {
        if let Err(err) = self.collaborators.store.clear_paused_snapshot() {
            log::error!("Failed to clear paused session snapshot: {err:#}");
        }
    }

    /// Ticks run only while some timer is counting.
    fn sync_ticker(&mut self) {
        let wanted = self
            .session
            .as_ref()
            .map(|session| session.status.is_active() && session.timers.has_running())
            .unwrap_or(false);
        let Some(ticker) = self.ticker.as_mut() else {
            return;
        };
        if wanted {
            ticker.start();
        } else if ticker.is_running() {
            ticker.stop();
        }
    }
}

fn restore_conflict(
    stored: &StoredSnapshot,
    requested_routine_id: Option<&str>,
) -> Option<ResumeConflict> {
    let header = stored.header();
    if header.format_version != SNAPSHOT_FORMAT_VERSION {
        return Some(ResumeConflict::VersionMismatch {
            found: header.format_version,
            expected: SNAPSHOT_FORMAT_VERSION,
        });
    }
    if matches!(stored, StoredSnapshot::Unreadable(_)) {
        return Some(ResumeConflict::Unreadable {
            format_version: header.format_version,
        });
    }
    match requested_routine_id {
        Some(requested) if header.routine_id.as_deref() != Some(requested) => {
            Some(ResumeConflict::RoutineMismatch {
                found: header.routine_id,
                requested: Some(requested.to_string()),
            })
        }
        _ => None,
    }
}
