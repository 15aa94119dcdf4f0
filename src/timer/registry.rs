use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SetKey;
use crate::settings::RestTimerMode;

use super::{TimerKind, TimerState};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimer {
    pub key: SetKey,
    pub timer: TimerState,
}

/// A timer that reached zero during reconciliation. It has already been
/// removed from the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerExpiry {
    pub key: SetKey,
    pub timer: TimerState,
}

/// Active timers keyed by `(exercise instance, set index)`. At most one rest
/// timer exists at a time; starting another replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimerRegistry {
    timers: Vec<ActiveTimer>,
}

impl TimerRegistry {
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveTimer> {
        self.timers.iter()
    }

    pub fn get(&self, key: &SetKey) -> Option<&TimerState> {
        self.timers
            .iter()
            .find(|active| &active.key == key)
            .map(|active| &active.timer)
    }

    pub fn get_kind(&self, key: &SetKey, kind: TimerKind) -> Option<&TimerState> {
        self.timers
            .iter()
            .find(|active| &active.key == key && active.timer.kind == kind)
            .map(|active| &active.timer)
    }

    pub fn get_kind_mut(&mut self, key: &SetKey, kind: TimerKind) -> Option<&mut TimerState> {
        self.timers
            .iter_mut()
            .find(|active| &active.key == key && active.timer.kind == kind)
            .map(|active| &mut active.timer)
    }

    pub fn rest(&self) -> Option<&ActiveTimer> {
        self.timers
            .iter()
            .find(|active| active.timer.kind == TimerKind::Rest)
    }

    pub fn round_timer(&self, superset_id: &str) -> Option<&ActiveTimer> {
        self.timers.iter().find(|active| {
            active.timer.kind == TimerKind::Round
                && active.timer.superset_id.as_deref() == Some(superset_id)
        })
    }

    pub fn has_running(&self) -> bool {
        self.timers.iter().any(|active| active.timer.is_running())
    }

    /// Registers `timer` under `key`, replacing a timer of the same kind there.
    /// Returns the rest timer displaced by a new rest timer, if any.
    pub fn start(&mut self, key: SetKey, timer: TimerState) -> Option<ActiveTimer> {
        let mut displaced = None;
        if timer.kind == TimerKind::Rest {
            if let Some(pos) = self
                .timers
                .iter()
                .position(|active| active.timer.kind == TimerKind::Rest)
            {
                displaced = Some(self.timers.remove(pos));
            }
        }
        self.timers
            .retain(|active| !(active.key == key && active.timer.kind == timer.kind));
        self.timers.push(ActiveTimer { key, timer });
        displaced
    }

    /// Cancels every timer registered under `key`.
    pub fn cancel(&mut self, key: &SetKey) -> Vec<TimerState> {
        let (cancelled, kept): (Vec<ActiveTimer>, Vec<ActiveTimer>) = self
            .timers
            .drain(..)
            .partition(|active| &active.key == key);
        self.timers = kept;
        cancelled.into_iter().map(|active| active.timer).collect()
    }

    pub fn cancel_kind(&mut self, key: &SetKey, kind: TimerKind) -> Option<TimerState> {
        let pos = self
            .timers
            .iter()
            .position(|active| &active.key == key && active.timer.kind == kind)?;
        Some(self.timers.remove(pos).timer)
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Removes and returns every running timer that reached zero.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> Vec<TimerExpiry> {
        let (expired, active): (Vec<ActiveTimer>, Vec<ActiveTimer>) = self
            .timers
            .drain(..)
            .partition(|active| active.timer.is_running() && active.timer.is_finished(now));
        self.timers = active;
        expired
            .into_iter()
            .map(|active| TimerExpiry {
                key: active.key,
                timer: active.timer,
            })
            .collect()
    }

    /// Freezes timers that do not accrue in the background. Set and round
    /// timers always stop; rest timers keep running in wall-clock mode.
    pub fn pause_all(&mut self, now: DateTime<Utc>, rest_mode: RestTimerMode) {
        for active in &mut self.timers {
            if active.timer.kind == TimerKind::Rest && rest_mode == RestTimerMode::WallClock {
                continue;
            }
            active.timer.pause(now);
        }
    }

    pub fn resume_all(&mut self, now: DateTime<Utc>) {
        for active in &mut self.timers {
            active.timer.resume(now);
        }
    }

    /// Re-anchors running rest timers on the completion time of the set that
    /// started them, so the suspension gap counts as rest.
    pub fn realign_rest<F>(&mut self, completed_at: F)
    where
        F: Fn(&SetKey) -> Option<DateTime<Utc>>,
    {
        for active in &mut self.timers {
            if active.timer.kind != TimerKind::Rest || !active.timer.is_running() {
                continue;
            }
            if let Some(started_at) = completed_at(&active.key) {
                active.timer.realign(started_at);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()
    }

    #[test]
    fn second_rest_timer_displaces_first() {
        let mut registry = TimerRegistry::default();
        registry.start(SetKey::new("a", 0), TimerState::rest(t0(), 60));
        let displaced = registry.start(SetKey::new("a", 1), TimerState::rest(t0(), 60));

        assert_eq!(displaced.map(|active| active.key), Some(SetKey::new("a", 0)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.rest().map(|active| active.key.set_index), Some(1));
    }

    #[test]
    fn reconcile_only_drains_finished_running_timers() {
        let mut registry = TimerRegistry::default();
        registry.start(SetKey::new("a", 0), TimerState::rest(t0(), 30));
        registry.start(SetKey::new("b", 0), TimerState::set(t0(), 120));
        let mut paused = TimerState::set(t0(), 10);
        paused.pause(t0());
        registry.start(SetKey::new("c", 0), paused);

        let expired = registry.reconcile(t0() + Duration::seconds(45));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].key, SetKey::new("a", 0));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn wall_clock_rest_keeps_running_through_pause() {
        let mut registry = TimerRegistry::default();
        registry.start(SetKey::new("a", 0), TimerState::rest(t0(), 90));
        registry.start(SetKey::new("b", 0), TimerState::set(t0(), 90));
        registry.pause_all(t0() + Duration::seconds(10), RestTimerMode::WallClock);

        let later = t0() + Duration::seconds(40);
        assert_eq!(registry.get(&SetKey::new("a", 0)).unwrap().remaining_seconds(later), 50);
        assert_eq!(registry.get(&SetKey::new("b", 0)).unwrap().remaining_seconds(later), 80);
    }

    #[test]
    fn realign_rest_uses_completion_time() {
        let mut registry = TimerRegistry::default();
        let key = SetKey::new("a", 0);
        registry.start(key.clone(), TimerState::rest(t0() + Duration::seconds(5), 60));
        registry.realign_rest(|_| Some(t0()));

        assert_eq!(
            registry.get(&key).unwrap().remaining_seconds(t0() + Duration::seconds(20)),
            40
        );
    }
}
