use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerKind {
    Rest,
    Set,
    Round,
}

/// Countdown derived from absolute timestamps. Remaining time is always
/// recomputed from `started_at`, never decremented, so it stays correct across
/// process suspension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub kind: TimerKind,
    pub status: TimerStatus,
    pub duration_seconds: u32,
    /// Start of the current running window.
    pub started_at: DateTime<Utc>,
    /// Time accumulated from earlier running windows; combines with
    /// `started_at` to compute the true elapsed time.
    pub elapsed_ms_baseline: u64,
    pub superset_id: Option<String>,
}

impl TimerState {
    pub fn rest(started_at: DateTime<Utc>, duration_seconds: u32) -> Self {
        Self::running(TimerKind::Rest, started_at, duration_seconds, None)
    }

    pub fn set(started_at: DateTime<Utc>, duration_seconds: u32) -> Self {
        Self::running(TimerKind::Set, started_at, duration_seconds, None)
    }

    pub fn round(superset_id: String, started_at: DateTime<Utc>, duration_seconds: u32) -> Self {
        Self::running(
            TimerKind::Round,
            started_at,
            duration_seconds,
            Some(superset_id),
        )
    }

    fn running(
        kind: TimerKind,
        started_at: DateTime<Utc>,
        duration_seconds: u32,
        superset_id: Option<String>,
    ) -> Self {
        Self {
            kind,
            status: TimerStatus::Running,
            duration_seconds,
            started_at,
            elapsed_ms_baseline: 0,
            superset_id,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        match self.status {
            TimerStatus::Running => {
                let window = (now - self.started_at).num_milliseconds().max(0) as u64;
                self.elapsed_ms_baseline.saturating_add(window)
            }
            TimerStatus::Paused => self.elapsed_ms_baseline,
        }
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u32 {
        (self.elapsed_ms(now) / 1000).min(u32::MAX as u64) as u32
    }

    /// `max(0, duration - floor(elapsed / 1000))`.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u32 {
        self.duration_seconds
            .saturating_sub(self.elapsed_seconds(now))
    }

    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        self.remaining_seconds(now) == 0
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.status == TimerStatus::Running {
            self.elapsed_ms_baseline = self.elapsed_ms(now);
            self.status = TimerStatus::Paused;
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.status == TimerStatus::Paused {
            self.started_at = now;
            self.status = TimerStatus::Running;
        }
    }

    /// Re-anchors a running timer on an absolute start, discarding any
    /// accumulated baseline.
    pub fn realign(&mut self, started_at: DateTime<Utc>) {
        self.started_at = started_at;
        self.elapsed_ms_baseline = 0;
    }

    /// Lengthens or shortens the countdown, never below what already elapsed.
    pub fn adjust(&mut self, delta_seconds: i64, now: DateTime<Utc>) {
        let adjusted = (self.duration_seconds as i64 + delta_seconds)
            .max(self.elapsed_seconds(now) as i64)
            .max(0);
        self.duration_seconds = adjusted.min(u32::MAX as i64) as u32;
    }
}
