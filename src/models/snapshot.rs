use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::completion::InputBuffer;
use crate::timer::TimerRegistry;

use super::{Plan, Session, SessionStatus, WorkoutLog};

/// Bumped whenever the snapshot layout changes. Snapshots written with another
/// version are never migrated silently.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PausedSessionSnapshot {
    pub format_version: u32,
    pub session_id: String,
    pub routine_id: Option<String>,
    pub plan: Plan,
    pub original_plan: Plan,
    pub log: WorkoutLog,
    #[serde(default)]
    pub inputs: InputBuffer,
    pub session_started_at: DateTime<Utc>,
    pub accumulated_paused_seconds: u64,
    pub paused_at: Option<DateTime<Utc>>,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub active_timers: TimerRegistry,
}

impl PausedSessionSnapshot {
    pub fn capture(session: &Session, saved_at: DateTime<Utc>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            session_id: session.id.clone(),
            routine_id: session.routine_id.clone(),
            plan: session.plan.clone(),
            original_plan: session.original_plan.clone(),
            log: session.log.clone(),
            inputs: session.inputs.clone(),
            session_started_at: session.started_at,
            accumulated_paused_seconds: session.accumulated_paused_seconds,
            paused_at: session.paused_at,
            saved_at,
            active_timers: session.timers.clone(),
        }
    }

    /// Rebuilds a paused session. A snapshot written while playing is treated
    /// as paused from the moment it was saved.
    pub fn into_session(self) -> Session {
        let paused_at = self.paused_at.unwrap_or(self.saved_at);
        Session {
            id: self.session_id,
            routine_id: self.routine_id,
            status: SessionStatus::Paused,
            plan: self.plan,
            original_plan: self.original_plan,
            log: self.log,
            inputs: self.inputs,
            timers: self.active_timers,
            started_at: self.session_started_at,
            accumulated_paused_seconds: self.accumulated_paused_seconds,
            paused_at: Some(paused_at),
        }
    }
}

/// The columns stored next to a snapshot body. They stay readable when the
/// body was written in a layout this build no longer understands.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotHeader {
    pub format_version: u32,
    pub routine_id: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Contents of the paused-session slot.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredSnapshot {
    Readable(PausedSessionSnapshot),
    Unreadable(SnapshotHeader),
}

impl StoredSnapshot {
    pub fn header(&self) -> SnapshotHeader {
        match self {
            StoredSnapshot::Readable(snapshot) => SnapshotHeader {
                format_version: snapshot.format_version,
                routine_id: snapshot.routine_id.clone(),
                saved_at: snapshot.saved_at,
            },
            StoredSnapshot::Unreadable(header) => header.clone(),
        }
    }
}
