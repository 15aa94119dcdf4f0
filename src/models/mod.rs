mod key;
pub mod log;
pub mod plan;
pub mod session;
pub mod snapshot;

pub use key::SetKey;
pub use log::{
    logged_set_ref, LoggedExercise, LoggedSet, MetricValues, PerformanceSummary, SavedWorkoutLog,
    SetTargets, WorkoutLog,
};
pub use plan::{
    MetricField, OverloadRule, OverloadStrategy, Plan, PlanExercise, PlannedSet, SetKind,
    SupersetMode, Target, TargetScheme,
};
pub use session::{Session, SessionStatus, SessionSummary};
pub use snapshot::{
    PausedSessionSnapshot, SnapshotHeader, StoredSnapshot, SNAPSHOT_FORMAT_VERSION,
};
