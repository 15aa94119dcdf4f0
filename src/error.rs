use thiserror::Error;

use crate::models::{MetricField, SessionStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("exercise {instance_id} is not part of the plan")]
    UnknownExercise { instance_id: String },
    #[error("exercise {instance_id} has no set {set_index}")]
    UnknownSet { instance_id: String, set_index: usize },
    #[error("superset {superset_id} has no round {round}")]
    UnknownRound { superset_id: String, round: usize },
    #[error("{field:?} for set {set_index} of {instance_id} needs a performed value")]
    UnresolvedTarget {
        instance_id: String,
        set_index: usize,
        field: MetricField,
    },
    #[error("set {set_index} of {instance_id} has zero weight but is not a bodyweight set")]
    ZeroWeight { instance_id: String, set_index: usize },
    #[error("set {set_index} of {instance_id} has no duration to time")]
    MissingDuration { instance_id: String, set_index: usize },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cannot start a session from an empty plan")]
    EmptyPlan,
    #[error("no session is active")]
    NoSession,
    #[error("operation not allowed while {}", .0.as_str())]
    InvalidState(SessionStatus),
    #[error("cannot finish a session without any logged set")]
    NoLoggedSets,
    #[error("set validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("failed to save workout log: {0:#}")]
    Persistence(anyhow::Error),
    #[error("collaborator failed: {0:#}")]
    Source(anyhow::Error),
}
