mod controller;
mod display;

pub use controller::{
    FinishOptions, FinishOutcome, LoadOutcome, RestoreOutcome, SessionController, TimerEvent,
};
pub use display::{derive_display_plan, DisplayExercise, DisplayPlan, DisplaySet, DisplayTimer};
