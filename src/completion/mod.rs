pub mod engine;
mod input;
mod validation;

pub use engine::{
    advance_round_timer, complete_round_lenient, complete_set, complete_timed_set,
    is_round_completed, record_actual_rest, round_key, start_round_timer, start_set_timer,
    toggle_completion, toggle_round, RoundOutcome, ToggleOutcome,
};
pub use input::{InputBuffer, InputEntry};
pub use validation::{planned_value, resolve_values};
