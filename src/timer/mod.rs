pub mod registry;
pub mod state;
pub mod ticker;

pub use registry::{ActiveTimer, TimerExpiry, TimerRegistry};
pub use state::{TimerKind, TimerState, TimerStatus};
pub use ticker::{Tick, Ticker};
