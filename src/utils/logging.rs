//! Logging macros gated by a per-module `ENABLE_LOGS` const, for chatty
//! engine paths (timer reconciliation, controller transitions) that stay
//! quiet unless a module opts in.
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("rest finished for {key:?}");
//! ```
//!
//! Failures that must always surface use `log::error!`/`log::warn!` directly.

/// `log::info!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// `log::warn!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}
