//! Logging macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! The gesture and voice loops run at frame/recognizer rate, so their chatter
//! is switched per module rather than through `RUST_LOG` alone:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = false;
//! use crate::{log_debug, log_info, log_warn};
//!
//! log_debug!("frame {} classified", n);
//! ```

/// `log::debug!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

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
///
/// Device failures are surfaced through `ModalityStatus` as well, so a
/// silenced module still reports them to the user.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}
