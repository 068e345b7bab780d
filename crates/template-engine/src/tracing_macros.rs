//! Logging shims for the evaluator.
//!
//! With the `tracing` feature (or under `cfg(test)`) these forward to the
//! `tracing` crate; otherwise the arguments are dropped unexpanded, so the
//! hot path of placeholder evaluation carries no logging cost.

#[cfg(any(test, feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "sandbox_template", $($arg)*);
    };
}

#[cfg(not(any(test, feature = "tracing")))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// Sandbox failures are logged at debug level.
#[cfg(any(test, feature = "tracing"))]
macro_rules! debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "sandbox_template", $($arg)*);
    };
}

#[cfg(not(any(test, feature = "tracing")))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}
