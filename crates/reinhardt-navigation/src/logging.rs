//! Development-time diagnostics.
//!
//! Misconfiguration warnings (unknown named routes, unfillable redirects,
//! duplicate names) are only useful while an application is being built, so
//! these macros forward to `tracing` when `debug_assertions` are enabled and
//! compile to nothing otherwise.
//!
//! | Macro | Debug Assertions | Release |
//! |-------|------------------|---------|
//! | `debug_log!` | `tracing::debug!` | no-op |
//! | `warn_log!` | `tracing::warn!` | no-op |

/// Logs a debug message (requires `debug_assertions`)
#[cfg(debug_assertions)]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		::tracing::debug!($($arg)*);
	}};
}

/// No-op debug_log in release builds
#[cfg(not(debug_assertions))]
macro_rules! debug_log {
	($($arg:tt)*) => {{}};
}

/// Logs a warning message (requires `debug_assertions`)
#[cfg(debug_assertions)]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		::tracing::warn!($($arg)*);
	}};
}

/// No-op warn_log in release builds
#[cfg(not(debug_assertions))]
macro_rules! warn_log {
	($($arg:tt)*) => {{}};
}

pub(crate) use debug_log;
pub(crate) use warn_log;
