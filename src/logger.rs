// This file implements the application's logging system.
// It provides macros for the human-facing log levels (INFO, WARN, ERROR, DEBUG)
// with colored terminal output, and wires up `tracing` so the deployment driver's
// state transitions can be followed as structured events in debug mode.

use std::sync::OnceLock; // Ensures the DEBUG_ENABLED flag is initialized exactly once.
use std::sync::atomic::{AtomicBool, Ordering}; // Thread-safe control of the debug flag.

/// Provides convenient logging macros.
/// `#[macro_export]` makes these macros globally available within the crate.
/// Every macro writes to stderr so that stdout stays reserved for `--list` output.

// `log_info!` for general application progress and informational messages.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => (eprintln!(
        "{} {}",
        colored::Colorize::bright_green("[INFO]"),
        format!($($arg)*)
    ));
}

// `log_warn!` for non-critical issues or noteworthy conditions.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => (eprintln!(
        "{} {}",
        colored::Colorize::bright_yellow("[WARN]"),
        format!($($arg)*)
    ));
}

// `log_error!` for failures the user has to act on.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => (eprintln!(
        "{} {}",
        colored::Colorize::bright_red("[ERROR]"),
        format!($($arg)*)
    ));
}

// `log_debug!` for detailed internal tracing.
// Messages are only printed if debug mode is enabled via `is_debug_enabled()`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::logger::is_debug_enabled() {
           eprintln!("{} {}", colored::Colorize::dimmed("[DEBUG]"), format!($($arg)*));
        }
    };
}

// Global flag to control debug logging, ensured to be initialized once.
static DEBUG_ENABLED: OnceLock<AtomicBool> = OnceLock::new();

/// Initializes the logger, setting the global debug mode.
/// This function should be called once at application startup.
///
/// In debug mode a `tracing-subscriber` fmt subscriber is installed as well, so the
/// `tracing` events emitted by the deployment driver (tool, direction, state) show up
/// next to the regular `[DEBUG]` lines.
///
/// # Arguments
/// * `debug`: If `true`, enables debug logging; otherwise only info, warn and error
///   messages are printed.
pub fn init(debug: bool) {
    DEBUG_ENABLED
        .get_or_init(|| AtomicBool::new(debug)) // Initialize if not already set.
        .store(debug, Ordering::Relaxed); // Update the flag with the provided debug value.

    if debug {
        // `try_init` fails only when a global subscriber already exists, which is harmless.
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
        log_debug!("Logger initialized in DEBUG mode");
    }
}

/// Checks if debug logging is currently enabled.
/// Used primarily by the `log_debug!` macro.
///
/// # Returns
/// * `true` if debug logging is enabled, `false` otherwise.
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED
        .get() // Attempt to retrieve the AtomicBool.
        .map(|f| f.load(Ordering::Relaxed)) // Load its value if present.
        .unwrap_or(false) // Default to false if `init` was never called.
}
