//! Process-wide defaults read by new process objects.
//!
//! The values are shared mutable state. A [`ProcessObject`] whose debug flag
//! or thread count was never set reads the current default each time it
//! activates a native operation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::process_object::ProcessObject;

/// Environment variable overriding the initial default thread count.
pub const NUMBER_OF_THREADS_ENV: &str = "IMGKIT_GLOBAL_DEFAULT_NUMBER_OF_THREADS";

static GLOBAL_DEFAULT_DEBUG: AtomicBool = AtomicBool::new(false);
static GLOBAL_WARNING_DISPLAY: AtomicBool = AtomicBool::new(true);
// 0 until first read.
static GLOBAL_DEFAULT_NUMBER_OF_THREADS: AtomicUsize = AtomicUsize::new(0);

/// Debug flag of process objects that did not set their own.
pub fn global_default_debug() -> bool {
    GLOBAL_DEFAULT_DEBUG.load(Ordering::Relaxed)
}

/// Set the default debug flag.
pub fn set_global_default_debug(debug: bool) {
    GLOBAL_DEFAULT_DEBUG.store(debug, Ordering::Relaxed);
}

/// Whether filters log warnings.
pub fn global_warning_display() -> bool {
    GLOBAL_WARNING_DISPLAY.load(Ordering::Relaxed)
}

/// Enable or disable filter warnings.
pub fn set_global_warning_display(display: bool) {
    GLOBAL_WARNING_DISPLAY.store(display, Ordering::Relaxed);
}

fn threads_from_env() -> Option<usize> {
    let value = std::env::var(NUMBER_OF_THREADS_ENV).ok()?;
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            log::warn!("ignoring {NUMBER_OF_THREADS_ENV}={value:?}, expected a positive integer");
            None
        }
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Thread count of process objects that did not set their own.
///
/// The first read initialises it from [`NUMBER_OF_THREADS_ENV`], or from the
/// available parallelism when the variable is unset or invalid.
pub fn global_default_number_of_threads() -> usize {
    let current = GLOBAL_DEFAULT_NUMBER_OF_THREADS.load(Ordering::Acquire);
    if current != 0 {
        return current;
    }
    let initial = threads_from_env().unwrap_or_else(available_parallelism);
    match GLOBAL_DEFAULT_NUMBER_OF_THREADS.compare_exchange(
        0,
        initial,
        Ordering::AcqRel,
        Ordering::Acquire,
    ) {
        Ok(_) => initial,
        Err(current) => current,
    }
}

/// Set the default thread count, at least one.
pub fn set_global_default_number_of_threads(num_threads: usize) {
    GLOBAL_DEFAULT_NUMBER_OF_THREADS.store(num_threads.max(1), Ordering::Release);
}

/// Per-object settings applied on top of the global defaults.
///
/// # Examples
///
/// ```rust
/// use imgkit_process::{ProcessConfig, ProcessObject};
///
/// let process_object = ProcessObject::new("Filter");
/// ProcessConfig::new()
///     .with_num_threads(2)
///     .with_debug(true)
///     .apply(&process_object);
///
/// assert_eq!(process_object.number_of_threads(), 2);
/// assert!(process_object.debug());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessConfig {
    num_threads: Option<usize>,
    debug: Option<bool>,
}

impl ProcessConfig {
    /// A configuration that keeps the global defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of threads.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set the debug flag.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Write the configured values into `process_object`.
    pub fn apply(&self, process_object: &ProcessObject) {
        if let Some(num_threads) = self.num_threads {
            process_object.set_number_of_threads(num_threads);
        }
        if let Some(debug) = self.debug {
            process_object.set_debug(debug);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_count_is_positive() {
        assert!(global_default_number_of_threads() >= 1);
    }

    #[test]
    fn empty_config_keeps_object_settings() {
        let process_object = ProcessObject::new("po");
        process_object.set_number_of_threads(5);
        process_object.set_debug(true);
        ProcessConfig::new().apply(&process_object);
        assert_eq!(process_object.number_of_threads(), 5);
        assert!(process_object.debug());

        ProcessConfig::new()
            .with_num_threads(0)
            .apply(&process_object);
        assert_eq!(process_object.number_of_threads(), 1);
    }
}
