//! Unified progress bar helpers
//!
//! Provides consistent progress bar styling for downloads and extraction.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Standard spinner characters
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard tick interval for spinners
const TICK_INTERVAL_MS: u64 = 80;

const SPINNER_TEMPLATE: &str = "     {spinner:.cyan} {msg}";
const BYTES_TEMPLATE: &str =
    "     {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})";

/// Create a spinner progress bar with standard styling.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
        pb.set_style(style.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// A bar that draws nothing, for callers that did not ask for progress.
pub fn hidden() -> ProgressBar {
    ProgressBar::hidden()
}

/// Upgrade a spinner to a byte progress bar when content length becomes known.
pub fn upgrade_to_bytes(pb: &ProgressBar, total_bytes: u64) {
    pb.set_length(total_bytes);
    if let Ok(style) = ProgressStyle::default_bar().template(BYTES_TEMPLATE) {
        pb.set_style(style.progress_chars("━╸━"));
    }
}

/// RAII guard that clears a progress bar when dropped.
///
/// Keeps bars from lingering on the terminal when a download fails midway.
pub struct ProgressGuard<'a>(&'a ProgressBar);

impl<'a> ProgressGuard<'a> {
    pub fn new(pb: &'a ProgressBar) -> Self {
        Self(pb)
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

/// Run a closure under a spinner when `enabled`, clearing it when done.
pub fn with_spinner<T, E>(
    enabled: bool,
    message: &str,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    if !enabled {
        return f();
    }
    let pb = create_spinner(message);
    let _guard = ProgressGuard::new(&pb);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spinner() {
        let pb = create_spinner("test message");
        assert!(!pb.is_finished());
        pb.finish_and_clear();
        assert!(pb.is_finished());
    }

    #[test]
    fn test_upgrade_to_bytes_sets_length() {
        let pb = hidden();
        upgrade_to_bytes(&pb, 1000);
        pb.set_position(500);
        assert_eq!(pb.length(), Some(1000));
        assert_eq!(pb.position(), 500);
    }

    #[test]
    fn test_progress_guard_clears_on_drop() {
        let pb = create_spinner("test");
        {
            let _guard = ProgressGuard::new(&pb);
            assert!(!pb.is_finished());
        }
        assert!(pb.is_finished());
    }

    #[test]
    fn test_with_spinner_passes_result_through() {
        let result: Result<i32, &str> = with_spinner(true, "test", || Ok(42));
        assert_eq!(result.unwrap(), 42);

        let result: Result<i32, &str> = with_spinner(false, "test", || Err("boom"));
        assert_eq!(result.unwrap_err(), "boom");
    }
}
