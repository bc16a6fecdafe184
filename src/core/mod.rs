//! Shared infrastructure: terminal output, progress bars, version handling.

pub mod output;
pub mod progress;
pub mod version;
