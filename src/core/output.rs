//! Colored output for bin-acquire
//!
//! Uses owo-colors for terminal colors. The library only prints through these
//! helpers when the caller asked for verbose reporting.

use owo_colors::OwoColorize;

/// Print an action header (blue, bold)
/// Example: "==> Acquiring gifsicle"
pub fn action(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// Print a detail line (dimmed prefix)
/// Example: "     downloading https://..."
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Print a success message (green)
/// Example: "==> gifsicle is ready"
pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    println!("{} {}", "::".cyan(), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

/// Print a skip message (dimmed)
/// Example: "==> gifsicle already present, skipping download"
pub fn skip(message: &str) {
    println!("{} {}", "==>".dimmed(), message.dimmed());
}

/// Print one row of a listing, highlighting rows that apply here
pub fn list_item(name: &str, status: &str, highlighted: bool) {
    if highlighted {
        println!("  {} {}", name.green(), status.dimmed());
    } else {
        println!("  {} {}", name, status.dimmed());
    }
}
