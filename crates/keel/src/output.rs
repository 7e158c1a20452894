//! Terminal output utilities

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print the start of an update step on stderr
pub fn progress(msg: &str) {
    eprintln!("{} {}...", style("ℹ").blue().bold(), msg);
}

/// Print a finished update step on stderr
pub fn progress_done(msg: &str) {
    eprintln!("{} {}... done", style("✓").green().bold(), msg);
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Create a spinner for one step of a longer operation
///
/// Hidden when `quiet` is set.
pub fn step(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(format!("{}...", msg));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Finish a step spinner, leaving `<msg>... done` on screen
pub fn step_done(pb: &ProgressBar, msg: &str) {
    pb.set_style(
        ProgressStyle::with_template("{prefix} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(style("✓").green().bold().to_string());
    pb.finish_with_message(format!("{}... done", msg));
}

/// Finish a step spinner after a failure
pub fn step_failed(pb: &ProgressBar) {
    pb.abandon();
}
