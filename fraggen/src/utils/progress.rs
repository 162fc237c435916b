use indicatif::{ProgressBar, ProgressStyle};

use crate::utils::{LogLevel, log_level};

/// Spinner for fill passes. Totals are unknowable up front (the volume
/// decides when a pass ends), so the live file count is the signal.
pub fn fill_progress(message: &str) -> ProgressBar {
    if log_level() == LogLevel::Quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}: {pos} files")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb
}
