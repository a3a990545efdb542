//! Progress reporting for the walker binary
//!
//! Provides a live spinner using indicatif and styled header/summary output.

use crate::config::{Traversal, WalkConfig};
use crate::walker::{WalkProgress, WalkSummary};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner that displays walk counters
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &WalkProgress) {
        let msg = format!(
            "{} | Dirs: {}/{} | Files: {} | Rate: {:.0}/s | Queue: {} (peak {}) | {:.0}%",
            progress.status,
            format_number(progress.directories_processed),
            format_number(progress.directories_seen),
            format_number(progress.files_seen),
            progress.files_per_second(),
            progress.queued,
            progress.high_water,
            progress.fraction * 100.0,
        );

        self.bar.set_message(msg);
    }

    /// Print a line to stdout without tearing the spinner
    pub fn println(&self, line: &str) {
        self.bar.suspend(|| println!("{}", line));
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|&b| b as char)
                .collect::<String>()
        })
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the walk results (to stderr; stdout carries matches)
pub fn print_summary(summary: &WalkSummary) {
    let duration_secs = summary.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        summary.files as f64 / duration_secs
    } else {
        0.0
    };

    let title = if summary.completed {
        style("Walk Complete").green().bold()
    } else {
        style("Walk Stopped").yellow().bold()
    };

    eprintln!();
    eprintln!("{}", title);
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(summary.directories)
    );
    eprintln!(
        "  {} {}",
        style("Matches:").bold(),
        format_number(summary.files)
    );
    eprintln!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if summary.errors > 0 {
        eprintln!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(summary.errors)
        );
    }
    eprintln!();
}

/// Print a header at the start of the walk
pub fn print_header(config: &WalkConfig, traversal: Traversal) {
    let capacity = match config.max_queued {
        0 => "unbounded".to_string(),
        n => format_number(n as u64),
    };

    eprintln!();
    eprintln!(
        "{} {}",
        style("stream-walker").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  {} {}", style("Root:").bold(), config.root.display());
    eprintln!(
        "  {} files '{}', dirs '{}'",
        style("Masks:").bold(),
        config.file_mask,
        config.directory_mask
    );
    eprintln!("  {} {}", style("Order:").bold(), traversal);
    eprintln!("  {} {}", style("Queue:").bold(), capacity);
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(1234567890), "1,234,567,890");
    }
}
