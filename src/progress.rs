//! Progress display for shade runs
//!
//! A spinner while dependencies resolve, then a bar counting merged
//! dependency jars. Everything draws to stderr so stdout stays clean for
//! reports, and the display is cleared when the reporter is dropped so an
//! early error return leaves no half-drawn bar behind.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for the shade workflow
pub struct Progress {
    /// Whether progress display is enabled (disabled in quiet mode)
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Show a spinner while dependencies are resolved and downloaded
    pub fn resolving(&mut self) {
        self.replace(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                    .template("{spinner:.cyan} {msg}")
                    .expect("Invalid template"),
            );
            spinner.set_message("Resolving dependencies...");
            spinner.enable_steady_tick(Duration::from_millis(80));
            spinner
        });
    }

    /// Switch to a bar over `jars` dependency jars
    pub fn merging(&mut self, jars: usize) {
        self.replace(|| {
            let bar = ProgressBar::new(jars as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.cyan} Merging {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                    .expect("Invalid template")
                    .progress_chars("█▓▒░"),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
    }

    /// Advance to the next jar and show its label
    pub fn jar(&self, label: &str) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
            bar.set_message(label.to_string());
        }
    }

    /// Clear whatever is on screen
    pub fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn replace(&mut self, make: impl FnOnce() -> ProgressBar) {
        self.clear();
        if self.enabled {
            self.bar = Some(make());
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.clear();
    }
}
