use std::time::Duration;

use console::style;
use dakscan::RepositorySummary;
use dakscan::scan::ScanProgress;
use indicatif::{ProgressBar, ProgressStyle};

/// Interactive progress reporter using indicatif.
///
/// Starts as a spinner while the owner's repositories are listed and turns
/// into a bar once the first check settles and the total is known.
pub struct InteractiveReporter {
    bar: ProgressBar,
    quiet_found: bool,
}

impl InteractiveReporter {
    pub fn new(owner: &str, quiet_found: bool) -> Self {
        Self::with_bar(ProgressBar::new_spinner(), owner, quiet_found)
    }

    /// A reporter that draws nothing.
    #[cfg(test)]
    pub fn hidden(owner: &str) -> Self {
        let bar = ProgressBar::with_draw_target(None, indicatif::ProgressDrawTarget::hidden());
        Self::with_bar(bar, owner, true)
    }

    fn with_bar(bar: ProgressBar, owner: &str, quiet_found: bool) -> Self {
        bar.set_style(Self::spinner_style());
        bar.set_prefix(owner.to_string());
        bar.set_message("Listing repositories...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar, quiet_found }
    }

    pub fn handle_progress(&self, event: ScanProgress) {
        if self.bar.length() != Some(event.total as u64) {
            self.bar.set_style(Self::bar_style());
            self.bar.set_length(event.total as u64);
        }
        self.bar.set_position(event.current as u64);
        match event.current_repository_name {
            Some(name) => self.bar.set_message(name),
            None => self.bar.set_message(""),
        }
        if event.completed {
            self.bar.set_message("done");
        }
    }

    pub fn handle_found(&self, repo: &RepositorySummary) {
        if !self.quiet_found {
            self.bar.println(format!(
                "{} {}",
                style("✓").green().bold(),
                repo.full_name()
            ));
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    #[cfg(test)]
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}
