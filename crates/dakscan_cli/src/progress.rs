//! Progress reporting for scans.
//!
//! Two modes:
//! - Interactive mode (TTY): one indicatif bar, found repositories printed
//!   above it as they are discovered
//! - Logging mode (non-TTY): structured logging using tracing

mod interactive;
mod logging;

use std::sync::Arc;

use console::Term;
use dakscan::RepositorySummary;
use dakscan::scan::{FoundCallback, ProgressCallback, ScanProgress};

pub use interactive::InteractiveReporter;
pub use logging::LoggingReporter;

/// Progress reporter that handles both interactive and logging modes.
pub enum ScanReporter {
    /// Interactive progress bar for TTY.
    Interactive(InteractiveReporter),
    /// Structured logging for non-TTY (CI, pipes).
    Logging(LoggingReporter),
}

impl ScanReporter {
    /// Create a new reporter, auto-detecting TTY mode.
    ///
    /// `quiet_found` suppresses per-repository lines, for JSON output.
    pub fn new(owner: &str, quiet_found: bool) -> Self {
        if Term::stdout().is_term() {
            Self::Interactive(InteractiveReporter::new(owner, quiet_found))
        } else {
            Self::Logging(LoggingReporter::new())
        }
    }

    pub fn handle_progress(&self, event: ScanProgress) {
        match self {
            Self::Interactive(r) => r.handle_progress(event),
            Self::Logging(r) => r.handle_progress(event),
        }
    }

    pub fn handle_found(&self, repo: &RepositorySummary) {
        match self {
            Self::Interactive(r) => r.handle_found(repo),
            Self::Logging(r) => r.handle_found(repo),
        }
    }

    /// Progress callback for the scanner.
    pub fn progress_callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| reporter.handle_progress(event))
    }

    /// Found callback for the scanner.
    pub fn found_callback(self: &Arc<Self>) -> FoundCallback {
        let reporter = Arc::clone(self);
        Box::new(move |repo| reporter.handle_found(repo))
    }

    /// Finish the progress bar (interactive mode only).
    pub fn finish(&self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callbacks_route_to_logging_reporter() {
        let reporter = Arc::new(ScanReporter::Logging(LoggingReporter::new()));
        let on_progress = reporter.progress_callback();
        let on_found = reporter.found_callback();

        on_found(&RepositorySummary::new("who", "smart-base"));
        on_progress(ScanProgress::new(1, 1, Some("smart-base".to_string())));
        reporter.finish();
    }

    #[test]
    fn interactive_reporter_tracks_position() {
        let reporter = ScanReporter::Interactive(InteractiveReporter::hidden("who"));
        reporter.handle_progress(ScanProgress::new(1, 3, Some("a".to_string())));
        reporter.handle_progress(ScanProgress::new(2, 3, Some("b".to_string())));

        if let ScanReporter::Interactive(r) = &reporter {
            assert_eq!(r.position(), 2);
            assert_eq!(r.length(), Some(3));
        }
        reporter.finish();
    }
}
