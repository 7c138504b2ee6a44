use dakscan::RepositorySummary;
use dakscan::scan::ScanProgress;

/// Logging reporter using tracing for structured output.
#[derive(Default)]
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_progress(&self, event: ScanProgress) {
        if event.completed {
            tracing::info!(
                current = event.current,
                total = event.total,
                "All repositories checked"
            );
        } else {
            tracing::debug!(
                repo = ?event.current_repository_name,
                current = event.current,
                total = event.total,
                percentage = event.percentage,
                "Checked repository"
            );
        }
    }

    pub fn handle_found(&self, repo: &RepositorySummary) {
        tracing::info!(repo = %repo.full_name(), "Found DAK repository");
    }
}
