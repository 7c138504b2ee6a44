//! Callbacks the scanner pushes results through while it runs.

use super::types::ScanProgress;
use crate::platform::RepositorySummary;

/// Called once per compatible repository, as soon as its check settles.
pub type FoundCallback = Box<dyn Fn(&RepositorySummary) + Send + Sync>;

/// Called once per settled check, plus once for an empty scan.
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: ScanProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

/// Report a compatible repository if a callback is provided.
#[inline]
pub fn emit_found(on_found: Option<&FoundCallback>, repository: &RepositorySummary) {
    if let Some(cb) = on_found {
        cb(repository);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn emit_invokes_callback_when_present() {
        let events: Arc<Mutex<Vec<ScanProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let events_capture = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            events_capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        });

        emit(Some(&callback), ScanProgress::new(1, 2, None));
        emit(None, ScanProgress::new(2, 2, None));

        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].current, 1);
    }

    #[test]
    fn emit_found_passes_repository() {
        let names: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let names_capture = Arc::clone(&names);
        let callback: FoundCallback = Box::new(move |repo| {
            names_capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(repo.full_name());
        });

        emit_found(Some(&callback), &RepositorySummary::new("who", "smart-base"));
        emit_found(None, &RepositorySummary::new("who", "smart-anc"));

        assert_eq!(
            *names.lock().unwrap_or_else(|e| e.into_inner()),
            vec!["who/smart-base".to_string()]
        );
    }
}
