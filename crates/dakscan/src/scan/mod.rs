//! Progressive owner scans.
//!
//! # Module Structure
//!
//! - `engine` - `Scanner`, listing plus bounded-concurrency checks
//! - `errors` - `ErrorAggregator` and `ScanningErrorSummary`
//! - `progress` - Found and progress callbacks
//! - `types` - `ScanProgress`, `ScanOutcome`, `ScanOptions`, `ScanState`

mod engine;
mod errors;
mod progress;
mod types;

pub use engine::{ScanError, Scanner};
pub use errors::{ErrorAggregator, ScanningErrorSummary};
pub use progress::{FoundCallback, ProgressCallback, emit, emit_found};
pub use types::{
    DEFAULT_SCAN_CONCURRENCY, ScanCacheEntry, ScanOptions, ScanOutcome, ScanProgress, ScanState,
};
