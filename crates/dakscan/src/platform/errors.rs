use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur when talking to a code hosting platform.
///
/// Each variant corresponds to one failure shape the compatibility checker
/// needs to tell apart. Raw transport errors never leave the client; they are
/// mapped into one of these variants first.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// API error from the platform that fits no other variant.
    #[error("API error: {message}")]
    Api { message: String },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded{}", describe_reset(.reset_at, .retry_after_secs))]
    RateLimited {
        /// When the rate limit window resets (from `x-ratelimit-reset`).
        reset_at: Option<DateTime<Utc>>,
        /// Explicit wait hint (from `retry-after`).
        retry_after_secs: Option<u64>,
    },

    /// Authentication required or failed.
    #[error("Authentication required")]
    AuthRequired,

    /// Requested resource (file, owner) does not exist.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// The repository itself is gone or blocked.
    #[error("Repository unavailable: {repository} (HTTP {status})")]
    RepositoryUnavailable { repository: String, status: u16 },

    /// No response was received at all.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The platform answered with a server-side status.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Unexpected/internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn describe_reset(reset_at: &Option<DateTime<Utc>>, retry_after_secs: &Option<u64>) -> String {
    match (retry_after_secs, reset_at) {
        (Some(secs), _) => format!(". Retry after {secs}s"),
        (None, Some(reset_at)) => format!(". Resets at {reset_at}"),
        (None, None) => String::new(),
    }
}

impl PlatformError {
    /// Create an API error.
    #[inline]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a not found error.
    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a server error.
    #[inline]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a rate limit error without any reset hint.
    #[inline]
    pub fn rate_limited() -> Self {
        Self::RateLimited {
            reset_at: None,
            retry_after_secs: None,
        }
    }

    /// Check if this error is a rate limit error.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Check if this error means the requested resource does not exist.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Seconds to wait before retrying, if the platform gave a hint.
    ///
    /// An explicit `retry-after` wins over the reset timestamp. A reset time
    /// already in the past yields zero.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        match self {
            Self::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Some(*secs),
            Self::RateLimited {
                reset_at: Some(reset_at),
                ..
            } => Some((*reset_at - now).num_seconds().max(0) as u64),
            _ => None,
        }
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which keeps progress output and
/// log lines on one line when an error carries a multi-line body.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
