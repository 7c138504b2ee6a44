//! GitHub response classification.
//!
//! Every non-success response is turned into a [`PlatformError`] here, once,
//! so nothing downstream looks at raw status codes or headers again.

use chrono::{DateTime, Utc};

use super::types::GitHubErrorBody;
use crate::http::{HttpError, HttpResponse};
use crate::platform::PlatformError;

/// Phrases GitHub (and proxies in front of it) use in throttling messages.
const RATE_LIMIT_PHRASES: &[&str] = &[
    "rate limit",
    "rate-limit",
    "too many requests",
    "secondary rate",
    "abuse detection",
];

/// Which endpoint produced the response, for 404 handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Repository listing for an owner.
    Listing,
    /// File contents inside a repository.
    Contents,
}

/// Extract the GitHub error message from a response body, if any.
fn error_message(response: &HttpResponse) -> String {
    serde_json::from_slice::<GitHubErrorBody>(&response.body)
        .map(|b| b.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| response.text().lines().next().unwrap_or_default().to_string())
}

/// Check whether a 403/429 response is a throttling response.
pub fn is_rate_limit_response(response: &HttpResponse) -> bool {
    if response.status == 429 {
        return true;
    }
    if response.status != 403 {
        return false;
    }
    if response.header("x-ratelimit-remaining") == Some("0")
        || response.header("retry-after").is_some()
    {
        return true;
    }
    let message = error_message(response).to_lowercase();
    RATE_LIMIT_PHRASES.iter().any(|p| message.contains(p))
}

fn rate_limited_from(response: &HttpResponse) -> PlatformError {
    let reset_at = response
        .header("x-ratelimit-reset")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|epoch| DateTime::<Utc>::from_timestamp(epoch, 0));
    let retry_after_secs = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok());

    PlatformError::RateLimited {
        reset_at,
        retry_after_secs,
    }
}

/// Classify a non-2xx response into a `PlatformError`.
///
/// `resource` names what was requested (`owner/repo/path` or the owner) and
/// ends up in `NotFound` / `RepositoryUnavailable` messages.
pub fn classify_response(
    response: &HttpResponse,
    endpoint: Endpoint,
    resource: &str,
) -> PlatformError {
    match response.status {
        403 | 429 if is_rate_limit_response(response) => rate_limited_from(response),
        401 | 403 => PlatformError::AuthRequired,
        404 => match endpoint {
            Endpoint::Listing => PlatformError::not_found(format!("owner {resource}")),
            Endpoint::Contents => PlatformError::not_found(resource),
        },
        410 | 451 => PlatformError::RepositoryUnavailable {
            repository: resource.to_string(),
            status: response.status,
        },
        status @ 500..=599 => PlatformError::server(status, error_message(response)),
        status => PlatformError::api(format!("HTTP {status}: {}", error_message(response))),
    }
}

/// Map a transport failure (no response received) to a `PlatformError`.
pub fn classify_transport(err: HttpError) -> PlatformError {
    match err {
        HttpError::Transport(message) => PlatformError::network(message),
        other => PlatformError::internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn forbidden_with_exhausted_quota_is_rate_limited() {
        let resp = response(
            403,
            &[
                ("x-ratelimit-remaining", "0"),
                ("x-ratelimit-reset", "1700000000"),
            ],
            r#"{"message":"API rate limit exceeded for user ID 1."}"#,
        );
        let err = classify_response(&resp, Endpoint::Contents, "o/r/f");
        match err {
            PlatformError::RateLimited {
                reset_at,
                retry_after_secs,
            } => {
                assert_eq!(reset_at.map(|t| t.timestamp()), Some(1_700_000_000));
                assert_eq!(retry_after_secs, None);
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn secondary_rate_limit_is_detected_from_message() {
        let resp = response(
            403,
            &[],
            r#"{"message":"You have exceeded a secondary rate limit."}"#,
        );
        assert!(is_rate_limit_response(&resp));
    }

    #[test]
    fn too_many_requests_carries_retry_after() {
        let resp = response(429, &[("Retry-After", "45")], "");
        let err = classify_response(&resp, Endpoint::Contents, "o/r/f");
        assert!(matches!(
            err,
            PlatformError::RateLimited {
                retry_after_secs: Some(45),
                ..
            }
        ));
    }

    #[test]
    fn plain_forbidden_is_auth_error() {
        let resp = response(403, &[], r#"{"message":"Resource not accessible"}"#);
        assert!(matches!(
            classify_response(&resp, Endpoint::Contents, "o/r/f"),
            PlatformError::AuthRequired
        ));
    }

    #[test]
    fn not_found_keeps_resource() {
        let resp = response(404, &[], r#"{"message":"Not Found"}"#);
        let err = classify_response(&resp, Endpoint::Contents, "o/r/sushi-config.yaml");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("sushi-config.yaml"));
    }

    #[test]
    fn blocked_repository_is_unavailable() {
        let resp = response(451, &[], r#"{"message":"Repository access blocked"}"#);
        assert!(matches!(
            classify_response(&resp, Endpoint::Contents, "o/r"),
            PlatformError::RepositoryUnavailable { status: 451, .. }
        ));
    }

    #[test]
    fn server_status_is_server_error() {
        let resp = response(502, &[], "Bad Gateway");
        match classify_response(&resp, Endpoint::Listing, "o") {
            PlatformError::Server { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn other_status_is_api_error() {
        let resp = response(422, &[], r#"{"message":"Validation Failed"}"#);
        let err = classify_response(&resp, Endpoint::Listing, "o");
        assert!(matches!(err, PlatformError::Api { .. }));
        assert!(err.to_string().contains("Validation Failed"));
    }

    #[test]
    fn transport_failure_is_network_error() {
        let err = classify_transport(HttpError::Transport("dns error".to_string()));
        assert!(matches!(err, PlatformError::Network { .. }));
    }
}
