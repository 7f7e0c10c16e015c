//! Upstream failure classification.
//!
//! Pure labelling of a failed upstream response. No retries happen here; the
//! transport decides whether to retry based on the label.

use crate::error::UpstreamError;

/// Longest body excerpt carried in a classified error.
pub const BODY_SNIPPET_CHARS: usize = 200;

/// Map a non-success upstream status (and its body) to a classified error.
///
/// `resource` names what was requested, for diagnostics only.
pub fn classify(status: u16, body: &str, resource: &str) -> UpstreamError {
    match status {
        404 => UpstreamError::NotFound {
            resource: resource.to_string(),
        },
        400 => UpstreamError::BadRequest {
            message: snippet(body),
        },
        401 => UpstreamError::Unauthorized {
            resource: resource.to_string(),
        },
        403 => UpstreamError::Forbidden {
            resource: resource.to_string(),
        },
        429 => UpstreamError::RateLimited { retry_after: None },
        _ => UpstreamError::Generic {
            status: Some(status),
            detail: snippet(body),
        },
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.chars().take(BODY_SNIPPET_CHARS).collect()
    }
}
