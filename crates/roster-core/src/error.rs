//! Error types for the roster core.
//!
//! Three boundaries, three enums:
//!
//! - [`UpstreamError`]: a classified upstream failure. Never reaches the caller of a
//!   read resolution; it only selects the fallback branch and the log level.
//! - [`StoreError`]: the local replica failed.
//! - [`RosterError`]: what callers of the resolution service can actually see.

use std::time::Duration;

/// Closed set of upstream failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Unauthorized,
    Forbidden,
    RateLimited,
    Generic,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::RateLimited => "rate_limited",
            Self::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Classified upstream failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// 404 from the upstream.
    #[error("upstream resource not found: {resource}")]
    NotFound { resource: String },

    /// 400 from the upstream.
    #[error("upstream rejected request: {message}")]
    BadRequest { message: String },

    /// 401 from the upstream.
    #[error("unauthorized to access upstream: {resource}")]
    Unauthorized { resource: String },

    /// 403 from the upstream.
    #[error("access to upstream forbidden: {resource}")]
    Forbidden { resource: String },

    /// 429 from the upstream.
    #[error("upstream rate limit reached: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Any other status, transport failure or undecodable payload.
    ///
    /// `status` is `None` when no HTTP status was received.
    #[error("upstream error (status {status:?}): {detail}")]
    Generic { status: Option<u16>, detail: String },
}

impl UpstreamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Generic { .. } => ErrorKind::Generic,
        }
    }

    /// Whether the transport should retry the request.
    ///
    /// Only failures without an HTTP status (connect, reset, timeout) qualify. Any answer
    /// the upstream actually gave, 5xx and 429 included, goes straight to the fallback so
    /// the caller's permit is not held across backoffs.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Generic { status: None, .. })
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::Generic {
            status: err.status().map(|s| s.as_u16()),
            detail: err.to_string(),
        }
    }
}

/// Result type for upstream calls.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Local replica errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("invalid stored timestamp: {0}")]
    Timestamp(String),

    /// The blocking task running the store call panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Result type for local replica operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Caller-visible errors.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// The external id form is not an integer.
    #[error("invalid employee id: {input:?}")]
    InvalidId { input: String },

    /// No record (or no salary) could be resolved for the id.
    #[error("could not calculate annual salary for employee with id {id}")]
    NotFound { id: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("configuration error: {message}")]
    Config { message: String },

    /// Only raised while building an upstream client, never by a read resolution.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl RosterError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => 1,
            Self::InvalidId { .. } => 2,
            Self::Config { .. } => 3,
            Self::Store(_) => 4,
            Self::Upstream(_) => 5,
        }
    }
}

/// Result type for roster operations.
pub type RosterResult<T> = Result<T, RosterError>;
