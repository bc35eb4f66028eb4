//! Backend invocation error types.

/// Why a single backend invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BackendErrorKind {
    /// The upstream did not answer in time
    #[display("Request timed out: {}", _0)]
    Timeout(String),

    /// Credential rejected by the upstream
    #[display("Authorization failed: {}", _0)]
    Unauthorized(String),

    /// Upstream quota exhausted (HTTP 429 or equivalent)
    #[display("Upstream rate limit exceeded: {}", _0)]
    UpstreamRateLimited(String),

    /// Upstream answered with a non-success status
    #[display("HTTP {} error: {}", status_code, message)]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },

    /// Upstream answered with something we could not parse
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),

    /// Connection-level failure
    #[display("Transport error: {}", _0)]
    Transport(String),

    /// Stream broke after it was established
    #[display("Stream interrupted: {}", _0)]
    StreamInterrupted(String),

    /// The caller abandoned the request
    #[display("Cancelled by caller")]
    Cancelled,
}

impl BackendErrorKind {
    /// Short label used for metrics and structured logs.
    ///
    /// Returns one of: "timeout", "auth", "rate_limit", "api", "malformed", "network",
    /// "stream", "cancelled"
    pub fn label(&self) -> &'static str {
        match self {
            BackendErrorKind::Timeout(_) => "timeout",
            BackendErrorKind::Unauthorized(_) => "auth",
            BackendErrorKind::UpstreamRateLimited(_) => "rate_limit",
            BackendErrorKind::Api { .. } => "api",
            BackendErrorKind::MalformedResponse(_) => "malformed",
            BackendErrorKind::Transport(_) => "network",
            BackendErrorKind::StreamInterrupted(_) => "stream",
            BackendErrorKind::Cancelled => "cancelled",
        }
    }
}

/// A runtime failure of one specific backend.
///
/// The gateway recovers from these locally by moving on to the next backend, except for
/// [`BackendErrorKind::Cancelled`], which stops dispatch.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Backend '{}' failed: {} at line {} in {}", backend, kind, line, file)]
pub struct BackendError {
    backend: String,
    kind: BackendErrorKind,
    line: u32,
    file: &'static str,
}

impl BackendError {
    /// Create a new backend error for the given backend id.
    ///
    /// # Examples
    ///
    /// ```
    /// use peroot_error::{BackendError, BackendErrorKind};
    ///
    /// let err = BackendError::new("llama-3-70b", BackendErrorKind::Timeout("30s".into()));
    /// assert_eq!(err.backend(), "llama-3-70b");
    /// assert_eq!(err.kind().label(), "timeout");
    /// ```
    #[track_caller]
    pub fn new(backend: impl Into<String>, kind: BackendErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            backend: backend.into(),
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Id of the backend that failed.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BackendErrorKind {
        &self.kind
    }

    /// Whether the caller gave up, as opposed to the backend failing.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind, BackendErrorKind::Cancelled)
    }
}

/// A backend skipped before invocation because it cannot be used under the current
/// configuration (for example, no credential for its provider family).
///
/// Skips never count as failed attempts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Error)]
#[display("Backend '{}' unavailable: {}", backend, reason)]
pub struct BackendUnavailable {
    /// Id of the skipped backend
    pub backend: String,
    /// Why it was skipped
    pub reason: String,
}

impl BackendUnavailable {
    /// Record a skipped backend.
    pub fn new(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}
