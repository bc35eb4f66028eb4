//! Error types for rate limiting operations.

/// Error kinds for rate limiting operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// The shared counter store could not be reached or misbehaved.
    #[display("Counter store unavailable: {}", _0)]
    StoreUnavailable(String),
    /// Invalid tier specification.
    #[display("Invalid tier: {}", _0)]
    InvalidTier(String),
}

/// Rate limiting error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a store failure.
    #[track_caller]
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(RateLimitErrorKind::StoreUnavailable(message.into()))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}

/// Result type for counter store operations.
pub type StoreResult<T> = Result<T, RateLimitError>;
