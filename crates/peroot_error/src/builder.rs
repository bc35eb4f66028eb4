//! Request builder errors.

/// Why a request could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A required field was never set
    #[display("Missing required field: {}", _0)]
    MissingField(String),

    /// A numeric field outside its accepted range
    #[display("{} = {} is outside {}", field, value, allowed)]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Rejected value, as written
        value: String,
        /// Accepted range, as written
        allowed: String,
    },

    /// Any other rejection raised while assembling the request
    #[display("Request rejected: {}", _0)]
    Rejected(String),
}

/// Builder error with location tracking.
///
/// ```
/// use peroot_error::{BuilderError, BuilderErrorKind};
///
/// let err = BuilderError::new(BuilderErrorKind::MissingField("prompt".into()));
/// assert!(err.to_string().contains("Missing required field: prompt"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    kind: BuilderErrorKind,
    line: u32,
    file: &'static str,
}

impl BuilderError {
    /// Create a new builder error with caller location tracking.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BuilderErrorKind {
        &self.kind
    }
}
