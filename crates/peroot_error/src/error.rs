//! Top-level error wrapper types.

use crate::{BackendError, BuilderError, ConfigError, GatewayError, RateLimitError};

/// All error conditions in the workspace.
///
/// # Examples
///
/// ```
/// use peroot_error::{PerootError, ConfigError};
///
/// let err: PerootError = ConfigError::new("bad order").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum PerootErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Single backend failure
    #[from(BackendError)]
    Backend(BackendError),
    /// Terminal dispatch failure
    #[from(GatewayError)]
    Gateway(GatewayError),
    /// Rate limiting error
    #[from(RateLimitError)]
    RateLimit(RateLimitError),
}

/// Peroot error with kind discrimination.
///
/// # Examples
///
/// ```
/// use peroot_error::{PerootResult, ConfigError};
///
/// fn might_fail() -> PerootResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Peroot Error: {}", _0)]
pub struct PerootError(Box<PerootErrorKind>);

impl PerootError {
    /// Create a new error from a kind.
    pub fn new(kind: PerootErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PerootErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to PerootErrorKind
impl<T> From<T> for PerootError
where
    T: Into<PerootErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Peroot operations.
pub type PerootResult<T> = std::result::Result<T, PerootError>;
