//! Errors surfaced by the fallback gateway.

use crate::{BackendError, BackendUnavailable};
use std::fmt;

/// Why the fallback order was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ExhaustionCause {
    /// Every backend was skipped; nothing was ever invoked.
    #[display("no backend was available")]
    NoBackendAvailable,
    /// At least one backend was invoked and every invocation failed.
    #[display("all available backends failed")]
    AllBackendsFailed,
}

/// Terminal dispatch failures.
#[derive(Debug, Clone)]
pub enum GatewayErrorKind {
    /// Every backend in the fallback order was tried or skipped without success.
    AllBackendsExhausted {
        /// Number of backends actually invoked
        attempted: usize,
        /// Backends skipped before invocation, in order
        unavailable: Vec<BackendUnavailable>,
        /// Error of the last invoked backend, if any was invoked
        last_error: Option<BackendError>,
    },
    /// The caller abandoned the request; no further backends were tried.
    Cancelled(BackendError),
}

impl GatewayErrorKind {
    /// Distinguishes "nothing configured" from "everything configured failed".
    ///
    /// Returns `None` for non-exhaustion errors.
    pub fn exhaustion_cause(&self) -> Option<ExhaustionCause> {
        match self {
            GatewayErrorKind::AllBackendsExhausted { last_error, .. } => Some(match last_error {
                Some(_) => ExhaustionCause::AllBackendsFailed,
                None => ExhaustionCause::NoBackendAvailable,
            }),
            GatewayErrorKind::Cancelled(_) => None,
        }
    }
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayErrorKind::AllBackendsExhausted {
                attempted,
                unavailable,
                last_error,
            } => {
                write!(
                    f,
                    "All backends exhausted ({} attempted, {} skipped)",
                    attempted,
                    unavailable.len()
                )?;
                match last_error {
                    Some(err) => write!(f, ": {}", err),
                    None => write!(f, ": no backend was available"),
                }
            }
            GatewayErrorKind::Cancelled(err) => write!(f, "Dispatch cancelled: {}", err),
        }
    }
}

/// Gateway error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Gateway Error: {} at line {} in {}", kind, line, file)]
pub struct GatewayError {
    kind: GatewayErrorKind,
    line: u32,
    file: &'static str,
}

impl GatewayError {
    /// Create a new gateway error with caller location tracking.
    #[track_caller]
    pub fn new(kind: GatewayErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GatewayErrorKind {
        &self.kind
    }

    /// The last underlying backend error, if one was recorded.
    pub fn last_error(&self) -> Option<&BackendError> {
        match &self.kind {
            GatewayErrorKind::AllBackendsExhausted { last_error, .. } => last_error.as_ref(),
            GatewayErrorKind::Cancelled(err) => Some(err),
        }
    }
}
