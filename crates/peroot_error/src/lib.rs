//! Error types for the Peroot completion dispatch layer.
//!
//! This crate provides the foundation error types used throughout the Peroot workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Backend failures ([`BackendError`]) are recovered by the gateway, which moves on to the
//! next backend. Only [`GatewayErrorKind::AllBackendsExhausted`] and
//! [`GatewayErrorKind::Cancelled`] ever reach a caller of `dispatch`. Counter store failures
//! ([`RateLimitErrorKind::StoreUnavailable`]) never reach a caller of `check` at all.
//!
//! # Examples
//!
//! ```
//! use peroot_error::{ConfigError, PerootResult};
//!
//! fn load() -> PerootResult<String> {
//!     Err(ConfigError::new("fallback order is empty"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod builder;
mod config;
mod error;
mod gateway;
mod rate_limit;

pub use backend::{BackendError, BackendErrorKind, BackendUnavailable};
pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{PerootError, PerootErrorKind, PerootResult};
pub use gateway::{ExhaustionCause, GatewayError, GatewayErrorKind};
pub use rate_limit::{RateLimitError, RateLimitErrorKind, StoreResult};
