//! Trait definitions for completion backends.

use async_trait::async_trait;
use peroot_core::{BackendDescriptor, Invocation, TextStream};
use peroot_error::BackendError;
use std::sync::Arc;

/// Uniform invocation capability over every backend in the catalog.
///
/// Success means the stream was established. Errors raised later in the stream belong to
/// whoever consumes it; the gateway never retries a stream that has started.
///
/// Implementations report caller-initiated abandonment as
/// [`BackendErrorKind::Cancelled`](peroot_error::BackendErrorKind::Cancelled) so the gateway
/// can stop instead of falling back.
#[async_trait]
pub trait BackendInvoker: Send + Sync {
    /// Start a completion on the described backend.
    async fn invoke(
        &self,
        backend: &BackendDescriptor,
        invocation: Invocation<'_>,
    ) -> Result<TextStream, BackendError>;
}

#[async_trait]
impl<T: BackendInvoker + ?Sized> BackendInvoker for Arc<T> {
    async fn invoke(
        &self,
        backend: &BackendDescriptor,
        invocation: Invocation<'_>,
    ) -> Result<TextStream, BackendError> {
        (**self).invoke(backend, invocation).await
    }
}
