//! The ordered fallback orchestrator.

use crate::{BackendCatalog, FallbackOrder, GatewayConfig, GatewayMetrics, OpenAiCompatInvoker};
use futures::{FutureExt, StreamExt};
use peroot_core::{
    BackendId, Completion, Credentials, GenerationOutcome, GenerationRequest, OnFinish,
    TextStream,
};
use peroot_error::{
    BackendError, BackendUnavailable, GatewayError, GatewayErrorKind, PerootResult,
};
use peroot_interface::BackendInvoker;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Dispatches generation requests across backends in strict priority order.
///
/// Attempts are sequential. There is no parallel fan-out and no retry of the same backend;
/// the next backend in the order is the retry.
#[derive(Clone)]
pub struct Gateway {
    catalog: Arc<BackendCatalog>,
    order: FallbackOrder,
    credentials: Credentials,
    invoker: Arc<dyn BackendInvoker>,
    metrics: GatewayMetrics,
}

impl Gateway {
    /// Create a gateway.
    ///
    /// Order entries that are missing from the catalog are reported as warnings here and
    /// skipped at dispatch time.
    pub fn new(
        catalog: BackendCatalog,
        order: FallbackOrder,
        credentials: Credentials,
        invoker: impl BackendInvoker + 'static,
    ) -> Self {
        for id in order.unresolved(&catalog) {
            warn!(backend = %id, "Fallback order references a backend missing from the catalog");
        }

        Self {
            catalog: Arc::new(catalog),
            order,
            credentials,
            invoker: Arc::new(invoker),
            metrics: GatewayMetrics::default(),
        }
    }

    /// Gateway over the built-in catalog and the HTTP invoker.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured order references unknown backends or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &GatewayConfig, credentials: Credentials) -> PerootResult<Self> {
        let catalog = BackendCatalog::builtin();
        let order = FallbackOrder::validated(config.fallback_order.iter().cloned(), &catalog)?;
        let invoker = OpenAiCompatInvoker::new(config, credentials.clone())?;
        Ok(Self::new(catalog, order, credentials, invoker))
    }

    /// The catalog in use.
    pub fn catalog(&self) -> &BackendCatalog {
        &self.catalog
    }

    /// The fallback order in use.
    pub fn order(&self) -> &FallbackOrder {
        &self.order
    }

    /// The credentials availability is evaluated against.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Generate text with the first backend that accepts the request.
    ///
    /// # Errors
    ///
    /// - [`GatewayErrorKind::AllBackendsExhausted`] when every backend was skipped or failed.
    ///   The payload keeps the skipped backends and the last invocation error.
    /// - [`GatewayErrorKind::Cancelled`] when an invoker reports that the caller gave up.
    #[instrument(skip_all, fields(order_len = self.order.len()))]
    pub async fn dispatch(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GatewayError> {
        let mut attempted = 0usize;
        let mut unavailable: Vec<BackendUnavailable> = Vec::new();
        let mut last_error: Option<BackendError> = None;

        for id in self.order.iter() {
            let Some(descriptor) = self.catalog.get(id) else {
                warn!(backend = %id, "Backend missing from catalog, skipping");
                self.metrics.record_skip(id.as_str(), "unknown");
                unavailable.push(BackendUnavailable::new(id.as_str(), "not in catalog"));
                continue;
            };

            if let Some(reason) = descriptor.availability(&self.credentials).reason() {
                warn!(backend = %id, %reason, "Skipping unavailable backend");
                self.metrics.record_skip(id.as_str(), "unavailable");
                unavailable.push(BackendUnavailable::new(id.as_str(), reason));
                continue;
            }

            attempted += 1;
            info!(
                backend = %id,
                label = %descriptor.label(),
                attempt = attempted,
                "Attempting generation"
            );
            self.metrics.record_attempt(id.as_str());

            let started = Instant::now();
            match self.invoker.invoke(descriptor, request.invocation()).await {
                Ok(stream) => {
                    self.metrics
                        .record_success(id.as_str(), started.elapsed().as_secs_f64());
                    info!(backend = %id, attempted, skipped = unavailable.len(), "Backend accepted request");

                    let stream = with_completion_hook(id.clone(), stream, request.on_finish().clone());
                    return Ok(GenerationOutcome::new(
                        id.clone(),
                        attempted,
                        unavailable.len(),
                        stream,
                    ));
                }
                Err(e) if e.is_cancellation() => {
                    info!(backend = %id, "Caller cancelled dispatch, not falling back");
                    return Err(GatewayError::new(GatewayErrorKind::Cancelled(e)));
                }
                Err(e) => {
                    error!(backend = %id, error_type = e.kind().label(), error = %e, "Backend failed, falling back");
                    self.metrics.record_failure(id.as_str(), e.kind().label());
                    last_error = Some(e);
                }
            }
        }

        let err = GatewayError::new(GatewayErrorKind::AllBackendsExhausted {
            attempted,
            unavailable,
            last_error,
        });
        if let Some(cause) = err.kind().exhaustion_cause() {
            error!(%cause, attempted, "All backends exhausted");
            self.metrics.record_exhausted(cause);
        }
        Err(err)
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("catalog", &self.catalog)
            .field("order", &self.order)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Pass chunks through and run the hook once the stream ends cleanly.
///
/// The hook does not run if the stream fails or is dropped before its end.
fn with_completion_hook(backend: BackendId, inner: TextStream, hook: Option<OnFinish>) -> TextStream {
    let Some(hook) = hook else {
        return inner;
    };

    Box::pin(async_stream::stream! {
        let mut inner = inner;
        let mut text = String::new();
        let mut usage = None;
        let mut failed = false;

        while let Some(item) = inner.next().await {
            match item {
                Ok(chunk) => {
                    text.push_str(&chunk.text);
                    if chunk.usage.is_some() {
                        usage = chunk.usage;
                    }
                    yield Ok(chunk);
                }
                Err(e) => {
                    warn!(backend = %backend, error = %e, "Stream failed after it was established");
                    failed = true;
                    yield Err(e);
                    break;
                }
            }
        }

        if !failed {
            run_hook(&hook, Completion { backend, text, usage }).await;
        }
    })
}

async fn run_hook(hook: &OnFinish, completion: Completion) {
    let backend = completion.backend.clone();

    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| hook(completion))) {
        Ok(future) => future,
        Err(_) => {
            warn!(backend = %backend, "Completion hook panicked");
            return;
        }
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(())) => debug!(backend = %backend, "Completion hook finished"),
        Ok(Err(e)) => warn!(backend = %backend, error = %e, "Completion hook failed"),
        Err(_) => warn!(backend = %backend, "Completion hook panicked"),
    }
}
