//! Generation requests.

use crate::Completion;
use futures::future::BoxFuture;
use peroot_error::{BuilderError, BuilderErrorKind, PerootResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Sampling temperature used when a request does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Highest temperature accepted by every supported provider family.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Hook invoked once a backend has finished streaming a completion.
pub type OnFinish = Arc<dyn Fn(Completion) -> BoxFuture<'static, PerootResult<()>> + Send + Sync>;

/// A single logical "generate text for me" request.
///
/// # Examples
///
/// ```
/// use peroot_core::{GenerationRequest, DEFAULT_TEMPERATURE};
///
/// let request = GenerationRequest::builder()
///     .system("You improve prompts.")
///     .prompt("write a haiku about rust")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.temperature(), DEFAULT_TEMPERATURE);
/// assert!(request.on_finish().is_none());
/// ```
#[derive(Clone, derive_builder::Builder, derive_getters::Getters)]
#[builder(build_fn(private, name = "build_internal"))]
pub struct GenerationRequest {
    /// System instruction text
    #[builder(setter(into))]
    system: String,
    /// User instruction text
    #[builder(setter(into))]
    prompt: String,
    #[builder(default, setter(strip_option))]
    #[getter(skip)]
    temperature: Option<f32>,
    /// Completion hook for telemetry capture
    #[builder(default, setter(custom))]
    on_finish: Option<OnFinish>,
}

impl GenerationRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }

    /// Request with default temperature and no hook.
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: None,
            on_finish: None,
        }
    }

    /// Effective sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// The part of the request handed to a backend.
    pub fn invocation(&self) -> Invocation<'_> {
        Invocation {
            system: &self.system,
            prompt: &self.prompt,
            temperature: self.temperature(),
        }
    }
}

impl GenerationRequestBuilder {
    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns an error if system or prompt text is missing, or the temperature is outside
    /// `0.0..=2.0`.
    pub fn build(&self) -> Result<GenerationRequest, BuilderError> {
        if let Some(Some(temperature)) = self.temperature
            && !(0.0..=MAX_TEMPERATURE).contains(&temperature)
        {
            return Err(BuilderError::new(BuilderErrorKind::OutOfRange {
                field: "temperature",
                value: temperature.to_string(),
                allowed: format!("0.0..={}", MAX_TEMPERATURE),
            }));
        }

        self.build_internal().map_err(|e| match e {
            GenerationRequestBuilderError::UninitializedField(field) => {
                BuilderError::new(BuilderErrorKind::MissingField(field.to_string()))
            }
            other => BuilderError::new(BuilderErrorKind::Rejected(other.to_string())),
        })
    }

    /// Attach a completion hook.
    pub fn on_finish<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(Completion) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PerootResult<()>> + Send + 'static,
    {
        let hook: OnFinish =
            Arc::new(move |completion: Completion| -> BoxFuture<'static, PerootResult<()>> {
                Box::pin(hook(completion))
            });
        self.on_finish = Some(Some(hook));
        self
    }
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("system_len", &self.system.len())
            .field("prompt_len", &self.prompt.len())
            .field("temperature", &self.temperature())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

/// What a backend receives: system text, user text and temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Invocation<'a> {
    /// System instruction text
    pub system: &'a str,
    /// User instruction text
    pub prompt: &'a str,
    /// Sampling temperature
    pub temperature: f32,
}
