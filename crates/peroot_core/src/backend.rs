//! Backend descriptors and provider families.

use crate::Credentials;
use serde::{Deserialize, Serialize};

/// Unique symbolic id of a completion backend (e.g. `gemini-2.0-flash`).
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    /// Create a backend id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BackendId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Upstream provider family. Backends of one family share a credential.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderFamily {
    /// Google Generative AI (Gemini)
    Google,
    /// Groq LPU inference
    Groq,
    /// DeepSeek
    DeepSeek,
}

impl ProviderFamily {
    /// Environment variable holding this family's API key.
    pub fn credential_env_var(&self) -> &'static str {
        match self {
            ProviderFamily::Google => "GOOGLE_GENERATIVE_AI_API_KEY",
            ProviderFamily::Groq => "GROQ_API_KEY",
            ProviderFamily::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

/// Result of evaluating a backend's availability check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Availability {
    /// The backend may be invoked.
    Available,
    /// No credential is configured for the backend's family.
    MissingCredential(ProviderFamily),
    /// Unavailable for some other configuration reason.
    Disabled(String),
}

impl Availability {
    /// Whether the backend may be invoked.
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    /// Human-readable reason for unavailability, `None` if available.
    pub fn reason(&self) -> Option<String> {
        match self {
            Availability::Available => None,
            Availability::MissingCredential(family) => Some(format!(
                "no API key for {} ({} not set)",
                family,
                family.credential_env_var()
            )),
            Availability::Disabled(reason) => Some(reason.clone()),
        }
    }
}

/// Pure predicate deciding whether a backend is usable under the given credentials.
pub type AvailabilityCheck = fn(&BackendDescriptor, &Credentials) -> Availability;

fn requires_family_credential(descriptor: &BackendDescriptor, credentials: &Credentials) -> Availability {
    if credentials.has(descriptor.family) {
        Availability::Available
    } else {
        Availability::MissingCredential(descriptor.family)
    }
}

/// Static description of one completion backend.
///
/// Descriptors are immutable data; the availability check is evaluated on every dispatch
/// so credential changes between requests are honoured.
///
/// # Examples
///
/// ```
/// use peroot_core::{BackendDescriptor, Credentials, ProviderFamily};
///
/// let groq = BackendDescriptor::new(
///     "llama-3-70b",
///     "Llama 3 70B (Groq)",
///     ProviderFamily::Groq,
///     "llama3-70b-8192",
///     8192,
/// );
///
/// assert!(!groq.availability(&Credentials::default()).is_available());
///
/// let creds = Credentials::default().with_key(ProviderFamily::Groq, "gsk-test");
/// assert!(groq.availability(&creds).is_available());
/// ```
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct BackendDescriptor {
    /// Unique id
    id: BackendId,
    /// Display name
    label: String,
    /// Provider family
    family: ProviderFamily,
    /// Model name sent upstream
    model: String,
    /// Context window in tokens
    context_window: u32,
    #[getter(skip)]
    check: AvailabilityCheck,
}

impl BackendDescriptor {
    /// Create a descriptor that is available whenever its family has a credential.
    pub fn new(
        id: impl Into<BackendId>,
        label: impl Into<String>,
        family: ProviderFamily,
        model: impl Into<String>,
        context_window: u32,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            family,
            model: model.into(),
            context_window,
            check: requires_family_credential,
        }
    }

    /// Replace the availability check.
    pub fn with_availability_check(mut self, check: AvailabilityCheck) -> Self {
        self.check = check;
        self
    }

    /// Evaluate the availability check against the given credentials.
    pub fn availability(&self, credentials: &Credentials) -> Availability {
        (self.check)(self, credentials)
    }
}
