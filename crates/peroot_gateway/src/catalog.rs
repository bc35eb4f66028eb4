//! The static catalog of completion backends.

use peroot_core::{BackendDescriptor, BackendId, ProviderFamily};
use peroot_error::{ConfigError, PerootResult};
use tracing::debug;

/// Ordered, immutable set of backend descriptors keyed by id.
#[derive(Debug, Clone)]
pub struct BackendCatalog {
    descriptors: Vec<BackendDescriptor>,
}

impl BackendCatalog {
    /// Build a catalog from descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error if two descriptors share an id.
    pub fn new(descriptors: Vec<BackendDescriptor>) -> PerootResult<Self> {
        for (i, descriptor) in descriptors.iter().enumerate() {
            if descriptors[..i].iter().any(|d| d.id() == descriptor.id()) {
                return Err(ConfigError::new(format!(
                    "Duplicate backend id in catalog: {}",
                    descriptor.id()
                ))
                .into());
            }
        }
        debug!(count = descriptors.len(), "Loaded backend catalog");
        Ok(Self { descriptors })
    }

    /// The backends the product ships with.
    pub fn builtin() -> Self {
        Self {
            descriptors: vec![
                BackendDescriptor::new(
                    "gemini-2.0-flash",
                    "Gemini 2.0 Flash (Primary)",
                    ProviderFamily::Google,
                    "gemini-2.0-flash",
                    1_000_000,
                ),
                BackendDescriptor::new(
                    "gemini-1.5-flash",
                    "Gemini 1.5 Flash (Backup)",
                    ProviderFamily::Google,
                    "gemini-1.5-flash",
                    1_000_000,
                ),
                BackendDescriptor::new(
                    "llama-3-70b",
                    "Llama 3 70B (Groq)",
                    ProviderFamily::Groq,
                    "llama3-70b-8192",
                    8192,
                ),
                BackendDescriptor::new(
                    "deepseek-chat",
                    "DeepSeek Chat (Alternative)",
                    ProviderFamily::DeepSeek,
                    "deepseek-chat",
                    64_000,
                ),
            ],
        }
    }

    /// Look up a descriptor.
    pub fn get(&self, id: &BackendId) -> Option<&BackendDescriptor> {
        self.descriptors.iter().find(|d| d.id() == id)
    }

    /// Whether the id is known.
    pub fn contains(&self, id: &BackendId) -> bool {
        self.get(id).is_some()
    }

    /// Descriptors in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.descriptors.iter()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for BackendCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
