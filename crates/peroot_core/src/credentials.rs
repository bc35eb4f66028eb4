//! Provider credentials, read once at startup and passed explicitly.

use crate::ProviderFamily;
use std::collections::HashMap;
use std::fmt;
use strum::IntoEnumIterator;

/// API keys per provider family.
///
/// Empty or whitespace-only keys count as missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    keys: HashMap<ProviderFamily, String>,
}

impl Credentials {
    /// Read every family's key from its environment variable.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut credentials = Self::default();
        for family in ProviderFamily::iter() {
            if let Some(key) = lookup(family.credential_env_var()) {
                credentials.insert(family, key);
            }
        }
        credentials
    }

    /// Add a key, builder style.
    pub fn with_key(mut self, family: ProviderFamily, key: impl Into<String>) -> Self {
        self.insert(family, key);
        self
    }

    /// Add or replace a key. Blank keys remove the family.
    pub fn insert(&mut self, family: ProviderFamily, key: impl Into<String>) {
        let key = key.into();
        if key.trim().is_empty() {
            self.keys.remove(&family);
        } else {
            self.keys.insert(family, key);
        }
    }

    /// The key for a family, if configured.
    pub fn get(&self, family: ProviderFamily) -> Option<&str> {
        self.keys.get(&family).map(String::as_str)
    }

    /// Whether a key is configured for the family.
    pub fn has(&self, family: ProviderFamily) -> bool {
        self.keys.contains_key(&family)
    }
}

// Keys never reach logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut families: Vec<_> = self.keys.keys().collect();
        families.sort();
        f.debug_struct("Credentials")
            .field("families", &families)
            .finish()
    }
}
