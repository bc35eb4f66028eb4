//! Gateway configuration.

use crate::FallbackOrder;
use peroot_core::ProviderFamily;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible base URL per provider family.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Endpoints {
    /// Google Generative AI, OpenAI-compatible surface
    #[serde(default = "default_google")]
    pub google: String,
    /// Groq
    #[serde(default = "default_groq")]
    pub groq: String,
    /// DeepSeek
    #[serde(default = "default_deepseek")]
    pub deepseek: String,
}

fn default_google() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_groq() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_deepseek() -> String {
    "https://api.deepseek.com".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            google: default_google(),
            groq: default_groq(),
            deepseek: default_deepseek(),
        }
    }
}

impl Endpoints {
    /// Point every family at the same base URL.
    pub fn uniform(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            google: base_url.clone(),
            groq: base_url.clone(),
            deepseek: base_url,
        }
    }

    /// Base URL for a family.
    pub fn for_family(&self, family: ProviderFamily) -> &str {
        match family {
            ProviderFamily::Google => &self.google,
            ProviderFamily::Groq => &self.groq,
            ProviderFamily::DeepSeek => &self.deepseek,
        }
    }
}

/// Gateway settings.
///
/// ```toml
/// [gateway]
/// fallback_order = ["gemini-2.0-flash", "gemini-1.5-flash", "llama-3-70b", "deepseek-chat"]
/// connect_timeout_secs = 10
/// request_timeout_secs = 30
///
/// [gateway.endpoints]
/// deepseek = "https://api.deepseek.com"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Backend ids in priority order
    #[serde(default)]
    pub fallback_order: FallbackOrder,

    /// TCP/TLS connect timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Time allowed for a backend to start streaming
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upstream base URLs
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            fallback_order: FallbackOrder::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            endpoints: Endpoints::default(),
        }
    }
}

impl GatewayConfig {
    /// Connect timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Stream establishment timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
