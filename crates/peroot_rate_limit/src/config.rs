//! Rate limit configuration.

use crate::Tier;
use peroot_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Requests admitted per window, per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct TierLimits {
    /// Guest quota
    #[serde(default = "guest_limit")]
    pub guest: u64,
    /// Free quota
    #[serde(default = "free_limit")]
    pub free: u64,
    /// Pro quota
    #[serde(default = "pro_limit")]
    pub pro: u64,
}

fn guest_limit() -> u64 {
    Tier::Guest.default_limit()
}

fn free_limit() -> u64 {
    Tier::Free.default_limit()
}

fn pro_limit() -> u64 {
    Tier::Pro.default_limit()
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            guest: guest_limit(),
            free: free_limit(),
            pro: pro_limit(),
        }
    }
}

impl TierLimits {
    /// Quota for a tier.
    pub fn for_tier(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Guest => self.guest,
            Tier::Free => self.free,
            Tier::Pro => self.pro,
        }
    }
}

/// Fixed window settings.
///
/// ```toml
/// [rate_limit]
/// window_secs = 3600
/// key_prefix = "@peroot/ratelimit"
/// store_timeout_ms = 5000
///
/// [rate_limit.limits]
/// guest = 5
/// free = 30
/// pro = 200
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Window length in seconds, shared by every tier
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Prefix of counter keys
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Upper bound on one store round trip before failing open
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Per-tier quotas
    #[serde(default)]
    pub limits: TierLimits,
}

fn default_window_secs() -> u64 {
    3600
}

fn default_key_prefix() -> String {
    "@peroot/ratelimit".to_string()
}

fn default_store_timeout_ms() -> u64 {
    5000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            key_prefix: default_key_prefix(),
            store_timeout_ms: default_store_timeout_ms(),
            limits: TierLimits::default(),
        }
    }
}

impl RateLimitConfig {
    /// Quota for a tier.
    pub fn limit_for(&self, tier: Tier) -> u64 {
        self.limits.for_tier(tier)
    }

    /// Reject settings that would quietly switch enforcement off.
    ///
    /// A zero-length window expires every counter at once, so no caller is ever rejected. A
    /// zero store timeout fails every check open.
    ///
    /// # Errors
    ///
    /// Returns the first offending setting.
    ///
    /// ```
    /// use peroot_rate_limit::RateLimitConfig;
    ///
    /// assert!(RateLimitConfig::default().validate().is_ok());
    ///
    /// let config = RateLimitConfig { window_secs: 0, ..RateLimitConfig::default() };
    /// let err = config.validate().unwrap_err();
    /// assert_eq!(err.setting.as_deref(), Some("rate_limit.window_secs"));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_secs == 0 {
            return Err(ConfigError::invalid(
                "rate_limit.window_secs",
                "must be at least 1",
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "rate_limit.store_timeout_ms",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Store timeout as a duration.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
