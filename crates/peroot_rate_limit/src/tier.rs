//! Subscription tiers.

use peroot_error::{RateLimitError, RateLimitErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Subscription class of a caller. Selects the quota, never the window length.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    /// Unauthenticated caller, identified by device fingerprint
    #[default]
    Guest,
    /// Signed-in user without a subscription
    Free,
    /// Paying subscriber
    Pro,
}

impl Tier {
    /// Built-in requests per window.
    pub fn default_limit(&self) -> u64 {
        match self {
            Tier::Guest => 5,
            Tier::Free => 30,
            Tier::Pro => 200,
        }
    }
}

impl FromStr for Tier {
    type Err = RateLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Tier::Guest),
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            other => Err(RateLimitError::new(RateLimitErrorKind::InvalidTier(
                other.to_string(),
            ))),
        }
    }
}
