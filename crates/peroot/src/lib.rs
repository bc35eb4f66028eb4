//! Peroot completion dispatch layer.
//!
//! Every generation request passes two gates:
//!
//! 1. [`RateLimiter::check`] admits or rejects the caller against its tier quota in the
//!    current fixed window. Store outages fail open.
//! 2. [`Gateway::dispatch`] tries each backend of the fallback order in turn and returns the
//!    first stream that could be established.
//!
//! # Quick Start
//!
//! ```no_run
//! use peroot::{
//!     CallerIdentity, Credentials, Gateway, GenerationRequest, MemoryCounterStore,
//!     PerootConfig, RateLimiter, Tier,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PerootConfig::load()?;
//! let limiter = RateLimiter::new(MemoryCounterStore::new(), config.rate_limit.clone());
//! let gateway = Gateway::from_config(&config.gateway, Credentials::from_env())?;
//!
//! let decision = limiter.check(&CallerIdentity::new("user-42"), Tier::Free).await;
//! if decision.admitted {
//!     let request = GenerationRequest::new("You improve prompts.", "make this clearer");
//!     let outcome = gateway.dispatch(&request).await?;
//!     println!("{}", outcome.collect_text().await?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `peroot_error` - Error types
//! - `peroot_core` - Descriptors, credentials, requests and streamed outcomes
//! - `peroot_interface` - The `BackendInvoker` trait
//! - `peroot_gateway` - Catalog, fallback order, orchestrator and HTTP invoker
//! - `peroot_rate_limit` - Fixed window limiter and counter stores
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]

mod config;
mod telemetry;

pub use config::PerootConfig;
pub use telemetry::init_tracing;

pub use peroot_core::*;
pub use peroot_error::*;
pub use peroot_gateway::*;
pub use peroot_interface::*;
pub use peroot_rate_limit::*;
