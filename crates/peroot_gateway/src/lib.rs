//! Ordered fallback dispatch across interchangeable completion backends.
//!
//! A [`Gateway`] walks its [`FallbackOrder`] strictly in sequence. For each backend id it
//! resolves the descriptor in the [`BackendCatalog`], skips it when its availability check
//! fails under the configured credentials, and otherwise invokes it. The first backend that
//! establishes a stream wins; failures move on to the next id. When the order runs out the
//! gateway returns [`GatewayErrorKind::AllBackendsExhausted`](peroot_error::GatewayErrorKind)
//! carrying the last backend error.
//!
//! # Example
//!
//! ```no_run
//! use peroot_core::{Credentials, GenerationRequest};
//! use peroot_gateway::{Gateway, GatewayConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::from_config(&GatewayConfig::default(), Credentials::from_env())?;
//!
//! let request = GenerationRequest::new("You improve prompts.", "make this clearer");
//! let outcome = gateway.dispatch(&request).await?;
//! println!("served by {}", outcome.backend());
//! println!("{}", outcome.collect_text().await?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
mod gateway;
mod metrics;
mod openai_compat;
mod order;
mod sse;

pub use catalog::BackendCatalog;
pub use config::{Endpoints, GatewayConfig};
pub use gateway::Gateway;
pub use metrics::GatewayMetrics;
pub use openai_compat::OpenAiCompatInvoker;
pub use order::FallbackOrder;
