//! Core data types for the Peroot completion dispatch layer.
//!
//! This crate provides the data shared by the gateway, the invokers and the facade:
//! backend descriptors, credentials, generation requests and streamed outcomes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod completion;
mod credentials;
mod request;

pub use backend::{Availability, AvailabilityCheck, BackendDescriptor, BackendId, ProviderFamily};
pub use completion::{Completion, GenerationOutcome, StreamChunk, TextStream, TokenUsage};
pub use credentials::Credentials;
pub use request::{
    DEFAULT_TEMPERATURE, GenerationRequest, GenerationRequestBuilder, Invocation,
    MAX_TEMPERATURE, OnFinish,
};
