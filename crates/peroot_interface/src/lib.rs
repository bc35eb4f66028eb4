//! Trait definitions for the Peroot completion dispatch layer.
//!
//! The gateway only ever talks to backends through [`BackendInvoker`]; provider wire
//! formats live behind implementations of it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::BackendInvoker;
