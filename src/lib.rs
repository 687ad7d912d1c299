//! nzb-cleaner: batch normalization of NZB files.
//!
//! Reconciles password and title values between an NZB document's metadata
//! block and the `name{{password}}.nzb` filename convention, processing many
//! files concurrently with per-file failure isolation.

// Core modules
pub mod cli;
pub mod codec;
pub mod discovery;
pub mod error;
pub mod nzb;
pub mod pipeline;
pub mod transform;
pub mod validate;
pub mod writer;

// Re-export commonly used error types
pub use error::{DiscoveryError, NzbError, TaskError};
