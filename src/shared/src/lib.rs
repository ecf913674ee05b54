//! Shared types and constants for the EasyPrompt Gateway
//!
//! This crate contains the domain vocabulary used by both the provider
//! adapters and the API gateway, so the two sides agree on one set of types.

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::*;
