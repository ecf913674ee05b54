//! Shared type definitions for the EasyPrompt Gateway

pub mod core;
pub mod providers;

pub use core::*;
pub use providers::*;
