//! Route definitions for the gateway

pub mod api;
pub mod public;
