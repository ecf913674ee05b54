//! Middleware modules for the gateway

pub mod logging;
pub mod rate_limit;
