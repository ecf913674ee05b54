//! Prompt validation constants and canonical user-facing messages

/// Minimum accepted prompt length, in characters.
pub const MIN_PROMPT_LENGTH: usize = 10;

/// Maximum accepted prompt length, in characters.
pub const MAX_PROMPT_LENGTH: usize = 5000;

/// Canonical user-facing error messages. Handlers surface these instead of
/// upstream error payloads.
pub mod error_messages {
    pub const INVALID_PROMPT: &str = "Please enter a valid prompt";
    pub const PROMPT_TOO_SHORT: &str = "Prompt must be at least 10 characters";
    pub const PROMPT_TOO_LONG: &str = "Prompt must be at most 5000 characters";
    pub const PROVIDER_UNAVAILABLE: &str =
        "The selected provider is currently unavailable. Please try another one.";
    pub const RATE_LIMIT_EXCEEDED: &str =
        "You have exceeded the rate limit. Please try again later.";
}
