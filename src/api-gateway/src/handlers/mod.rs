//! Request handlers: the gateway's action layer

pub mod health;
pub mod prompts;
pub mod providers;

use crate::error::{ApiError, Result};
use easyprompt_shared::{error_messages, MAX_PROMPT_LENGTH, MIN_PROMPT_LENGTH};
use validator::{Validate, ValidationError};

/// Run derive-based validation, folding the first failure into an
/// `ApiError` so clients get one actionable message.
pub(crate) fn validate_request(payload: &impl Validate) -> Result<()> {
    payload.validate().map_err(|errors| {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .and_then(|(field, field_errors)| {
                field_errors.first().map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error_messages::INVALID_PROMPT.to_string());
                    (field.to_string(), message)
                })
            })
            .unwrap_or_else(|| {
                (
                    "request".to_string(),
                    error_messages::INVALID_PROMPT.to_string(),
                )
            });
        ApiError::validation(field, message)
    })
}

/// Prompt length rule shared by every prompt-carrying request.
pub(crate) fn validate_prompt_length(prompt: &str) -> std::result::Result<(), ValidationError> {
    let length = prompt.chars().count();

    if length < MIN_PROMPT_LENGTH {
        let mut error = ValidationError::new("prompt_too_short");
        error.message = Some(error_messages::PROMPT_TOO_SHORT.into());
        return Err(error);
    }
    if length > MAX_PROMPT_LENGTH {
        let mut error = ValidationError::new("prompt_too_long");
        error.message = Some(error_messages::PROMPT_TOO_LONG.into());
        return Err(error);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_length_rule() {
        assert!(validate_prompt_length("").is_err());
        assert!(validate_prompt_length("Hi").is_err());
        assert!(validate_prompt_length("This is a valid prompt with enough characters").is_ok());

        let at_max = "a".repeat(MAX_PROMPT_LENGTH);
        assert!(validate_prompt_length(&at_max).is_ok());

        let over_max = "a".repeat(MAX_PROMPT_LENGTH + 1);
        let error = validate_prompt_length(&over_max).unwrap_err();
        assert_eq!(error.code, "prompt_too_long");
    }

    #[test]
    fn test_validation_error_carries_canonical_message() {
        let error = validate_prompt_length("Hi").unwrap_err();
        assert_eq!(
            error.message.as_deref(),
            Some(error_messages::PROMPT_TOO_SHORT)
        );
    }
}
