//! Validation utilities.

use crate::ThreadlineError;
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `ThreadlineError` on failure.
    fn validate_request(&self) -> Result<(), ThreadlineError> {
        self.validate().map_err(validation_errors_to_threadline_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Converts `validator::ValidationErrors` to `ThreadlineError`.
///
/// Field errors are flattened into one message, sorted by field name so the
/// text is stable.
#[must_use]
pub fn validation_errors_to_threadline_error(errors: ValidationErrors) -> ThreadlineError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string);
                format!("{}: {}", field, message)
            })
        })
        .collect();
    messages.sort();

    ThreadlineError::Validation(messages.join("; "))
}
