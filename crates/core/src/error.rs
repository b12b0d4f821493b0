use std::fmt;

/// Rejected input, detected before any computation runs.
///
/// Carried inside `anyhow::Error`; callers that need to distinguish bad
/// input from internal failures recover it with `downcast_ref`.
#[derive(Debug, Clone)]
pub struct InvalidInputError {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl InvalidInputError {
    pub fn new(field: &'static str, value: impl fmt::Display, expected: &'static str) -> Self {
        Self {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

impl fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid input (field={}): expected {}, got {}",
            self.field, self.expected, self.value
        )
    }
}

impl std::error::Error for InvalidInputError {}

/// Shorthand for `Err(InvalidInputError { .. }.into())` at validation sites.
pub fn invalid_input(
    field: &'static str,
    value: impl fmt::Display,
    expected: &'static str,
) -> anyhow::Error {
    InvalidInputError::new(field, value, expected).into()
}
