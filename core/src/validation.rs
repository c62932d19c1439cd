//! Pre-flight checks run before any request leaves the client.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Lexical shape of a pet identifier.
static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-\._]+$").expect("static regex should not panic"));

/// A field or identifier rejected before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("pet {0} is required")]
    Missing(&'static str),

    #[error("pet {0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("invalid id {0:?}")]
    InvalidId(String),
}

/// Whether `id` is non-empty and matches the identifier pattern.
pub fn valid_id(id: &str) -> bool {
    ID_PATTERN.is_match(id)
}

/// Whether `value` is non-empty.
pub fn valid_string(value: &str) -> bool {
    !value.is_empty()
}

/// Whether `value` is strictly positive.
pub fn valid_int(value: i64) -> bool {
    value > 0
}

pub(crate) fn require_id(id: &str) -> Result<(), ValidationError> {
    if valid_id(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidId(id.to_string()))
    }
}
