//! Boundary validation for email input.

use super::input::EmailInput;
use crate::config::EmailConfig;

/// Maximum length of the email address field.
const MAX_EMAIL_LEN: usize = 255;

/// Maximum length of the classification label.
const MAX_TYPE_LEN: usize = 50;

/// Validation error for email input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email address is empty.
    EmptyEmail,
    /// Email address format is invalid.
    InvalidEmail,
    /// Email address exceeds 255 characters.
    EmailTooLong,
    /// Classification label exceeds 50 characters.
    TypeTooLong,
    /// Classification label is not in the configured allow-list.
    DisallowedType,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "Email address is required",
            Self::InvalidEmail => "Invalid email address format",
            Self::EmailTooLong => "Email address must be at most 255 characters",
            Self::TypeTooLong => "Type must be at most 50 characters",
            Self::DisallowedType => "Type is not in the allowed list",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::InvalidEmail | Self::EmailTooLong => "email",
            Self::TypeTooLong | Self::DisallowedType => "type",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating email input.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate raw email input against the configured rules.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all errors.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_input(input: &EmailInput, config: &EmailConfig) -> ValidationResult {
    let mut errors = Vec::new();

    // Email validation
    if input.email.trim().is_empty() {
        errors.push(ValidationError::EmptyEmail);
    } else {
        if !is_valid_email(&input.email) {
            errors.push(ValidationError::InvalidEmail);
        }
        if input.email.chars().count() > MAX_EMAIL_LEN {
            errors.push(ValidationError::EmailTooLong);
        }
    }

    // Type validation
    if let Some(kind) = &input.kind {
        if kind.chars().count() > MAX_TYPE_LEN {
            errors.push(ValidationError::TypeTooLong);
        }
        if !config.allow_custom_types && !config.allowed_types.iter().any(|t| t == kind) {
            errors.push(ValidationError::DisallowedType);
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    // Must contain exactly one @
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let local = parts[0];
    let domain = parts[1];

    // Local part must not be empty
    if local.is_empty() {
        return false;
    }

    // Domain must contain at least one dot and not be empty
    if domain.is_empty() || !domain.contains('.') {
        return false;
    }

    // Domain parts must not be empty
    let domain_parts: Vec<&str> = domain.split('.').collect();
    if domain_parts.iter().any(|p| p.is_empty()) {
        return false;
    }

    true
}
