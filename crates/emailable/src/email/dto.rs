//! Immutable write-shape for email records.

use chrono::{DateTime, Utc};

use super::input::EmailInput;
use crate::config::EmailConfig;

/// Validated, immutable value object carrying the writable fields of an
/// email record.
///
/// Constructed once per request and discarded after use. Fields are
/// private with read-only accessors, so the read-only contract holds at
/// compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailDto {
    kind: String,
    address: String,
    is_primary: bool,
    is_verified: bool,
    verified_at: Option<DateTime<Utc>>,
    metadata: Option<serde_json::Value>,
}

impl EmailDto {
    /// Create a DTO directly from its parts.
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        address: impl Into<String>,
        is_primary: bool,
        is_verified: bool,
        verified_at: Option<DateTime<Utc>>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            kind: kind.into(),
            address: address.into(),
            is_primary,
            is_verified,
            verified_at,
            metadata,
        }
    }

    /// Build a DTO from raw boundary input, applying configured defaults.
    ///
    /// A missing `type` falls back to `config.default_type`; missing flags
    /// default to false; `verified_at` and `metadata` stay absent. Any `id`
    /// on the input is ignored here (it only matters to sync).
    #[must_use]
    pub fn from_input(input: &EmailInput, config: &EmailConfig) -> Self {
        Self {
            kind: input
                .kind
                .clone()
                .unwrap_or_else(|| config.default_type.clone()),
            address: input.email.clone(),
            is_primary: input.is_primary.unwrap_or(false),
            is_verified: input.is_verified.unwrap_or(false),
            verified_at: input.verified_at,
            metadata: input.metadata.clone(),
        }
    }

    /// Convert back to the plain field mapping (without an id).
    #[must_use]
    pub fn to_input(&self) -> EmailInput {
        EmailInput {
            id: None,
            email: self.address.clone(),
            kind: Some(self.kind.clone()),
            is_primary: Some(self.is_primary),
            is_verified: Some(self.is_verified),
            verified_at: self.verified_at,
            metadata: self.metadata.clone(),
        }
    }

    /// Classification label.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The email address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether this write designates the record as primary.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Whether this write marks the record verified.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.is_verified
    }

    /// Verification timestamp carried by this write, if any.
    #[must_use]
    pub const fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verified_at
    }

    /// Metadata payload carried by this write, if any.
    #[must_use]
    pub const fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::model::EmailId;
    use super::*;

    #[test]
    fn test_from_input_applies_defaults() {
        let config = EmailConfig::default();
        let dto = EmailDto::from_input(&EmailInput::with_email("john@example.com"), &config);

        assert_eq!(dto.kind(), "personal");
        assert_eq!(dto.address(), "john@example.com");
        assert!(!dto.is_primary());
        assert!(!dto.is_verified());
        assert!(dto.verified_at().is_none());
        assert!(dto.metadata().is_none());
    }

    #[test]
    fn test_from_input_uses_configured_default_type() {
        let config = EmailConfig {
            default_type: "billing".to_string(),
            ..EmailConfig::default()
        };
        let dto = EmailDto::from_input(&EmailInput::with_email("pay@example.com"), &config);
        assert_eq!(dto.kind(), "billing");
    }

    #[test]
    fn test_from_input_keeps_explicit_fields() {
        let config = EmailConfig::default();
        let input = EmailInput {
            email: "boss@example.com".to_string(),
            kind: Some("work".to_string()),
            is_primary: Some(true),
            is_verified: Some(true),
            verified_at: Some(Utc::now()),
            metadata: Some(serde_json::json!({"label": "HQ"})),
            id: None,
        };

        let dto = EmailDto::from_input(&input, &config);
        assert_eq!(dto.kind(), "work");
        assert!(dto.is_primary());
        assert!(dto.is_verified());
        assert!(dto.verified_at().is_some());
        assert_eq!(dto.metadata().unwrap()["label"], "HQ");
    }

    #[test]
    fn test_round_trip_is_stable() {
        let config = EmailConfig::default();
        let input = EmailInput {
            email: "john@example.com".to_string(),
            kind: Some("work".to_string()),
            is_primary: Some(true),
            is_verified: None,
            verified_at: None,
            metadata: Some(serde_json::json!({"note": "x"})),
            id: Some(EmailId::new(99)),
        };

        let once = EmailDto::from_input(&input, &config);
        let twice = EmailDto::from_input(&once.to_input(), &config);
        assert_eq!(once, twice);
    }
}
