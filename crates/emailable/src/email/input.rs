//! Raw boundary input shape for email sub-resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::EmailId;

/// External request shape for creating, updating or syncing an email.
///
/// Optional fields left out of the payload fall back to configured
/// defaults when the input is turned into an [`super::EmailDto`]. The `id`
/// field is only meaningful in the bulk sync form, where it names an
/// existing record to update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailInput {
    /// Existing record id (bulk sync form only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EmailId>,
    /// The email address. Required.
    pub email: String,
    /// Classification label.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Whether this should be the owner's primary email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
    /// Whether the address is already verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    /// Verification timestamp, taken verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    /// Open-ended key/value payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl EmailInput {
    /// Input carrying just an address, everything else defaulted.
    #[must_use]
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }
}
