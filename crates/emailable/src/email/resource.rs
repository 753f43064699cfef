//! Response representation for a single email record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{EmailId, EmailRecord};

/// Boundary-facing view of an email record.
///
/// Timestamps serialize as RFC 3339; `domain` is derived from the address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailResponse {
    /// Record identifier.
    pub id: EmailId,
    /// Classification label.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether this is the owner's primary email.
    pub is_primary: bool,
    /// The email address.
    pub email: String,
    /// Domain part of the address, if present.
    pub domain: Option<String>,
    /// Whether the address has been verified.
    pub is_verified: bool,
    /// When the address was verified, if ever.
    pub verified_at: Option<DateTime<Utc>>,
    /// Metadata payload.
    pub metadata: Option<serde_json::Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-write timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&EmailRecord> for EmailResponse {
    fn from(record: &EmailRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind.clone(),
            is_primary: record.is_primary,
            email: record.address.clone(),
            domain: record.domain().map(ToString::to_string),
            is_verified: record.is_verified,
            verified_at: record.verified_at,
            metadata: record.metadata.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
