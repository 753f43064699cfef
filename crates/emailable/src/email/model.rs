//! Email record model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an email record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailId(pub i64);

impl EmailId {
    /// Create a new email ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EmailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Polymorphic reference to the entity owning an email record.
///
/// The pair (kind, key) is used as a composite lookup key; every
/// owner-scoped query filters on both components together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    /// Owner type discriminator (e.g. "facility", "user").
    pub kind: String,
    /// Owner primary key within its own table.
    pub key: i64,
}

impl OwnerRef {
    /// Create a new owner reference.
    pub fn new(kind: impl Into<String>, key: i64) -> Self {
        Self {
            kind: kind.into(),
            key,
        }
    }
}

impl std::fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}

/// Capability for entity types that can own email records.
///
/// Implementors expose their own owner reference; listing, primary and
/// type-filter accessors live on [`crate::EmailService`] and take this
/// capability, keeping entities free of email logic.
pub trait OwnsEmails {
    /// The (kind, key) pair identifying this entity as an email owner.
    fn owner_ref(&self) -> OwnerRef;
}

/// A persisted email address belonging to one owner.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailRecord {
    /// Unique identifier, assigned at creation.
    pub id: EmailId,
    /// Owning entity; immutable after creation.
    pub owner: OwnerRef,
    /// Classification label (e.g. "personal", "work", "billing").
    pub kind: String,
    /// Whether this is the owner's primary email. At most one record per
    /// owner carries this flag; the service enforces it, not the store.
    pub is_primary: bool,
    /// The email address itself.
    pub address: String,
    /// Whether the address has been verified.
    pub is_verified: bool,
    /// When the address was verified, if ever.
    pub verified_at: Option<DateTime<Utc>>,
    /// Open-ended key/value payload, opaque to the core logic.
    pub metadata: Option<serde_json::Value>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

impl EmailRecord {
    /// Domain part of the address: everything after the first `@`.
    ///
    /// Returns `None` for an empty address or one without an `@`.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        if self.address.is_empty() {
            return None;
        }
        self.address.split_once('@').map(|(_, domain)| domain)
    }
}
