//! Email service: invariant enforcement and bulk reconciliation.

use chrono::Utc;
use tracing::debug;

use crate::config::EmailConfig;
use crate::email::{
    EmailDto, EmailId, EmailInput, EmailRecord, EmailRepository, OwnerRef, OwnsEmails,
};
use crate::{Error, Result};

/// Service enforcing the primary-exclusivity rule and coordinating
/// multi-record reconciliation.
///
/// The repository has no awareness of these rules; every mutating
/// operation here runs its demote-then-write sequence inside a single
/// transaction, so a failure partway leaves the prior record set
/// unchanged.
pub struct EmailService {
    repository: EmailRepository,
    config: EmailConfig,
}

impl EmailService {
    /// Create a service over the given repository and configuration.
    #[must_use]
    pub const fn new(repository: EmailRepository, config: EmailConfig) -> Self {
        Self { repository, config }
    }

    /// Configuration used when building DTOs from raw sync input.
    #[must_use]
    pub const fn config(&self) -> &EmailConfig {
        &self.config
    }

    /// Create a new email record for an owner.
    ///
    /// When the DTO is flagged primary, any existing primary for the owner
    /// is demoted first, in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn store(&self, owner: &OwnerRef, dto: &EmailDto) -> Result<EmailRecord> {
        let mut tx = self.repository.begin().await?;

        if dto.is_primary() {
            debug!(owner = %owner, "demoting existing primary before insert");
            self.repository
                .unset_primary_for_owner(&mut tx, owner)
                .await?;
        }

        let record = self.repository.create(&mut tx, owner, dto).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Apply the DTO's fields to an existing record.
    ///
    /// Promoting a non-primary record demotes its siblings first; flipping
    /// primary to false never promotes a replacement.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn update(&self, record: &EmailRecord, dto: &EmailDto) -> Result<EmailRecord> {
        let mut tx = self.repository.begin().await?;

        if dto.is_primary() && !record.is_primary {
            debug!(owner = %record.owner, id = %record.id, "promoting record, demoting siblings");
            self.repository
                .unset_primary_for_owner(&mut tx, &record.owner)
                .await?;
        }

        let updated = self.repository.update(&mut tx, record, dto).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a record unconditionally.
    ///
    /// No replacement primary is promoted; an owner may legitimately end
    /// up with zero primary emails.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn delete(&self, record: &EmailRecord) -> Result<bool> {
        let mut conn = self.repository.acquire().await?;
        self.repository.delete(&mut conn, record.id).await
    }

    /// Look up a record by id, unscoped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn find(&self, id: EmailId) -> Result<Option<EmailRecord>> {
        let mut conn = self.repository.acquire().await?;
        self.repository.find(&mut conn, id).await
    }

    /// All records for an owner, primary first, then by type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_for_owner(&self, owner: &OwnerRef) -> Result<Vec<EmailRecord>> {
        let mut conn = self.repository.acquire().await?;
        self.repository.list_for_owner(&mut conn, owner).await
    }

    /// Owner-scoped lookup; ids belonging to other owners yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn find_for_owner(
        &self,
        id: EmailId,
        owner: &OwnerRef,
    ) -> Result<Option<EmailRecord>> {
        let mut conn = self.repository.acquire().await?;
        self.repository.find_for_owner(&mut conn, id, owner).await
    }

    /// The record flagged primary for an owner, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn primary_for_owner(&self, owner: &OwnerRef) -> Result<Option<EmailRecord>> {
        let mut conn = self.repository.acquire().await?;
        self.repository.find_primary_for_owner(&mut conn, owner).await
    }

    /// An owner's records of a given type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn of_type_for_owner(&self, owner: &OwnerRef, kind: &str) -> Result<Vec<EmailRecord>> {
        let mut conn = self.repository.acquire().await?;
        self.repository
            .list_of_type_for_owner(&mut conn, owner, kind)
            .await
    }

    /// All emails of an entity implementing [`OwnsEmails`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn emails_of(&self, entity: &impl OwnsEmails) -> Result<Vec<EmailRecord>> {
        self.get_for_owner(&entity.owner_ref()).await
    }

    /// The primary email of an entity implementing [`OwnsEmails`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn primary_email_of(&self, entity: &impl OwnsEmails) -> Result<Option<EmailRecord>> {
        self.primary_for_owner(&entity.owner_ref()).await
    }

    /// An entity's emails of a given type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn emails_of_type(
        &self,
        entity: &impl OwnsEmails,
        kind: &str,
    ) -> Result<Vec<EmailRecord>> {
        self.of_type_for_owner(&entity.owner_ref(), kind).await
    }

    /// Reconcile an owner's full email set to match `items`.
    ///
    /// Items carrying an id that resolves to one of the owner's records are
    /// updated in place; everything else is created (an id that doesn't
    /// resolve is discarded and treated as a create). Records not named by
    /// the pass are deleted afterwards - an empty `items` wipes the owner's
    /// whole set. The entire reconciliation runs in one transaction and
    /// returns the fresh listing.
    ///
    /// # Errors
    ///
    /// Returns an error if any database operation fails; the prior record
    /// set is left unchanged in that case.
    pub async fn sync(&self, owner: &OwnerRef, items: &[EmailInput]) -> Result<Vec<EmailRecord>> {
        let mut tx = self.repository.begin().await?;
        let mut kept_ids: Vec<EmailId> = Vec::with_capacity(items.len());

        for item in items {
            let dto = EmailDto::from_input(item, &self.config);

            if let Some(id) = item.id
                && let Some(existing) = self.repository.find_for_owner(&mut tx, id, owner).await?
            {
                if dto.is_primary() && !existing.is_primary {
                    self.repository.unset_primary_for_owner(&mut tx, owner).await?;
                }
                self.repository.update(&mut tx, &existing, &dto).await?;
                kept_ids.push(existing.id);
                continue;
            }

            if dto.is_primary() {
                self.repository.unset_primary_for_owner(&mut tx, owner).await?;
            }
            let created = self.repository.create(&mut tx, owner, &dto).await?;
            kept_ids.push(created.id);
        }

        self.repository
            .delete_where_not_in(&mut tx, owner, &kept_ids)
            .await?;

        let records = self.repository.list_for_owner(&mut tx, owner).await?;
        tx.commit().await?;

        debug!(owner = %owner, kept = kept_ids.len(), total = records.len(), "synced email set");
        Ok(records)
    }

    /// Flag a record as the owner's primary email, demoting its siblings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the record no
    /// longer exists.
    pub async fn mark_as_primary(&self, record: &EmailRecord) -> Result<EmailRecord> {
        let mut tx = self.repository.begin().await?;

        self.repository
            .unset_primary_for_owner(&mut tx, &record.owner)
            .await?;
        self.repository.set_primary(&mut tx, record.id).await?;

        let refreshed = self
            .repository
            .find(&mut tx, record.id)
            .await?
            .ok_or(Error::Database(sqlx::Error::RowNotFound))?;
        tx.commit().await?;
        Ok(refreshed)
    }

    /// Flag a record as verified, stamping `verified_at` with the current
    /// time. One-way; there is no unverify.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the record no
    /// longer exists.
    pub async fn mark_as_verified(&self, record: &EmailRecord) -> Result<EmailRecord> {
        let mut tx = self.repository.begin().await?;

        self.repository
            .set_verified(&mut tx, record.id, Utc::now())
            .await?;

        let refreshed = self
            .repository
            .find(&mut tx, record.id)
            .await?
            .ok_or(Error::Database(sqlx::Error::RowNotFound))?;
        tx.commit().await?;
        Ok(refreshed)
    }
}
