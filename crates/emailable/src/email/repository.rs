//! Email storage repository.

use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};

use super::dto::EmailDto;
use super::model::{EmailId, EmailRecord, OwnerRef};
use crate::{Error, Result};

/// Columns selected for every record read.
const RECORD_COLUMNS: &str = "id, owner_type, owner_id, type, is_primary, email, \
     is_verified, verified_at, metadata, created_at, updated_at";

/// Repository for email record storage and retrieval.
///
/// All data access methods take a connection so the service layer can run
/// multi-step sequences inside one transaction. The repository itself has
/// no knowledge of the primary-exclusivity rule.
pub struct EmailRepository {
    pool: SqlitePool,
}

impl EmailRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS emails (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_type TEXT NOT NULL,
                owner_id INTEGER NOT NULL,
                type TEXT NOT NULL DEFAULT 'personal',
                is_primary INTEGER NOT NULL DEFAULT 0,
                email TEXT NOT NULL,
                is_verified INTEGER NOT NULL DEFAULT 0,
                verified_at TEXT,
                metadata TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Composite owner lookup index plus the single-column ones
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_emails_owner ON emails(owner_type, owner_id)
            ",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(r"CREATE INDEX IF NOT EXISTS idx_emails_type ON emails(type)")
            .execute(&self.pool)
            .await?;
        sqlx::query(r"CREATE INDEX IF NOT EXISTS idx_emails_is_primary ON emails(is_primary)")
            .execute(&self.pool)
            .await?;
        sqlx::query(r"CREATE INDEX IF NOT EXISTS idx_emails_email ON emails(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Check out a single connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is exhausted or the backend is unavailable.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Begin a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Look up a record by id. Absence is a normal `None` result.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed.
    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        id: EmailId,
    ) -> Result<Option<EmailRecord>> {
        let row = sqlx::query(&format!("SELECT {RECORD_COLUMNS} FROM emails WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&mut *conn)
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Insert a new record for the given owner.
    ///
    /// Returns the record re-read after insert, with its generated id and
    /// store-maintained timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn create(
        &self,
        conn: &mut SqliteConnection,
        owner: &OwnerRef,
        dto: &EmailDto,
    ) -> Result<EmailRecord> {
        let now = Utc::now().to_rfc3339();
        let metadata = dto.metadata().map(serde_json::to_string).transpose()?;

        let result = sqlx::query(
            r"
            INSERT INTO emails
                (owner_type, owner_id, type, is_primary, email,
                 is_verified, verified_at, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&owner.kind)
        .bind(owner.key)
        .bind(dto.kind())
        .bind(dto.is_primary())
        .bind(dto.address())
        .bind(dto.is_verified())
        .bind(dto.verified_at().map(|at| at.to_rfc3339()))
        .bind(metadata)
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?;

        let id = EmailId::new(result.last_insert_rowid());
        self.find(conn, id)
            .await?
            .ok_or(Error::Database(sqlx::Error::RowNotFound))
    }

    /// Apply the DTO's fields to an existing record.
    ///
    /// Returns the record re-read after the write to reflect store-side
    /// defaults. Owner fields and `created_at` are never touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        record: &EmailRecord,
        dto: &EmailDto,
    ) -> Result<EmailRecord> {
        let metadata = dto.metadata().map(serde_json::to_string).transpose()?;

        sqlx::query(
            r"
            UPDATE emails SET
                type = ?, is_primary = ?, email = ?,
                is_verified = ?, verified_at = ?, metadata = ?,
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(dto.kind())
        .bind(dto.is_primary())
        .bind(dto.address())
        .bind(dto.is_verified())
        .bind(dto.verified_at().map(|at| at.to_rfc3339()))
        .bind(metadata)
        .bind(Utc::now().to_rfc3339())
        .bind(record.id.0)
        .execute(&mut *conn)
        .await?;

        self.find(conn, record.id)
            .await?
            .ok_or(Error::Database(sqlx::Error::RowNotFound))
    }

    /// Delete a record by id.
    ///
    /// Returns true iff a row was actually removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: EmailId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM emails WHERE id = ?")
            .bind(id.0)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get all records for an owner, primary first, then by type, then by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed.
    pub async fn list_for_owner(
        &self,
        conn: &mut SqliteConnection,
        owner: &OwnerRef,
    ) -> Result<Vec<EmailRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM emails \
             WHERE owner_type = ? AND owner_id = ? \
             ORDER BY is_primary DESC, type ASC, id ASC"
        ))
        .bind(&owner.kind)
        .bind(owner.key)
        .fetch_all(&mut *conn)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Look up a record constrained to both id and owner.
    ///
    /// An id belonging to a different owner yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is malformed.
    pub async fn find_for_owner(
        &self,
        conn: &mut SqliteConnection,
        id: EmailId,
        owner: &OwnerRef,
    ) -> Result<Option<EmailRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM emails \
             WHERE id = ? AND owner_type = ? AND owner_id = ?"
        ))
        .bind(id.0)
        .bind(&owner.kind)
        .bind(owner.key)
        .fetch_optional(&mut *conn)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Get the record flagged primary for an owner, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is malformed.
    pub async fn find_primary_for_owner(
        &self,
        conn: &mut SqliteConnection,
        owner: &OwnerRef,
    ) -> Result<Option<EmailRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM emails \
             WHERE owner_type = ? AND owner_id = ? AND is_primary = 1 \
             LIMIT 1"
        ))
        .bind(&owner.kind)
        .bind(owner.key)
        .fetch_optional(&mut *conn)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Get an owner's records of a given type, ordered as in
    /// [`Self::list_for_owner`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed.
    pub async fn list_of_type_for_owner(
        &self,
        conn: &mut SqliteConnection,
        owner: &OwnerRef,
        kind: &str,
    ) -> Result<Vec<EmailRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM emails \
             WHERE owner_type = ? AND owner_id = ? AND type = ? \
             ORDER BY is_primary DESC, type ASC, id ASC"
        ))
        .bind(&owner.kind)
        .bind(owner.key)
        .bind(kind)
        .fetch_all(&mut *conn)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Demote every record for an owner to non-primary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unset_primary_for_owner(
        &self,
        conn: &mut SqliteConnection,
        owner: &OwnerRef,
    ) -> Result<()> {
        sqlx::query("UPDATE emails SET is_primary = 0 WHERE owner_type = ? AND owner_id = ?")
            .bind(&owner.kind)
            .bind(owner.key)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Flag a single record as primary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_primary(&self, conn: &mut SqliteConnection, id: EmailId) -> Result<()> {
        sqlx::query("UPDATE emails SET is_primary = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id.0)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Flag a single record as verified at the given instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_verified(
        &self,
        conn: &mut SqliteConnection,
        id: EmailId,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE emails SET is_verified = 1, verified_at = ?, updated_at = ? WHERE id = ?")
            .bind(at.to_rfc3339())
            .bind(Utc::now().to_rfc3339())
            .bind(id.0)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Delete every record for an owner whose id is not in `keep_ids`.
    ///
    /// An empty keep-list deletes all of the owner's records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete_where_not_in(
        &self,
        conn: &mut SqliteConnection,
        owner: &OwnerRef,
        keep_ids: &[EmailId],
    ) -> Result<()> {
        if keep_ids.is_empty() {
            sqlx::query("DELETE FROM emails WHERE owner_type = ? AND owner_id = ?")
                .bind(&owner.kind)
                .bind(owner.key)
                .execute(&mut *conn)
                .await?;
            return Ok(());
        }

        let placeholders = vec!["?"; keep_ids.len()].join(", ");
        let sql = format!(
            "DELETE FROM emails \
             WHERE owner_type = ? AND owner_id = ? AND id NOT IN ({placeholders})"
        );

        let mut query = sqlx::query(&sql).bind(&owner.kind).bind(owner.key);
        for id in keep_ids {
            query = query.bind(id.0);
        }
        query.execute(&mut *conn).await?;

        Ok(())
    }
}

/// Convert a database row to an `EmailRecord`.
fn row_to_record(row: &SqliteRow) -> Result<EmailRecord> {
    let verified_at = row
        .get::<Option<String>, _>("verified_at")
        .map(|s| parse_timestamp(&s))
        .transpose()?;
    let metadata = row
        .get::<Option<String>, _>("metadata")
        .map(|s| serde_json::from_str(&s))
        .transpose()?;

    Ok(EmailRecord {
        id: EmailId::new(row.get("id")),
        owner: OwnerRef {
            kind: row.get("owner_type"),
            key: row.get("owner_id"),
        },
        kind: row.get("type"),
        is_primary: row.get::<i64, _>("is_primary") != 0,
        address: row.get("email"),
        is_verified: row.get::<i64, _>("is_verified") != 0,
        verified_at,
        metadata,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dto(kind: &str, address: &str, is_primary: bool) -> EmailDto {
        EmailDto::new(kind, address, is_primary, false, None, None)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();
        let owner = OwnerRef::new("facility", 1);

        let created = repo
            .create(&mut conn, &owner, &dto("personal", "john@example.com", false))
            .await
            .unwrap();

        let found = repo.find(&mut conn, created.id).await.unwrap().unwrap();
        assert_eq!(found.address, "john@example.com");
        assert_eq!(found.kind, "personal");
        assert_eq!(found.owner, owner);
        assert!(!found.is_primary);
        assert!(!found.is_verified);
        assert!(found.verified_at.is_none());
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();

        let found = repo.find(&mut conn, EmailId::new(999)).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_metadata_round_trip() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();
        let owner = OwnerRef::new("facility", 1);

        let metadata = serde_json::json!({"label": "HQ", "floor": 3});
        let dto = EmailDto::new(
            "work",
            "hq@example.com",
            false,
            false,
            None,
            Some(metadata.clone()),
        );

        let created = repo.create(&mut conn, &owner, &dto).await.unwrap();
        assert_eq!(created.metadata, Some(metadata));
    }

    #[tokio::test]
    async fn test_update_applies_fields() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();
        let owner = OwnerRef::new("facility", 1);

        let created = repo
            .create(&mut conn, &owner, &dto("personal", "old@example.com", false))
            .await
            .unwrap();

        let updated = repo
            .update(&mut conn, &created, &dto("work", "new@example.com", true))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.address, "new@example.com");
        assert_eq!(updated.kind, "work");
        assert!(updated.is_primary);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_delete_reports_removal() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();
        let owner = OwnerRef::new("facility", 1);

        let created = repo
            .create(&mut conn, &owner, &dto("personal", "x@example.com", false))
            .await
            .unwrap();

        assert!(repo.delete(&mut conn, created.id).await.unwrap());
        assert!(!repo.delete(&mut conn, created.id).await.unwrap());
        assert!(repo.find(&mut conn, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_for_owner_ordering() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();
        let owner = OwnerRef::new("facility", 1);

        repo.create(&mut conn, &owner, &dto("work", "w@example.com", false))
            .await
            .unwrap();
        repo.create(&mut conn, &owner, &dto("billing", "b@example.com", false))
            .await
            .unwrap();
        let primary = repo
            .create(&mut conn, &owner, &dto("personal", "p@example.com", true))
            .await
            .unwrap();

        let listed = repo.list_for_owner(&mut conn, &owner).await.unwrap();
        assert_eq!(listed.len(), 3);
        // Primary first, then type ascending
        assert_eq!(listed[0].id, primary.id);
        assert_eq!(listed[1].kind, "billing");
        assert_eq!(listed[2].kind, "work");
    }

    #[tokio::test]
    async fn test_find_for_owner_scopes_by_owner() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();
        let owner = OwnerRef::new("facility", 1);
        let other = OwnerRef::new("facility", 2);

        let created = repo
            .create(&mut conn, &owner, &dto("personal", "a@example.com", false))
            .await
            .unwrap();

        let scoped = repo
            .find_for_owner(&mut conn, created.id, &owner)
            .await
            .unwrap();
        assert!(scoped.is_some());

        let cross = repo
            .find_for_owner(&mut conn, created.id, &other)
            .await
            .unwrap();
        assert!(cross.is_none());
    }

    #[tokio::test]
    async fn test_unset_primary_for_owner() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();
        let owner = OwnerRef::new("facility", 1);
        let other = OwnerRef::new("user", 1);

        repo.create(&mut conn, &owner, &dto("personal", "a@example.com", true))
            .await
            .unwrap();
        let untouched = repo
            .create(&mut conn, &other, &dto("personal", "b@example.com", true))
            .await
            .unwrap();

        repo.unset_primary_for_owner(&mut conn, &owner).await.unwrap();

        let demoted = repo.list_for_owner(&mut conn, &owner).await.unwrap();
        assert!(demoted.iter().all(|r| !r.is_primary));

        // Other owners are untouched
        let still_primary = repo.find(&mut conn, untouched.id).await.unwrap().unwrap();
        assert!(still_primary.is_primary);
    }

    #[tokio::test]
    async fn test_delete_where_not_in() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();
        let owner = OwnerRef::new("facility", 1);

        let keep = repo
            .create(&mut conn, &owner, &dto("personal", "keep@example.com", false))
            .await
            .unwrap();
        repo.create(&mut conn, &owner, &dto("work", "drop@example.com", false))
            .await
            .unwrap();

        repo.delete_where_not_in(&mut conn, &owner, &[keep.id])
            .await
            .unwrap();

        let remaining = repo.list_for_owner(&mut conn, &owner).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_delete_where_not_in_empty_wipes_owner() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();
        let owner = OwnerRef::new("facility", 1);
        let other = OwnerRef::new("facility", 2);

        repo.create(&mut conn, &owner, &dto("personal", "a@example.com", false))
            .await
            .unwrap();
        repo.create(&mut conn, &other, &dto("personal", "b@example.com", false))
            .await
            .unwrap();

        repo.delete_where_not_in(&mut conn, &owner, &[]).await.unwrap();

        assert!(repo.list_for_owner(&mut conn, &owner).await.unwrap().is_empty());
        assert_eq!(repo.list_for_owner(&mut conn, &other).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_primary_and_list_of_type() {
        let repo = EmailRepository::in_memory().await.unwrap();
        let mut conn = repo.acquire().await.unwrap();
        let owner = OwnerRef::new("facility", 1);

        assert!(repo
            .find_primary_for_owner(&mut conn, &owner)
            .await
            .unwrap()
            .is_none());

        repo.create(&mut conn, &owner, &dto("work", "w1@example.com", false))
            .await
            .unwrap();
        let primary = repo
            .create(&mut conn, &owner, &dto("work", "w2@example.com", true))
            .await
            .unwrap();

        let found = repo
            .find_primary_for_owner(&mut conn, &owner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, primary.id);

        let work = repo
            .list_of_type_for_owner(&mut conn, &owner, "work")
            .await
            .unwrap();
        assert_eq!(work.len(), 2);
        assert!(repo
            .list_of_type_for_owner(&mut conn, &owner, "billing")
            .await
            .unwrap()
            .is_empty());
    }
}
