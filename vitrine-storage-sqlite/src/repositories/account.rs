use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use vitrine_core::{
    Account, AccountId, Error, Review,
    account::{GalleryOp, NewAccount, ProfileChanges, RESERVED_SPECIALTIES, apply_gallery_op},
    error::{StorageError, TokenError},
    reputation,
    repositories::AccountRepository,
};

use crate::SqliteAccount;

/// Retry bound for the compare-and-swap loops. Contention only arises
/// between writers of the same account, so a handful of retries is
/// plenty before surfacing a transient failure.
const MAX_CAS_ATTEMPTS: u32 = 32;

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_db_err(e: sqlx::Error) -> Error {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return StorageError::Conflict("email already exists".to_string()).into();
            }
        }
        StorageError::Database(e.to_string()).into()
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, Error> {
        let now = Utc::now().timestamp();
        let id = AccountId::new_random();

        let row = sqlx::query_as::<_, SqliteAccount>(
            r#"
            INSERT INTO accounts (
                id, email, password_hash, name, specialty, location, state,
                description, image, is_admin, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(&account.specialty)
        .bind(&account.location)
        .bind(&account.state)
        .bind(&account.description)
        .bind(&account.image)
        .bind(account.is_admin)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_db_err)?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccount>("SELECT * FROM accounts WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_db_err)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccount>(
            "SELECT * FROM accounts WHERE lower(email) = lower(?1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_db_err)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_email_or_name(&self, key: &str) -> Result<Option<Account>, Error> {
        // An email match outranks a name match on a different account.
        let row = sqlx::query_as::<_, SqliteAccount>(
            r#"
            SELECT * FROM accounts
            WHERE lower(email) = lower(?1) OR lower(name) = lower(?1)
            ORDER BY (lower(email) = lower(?1)) DESC
            LIMIT 1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_db_err)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        changes: &ProfileChanges,
    ) -> Result<Account, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteAccount>(
            r#"
            UPDATE accounts SET
                name        = COALESCE(?2, name),
                specialty   = COALESCE(?3, specialty),
                location    = COALESCE(?4, location),
                state       = COALESCE(?5, state),
                phone       = COALESCE(?6, phone),
                whatsapp    = COALESCE(?7, whatsapp),
                description = COALESCE(?8, description),
                image       = COALESCE(?9, image),
                email       = COALESCE(?10, email),
                updated_at  = ?11,
                revision    = revision + 1
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .bind(&changes.name)
        .bind(&changes.specialty)
        .bind(&changes.location)
        .bind(&changes.state)
        .bind(&changes.phone)
        .bind(&changes.whatsapp)
        .bind(&changes.description)
        .bind(&changes.image)
        .bind(&changes.email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_db_err)?;

        row.ok_or(Error::Storage(StorageError::NotFound))?.try_into()
    }

    async fn append_review(&self, id: &AccountId, review: Review) -> Result<(f64, u32), Error> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let row: Option<(String, i64)> =
                sqlx::query_as("SELECT reviews, revision FROM accounts WHERE id = ?1")
                    .bind(id.as_str())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(Self::map_db_err)?;

            let (reviews_json, revision) = row.ok_or(Error::Storage(StorageError::NotFound))?;

            let mut reviews: Vec<Review> = serde_json::from_str(&reviews_json)
                .map_err(|e| StorageError::Database(format!("corrupt reviews column: {e}")))?;
            reviews.push(review.clone());

            // Validation failures reject the append before any write.
            let (rating, count) = reputation::aggregate(&reviews)?;

            let updated = serde_json::to_string(&reviews)
                .map_err(|e| StorageError::Database(e.to_string()))?;

            let result = sqlx::query(
                r#"
                UPDATE accounts
                SET reviews = ?1, rating = ?2, review_count = ?3,
                    updated_at = ?4, revision = revision + 1
                WHERE id = ?5 AND revision = ?6
                "#,
            )
            .bind(&updated)
            .bind(rating)
            .bind(count as i64)
            .bind(Utc::now().timestamp())
            .bind(id.as_str())
            .bind(revision)
            .execute(&self.pool)
            .await
            .map_err(Self::map_db_err)?;

            if result.rows_affected() == 1 {
                return Ok((rating, count));
            }
            // Lost the race; re-read current state and try again.
        }

        Err(StorageError::Transient("review append contention".to_string()).into())
    }

    async fn mutate_gallery(&self, id: &AccountId, op: GalleryOp) -> Result<Vec<String>, Error> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let row: Option<(String, i64)> =
                sqlx::query_as("SELECT gallery, revision FROM accounts WHERE id = ?1")
                    .bind(id.as_str())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(Self::map_db_err)?;

            let (gallery_json, revision) = row.ok_or(Error::Storage(StorageError::NotFound))?;

            let mut gallery: Vec<String> = serde_json::from_str(&gallery_json)
                .map_err(|e| StorageError::Database(format!("corrupt gallery column: {e}")))?;

            let before = gallery.len();
            apply_gallery_op(&mut gallery, &op);
            if gallery.len() == before && matches!(op, GalleryOp::Remove(_)) {
                // Removing an absent entry is a no-op.
                return Ok(gallery);
            }

            let updated = serde_json::to_string(&gallery)
                .map_err(|e| StorageError::Database(e.to_string()))?;

            let result = sqlx::query(
                r#"
                UPDATE accounts
                SET gallery = ?1, updated_at = ?2, revision = revision + 1
                WHERE id = ?3 AND revision = ?4
                "#,
            )
            .bind(&updated)
            .bind(Utc::now().timestamp())
            .bind(id.as_str())
            .bind(revision)
            .execute(&self.pool)
            .await
            .map_err(Self::map_db_err)?;

            if result.rows_affected() == 1 {
                return Ok(gallery);
            }
        }

        Err(StorageError::Transient("gallery mutation contention".to_string()).into())
    }

    async fn set_reset_token(
        &self,
        id: &AccountId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET reset_token = ?1, reset_token_expires_at = ?2,
                updated_at = ?3, revision = revision + 1
            WHERE id = ?4
            "#,
        )
        .bind(token)
        .bind(expires_at.timestamp())
        .bind(Utc::now().timestamp())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(Self::map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        email: &str,
        token: &str,
        new_password_hash: &str,
    ) -> Result<Account, Error> {
        let now = Utc::now().timestamp();

        // One statement performs the token-equality and expiry checks,
        // the digest update, and the field clearing, so a consumed or
        // superseded token can never be replayed.
        let row = sqlx::query_as::<_, SqliteAccount>(
            r#"
            UPDATE accounts
            SET password_hash = ?1, reset_token = NULL,
                reset_token_expires_at = NULL,
                updated_at = ?2, revision = revision + 1
            WHERE lower(email) = lower(?3)
              AND reset_token = ?4
              AND reset_token_expires_at >= ?2
            RETURNING *
            "#,
        )
        .bind(new_password_hash)
        .bind(now)
        .bind(email)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_db_err)?;

        row.ok_or(Error::Token(TokenError::Invalid))?.try_into()
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(Self::map_db_err)?;

        sqlx::query("DELETE FROM sessions WHERE account_id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(Self::map_db_err)?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Account>, Error> {
        let rows = sqlx::query_as::<_, SqliteAccount>(
            r#"
            SELECT * FROM accounts
            WHERE specialty IS NULL OR specialty NOT IN (?1, ?2)
            ORDER BY created_at, id
            "#,
        )
        .bind(RESERVED_SPECIALTIES[0])
        .bind(RESERVED_SPECIALTIES[1])
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_db_err)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
