//! SQLite storage backend
//!
//! One row per account; the embedded review and gallery collections
//! are JSON TEXT columns, and every read-modify-write over them is an
//! optimistic compare-and-swap on the `revision` column so concurrent
//! mutations of the same account never lose an update. Email
//! uniqueness is an expression index on `lower(email)`.

pub mod repositories;

pub use repositories::SqliteRepositoryProvider;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use vitrine_core::{
    Account, AccountId, Error, Review,
    error::StorageError,
};

/// Row representation of an account.
#[derive(Debug, FromRow)]
pub struct SqliteAccount {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub rating: f64,
    pub review_count: i64,
    pub reviews: String,
    pub gallery: String,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<i64>,
    pub is_admin: bool,
    pub revision: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StorageError::Database(format!("invalid timestamp {secs}")).into())
}

impl TryFrom<SqliteAccount> for Account {
    type Error = Error;

    fn try_from(row: SqliteAccount) -> Result<Self, Error> {
        let reviews: Vec<Review> = serde_json::from_str(&row.reviews)
            .map_err(|e| StorageError::Database(format!("corrupt reviews column: {e}")))?;
        let gallery: Vec<String> = serde_json::from_str(&row.gallery)
            .map_err(|e| StorageError::Database(format!("corrupt gallery column: {e}")))?;

        Ok(Account {
            id: AccountId::new(&row.id),
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            specialty: row.specialty,
            location: row.location,
            state: row.state,
            phone: row.phone,
            whatsapp: row.whatsapp,
            description: row.description,
            image: row.image,
            rating: row.rating,
            review_count: row.review_count as u32,
            reviews,
            gallery,
            reset_token: row.reset_token,
            reset_token_expires_at: row
                .reset_token_expires_at
                .map(timestamp)
                .transpose()?,
            is_admin: row.is_admin,
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
        })
    }
}
