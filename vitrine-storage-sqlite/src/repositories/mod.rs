//! Repository implementations for SQLite storage

pub mod account;
pub mod session;

pub use account::SqliteAccountRepository;
pub use session::SqliteSessionRepository;

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use vitrine_core::{
    Error,
    error::StorageError,
    repositories::{AccountRepositoryProvider, RepositoryProvider, SessionRepositoryProvider},
};

/// Repository provider implementation for SQLite
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    account: Arc<SqliteAccountRepository>,
    session: Arc<SqliteSessionRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let account = Arc::new(SqliteAccountRepository::new(pool.clone()));
        let session = Arc::new(SqliteSessionRepository::new(pool.clone()));

        Self {
            pool,
            account,
            session,
        }
    }
}

impl AccountRepositoryProvider for SqliteRepositoryProvider {
    type AccountRepo = SqliteAccountRepository;

    fn account(&self) -> &Self::AccountRepo {
        &self.account
    }
}

impl SessionRepositoryProvider for SqliteRepositoryProvider {
    type SessionRepo = SqliteSessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                specialty TEXT,
                location TEXT,
                state TEXT,
                phone TEXT,
                whatsapp TEXT,
                description TEXT,
                image TEXT,
                rating REAL NOT NULL DEFAULT 0,
                review_count INTEGER NOT NULL DEFAULT 0,
                reviews TEXT NOT NULL DEFAULT '[]',
                gallery TEXT NOT NULL DEFAULT '[]',
                reset_token TEXT,
                reset_token_expires_at INTEGER,
                is_admin INTEGER NOT NULL DEFAULT 0,
                revision INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to create accounts table");
            Error::Storage(StorageError::Migration(e.to_string()))
        })?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_email ON accounts (lower(email))",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Migration(e.to_string())))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                user_agent TEXT,
                ip_address TEXT,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Migration(e.to_string())))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sessions_account_id ON sessions (account_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Migration(e.to_string())))?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
