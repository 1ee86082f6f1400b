use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use vitrine_core::{
    AccountId, Error, Session, SessionToken,
    error::StorageError,
    repositories::SessionRepository,
};

#[derive(Debug, FromRow)]
struct SqliteSession {
    token: String,
    account_id: String,
    user_agent: Option<String>,
    ip_address: Option<String>,
    created_at: i64,
    expires_at: i64,
}

impl TryFrom<SqliteSession> for Session {
    type Error = Error;

    fn try_from(row: SqliteSession) -> Result<Self, Error> {
        let to_datetime = |secs: i64| -> Result<DateTime<Utc>, Error> {
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| StorageError::Database(format!("invalid timestamp {secs}")).into())
        };

        Ok(Session {
            token: SessionToken::new(&row.token),
            account_id: AccountId::new(&row.account_id),
            user_agent: row.user_agent,
            ip_address: row.ip_address,
            created_at: to_datetime(row.created_at)?,
            expires_at: to_datetime(row.expires_at)?,
        })
    }
}

pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, account_id, user_agent, ip_address, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(session.token.as_str())
        .bind(session.account_id.as_str())
        .bind(&session.user_agent)
        .bind(&session.ip_address)
        .bind(session.created_at.timestamp())
        .bind(session.expires_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(session)
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        let row = sqlx::query_as::<_, SqliteSession>("SELECT * FROM sessions WHERE token = ?1")
            .bind(token.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE token = ?1")
            .bind(token.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn delete_by_account_id(&self, account_id: &AccountId) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE account_id = ?1")
            .bind(account_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE expires_at < ?1")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }
}
