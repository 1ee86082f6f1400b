use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::{Error, Session, account::AccountId, repositories::SessionRepository,
    session::SessionToken};

/// Service for session management operations
pub struct SessionService<R: SessionRepository> {
    repository: Arc<R>,
}

impl<R: SessionRepository> SessionService<R> {
    /// Create a new SessionService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a new session for an account
    pub async fn create_session(
        &self,
        account_id: &AccountId,
        user_agent: Option<String>,
        ip_address: Option<String>,
        expires_in: Duration,
    ) -> Result<Session, Error> {
        let now = Utc::now();
        let session = Session {
            token: SessionToken::new_random(),
            account_id: account_id.clone(),
            user_agent,
            ip_address,
            created_at: now,
            expires_at: now + expires_in,
        };

        self.repository.create(session).await
    }

    /// Get a session by token. An expired session yields `None`, the
    /// same as an unknown token.
    pub async fn get_session(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        let session = self.repository.find_by_token(token).await?;

        if let Some(ref s) = session {
            if s.is_expired() {
                return Ok(None);
            }
        }

        Ok(session)
    }

    /// Delete a session; idempotent
    pub async fn delete_session(&self, token: &SessionToken) -> Result<(), Error> {
        self.repository.delete(token).await
    }

    /// Delete all sessions for an account
    pub async fn delete_account_sessions(&self, account_id: &AccountId) -> Result<(), Error> {
        self.repository.delete_by_account_id(account_id).await
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<(), Error> {
        self.repository.cleanup_expired().await
    }
}
