use async_trait::async_trait;

use crate::{Error, Session, account::AccountId, session::SessionToken};

/// Repository for session data access
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Create a new session
    async fn create(&self, session: Session) -> Result<Session, Error>;

    /// Find a session by token
    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error>;

    /// Delete a session by token; idempotent
    async fn delete(&self, token: &SessionToken) -> Result<(), Error>;

    /// Delete all sessions for an account
    async fn delete_by_account_id(&self, account_id: &AccountId) -> Result<(), Error>;

    /// Clean up expired sessions
    async fn cleanup_expired(&self) -> Result<(), Error>;
}
