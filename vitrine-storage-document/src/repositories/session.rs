use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use vitrine_core::{AccountId, Error, Session, SessionToken, repositories::SessionRepository};

/// Session repository over a concurrent map keyed by token.
pub struct DocumentSessionRepository {
    sessions: Arc<DashMap<String, Session>>,
}

impl DocumentSessionRepository {
    pub fn new(sessions: Arc<DashMap<String, Session>>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl SessionRepository for DocumentSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        self.sessions
            .insert(session.token.as_str().to_string(), session.clone());
        Ok(session)
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        Ok(self.sessions.get(token.as_str()).map(|entry| entry.clone()))
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.sessions.remove(token.as_str());
        Ok(())
    }

    async fn delete_by_account_id(&self, account_id: &AccountId) -> Result<(), Error> {
        self.sessions
            .retain(|_, session| session.account_id != *account_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<(), Error> {
        let now = Utc::now();
        self.sessions.retain(|_, session| session.expires_at >= now);
        Ok(())
    }
}
