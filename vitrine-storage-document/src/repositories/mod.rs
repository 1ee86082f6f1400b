//! Repository implementations for document storage

pub mod account;
pub mod session;

pub use account::DocumentAccountRepository;
pub use session::DocumentSessionRepository;

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use vitrine_core::{
    Error,
    repositories::{AccountRepositoryProvider, RepositoryProvider, SessionRepositoryProvider},
};

/// Repository provider backed by in-process concurrent maps.
///
/// The session map is shared with the account repository so deleting
/// an account also drops its sessions, matching the SQLite backend.
pub struct DocumentRepositoryProvider {
    account: Arc<DocumentAccountRepository>,
    session: Arc<DocumentSessionRepository>,
}

impl DocumentRepositoryProvider {
    pub fn new() -> Self {
        let sessions = Arc::new(DashMap::new());
        let account = Arc::new(DocumentAccountRepository::new(sessions.clone()));
        let session = Arc::new(DocumentSessionRepository::new(sessions));

        Self { account, session }
    }
}

impl Default for DocumentRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountRepositoryProvider for DocumentRepositoryProvider {
    type AccountRepo = DocumentAccountRepository;

    fn account(&self) -> &Self::AccountRepo {
        &self.account
    }
}

impl SessionRepositoryProvider for DocumentRepositoryProvider {
    type SessionRepo = DocumentSessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

#[async_trait]
impl RepositoryProvider for DocumentRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        // Nothing to set up; the maps are created empty.
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}
