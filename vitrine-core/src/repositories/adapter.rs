//! Adapters from a [`RepositoryProvider`] to the individual
//! repository traits, so services can be generic over one repository
//! while the facade holds a single provider.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error, Session,
    account::{Account, AccountId, GalleryOp, NewAccount, ProfileChanges, Review},
    repositories::{
        AccountRepository, AccountRepositoryProvider, RepositoryProvider, SessionRepository,
        SessionRepositoryProvider,
    },
    session::SessionToken,
};

pub struct AccountRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AccountRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AccountRepository for AccountRepositoryAdapter<R> {
    async fn create(&self, account: NewAccount) -> Result<Account, Error> {
        self.provider.account().create(account).await
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_email(email).await
    }

    async fn find_by_email_or_name(&self, key: &str) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_email_or_name(key).await
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        changes: &ProfileChanges,
    ) -> Result<Account, Error> {
        self.provider.account().update_profile(id, changes).await
    }

    async fn append_review(&self, id: &AccountId, review: Review) -> Result<(f64, u32), Error> {
        self.provider.account().append_review(id, review).await
    }

    async fn mutate_gallery(&self, id: &AccountId, op: GalleryOp) -> Result<Vec<String>, Error> {
        self.provider.account().mutate_gallery(id, op).await
    }

    async fn set_reset_token(
        &self,
        id: &AccountId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.provider
            .account()
            .set_reset_token(id, token, expires_at)
            .await
    }

    async fn consume_reset_token(
        &self,
        email: &str,
        token: &str,
        new_password_hash: &str,
    ) -> Result<Account, Error> {
        self.provider
            .account()
            .consume_reset_token(email, token, new_password_hash)
            .await
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        self.provider.account().delete(id).await
    }

    async fn list(&self) -> Result<Vec<Account>, Error> {
        self.provider.account().list().await
    }
}

pub struct SessionRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SessionRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SessionRepository for SessionRepositoryAdapter<R> {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        self.provider.session().create(session).await
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        self.provider.session().find_by_token(token).await
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.provider.session().delete(token).await
    }

    async fn delete_by_account_id(&self, account_id: &AccountId) -> Result<(), Error> {
        self.provider
            .session()
            .delete_by_account_id(account_id)
            .await
    }

    async fn cleanup_expired(&self) -> Result<(), Error> {
        self.provider.session().cleanup_expired().await
    }
}
